use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};

use crate::{
    db::entities::{album, playlist_song, song},
    error::{AppError, Result},
    middleware::auth::CurrentUser,
    services::{contains_as_text, contains_ci, Page, PaginationInfo},
    state::AppState,
};

#[derive(Deserialize)]
pub struct AddSongRequest {
    pub title: String,
    pub duration: i64,
    pub album_id: Option<i32>,
}

#[derive(Deserialize)]
pub struct UpdateSongRequest {
    pub title: Option<String>,
    pub duration: Option<i64>,
    pub album_id: Option<i32>,
}

#[derive(Deserialize)]
pub struct SearchSongsQuery {
    pub q: Option<String>,
    pub title: Option<String>,
    pub album_id: Option<i32>,
    pub min_duration: Option<i64>,
    pub max_duration: Option<i64>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

#[derive(Serialize)]
pub struct SongResponse {
    pub id: i32,
    pub title: String,
    pub duration: i64,
    pub album_id: Option<i32>,
    pub user_id: i32,
}

#[derive(Serialize)]
pub struct AlbumSummary {
    pub id: i32,
    pub title: String,
    pub artist: String,
    pub year: i32,
}

#[derive(Serialize)]
pub struct SongWithAlbumResponse {
    pub id: i32,
    pub title: String,
    pub duration: i64,
    pub album_id: Option<i32>,
    pub user_id: i32,
    pub album: Option<AlbumSummary>,
}

#[derive(Serialize)]
pub struct SearchSongsResponse {
    pub songs: Vec<SongWithAlbumResponse>,
    pub pagination: PaginationInfo,
}

impl From<song::Model> for SongResponse {
    fn from(s: song::Model) -> Self {
        Self {
            id: s.id,
            title: s.title,
            duration: s.duration,
            album_id: s.album_id,
            user_id: s.user_id,
        }
    }
}

/// A song may only reference an album its owner also owns. A nonexistent
/// album id is a validation problem; an existing album owned by someone else
/// is a forbidden one. The two are deliberately distinguishable.
async fn ensure_album_ownership(
    db: &DatabaseConnection,
    album_id: i32,
    owner_id: i32,
) -> Result<()> {
    let album_row = album::Entity::find_active()
        .filter(album::Column::Id.eq(album_id))
        .one(db)
        .await?
        .ok_or_else(|| AppError::Validation(format!("Album {} does not exist", album_id)))?;

    if album_row.user_id != owner_id {
        return Err(AppError::Forbidden("You don't own this album".to_string()));
    }
    Ok(())
}

pub async fn add_song(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<AddSongRequest>,
) -> Result<(StatusCode, Json<SongResponse>)> {
    if payload.title.trim().is_empty() {
        return Err(AppError::Validation("title is required".to_string()));
    }

    if let Some(album_id) = payload.album_id {
        ensure_album_ownership(&state.db, album_id, user.id).await?;
    }

    let now = Utc::now().into();
    let new_song = song::ActiveModel {
        title: Set(payload.title),
        duration: Set(payload.duration),
        album_id: Set(payload.album_id),
        user_id: Set(user.id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    let created = new_song.insert(&state.db).await?;

    Ok((StatusCode::CREATED, Json(created.into())))
}

pub async fn list_songs(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<SongResponse>>> {
    let songs = song::Entity::find_active()
        .filter(song::Column::UserId.eq(user.id))
        .order_by_desc(song::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(Json(songs.into_iter().map(SongResponse::from).collect()))
}

pub async fn get_song(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i32>,
) -> Result<Json<SongResponse>> {
    let song_row = find_owned_song(&state.db, id, user.id).await?;
    Ok(Json(song_row.into()))
}

pub async fn update_song(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateSongRequest>,
) -> Result<Json<SongResponse>> {
    let existing = find_owned_song(&state.db, id, user.id).await?;

    // Same ownership re-validation as create, but only when the payload
    // actually carries an album reference.
    if let Some(album_id) = payload.album_id {
        ensure_album_ownership(&state.db, album_id, user.id).await?;
    }

    let mut active: song::ActiveModel = existing.into();
    if let Some(title) = payload.title {
        active.title = Set(title);
    }
    if let Some(duration) = payload.duration {
        active.duration = Set(duration);
    }
    if let Some(album_id) = payload.album_id {
        active.album_id = Set(Some(album_id));
    }
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&state.db).await?;

    Ok(Json(updated.into()))
}

pub async fn delete_song(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i32>,
) -> Result<Json<serde_json::Value>> {
    let song_row = find_owned_song(&state.db, id, user.id).await?;

    // The join table is global, so memberships are purged across every
    // playlist regardless of who owns it. Purge and tombstone commit
    // together.
    let txn = state.db.begin().await?;

    playlist_song::Entity::delete_many()
        .filter(playlist_song::Column::SongId.eq(song_row.id))
        .exec(&txn)
        .await
        .map_err(|e| {
            tracing::error!("Failed to remove song from playlists: {}", e);
            AppError::Internal("Failed to remove song from playlists".to_string())
        })?;

    let now: chrono::DateTime<chrono::FixedOffset> = Utc::now().into();
    let mut active: song::ActiveModel = song_row.into();
    active.deleted_at = Set(Some(now));
    active.updated_at = Set(now);
    active.update(&txn).await.map_err(|e| {
        tracing::error!("Failed to delete song: {}", e);
        AppError::Internal("Failed to delete song".to_string())
    })?;

    txn.commit().await?;

    Ok(Json(serde_json::json!({
        "message": "Song deleted successfully"
    })))
}

pub async fn search_songs(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<SearchSongsQuery>,
) -> Result<Json<SearchSongsResponse>> {
    let page = Page::from_params(query.limit.as_deref(), query.offset.as_deref());

    let mut select = song::Entity::find_active().filter(song::Column::UserId.eq(user.id));

    if let Some(q) = query.q.as_deref().filter(|s| !s.is_empty()) {
        select = select.filter(
            Condition::any()
                .add(contains_ci(song::Column::Title, q))
                .add(contains_as_text(song::Column::Duration, q)),
        );
    } else {
        if let Some(title) = query.title.as_deref().filter(|s| !s.is_empty()) {
            select = select.filter(contains_ci(song::Column::Title, title));
        }
        if let Some(album_id) = query.album_id {
            select = select.filter(song::Column::AlbumId.eq(album_id));
        }
        if let Some(min) = query.min_duration {
            select = select.filter(song::Column::Duration.gte(min));
        }
        if let Some(max) = query.max_duration {
            select = select.filter(song::Column::Duration.lte(max));
        }
    }

    let total = select.clone().count(&state.db).await?;

    // Related album is a read-only join; the song row itself is already
    // owner-scoped.
    let songs = select
        .offset(page.offset)
        .limit(page.limit)
        .find_also_related(album::Entity)
        .all(&state.db)
        .await?;

    let songs = songs
        .into_iter()
        .map(|(s, a)| SongWithAlbumResponse {
            id: s.id,
            title: s.title,
            duration: s.duration,
            album_id: s.album_id,
            user_id: s.user_id,
            album: a.map(|a| AlbumSummary {
                id: a.id,
                title: a.title,
                artist: a.artist,
                year: a.year,
            }),
        })
        .collect();

    Ok(Json(SearchSongsResponse {
        songs,
        pagination: PaginationInfo::new(total, page),
    }))
}

async fn find_owned_song(db: &DatabaseConnection, id: i32, owner_id: i32) -> Result<song::Model> {
    song::Entity::find_active()
        .filter(song::Column::Id.eq(id))
        .filter(song::Column::UserId.eq(owner_id))
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Song not found".to_string()))
}
