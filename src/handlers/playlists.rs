use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, LoaderTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};

use crate::{
    db::entities::{playlist, playlist_song, song},
    error::{AppError, Result},
    middleware::auth::CurrentUser,
    services::{contains_ci, Page, PaginationInfo},
    state::AppState,
};

#[derive(Deserialize)]
pub struct AddPlaylistRequest {
    pub name: String,
    #[serde(default)]
    pub song_ids: Vec<i32>,
}

#[derive(Deserialize)]
pub struct UpdatePlaylistRequest {
    pub name: String,
    #[serde(default)]
    pub song_ids: Vec<i32>,
}

#[derive(Deserialize)]
pub struct SearchPlaylistsQuery {
    pub q: Option<String>,
    pub name: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

#[derive(Serialize)]
pub struct PlaylistResponse {
    pub id: i32,
    pub name: String,
    pub user_id: i32,
    pub songs: Vec<PlaylistSongResponse>,
}

#[derive(Serialize)]
pub struct PlaylistSongResponse {
    pub id: i32,
    pub title: String,
    pub duration: i64,
    pub album_id: Option<i32>,
    pub user_id: i32,
}

#[derive(Serialize)]
pub struct SearchPlaylistsResponse {
    pub playlists: Vec<PlaylistResponse>,
    pub pagination: PaginationInfo,
}

impl From<song::Model> for PlaylistSongResponse {
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

/// Load the member songs of one playlist through the join relation,
/// excluding tombstoned songs (album cascades can tombstone a song while its
/// join rows remain).
async fn load_playlist_songs(
    db: &DatabaseConnection,
    playlist_row: &playlist::Model,
) -> Result<Vec<PlaylistSongResponse>> {
    let songs = playlist_row
        .find_related(song::Entity)
        .filter(song::Column::DeletedAt.is_null())
        .all(db)
        .await?;

    Ok(songs.into_iter().map(PlaylistSongResponse::from).collect())
}

/// Batch variant for list/search responses.
async fn with_songs(
    db: &DatabaseConnection,
    playlists: Vec<playlist::Model>,
) -> Result<Vec<PlaylistResponse>> {
    let songs = playlists
        .load_many_to_many(
            song::Entity::find().filter(song::Column::DeletedAt.is_null()),
            playlist_song::Entity,
            db,
        )
        .await?;

    Ok(playlists
        .into_iter()
        .zip(songs)
        .map(|(p, songs)| PlaylistResponse {
            id: p.id,
            name: p.name,
            user_id: p.user_id,
            songs: songs.into_iter().map(PlaylistSongResponse::from).collect(),
        })
        .collect())
}

pub async fn add_playlist(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<AddPlaylistRequest>,
) -> Result<(StatusCode, Json<PlaylistResponse>)> {
    if payload.name.trim().is_empty() {
        return Err(AppError::Validation("name is required".to_string()));
    }

    // Song references are resolved by existence only at creation time; ids
    // that don't resolve are dropped, and no ownership filter is applied.
    let songs = if payload.song_ids.is_empty() {
        Vec::new()
    } else {
        song::Entity::find_active()
            .filter(song::Column::Id.is_in(payload.song_ids.clone()))
            .all(&state.db)
            .await?
    };

    let now = Utc::now().into();
    let new_playlist = playlist::ActiveModel {
        name: Set(payload.name),
        user_id: Set(user.id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    let created = new_playlist.insert(&state.db).await?;

    if !songs.is_empty() {
        let rows: Vec<playlist_song::ActiveModel> = songs
            .iter()
            .map(|s| playlist_song::ActiveModel {
                playlist_id: Set(created.id),
                song_id: Set(s.id),
            })
            .collect();
        playlist_song::Entity::insert_many(rows)
            .exec(&state.db)
            .await?;
    }

    let songs = load_playlist_songs(&state.db, &created).await?;
    Ok((
        StatusCode::CREATED,
        Json(PlaylistResponse {
            id: created.id,
            name: created.name,
            user_id: created.user_id,
            songs,
        }),
    ))
}

pub async fn list_playlists(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<PlaylistResponse>>> {
    let playlists = playlist::Entity::find_active()
        .filter(playlist::Column::UserId.eq(user.id))
        .order_by_desc(playlist::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(Json(with_songs(&state.db, playlists).await?))
}

pub async fn get_playlist(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i32>,
) -> Result<Json<PlaylistResponse>> {
    let playlist_row = find_owned_playlist(&state.db, id, user.id).await?;
    let songs = load_playlist_songs(&state.db, &playlist_row).await?;

    Ok(Json(PlaylistResponse {
        id: playlist_row.id,
        name: playlist_row.name,
        user_id: playlist_row.user_id,
        songs,
    }))
}

pub async fn update_playlist(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i32>,
    Json(payload): Json<UpdatePlaylistRequest>,
) -> Result<Json<PlaylistResponse>> {
    let existing = find_owned_playlist(&state.db, id, user.id).await?;
    let playlist_id = existing.id;

    // Name update and full song-set replacement commit as one unit.
    let txn = state.db.begin().await?;

    let mut active: playlist::ActiveModel = existing.into();
    active.name = Set(payload.name);
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&txn).await?;

    if !payload.song_ids.is_empty() {
        // Stricter than create: every referenced song must exist and belong
        // to the caller.
        let mut wanted = payload.song_ids.clone();
        wanted.sort_unstable();
        wanted.dedup();

        let owned = song::Entity::find_active()
            .filter(song::Column::Id.is_in(wanted.clone()))
            .filter(song::Column::UserId.eq(user.id))
            .all(&txn)
            .await?;

        if owned.len() != wanted.len() {
            return Err(AppError::Validation(
                "Invalid song ids provided".to_string(),
            ));
        }

        playlist_song::Entity::delete_many()
            .filter(playlist_song::Column::PlaylistId.eq(playlist_id))
            .exec(&txn)
            .await
            .map_err(|e| {
                tracing::error!("Failed to clear playlist songs: {}", e);
                AppError::Internal("Failed to clear playlist songs".to_string())
            })?;

        let rows: Vec<playlist_song::ActiveModel> = owned
            .iter()
            .map(|s| playlist_song::ActiveModel {
                playlist_id: Set(playlist_id),
                song_id: Set(s.id),
            })
            .collect();
        playlist_song::Entity::insert_many(rows)
            .exec(&txn)
            .await
            .map_err(|e| {
                tracing::error!("Failed to add songs to playlist: {}", e);
                AppError::Internal("Failed to add songs to playlist".to_string())
            })?;
    }

    txn.commit().await?;

    let songs = load_playlist_songs(&state.db, &updated).await?;
    Ok(Json(PlaylistResponse {
        id: updated.id,
        name: updated.name,
        user_id: updated.user_id,
        songs,
    }))
}

pub async fn delete_playlist(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i32>,
) -> Result<Json<serde_json::Value>> {
    let playlist_row = find_owned_playlist(&state.db, id, user.id).await?;

    // Association-only delete: join rows go, member songs are never touched.
    let txn = state.db.begin().await?;

    playlist_song::Entity::delete_many()
        .filter(playlist_song::Column::PlaylistId.eq(playlist_row.id))
        .exec(&txn)
        .await
        .map_err(|e| {
            tracing::error!("Failed to clear playlist songs: {}", e);
            AppError::Internal("Failed to clear playlist songs".to_string())
        })?;

    let now: chrono::DateTime<chrono::FixedOffset> = Utc::now().into();
    let mut active: playlist::ActiveModel = playlist_row.into();
    active.deleted_at = Set(Some(now));
    active.updated_at = Set(now);
    active.update(&txn).await.map_err(|e| {
        tracing::error!("Failed to delete playlist: {}", e);
        AppError::Internal("Failed to delete playlist".to_string())
    })?;

    txn.commit().await?;

    Ok(Json(serde_json::json!({
        "message": "Playlist deleted successfully (songs remain unaffected)"
    })))
}

pub async fn search_playlists(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<SearchPlaylistsQuery>,
) -> Result<Json<SearchPlaylistsResponse>> {
    let page = Page::from_params(query.limit.as_deref(), query.offset.as_deref());

    let mut select = playlist::Entity::find_active().filter(playlist::Column::UserId.eq(user.id));

    if let Some(q) = query.q.as_deref().filter(|s| !s.is_empty()) {
        select = select.filter(contains_ci(playlist::Column::Name, q));
    } else if let Some(name) = query.name.as_deref().filter(|s| !s.is_empty()) {
        select = select.filter(contains_ci(playlist::Column::Name, name));
    }

    let total = select.clone().count(&state.db).await?;

    let playlists = select
        .offset(page.offset)
        .limit(page.limit)
        .all(&state.db)
        .await?;

    Ok(Json(SearchPlaylistsResponse {
        playlists: with_songs(&state.db, playlists).await?,
        pagination: PaginationInfo::new(total, page),
    }))
}

async fn find_owned_playlist(
    db: &DatabaseConnection,
    id: i32,
    owner_id: i32,
) -> Result<playlist::Model> {
    playlist::Entity::find_active()
        .filter(playlist::Column::Id.eq(id))
        .filter(playlist::Column::UserId.eq(owner_id))
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Playlist not found".to_string()))
}
