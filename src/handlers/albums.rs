use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};

use crate::{
    db::entities::{album, song},
    error::{AppError, Result},
    middleware::auth::CurrentUser,
    services::{contains_as_text, contains_ci, Page, PaginationInfo},
    state::AppState,
};

#[derive(Deserialize)]
pub struct CreateAlbumRequest {
    pub title: String,
    pub artist: String,
    pub year: i32,
}

#[derive(Deserialize)]
pub struct UpdateAlbumRequest {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub year: Option<i32>,
}

#[derive(Deserialize)]
pub struct SearchAlbumsQuery {
    pub q: Option<String>,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub year: Option<i32>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

#[derive(Serialize)]
pub struct AlbumResponse {
    pub id: i32,
    pub title: String,
    pub artist: String,
    pub year: i32,
    pub user_id: i32,
    pub songs: Vec<AlbumSongResponse>,
}

#[derive(Serialize)]
pub struct AlbumSongResponse {
    pub id: i32,
    pub title: String,
    pub duration: i64,
    pub album_id: Option<i32>,
}

#[derive(Serialize)]
pub struct SearchAlbumsResponse {
    pub albums: Vec<AlbumResponse>,
    pub pagination: PaginationInfo,
}

/// Attach each album's songs, cross-filtered by owner again so another
/// user's songs never ride along even if their album reference matches.
async fn with_songs(
    db: &DatabaseConnection,
    owner_id: i32,
    albums: Vec<album::Model>,
) -> Result<Vec<AlbumResponse>> {
    let album_ids: Vec<i32> = albums.iter().map(|a| a.id).collect();

    let mut songs_by_album: HashMap<i32, Vec<AlbumSongResponse>> = HashMap::new();
    if !album_ids.is_empty() {
        let songs = song::Entity::find_active()
            .filter(song::Column::AlbumId.is_in(album_ids))
            .filter(song::Column::UserId.eq(owner_id))
            .all(db)
            .await?;

        for s in songs {
            if let Some(album_id) = s.album_id {
                songs_by_album.entry(album_id).or_default().push(AlbumSongResponse {
                    id: s.id,
                    title: s.title,
                    duration: s.duration,
                    album_id: s.album_id,
                });
            }
        }
    }

    Ok(albums
        .into_iter()
        .map(|a| AlbumResponse {
            songs: songs_by_album.remove(&a.id).unwrap_or_default(),
            id: a.id,
            title: a.title,
            artist: a.artist,
            year: a.year,
            user_id: a.user_id,
        })
        .collect())
}

/// Album titles are unique across the whole system, not per owner. The check
/// includes tombstoned rows because the storage constraint does too.
async fn ensure_title_available(
    db: &DatabaseConnection,
    title: &str,
    exclude_id: Option<i32>,
) -> Result<()> {
    let mut select = album::Entity::find().filter(album::Column::Title.eq(title));
    if let Some(id) = exclude_id {
        select = select.filter(album::Column::Id.ne(id));
    }

    if select.one(db).await?.is_some() {
        return Err(AppError::Validation(
            "An album with this title already exists".to_string(),
        ));
    }
    Ok(())
}

pub async fn create_album(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<CreateAlbumRequest>,
) -> Result<(StatusCode, Json<AlbumResponse>)> {
    user.ensure_album_manager()?;

    if payload.title.trim().is_empty() {
        return Err(AppError::Validation("title is required".to_string()));
    }

    // The unique constraint on albums.title backs this up under concurrent
    // creation.
    ensure_title_available(&state.db, &payload.title, None).await?;

    let now = Utc::now().into();
    let new_album = album::ActiveModel {
        title: Set(payload.title),
        artist: Set(payload.artist),
        year: Set(payload.year),
        user_id: Set(user.id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    let created = new_album.insert(&state.db).await?;

    Ok((
        StatusCode::CREATED,
        Json(AlbumResponse {
            id: created.id,
            title: created.title,
            artist: created.artist,
            year: created.year,
            user_id: created.user_id,
            songs: Vec::new(),
        }),
    ))
}

pub async fn list_albums(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<AlbumResponse>>> {
    let albums = album::Entity::find_active()
        .filter(album::Column::UserId.eq(user.id))
        .order_by_desc(album::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(Json(with_songs(&state.db, user.id, albums).await?))
}

pub async fn get_album(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i32>,
) -> Result<Json<AlbumResponse>> {
    let album_row = find_owned_album(&state.db, id, user.id).await?;

    let mut albums = with_songs(&state.db, user.id, vec![album_row]).await?;
    Ok(Json(albums.remove(0)))
}

pub async fn update_album(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateAlbumRequest>,
) -> Result<Json<AlbumResponse>> {
    user.ensure_album_manager()?;

    let existing = find_owned_album(&state.db, id, user.id).await?;

    if let Some(title) = &payload.title {
        if *title != existing.title {
            ensure_title_available(&state.db, title, Some(existing.id)).await?;
        }
    }

    let mut active: album::ActiveModel = existing.into();
    if let Some(title) = payload.title {
        active.title = Set(title);
    }
    if let Some(artist) = payload.artist {
        active.artist = Set(artist);
    }
    if let Some(year) = payload.year {
        active.year = Set(year);
    }
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&state.db).await?;

    let mut albums = with_songs(&state.db, user.id, vec![updated]).await?;
    Ok(Json(albums.remove(0)))
}

pub async fn delete_album(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i32>,
) -> Result<Json<serde_json::Value>> {
    user.ensure_album_manager()?;

    let album_row = find_owned_album(&state.db, id, user.id).await?;

    // Cascade and album tombstone commit together or not at all; the
    // transaction rolls back on drop if either step errors out.
    let txn = state.db.begin().await?;
    let now: chrono::DateTime<chrono::FixedOffset> = Utc::now().into();

    song::Entity::update_many()
        .col_expr(song::Column::DeletedAt, Expr::value(now))
        .col_expr(song::Column::UpdatedAt, Expr::value(now))
        .filter(song::Column::AlbumId.eq(album_row.id))
        .filter(song::Column::UserId.eq(user.id))
        .filter(song::Column::DeletedAt.is_null())
        .exec(&txn)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete album songs: {}", e);
            AppError::Internal("Failed to delete album songs".to_string())
        })?;

    let mut active: album::ActiveModel = album_row.into();
    active.deleted_at = Set(Some(now));
    active.updated_at = Set(now);
    active.update(&txn).await.map_err(|e| {
        tracing::error!("Failed to delete album: {}", e);
        AppError::Internal("Failed to delete album".to_string())
    })?;

    txn.commit().await?;

    Ok(Json(serde_json::json!({
        "message": "Album and all its songs deleted successfully"
    })))
}

pub async fn search_albums(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<SearchAlbumsQuery>,
) -> Result<Json<SearchAlbumsResponse>> {
    let page = Page::from_params(query.limit.as_deref(), query.offset.as_deref());

    let mut select = album::Entity::find_active().filter(album::Column::UserId.eq(user.id));

    if let Some(q) = query.q.as_deref().filter(|s| !s.is_empty()) {
        // General query mode: field filters are ignored entirely.
        select = select.filter(
            Condition::any()
                .add(contains_ci(album::Column::Title, q))
                .add(contains_ci(album::Column::Artist, q))
                .add(contains_as_text(album::Column::Year, q)),
        );
    } else {
        if let Some(title) = query.title.as_deref().filter(|s| !s.is_empty()) {
            select = select.filter(contains_ci(album::Column::Title, title));
        }
        if let Some(artist) = query.artist.as_deref().filter(|s| !s.is_empty()) {
            select = select.filter(contains_ci(album::Column::Artist, artist));
        }
        if let Some(year) = query.year {
            select = select.filter(album::Column::Year.eq(year));
        }
    }

    let total = select.clone().count(&state.db).await?;

    let albums = select
        .offset(page.offset)
        .limit(page.limit)
        .all(&state.db)
        .await?;

    Ok(Json(SearchAlbumsResponse {
        albums: with_songs(&state.db, user.id, albums).await?,
        pagination: PaginationInfo::new(total, page),
    }))
}

/// Owner-scoped lookup. A miss is always NotFound, whether the album belongs
/// to someone else or does not exist at all.
async fn find_owned_album(
    db: &DatabaseConnection,
    id: i32,
    owner_id: i32,
) -> Result<album::Model> {
    album::Entity::find_active()
        .filter(album::Column::Id.eq(id))
        .filter(album::Column::UserId.eq(owner_id))
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Album not found".to_string()))
}
