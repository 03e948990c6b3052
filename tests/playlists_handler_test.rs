//! Integration tests for playlist handler routes
//!
//! Covers the loose-at-create / strict-at-update song resolution rules,
//! full set replacement, and the association-only delete.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use pretty_assertions::assert_eq;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde_json::json;
use tower::util::ServiceExt;

use music_lib_api::db::{
    entities::{playlist, playlist_song},
    enums::Role,
};
use music_lib_api::handlers;
use music_lib_api::state::AppState;
use music_lib_api::test_utils::*;

fn create_test_router(state: &AppState) -> Router {
    Router::new()
        .nest("/api", handlers::api_routes(state.clone()))
        .with_state(state.clone())
}

async fn parse_json_response<T: serde::de::DeserializeOwned>(
    response: axum::response::Response,
) -> T {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn get(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

fn json_request(method: &str, uri: &str, token: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn delete(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

fn song_titles(playlist_json: &serde_json::Value) -> Vec<String> {
    let mut titles: Vec<String> = playlist_json["songs"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["title"].as_str().unwrap().to_string())
        .collect();
    titles.sort();
    titles
}

#[tokio::test]
async fn test_create_playlist_resolves_by_existence_only() {
    let state = setup_test_app_state().await;
    let owner = create_test_user(&state.db, "owner@example.com", Role::Listener).await;
    let other = create_test_user(&state.db, "other@example.com", Role::Listener).await;

    let own_song = create_test_song(&state.db, owner.id, "Mine", 180_000, None).await;
    // Creation is existence-only: other users' songs resolve too
    let foreign_song = create_test_song(&state.db, other.id, "Theirs", 200_000, None).await;

    let app = create_test_router(&state);
    let response = app
        .oneshot(json_request(
            "POST",
            "/api/playlists",
            &auth_token(&state, &owner),
            // 9999 does not exist and is silently dropped
            json!({ "name": "Mix", "song_ids": [own_song.id, foreign_song.id, 9999] }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body: serde_json::Value = parse_json_response(response).await;
    assert_eq!(body["name"], "Mix");
    assert_eq!(body["user_id"], owner.id);
    assert_eq!(song_titles(&body), vec!["Mine", "Theirs"]);
}

#[tokio::test]
async fn test_create_playlist_requires_name() {
    let state = setup_test_app_state().await;
    let owner = create_test_user(&state.db, "owner@example.com", Role::Listener).await;

    let app = create_test_router(&state);
    let response = app
        .oneshot(json_request(
            "POST",
            "/api/playlists",
            &auth_token(&state, &owner),
            json!({ "name": "   " }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_playlist_replaces_song_set() {
    let state = setup_test_app_state().await;
    let owner = create_test_user(&state.db, "owner@example.com", Role::Listener).await;

    let s1 = create_test_song(&state.db, owner.id, "One", 100_000, None).await;
    let s2 = create_test_song(&state.db, owner.id, "Two", 200_000, None).await;
    let s3 = create_test_song(&state.db, owner.id, "Three", 300_000, None).await;

    let existing = create_test_playlist(&state.db, owner.id, "Mix").await;
    add_song_to_playlist(&state.db, existing.id, s1.id).await;
    add_song_to_playlist(&state.db, existing.id, s2.id).await;

    let app = create_test_router(&state);
    let response = app
        .oneshot(json_request(
            "PUT",
            &format!("/api/playlists/{}", existing.id),
            &auth_token(&state, &owner),
            json!({ "name": "Mix v2", "song_ids": [s2.id, s3.id] }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = parse_json_response(response).await;
    assert_eq!(body["name"], "Mix v2");
    // The set is replaced wholesale, not merged
    assert_eq!(song_titles(&body), vec!["Three", "Two"]);
}

#[tokio::test]
async fn test_update_playlist_rejects_unowned_song_ids() {
    let state = setup_test_app_state().await;
    let owner = create_test_user(&state.db, "owner@example.com", Role::Listener).await;
    let other = create_test_user(&state.db, "other@example.com", Role::Listener).await;

    let own_song = create_test_song(&state.db, owner.id, "Mine", 180_000, None).await;
    let foreign_song = create_test_song(&state.db, other.id, "Theirs", 200_000, None).await;

    let existing = create_test_playlist(&state.db, owner.id, "Mix").await;
    add_song_to_playlist(&state.db, existing.id, own_song.id).await;

    let app = create_test_router(&state);
    let response = app
        .oneshot(json_request(
            "PUT",
            &format!("/api/playlists/{}", existing.id),
            &auth_token(&state, &owner),
            json!({ "name": "Renamed", "song_ids": [own_song.id, foreign_song.id] }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // The whole update rolled back, including the rename
    let row = playlist::Entity::find_by_id(existing.id)
        .one(&state.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.name, "Mix");

    let memberships = playlist_song::Entity::find()
        .filter(playlist_song::Column::PlaylistId.eq(existing.id))
        .all(&state.db)
        .await
        .unwrap();
    assert_eq!(memberships.len(), 1);
}

#[tokio::test]
async fn test_update_playlist_name_only_keeps_songs() {
    let state = setup_test_app_state().await;
    let owner = create_test_user(&state.db, "owner@example.com", Role::Listener).await;
    let member = create_test_song(&state.db, owner.id, "Keeper", 180_000, None).await;

    let existing = create_test_playlist(&state.db, owner.id, "Mix").await;
    add_song_to_playlist(&state.db, existing.id, member.id).await;

    let app = create_test_router(&state);
    let response = app
        .oneshot(json_request(
            "PUT",
            &format!("/api/playlists/{}", existing.id),
            &auth_token(&state, &owner),
            // Empty song_ids means "leave the membership alone"
            json!({ "name": "Renamed" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = parse_json_response(response).await;
    assert_eq!(body["name"], "Renamed");
    assert_eq!(song_titles(&body), vec!["Keeper"]);
}

#[tokio::test]
async fn test_delete_playlist_keeps_member_songs() {
    let state = setup_test_app_state().await;
    let owner = create_test_user(&state.db, "owner@example.com", Role::Listener).await;
    let member = create_test_song(&state.db, owner.id, "Keeper", 180_000, None).await;

    let doomed = create_test_playlist(&state.db, owner.id, "Mix").await;
    add_song_to_playlist(&state.db, doomed.id, member.id).await;
    let token = auth_token(&state, &owner);

    let app = create_test_router(&state);
    let response = app
        .clone()
        .oneshot(delete(&format!("/api/playlists/{}", doomed.id), &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Playlist is tombstoned and its join rows are gone
    let row = playlist::Entity::find_by_id(doomed.id)
        .one(&state.db)
        .await
        .unwrap()
        .unwrap();
    assert!(row.deleted_at.is_some());

    let memberships = playlist_song::Entity::find()
        .filter(playlist_song::Column::PlaylistId.eq(doomed.id))
        .all(&state.db)
        .await
        .unwrap();
    assert!(memberships.is_empty());

    // The song itself is still retrievable
    let response = app
        .oneshot(get(&format!("/api/songs/{}", member.id), &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_playlist_hides_songs_tombstoned_by_album_cascade() {
    let state = setup_test_app_state().await;
    let owner = create_test_user(&state.db, "owner@example.com", Role::Artist).await;

    let doomed_album = create_test_album(&state.db, owner.id, "Doomed", "Me", 2000).await;
    let album_song =
        create_test_song(&state.db, owner.id, "On Album", 180_000, Some(doomed_album.id)).await;
    let single = create_test_song(&state.db, owner.id, "Single", 160_000, None).await;

    let mix = create_test_playlist(&state.db, owner.id, "Mix").await;
    add_song_to_playlist(&state.db, mix.id, album_song.id).await;
    add_song_to_playlist(&state.db, mix.id, single.id).await;
    let token = auth_token(&state, &owner);

    let app = create_test_router(&state);
    let response = app
        .clone()
        .oneshot(delete(&format!("/api/albums/{}", doomed_album.id), &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // The cascade tombstoned the album song; the playlist must not show it
    let response = app
        .oneshot(get(&format!("/api/playlists/{}", mix.id), &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = parse_json_response(response).await;
    assert_eq!(song_titles(&body), vec!["Single"]);
}

#[tokio::test]
async fn test_get_playlist_of_other_user_is_not_found() {
    let state = setup_test_app_state().await;
    let owner = create_test_user(&state.db, "owner@example.com", Role::Listener).await;
    let snooper = create_test_user(&state.db, "snooper@example.com", Role::Listener).await;
    let theirs = create_test_playlist(&state.db, owner.id, "Private").await;

    let app = create_test_router(&state);
    let response = app
        .oneshot(get(
            &format!("/api/playlists/{}", theirs.id),
            &auth_token(&state, &snooper),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_search_playlists_by_name() {
    let state = setup_test_app_state().await;
    let owner = create_test_user(&state.db, "owner@example.com", Role::Listener).await;

    create_test_playlist(&state.db, owner.id, "Morning Run").await;
    create_test_playlist(&state.db, owner.id, "Evening Chill").await;

    let app = create_test_router(&state);
    let response = app
        .oneshot(get(
            "/api/playlists/search?name=RUN",
            &auth_token(&state, &owner),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = parse_json_response(response).await;
    let playlists = body["playlists"].as_array().unwrap();
    assert_eq!(playlists.len(), 1);
    assert_eq!(playlists[0]["name"], "Morning Run");
    assert_eq!(body["pagination"]["total"], 1);
}

#[tokio::test]
async fn test_list_playlists_owner_scoped_with_songs() {
    let state = setup_test_app_state().await;
    let owner = create_test_user(&state.db, "owner@example.com", Role::Listener).await;
    let other = create_test_user(&state.db, "other@example.com", Role::Listener).await;

    let member = create_test_song(&state.db, owner.id, "Member", 180_000, None).await;
    let mine = create_test_playlist(&state.db, owner.id, "Mine").await;
    add_song_to_playlist(&state.db, mine.id, member.id).await;
    create_test_playlist(&state.db, other.id, "Theirs").await;

    let app = create_test_router(&state);
    let response = app
        .oneshot(get("/api/playlists", &auth_token(&state, &owner)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = parse_json_response(response).await;
    let playlists = body.as_array().unwrap();
    assert_eq!(playlists.len(), 1);
    assert_eq!(playlists[0]["name"], "Mine");
    assert_eq!(song_titles(&playlists[0]), vec!["Member"]);
}
