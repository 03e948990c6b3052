pub mod health;
pub mod auth;
pub mod albums;
pub mod songs;
pub mod playlists;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub fn api_routes(state: AppState) -> Router<AppState> {
    // Everything except registration/login sits behind the auth guard.
    let protected = Router::new()
        // Album endpoints
        .route("/albums", get(albums::list_albums).post(albums::create_album))
        .route("/albums/search", get(albums::search_albums))
        .route(
            "/albums/:id",
            get(albums::get_album)
                .put(albums::update_album)
                .delete(albums::delete_album),
        )
        // Song endpoints
        .route("/songs", get(songs::list_songs).post(songs::add_song))
        .route("/songs/search", get(songs::search_songs))
        .route(
            "/songs/:id",
            get(songs::get_song)
                .put(songs::update_song)
                .delete(songs::delete_song),
        )
        // Playlist endpoints
        .route(
            "/playlists",
            get(playlists::list_playlists).post(playlists::add_playlist),
        )
        .route("/playlists/search", get(playlists::search_playlists))
        .route(
            "/playlists/:id",
            get(playlists::get_playlist)
                .put(playlists::update_playlist)
                .delete(playlists::delete_playlist),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            state,
            crate::middleware::auth::require_auth,
        ));

    Router::new()
        .route("/ping", get(health::ping))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .merge(protected)
}
