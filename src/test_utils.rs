//! Test utilities for the Music Lib API
//!
//! Provides helpers for creating isolated test environments with:
//! - In-memory SQLite databases (one per test)
//! - AppState factories
//! - Test data generators

use chrono::Utc;
use migration::MigratorTrait;
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};

use crate::{
    config::Config,
    db::{
        entities::{album, playlist, playlist_song, song, user},
        enums::Role,
    },
    state::AppState,
};

/// Setup an in-memory SQLite database with all migrations applied
///
/// Each call creates a fresh, isolated database perfect for parallel testing
pub async fn setup_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");

    // Run all migrations
    migration::Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    db
}

/// Create a test configuration with sensible defaults
pub fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        server_host: "127.0.0.1".to_string(),
        server_port: 8082,
        jwt_secret: "test-jwt-secret".to_string(),
    }
}

/// Create a complete test AppState with an isolated database
pub async fn setup_test_app_state() -> AppState {
    let db = setup_test_db().await;
    AppState::new(db, test_config())
}

// ============================================================================
// Test Data Factories
// ============================================================================

/// Create a test user in the database
///
/// Uses a low bcrypt cost so test suites stay fast; the password is always
/// "password123".
pub async fn create_test_user(db: &DatabaseConnection, email: &str, role: Role) -> user::Model {
    let hashed = bcrypt::hash("password123", 4).expect("Failed to hash test password");

    let now = Utc::now().into();
    let test_user = user::ActiveModel {
        name: Set(email.split('@').next().unwrap_or("user").to_string()),
        email: Set(email.to_string()),
        password: Set(hashed),
        role: Set(role.as_str().to_string()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    test_user.insert(db).await.expect("Failed to insert test user")
}

/// Issue a bearer token for a test user
pub fn auth_token(state: &AppState, test_user: &user::Model) -> String {
    state
        .auth
        .issue_token(test_user.id, Role::from_str(&test_user.role))
        .expect("Failed to issue test token")
}

/// Create a test album in the database
pub async fn create_test_album(
    db: &DatabaseConnection,
    user_id: i32,
    title: &str,
    artist: &str,
    year: i32,
) -> album::Model {
    let now = Utc::now().into();
    let test_album = album::ActiveModel {
        title: Set(title.to_string()),
        artist: Set(artist.to_string()),
        year: Set(year),
        user_id: Set(user_id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    test_album.insert(db).await.expect("Failed to insert test album")
}

/// Create a test song in the database
pub async fn create_test_song(
    db: &DatabaseConnection,
    user_id: i32,
    title: &str,
    duration: i64,
    album_id: Option<i32>,
) -> song::Model {
    let now = Utc::now().into();
    let test_song = song::ActiveModel {
        title: Set(title.to_string()),
        duration: Set(duration),
        album_id: Set(album_id),
        user_id: Set(user_id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    test_song.insert(db).await.expect("Failed to insert test song")
}

/// Create a test playlist in the database
pub async fn create_test_playlist(
    db: &DatabaseConnection,
    user_id: i32,
    name: &str,
) -> playlist::Model {
    let now = Utc::now().into();
    let test_playlist = playlist::ActiveModel {
        name: Set(name.to_string()),
        user_id: Set(user_id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    test_playlist
        .insert(db)
        .await
        .expect("Failed to insert test playlist")
}

/// Add a song to a playlist directly through the join table
pub async fn add_song_to_playlist(db: &DatabaseConnection, playlist_id: i32, song_id: i32) {
    let row = playlist_song::ActiveModel {
        playlist_id: Set(playlist_id),
        song_id: Set(song_id),
    };
    row.insert(db)
        .await
        .expect("Failed to insert playlist song row");
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::EntityTrait;

    #[tokio::test]
    async fn test_setup_test_db() {
        let db = setup_test_db().await;
        // Verify we can query the database (it has tables from migrations)
        let users = user::Entity::find().all(&db).await.unwrap();
        assert_eq!(users.len(), 0);
    }

    #[tokio::test]
    async fn test_create_test_user() {
        let db = setup_test_db().await;
        let created = create_test_user(&db, "artist@example.com", Role::Artist).await;

        assert_eq!(created.email, "artist@example.com");
        assert_eq!(created.role, "artist");
        assert!(bcrypt::verify("password123", &created.password).unwrap());
    }

    #[tokio::test]
    async fn test_create_test_album_and_song() {
        let db = setup_test_db().await;
        let owner = create_test_user(&db, "artist@example.com", Role::Artist).await;
        let test_album = create_test_album(&db, owner.id, "Test Album", "Test Artist", 1999).await;
        let test_song =
            create_test_song(&db, owner.id, "Test Song", 180_000, Some(test_album.id)).await;

        assert_eq!(test_album.user_id, owner.id);
        assert_eq!(test_song.album_id, Some(test_album.id));
    }

    #[tokio::test]
    async fn test_parallel_databases() {
        // Run two database setups in parallel - they should not interfere
        let (db1, db2) = tokio::join!(setup_test_db(), setup_test_db());

        let user1 = create_test_user(&db1, "one@example.com", Role::Listener).await;
        let user2 = create_test_user(&db2, "two@example.com", Role::Listener).await;

        // Both should be ID 1 (separate databases)
        assert_eq!(user1.id, 1);
        assert_eq!(user2.id, 1);
    }
}
