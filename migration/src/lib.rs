pub use sea_orm_migration::prelude::*;

mod m20250801_000001_create_users_table;
mod m20250801_000002_create_albums_table;
mod m20250801_000003_create_songs_table;
mod m20250801_000004_create_playlists_table;
mod m20250801_000005_create_playlist_songs_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250801_000001_create_users_table::Migration),
            Box::new(m20250801_000002_create_albums_table::Migration),
            Box::new(m20250801_000003_create_songs_table::Migration),
            Box::new(m20250801_000004_create_playlists_table::Migration),
            Box::new(m20250801_000005_create_playlist_songs_table::Migration),
        ]
    }
}
