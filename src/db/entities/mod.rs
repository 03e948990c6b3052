pub mod user;
pub mod album;
pub mod song;
pub mod playlist;
pub mod playlist_song;

pub use user::Entity as User;
pub use album::Entity as Album;
pub use song::Entity as Song;
pub use playlist::Entity as Playlist;
pub use playlist_song::Entity as PlaylistSong;
