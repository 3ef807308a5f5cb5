//! Persistent song library: the SQLite store and file import helpers.

mod import;
mod model;
mod store;

pub use import::{ImportError, collect_audio_files, read_song};
pub use model::{NewSong, Song, SongId, now_millis};
pub use store::{LibraryStore, StorageError};
