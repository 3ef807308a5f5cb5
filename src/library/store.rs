//! SQLite-backed song storage.
//!
//! One table keyed by an auto-incrementing id, with a secondary index on the
//! insertion timestamp used for ordered retrieval.

use std::path::Path;
use std::sync::Arc;

use rusqlite::{Connection, OptionalExtension, Row, params};
use thiserror::Error;
use tracing::debug;

use super::model::{NewSong, Song, SongId};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage medium unavailable: {0}")]
    Unavailable(#[from] std::io::Error),
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

pub struct LibraryStore {
    conn: Connection,
}

impl LibraryStore {
    /// Open (or create) the store at `path`, creating parent directories.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        debug!(path = %path.display(), "opened library store");
        Self::with_connection(conn)
    }

    /// A throwaway store that lives only as long as the value.
    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StorageError> {
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    fn initialize_schema(&self) -> Result<(), StorageError> {
        // AUTOINCREMENT keeps ids monotonic even after the newest row is deleted.
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS songs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                artist TEXT NOT NULL,
                audio BLOB NOT NULL,
                duration REAL NOT NULL,
                added_at INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_songs_added_at ON songs(added_at);",
        )?;
        Ok(())
    }

    /// Persist `song` and return its newly assigned id.
    pub fn add(&self, song: &NewSong) -> Result<SongId, StorageError> {
        self.conn.execute(
            "INSERT INTO songs (name, artist, audio, duration, added_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                song.name,
                song.artist,
                &song.audio[..],
                song.duration.max(0.0),
                song.added_at
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// All songs, oldest first. Equal timestamps keep insertion order.
    pub fn list(&self) -> Result<Vec<Song>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, artist, audio, duration, added_at
             FROM songs ORDER BY added_at ASC, id ASC",
        )?;
        let songs = stmt
            .query_map([], song_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(songs)
    }

    pub fn get_by_id(&self, id: SongId) -> Result<Option<Song>, StorageError> {
        let song = self
            .conn
            .query_row(
                "SELECT id, name, artist, audio, duration, added_at
                 FROM songs WHERE id = ?1",
                params![id],
                song_from_row,
            )
            .optional()?;
        Ok(song)
    }

    /// Remove the song with `id`. Deleting a missing id is not an error.
    pub fn delete_by_id(&self, id: SongId) -> Result<(), StorageError> {
        let removed = self
            .conn
            .execute("DELETE FROM songs WHERE id = ?1", params![id])?;
        debug!(id, removed, "delete song");
        Ok(())
    }

    pub fn count(&self) -> Result<usize, StorageError> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM songs", [], |row| row.get(0))?;
        Ok(n as usize)
    }

    #[cfg(test)]
    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }
}

fn song_from_row(row: &Row<'_>) -> rusqlite::Result<Song> {
    let audio: Vec<u8> = row.get(3)?;
    Ok(Song {
        id: row.get(0)?,
        name: row.get(1)?,
        artist: row.get(2)?,
        audio: Arc::from(audio),
        duration: row.get(4)?,
        added_at: row.get(5)?,
    })
}
