use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Store-assigned song identifier.
pub type SongId = i64;

/// A song that has not been persisted yet.
#[derive(Clone, Debug, PartialEq)]
pub struct NewSong {
    pub name: String,
    pub artist: String,
    /// Encoded audio bytes exactly as imported (mp3, flac, ...).
    pub audio: Arc<[u8]>,
    /// Duration in seconds, measured at import time.
    pub duration: f64,
    /// Creation timestamp in epoch milliseconds; the playlist sort key.
    pub added_at: i64,
}

/// A persisted song.
#[derive(Clone, Debug, PartialEq)]
pub struct Song {
    pub id: SongId,
    pub name: String,
    pub artist: String,
    pub audio: Arc<[u8]>,
    pub duration: f64,
    pub added_at: i64,
}

impl Song {
    /// Attach the identifier the store assigned to `song`.
    pub fn with_id(id: SongId, song: NewSong) -> Self {
        Self {
            id,
            name: song.name,
            artist: song.artist,
            audio: song.audio,
            duration: song.duration,
            added_at: song.added_at,
        }
    }

    /// "Artist - Name", or just the name when the artist is blank.
    pub fn display(&self) -> String {
        match self.artist.trim() {
            "" => self.name.clone(),
            artist => format!("{} - {}", artist, self.name),
        }
    }
}

/// Current wall clock in epoch milliseconds.
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
