//! Application model types: `App` and `PlaybackStatus`.
//!
//! The `App` struct holds the playlist, the current song index, transport
//! flags and the few UI-facing fields the terminal front-end renders.

use crate::audio;
use crate::library::Song;

/// Coarse playback state derived from the session fields.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PlaybackStatus {
    /// No song selected.
    Empty,
    LoadedPaused,
    LoadedPlaying,
}

/// The main application model.
///
/// `current` is either `None` or a valid index into `playlist`; every
/// transition that shrinks the playlist restores that.
#[derive(Debug, Default)]
pub struct App {
    pub playlist: Vec<Song>,
    pub current: Option<usize>,
    pub playing: bool,
    /// Seconds into the current song.
    pub elapsed: f64,
    /// Length of the current song in seconds; 0 when unknown.
    pub total: f64,

    pub show_playlist: bool,
    /// Playlist cursor, independent of the playing song.
    pub selected: usize,
    /// Set while a reload is requested but not yet performed.
    pub loading: bool,
    /// Last user-facing message (import failures, playback errors).
    pub notice: Option<String>,
}

impl App {
    pub fn new(show_playlist: bool) -> Self {
        Self {
            show_playlist,
            ..Self::default()
        }
    }

    pub fn status(&self) -> PlaybackStatus {
        match (self.current, self.playing) {
            (None, _) => PlaybackStatus::Empty,
            (Some(_), false) => PlaybackStatus::LoadedPaused,
            (Some(_), true) => PlaybackStatus::LoadedPlaying,
        }
    }

    pub fn current_song(&self) -> Option<&Song> {
        self.current.and_then(|i| self.playlist.get(i))
    }

    pub fn has_songs(&self) -> bool {
        !self.playlist.is_empty()
    }

    pub fn progress_percent(&self) -> f64 {
        audio::progress_percent(self.elapsed, self.total)
    }

    pub fn toggle_playlist(&mut self) {
        self.show_playlist = !self.show_playlist;
    }

    /// Ask the event loop to reload the playlist after the next frame, so
    /// the UI can show that a load is in progress.
    pub fn request_reload(&mut self) {
        self.loading = true;
    }

    pub fn set_notice(&mut self, notice: impl Into<String>) {
        self.notice = Some(notice.into());
    }

    pub fn clear_notice(&mut self) {
        self.notice = None;
    }

    /// Move the cursor down, wrapping to the top.
    pub fn select_next(&mut self) {
        if self.playlist.is_empty() {
            return;
        }
        self.selected = (self.selected + 1) % self.playlist.len();
    }

    /// Move the cursor up, wrapping to the bottom.
    pub fn select_prev(&mut self) {
        if self.playlist.is_empty() {
            return;
        }
        let len = self.playlist.len();
        self.selected = (self.selected + len - 1) % len;
    }

    pub fn selected_song(&self) -> Option<&Song> {
        self.playlist.get(self.selected)
    }

    pub(super) fn clamp_selection(&mut self) {
        if self.selected >= self.playlist.len() {
            self.selected = self.playlist.len().saturating_sub(1);
        }
    }

    pub(super) fn reset_position(&mut self) {
        self.elapsed = 0.0;
        self.total = 0.0;
    }
}
