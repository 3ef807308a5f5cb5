//! Transitions of the playback state machine.
//!
//! Each action updates the session fields first and then tells the engine
//! what to do, so the UI never shows a state the engine was not asked for.
//! With an empty playlist everything except `load_playlist` and `add_song`
//! is a no-op.

use tracing::{debug, error, info, warn};

use crate::audio::{EngineEvent, PlaybackEngine};
use crate::library::{LibraryStore, NewSong, Song, SongId, StorageError};

use super::model::App;

impl App {
    /// Replace the playlist with the store's contents.
    ///
    /// An index that fell off the end is reset and playback stops. An index
    /// that still fits but now names a different song loads that song. On a
    /// storage error the playlist is left as it was. Either way a pending
    /// reload request is cleared.
    pub fn load_playlist(
        &mut self,
        store: &LibraryStore,
        engine: &mut impl PlaybackEngine,
    ) -> Result<(), StorageError> {
        let listed = store.list();
        self.loading = false;

        let songs = match listed {
            Ok(songs) => songs,
            Err(e) => {
                error!("failed to load playlist: {e}");
                self.set_notice(format!("Could not load the library: {e}"));
                return Err(e);
            }
        };

        let previous = self.current_song().map(|s| s.id);
        self.playlist = songs;
        debug!(songs = self.playlist.len(), "playlist loaded");

        match self.current {
            Some(i) if i >= self.playlist.len() => {
                self.current = None;
                self.playing = false;
                self.reset_position();
                engine.stop();
            }
            Some(i) if previous != Some(self.playlist[i].id) => {
                let song = &self.playlist[i];
                self.elapsed = 0.0;
                self.total = song.duration;
                engine.load(song.audio.clone());
                if self.playing {
                    engine.play();
                }
            }
            _ => {}
        }

        self.clamp_selection();
        Ok(())
    }

    /// Select song `index` and start it from the beginning.
    pub fn play_song(&mut self, index: usize, engine: &mut impl PlaybackEngine) {
        let Some(song) = self.playlist.get(index) else {
            debug!(index, "play_song: index out of range");
            return;
        };

        info!(id = song.id, "playing {}", song.display());
        self.elapsed = 0.0;
        self.total = song.duration;
        engine.load(song.audio.clone());
        engine.play();

        self.current = Some(index);
        self.playing = true;
        self.selected = index;
    }

    pub fn toggle_play_pause(&mut self, engine: &mut impl PlaybackEngine) {
        match self.current {
            None => {
                if self.has_songs() {
                    self.play_song(0, engine);
                }
            }
            Some(_) if self.playing => {
                self.playing = false;
                engine.pause();
            }
            Some(_) => {
                self.playing = true;
                engine.play();
            }
        }
    }

    /// Advance to the next song, wrapping to the first.
    pub fn play_next(&mut self, engine: &mut impl PlaybackEngine) {
        let len = self.playlist.len();
        if len == 0 {
            return;
        }
        let next = match self.current {
            Some(i) => (i + 1) % len,
            None => 0,
        };
        self.play_song(next, engine);
    }

    /// Step back to the previous song, wrapping to the last.
    ///
    /// With no selection the step starts from one before the first song, so
    /// it lands two from the end.
    pub fn play_previous(&mut self, engine: &mut impl PlaybackEngine) {
        let len = self.playlist.len();
        if len == 0 {
            return;
        }
        let prev = match self.current {
            Some(i) => (i + len - 1) % len,
            None => (len + len - 2) % len,
        };
        self.play_song(prev, engine);
    }

    /// Start the song under the cursor.
    pub fn play_selected(&mut self, engine: &mut impl PlaybackEngine) {
        self.play_song(self.selected, engine);
    }

    /// Append an already persisted song. Selection and transport are untouched.
    pub fn add_song(&mut self, song: Song) {
        self.playlist.push(song);
    }

    /// Persist `song` and append it with the id the store assigned.
    pub fn import_song(
        &mut self,
        song: NewSong,
        store: &LibraryStore,
    ) -> Result<SongId, StorageError> {
        match store.add(&song) {
            Ok(id) => {
                info!(id, "imported {}", song.name);
                self.add_song(Song::with_id(id, song));
                Ok(id)
            }
            Err(e) => {
                warn!("failed to store {}: {e}", song.name);
                self.set_notice(format!("Could not save {}: {e}", song.name));
                Err(e)
            }
        }
    }

    /// Delete a song from the store, then reload so the index stays valid.
    pub fn remove_song(
        &mut self,
        id: SongId,
        store: &LibraryStore,
        engine: &mut impl PlaybackEngine,
    ) -> Result<(), StorageError> {
        if let Err(e) = store.delete_by_id(id) {
            warn!(id, "failed to delete song: {e}");
            self.set_notice(format!("Could not delete song: {e}"));
            return Err(e);
        }
        self.load_playlist(store, engine)
    }

    /// Scrub within the current song.
    pub fn seek_by(&mut self, seconds: i32, engine: &mut impl PlaybackEngine) {
        if self.current.is_some() {
            engine.seek_by(seconds);
        }
    }

    pub fn handle_engine_event(&mut self, event: EngineEvent, engine: &mut impl PlaybackEngine) {
        match event {
            EngineEvent::TimeUpdate { current, total } => {
                let Some(song) = self.current_song() else {
                    return;
                };
                // Some decoders cannot tell the length; use the imported one.
                let total = if total.is_finite() && total > 0.0 {
                    total
                } else {
                    song.duration
                };
                self.elapsed = current.max(0.0);
                self.total = total;
            }
            EngineEvent::Ended => {
                debug!("song ended");
                self.play_next(engine);
            }
            EngineEvent::Failed(e) => {
                warn!("playback failed: {e}");
                self.playing = false;
                self.set_notice(format!("Playback failed: {e}"));
            }
        }
    }
}
