use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Mutex;
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::debug;

use crate::config::AudioSettings;

use super::thread::spawn_audio_thread;
use super::types::{AudioCmd, EngineEvent, PlaybackEngine, Tagged};

/// Handle to the audio thread. Implements [`PlaybackEngine`].
pub struct AudioPlayer {
    tx: Sender<AudioCmd>,
    events: Receiver<Tagged>,
    serial: u64,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl AudioPlayer {
    pub fn new(audio_settings: AudioSettings) -> Self {
        let (tx, rx) = mpsc::channel::<AudioCmd>();
        let (event_tx, event_rx) = mpsc::channel::<Tagged>();

        let audio_handle = spawn_audio_thread(rx, event_tx, audio_settings);

        Self {
            tx,
            events: event_rx,
            serial: 0,
            join: Mutex::new(Some(audio_handle)),
        }
    }

    fn send(&self, cmd: AudioCmd) {
        if self.tx.send(cmd).is_err() {
            debug!("audio thread gone, dropping command");
        }
    }

    /// Drain pending events for the current source.
    ///
    /// Events still queued from a source that has since been replaced are
    /// discarded here, so an `Ended` is never reported for the wrong song.
    pub fn poll_events(&mut self) -> Vec<EngineEvent> {
        let current = self.serial;
        self.events
            .try_iter()
            .filter(|t| t.serial == current)
            .map(|t| t.event)
            .collect()
    }

    pub fn quit_softly(&self, fade_out: Duration) {
        self.send(AudioCmd::Quit {
            fade_out_ms: fade_out.as_millis() as u64,
        });

        if let Ok(mut j) = self.join.lock() {
            if let Some(h) = j.take() {
                let _ = h.join();
            }
        }
    }
}

impl PlaybackEngine for AudioPlayer {
    fn load(&mut self, audio: Arc<[u8]>) {
        self.serial += 1;
        self.send(AudioCmd::Load {
            serial: self.serial,
            audio,
        });
    }

    fn play(&mut self) {
        self.send(AudioCmd::Play);
    }

    fn pause(&mut self) {
        self.send(AudioCmd::Pause);
    }

    fn seek_by(&mut self, seconds: i32) {
        self.send(AudioCmd::SeekBy(seconds));
    }

    fn stop(&mut self) {
        // Bump the serial so late events from the released source are ignored.
        self.serial += 1;
        self.send(AudioCmd::Stop);
    }
}
