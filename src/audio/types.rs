//! Audio-related small types: commands, events and errors.
//!
//! The audio thread receives `AudioCmd` values and answers with `Tagged`
//! events; `AudioPlayer` filters those down to `EngineEvent`s for the
//! current source.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum PlaybackError {
    #[error("no audio output device: {0}")]
    NoOutputDevice(String),
    #[error("failed to decode audio: {0}")]
    Decode(String),
    #[error("nothing is loaded")]
    NoSource,
}

#[derive(Debug)]
pub enum AudioCmd {
    /// Replace the current source. Playback stays paused.
    Load { serial: u64, audio: Arc<[u8]> },
    /// Resume or start the current source.
    Play,
    /// Pause the current source.
    Pause,
    /// Drop the current source entirely.
    Stop,
    /// Seek by the specified number of seconds (positive or negative).
    SeekBy(i32),
    /// Quit the audio thread, optionally fading out over `fade_out_ms` milliseconds.
    Quit { fade_out_ms: u64 },
}

/// Notifications from the engine about the current source.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// Playback position advanced; both values are seconds.
    TimeUpdate { current: f64, total: f64 },
    /// The source played to its end.
    Ended,
    /// The source could not be decoded or played.
    Failed(PlaybackError),
}

/// An event together with the serial of the load that produced it.
#[derive(Debug)]
pub(super) struct Tagged {
    pub serial: u64,
    pub event: EngineEvent,
}

/// Transport contract the playback state machine drives.
pub trait PlaybackEngine {
    /// Bind `audio` as the current source, releasing the previous one.
    fn load(&mut self, audio: Arc<[u8]>);
    fn play(&mut self);
    fn pause(&mut self);
    fn seek_by(&mut self, seconds: i32);
    /// Release the current source without binding a new one.
    fn stop(&mut self);
}

/// Progress through the current source as a percentage.
///
/// Unknown totals (zero, negative, NaN or infinite) report 0.
pub fn progress_percent(current: f64, total: f64) -> f64 {
    if !total.is_finite() || total <= 0.0 || !current.is_finite() {
        return 0.0;
    }
    (current / total * 100.0).clamp(0.0, 100.0)
}

pub(super) fn secs(d: Duration) -> f64 {
    d.as_secs_f64()
}
