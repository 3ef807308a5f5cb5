//! Playback engine adapter built on `rodio`.
//!
//! A dedicated audio thread owns the output stream and the single bound
//! sink. The rest of the program talks to it through [`AudioPlayer`], which
//! implements the [`PlaybackEngine`] transport trait.

mod player;
mod sink;
mod thread;
mod types;

pub use player::AudioPlayer;
pub use types::{EngineEvent, PlaybackEngine, PlaybackError, progress_percent};
