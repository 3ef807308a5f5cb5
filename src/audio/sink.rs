//! Utilities for creating `rodio` sinks from in-memory audio.
//!
//! The helper here decodes a shared payload and prepares a paused `Sink`
//! at the requested start position.

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use rodio::{Decoder, OutputStream, Sink, Source};

use super::types::PlaybackError;

/// A paused sink plus the total length the decoder reported, if any.
pub(super) struct PreparedSink {
    pub sink: Sink,
    pub total: Option<Duration>,
}

/// Create a paused `Sink` for `audio` that starts playback at `start_at`.
pub(super) fn create_sink_at(
    stream: &OutputStream,
    audio: &Arc<[u8]>,
    start_at: Duration,
) -> Result<PreparedSink, PlaybackError> {
    let decoder = Decoder::new(Cursor::new(Arc::clone(audio)))
        .map_err(|e| PlaybackError::Decode(e.to_string()))?;
    let total = decoder.total_duration();

    // `skip_duration` is our seeking primitive; even Duration::ZERO is fine.
    let source = decoder.skip_duration(start_at);

    let sink = Sink::connect_new(stream.mixer());
    sink.append(source);
    sink.pause();
    Ok(PreparedSink { sink, total })
}
