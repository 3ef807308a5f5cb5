use std::sync::Arc;
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::thread::JoinHandle;
use std::time::Duration;

use rodio::{OutputStream, OutputStreamBuilder, Sink};
use tracing::{debug, error, warn};

use crate::config::AudioSettings;

use super::sink::create_sink_at;
use super::types::{AudioCmd, EngineEvent, PlaybackError, Tagged, secs};

/// The single bound source. Dropping it stops the sink and releases the
/// payload clone it holds.
struct Loaded {
    serial: u64,
    audio: Arc<[u8]>,
    sink: Sink,
    /// Where the sink started inside the payload (non-zero after a seek).
    offset: Duration,
    total: Option<Duration>,
    ended_sent: bool,
}

impl Loaded {
    fn position(&self) -> Duration {
        self.offset + self.sink.get_pos()
    }

    fn total_secs(&self) -> f64 {
        self.total.map(secs).unwrap_or(0.0)
    }
}

struct Engine {
    stream: Result<OutputStream, PlaybackError>,
    current: Option<Loaded>,
    /// Serial of the last load, kept even when that load failed.
    serial: u64,
    paused: bool,
    /// A `Failed` has gone out for `serial`; each serial reports at most once.
    failure_reported: bool,
    events: Sender<Tagged>,
}

impl Engine {
    fn emit(&self, serial: u64, event: EngineEvent) {
        // The receiver only disappears during shutdown.
        let _ = self.events.send(Tagged { serial, event });
    }

    fn release(&mut self) {
        if let Some(old) = self.current.take() {
            old.sink.stop();
        }
    }

    fn load(&mut self, serial: u64, audio: Arc<[u8]>) {
        self.release();
        self.serial = serial;
        self.paused = true;
        self.failure_reported = false;

        let prepared = match &self.stream {
            Ok(stream) => create_sink_at(stream, &audio, Duration::ZERO),
            Err(e) => Err(e.clone()),
        };

        match prepared {
            Ok(prepared) => {
                let loaded = Loaded {
                    serial,
                    audio,
                    sink: prepared.sink,
                    offset: Duration::ZERO,
                    total: prepared.total,
                    ended_sent: false,
                };
                self.emit(
                    serial,
                    EngineEvent::TimeUpdate {
                        current: 0.0,
                        total: loaded.total_secs(),
                    },
                );
                debug!(serial, bytes = loaded.audio.len(), "source loaded");
                self.current = Some(loaded);
            }
            Err(e) => {
                warn!(serial, "failed to load source: {e}");
                self.failure_reported = true;
                self.emit(serial, EngineEvent::Failed(e));
            }
        }
    }

    fn play(&mut self) {
        match &self.current {
            Some(loaded) => {
                loaded.sink.play();
                self.paused = false;
            }
            None if self.failure_reported => {
                debug!(serial = self.serial, "play without a source, failure already reported");
            }
            None => {
                let err = match &self.stream {
                    Err(e) => e.clone(),
                    Ok(_) => PlaybackError::NoSource,
                };
                self.failure_reported = true;
                self.emit(self.serial, EngineEvent::Failed(err));
            }
        }
    }

    fn pause(&mut self) {
        if let Some(loaded) = &self.current {
            loaded.sink.pause();
        }
        self.paused = true;
    }

    fn seek_by(&mut self, delta: i32) {
        // Scrubbing: rebuild the current sink and skip into the payload.
        let Ok(stream) = &self.stream else {
            return;
        };
        let Some(loaded) = self.current.as_mut() else {
            return;
        };

        let cur = loaded.position().as_secs() as i64;
        let mut target = (cur + delta as i64).max(0) as u64;
        if let Some(total) = loaded.total {
            target = target.min(total.as_secs());
        }
        let target = Duration::from_secs(target);

        match create_sink_at(stream, &loaded.audio, target) {
            Ok(prepared) => {
                loaded.sink.stop();
                loaded.sink = prepared.sink;
                loaded.offset = target;
                if !self.paused {
                    loaded.sink.play();
                }
                let serial = loaded.serial;
                let event = EngineEvent::TimeUpdate {
                    current: secs(target),
                    total: loaded.total_secs(),
                };
                self.emit(serial, event);
            }
            Err(e) => warn!("seek failed: {e}"),
        }
    }

    fn tick(&mut self) {
        if self.paused {
            return;
        }
        let Some(loaded) = self.current.as_mut() else {
            return;
        };
        if loaded.ended_sent {
            return;
        }

        let serial = loaded.serial;
        if loaded.sink.empty() {
            loaded.ended_sent = true;
            let total = loaded.total_secs();
            self.emit(
                serial,
                EngineEvent::TimeUpdate {
                    current: total,
                    total,
                },
            );
            self.emit(serial, EngineEvent::Ended);
        } else {
            let event = EngineEvent::TimeUpdate {
                current: secs(loaded.position()),
                total: loaded.total_secs(),
            };
            self.emit(serial, event);
        }
    }
}

fn fade_out_sink(sink: &Sink, fade_out_ms: u64) {
    if fade_out_ms == 0 {
        sink.set_volume(0.0);
        return;
    }
    let steps: u64 = 20;
    let step_ms = (fade_out_ms / steps).max(1);
    let start = sink.volume();
    for step in 1..=steps {
        let t = step as f32 / steps as f32;
        sink.set_volume(start * (1.0 - t));
        thread::sleep(Duration::from_millis(step_ms));
    }
    sink.set_volume(0.0);
}

pub(super) fn spawn_audio_thread(
    rx: Receiver<AudioCmd>,
    events: Sender<Tagged>,
    audio_settings: AudioSettings,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let stream = match OutputStreamBuilder::open_default_stream() {
            Ok(mut stream) => {
                // rodio logs to stderr when OutputStream is dropped; that would
                // scribble over the TUI.
                stream.log_on_drop(false);
                Ok(stream)
            }
            Err(e) => {
                error!("no audio output device: {e}");
                Err(PlaybackError::NoOutputDevice(e.to_string()))
            }
        };

        let mut engine = Engine {
            stream,
            current: None,
            serial: 0,
            paused: true,
            failure_reported: false,
            events,
        };
        let tick = Duration::from_millis(audio_settings.tick_ms.max(10));

        loop {
            match rx.recv_timeout(tick) {
                Ok(cmd) => match cmd {
                    AudioCmd::Load { serial, audio } => engine.load(serial, audio),
                    AudioCmd::Play => engine.play(),
                    AudioCmd::Pause => engine.pause(),
                    AudioCmd::Stop => {
                        engine.release();
                        engine.paused = true;
                    }
                    AudioCmd::SeekBy(delta) => engine.seek_by(delta),
                    AudioCmd::Quit { fade_out_ms } => {
                        if let Some(loaded) = &engine.current {
                            if !engine.paused {
                                fade_out_sink(&loaded.sink, fade_out_ms);
                            }
                        }
                        engine.release();
                        break;
                    }
                },
                Err(RecvTimeoutError::Timeout) => engine.tick(),
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        debug!("audio thread exiting");
    })
}
