use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use futures_util::{Sink, SinkExt, StreamExt};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, error, info, trace, warn};

use crate::config::RemoteSettings;
use crate::library::now_millis;

use super::lifecycle::{ConnectionState, Lifecycle};
use super::protocol::{ControlCmd, PingFrame, ProtocolError, decode_command};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// How long shutdown waits for the peer to take our close frame.
pub(super) const CLOSE_TIMEOUT: Duration = Duration::from_millis(500);

/// Why a session with the command source ended. Never leaves this module;
/// every variant is answered with a reconnect.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("closed by peer: {0}")]
    ClosedByPeer(String),
    #[error("stream ended")]
    StreamEnded,
}

enum SessionEnd {
    Shutdown,
    Closed(ConnectionError),
}

/// Endpoint and timer intervals for one channel instance.
#[derive(Clone, Debug)]
pub struct ChannelConfig {
    pub endpoint: String,
    pub ping_interval: Duration,
    pub reconnect_delay: Duration,
}

impl From<&RemoteSettings> for ChannelConfig {
    fn from(settings: &RemoteSettings) -> Self {
        Self {
            endpoint: settings.endpoint.clone(),
            ping_interval: Duration::from_secs(settings.ping_interval_secs.max(1)),
            reconnect_delay: Duration::from_secs(settings.reconnect_delay_secs.max(1)),
        }
    }
}

struct Worker {
    shutdown: watch::Sender<bool>,
    join: JoinHandle<()>,
}

/// Self-healing client connection to the gesture command source.
///
/// Commands are forwarded to `control_tx` in the order their frames arrive.
/// Connection problems are never reported to the caller; the channel just
/// keeps reconnecting after a fixed delay until [`RemoteChannel::stop`].
pub struct RemoteChannel {
    config: ChannelConfig,
    control_tx: Sender<ControlCmd>,
    lifecycle: Arc<Mutex<Lifecycle>>,
    worker: Option<Worker>,
}

fn lock(lifecycle: &Mutex<Lifecycle>) -> MutexGuard<'_, Lifecycle> {
    lifecycle.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl RemoteChannel {
    pub fn new(config: ChannelConfig, control_tx: Sender<ControlCmd>) -> Self {
        Self {
            config,
            control_tx,
            lifecycle: Arc::new(Mutex::new(Lifecycle::default())),
            worker: None,
        }
    }

    /// Start connecting in the background. Calling it again while running
    /// does nothing.
    pub fn start(&mut self) {
        if self.worker.is_some() {
            debug!("remote channel already running");
            return;
        }

        let lifecycle = Arc::new(Mutex::new(Lifecycle::default()));
        self.lifecycle = Arc::clone(&lifecycle);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let config = self.config.clone();
        let control_tx = self.control_tx.clone();

        let spawned = thread::Builder::new()
            .name("remote-channel".to_string())
            .spawn(move || {
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build();
                match runtime {
                    Ok(rt) => rt.block_on(run(config, control_tx, lifecycle, shutdown_rx)),
                    Err(e) => error!("failed to start remote channel runtime: {e}"),
                }
            });

        match spawned {
            Ok(join) => {
                self.worker = Some(Worker {
                    shutdown: shutdown_tx,
                    join,
                });
            }
            Err(e) => error!("failed to spawn remote channel thread: {e}"),
        }
    }

    /// Close the connection, cancel both timers and wait for the worker to
    /// exit. No ping or reconnect can fire once this returns.
    pub fn stop(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = worker.shutdown.send(true);
            if worker.join.join().is_err() {
                warn!("remote channel worker panicked");
            }
        }
        lock(&self.lifecycle).shutdown();
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    pub fn state(&self) -> ConnectionState {
        lock(&self.lifecycle).state()
    }

    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }
}

impl Drop for RemoteChannel {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn stopped(shutdown: &mut watch::Receiver<bool>) {
    // A dropped sender counts as a stop request too.
    let _ = shutdown.wait_for(|stop| *stop).await;
}

async fn run(
    config: ChannelConfig,
    control_tx: Sender<ControlCmd>,
    lifecycle: Arc<Mutex<Lifecycle>>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut connect = lock(&lifecycle).begin_connect();

    while connect {
        debug!(endpoint = %config.endpoint, "connecting to command source");
        let attempt = tokio::select! {
            _ = stopped(&mut shutdown) => break,
            result = connect_async(config.endpoint.as_str()) => result,
        };

        match attempt {
            Ok((ws, _)) => {
                lock(&lifecycle).opened();
                info!(endpoint = %config.endpoint, "connected to command source");
                match session(ws, &config, &control_tx, &lifecycle, &mut shutdown).await {
                    SessionEnd::Shutdown => break,
                    SessionEnd::Closed(reason) => info!("command source disconnected: {reason}"),
                }
            }
            Err(e) => debug!("connect to {} failed: {e}", config.endpoint),
        }

        let arm_timer = {
            let mut l = lock(&lifecycle);
            let arm = l.closed();
            trace!(
                reconnect_pending = l.reconnect_pending(),
                liveness = l.liveness_armed(),
                "connection down"
            );
            if l.is_stopped() {
                break;
            }
            arm
        };

        if arm_timer {
            trace!(delay = ?config.reconnect_delay, "reconnect scheduled");
            tokio::select! {
                _ = stopped(&mut shutdown) => break,
                _ = tokio::time::sleep(config.reconnect_delay) => {}
            }
        }
        connect = lock(&lifecycle).reconnect_due();
    }

    lock(&lifecycle).shutdown();
    debug!("remote channel stopped");
}

/// Send a close frame, giving up after `CLOSE_TIMEOUT` so a stalled peer
/// cannot hold up `stop()`.
pub(super) async fn send_close<S>(sink: &mut S)
where
    S: Sink<Message> + Unpin,
{
    if tokio::time::timeout(CLOSE_TIMEOUT, sink.send(Message::Close(None)))
        .await
        .is_err()
    {
        debug!("peer did not take the close frame in time");
    }
}

async fn session(
    ws: WsStream,
    config: &ChannelConfig,
    control_tx: &Sender<ControlCmd>,
    lifecycle: &Mutex<Lifecycle>,
    shutdown: &mut watch::Receiver<bool>,
) -> SessionEnd {
    let (mut sink, mut stream) = ws.split();

    let mut liveness = tokio::time::interval_at(
        Instant::now() + config.ping_interval,
        config.ping_interval,
    );
    liveness.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = stopped(shutdown) => {
                send_close(&mut sink).await;
                return SessionEnd::Shutdown;
            }
            _ = liveness.tick() => {
                if lock(lifecycle).should_ping() {
                    let frame = PingFrame::at(now_millis()).to_json();
                    trace!("sending liveness ping");
                    if let Err(e) = sink.send(Message::Text(frame)).await {
                        return SessionEnd::Closed(e.into());
                    }
                }
            }
            message = stream.next() => match message {
                Some(Ok(Message::Text(text))) => dispatch(&text, control_tx),
                Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes) {
                    Ok(text) => dispatch(&text, control_tx),
                    Err(_) => warn!("discarding frame: {}", ProtocolError::NotText),
                },
                Some(Ok(Message::Close(frame))) => {
                    let reason = frame.map(|f| f.reason.to_string()).unwrap_or_default();
                    return SessionEnd::Closed(ConnectionError::ClosedByPeer(reason));
                }
                // Pings are answered by tungstenite itself.
                Some(Ok(_)) => {}
                Some(Err(e)) => return SessionEnd::Closed(e.into()),
                None => return SessionEnd::Closed(ConnectionError::StreamEnded),
            },
        }
    }
}

fn dispatch(text: &str, control_tx: &Sender<ControlCmd>) {
    match decode_command(text) {
        Ok(cmd) => {
            debug!(?cmd, "remote command");
            if control_tx.send(cmd).is_err() {
                debug!("player is gone, dropping remote command");
            }
        }
        Err(ProtocolError::UnknownAction(action)) => {
            warn!(%action, "ignoring unknown remote action");
        }
        Err(e) => warn!("discarding frame: {e}"),
    }
}
