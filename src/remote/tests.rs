use super::client::{CLOSE_TIMEOUT, ChannelConfig, RemoteChannel, send_close};
use super::lifecycle::{ConnectionState, Lifecycle};
use super::protocol::*;

use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;

// ---- wire format ----

#[test]
fn decode_command_maps_every_action() {
    let cases = [
        (r#"{"action":"play_pause","timestamp":1}"#, ControlCmd::PlayPause),
        (r#"{"action":"previous","timestamp":2}"#, ControlCmd::Prev),
        (r#"{"action":"next","timestamp":3}"#, ControlCmd::Next),
        (r#"{"action":"toggle_list","timestamp":4}"#, ControlCmd::ToggleList),
    ];
    for (frame, expected) in cases {
        assert_eq!(decode_command(frame).unwrap(), expected, "frame {frame}");
    }
}

#[test]
fn timestamp_is_optional() {
    let frame = CommandFrame::parse(r#"{"action":"next"}"#).unwrap();
    assert_eq!(frame.timestamp, None);
    assert_eq!(frame.command().unwrap(), ControlCmd::Next);
}

#[test]
fn malformed_and_unknown_frames_are_protocol_errors() {
    assert!(matches!(
        decode_command("not json"),
        Err(ProtocolError::Malformed(_))
    ));
    assert!(matches!(
        decode_command(r#"{"timestamp":5}"#),
        Err(ProtocolError::Malformed(_))
    ));
    match decode_command(r#"{"action":"dance","timestamp":5}"#) {
        Err(ProtocolError::UnknownAction(a)) => assert_eq!(a, "dance"),
        other => panic!("expected unknown action, got {other:?}"),
    }
}

#[test]
fn oversized_frames_are_rejected_before_parsing() {
    let padding = "x".repeat(MAX_FRAME_BYTES);
    let frame = format!(r#"{{"action":"next","pad":"{padding}"}}"#);
    assert!(matches!(
        decode_command(&frame),
        Err(ProtocolError::Oversized(_))
    ));
}

#[test]
fn ping_frame_matches_wire_format() {
    assert_eq!(
        PingFrame::at(1_700_000_000_123).to_json(),
        r#"{"type":"ping","timestamp":1700000000123}"#
    );
}

// ---- lifecycle ----

#[test]
fn repeated_closes_leave_exactly_one_reconnect_pending() {
    let mut l = Lifecycle::default();
    assert!(l.begin_connect());

    assert!(l.closed(), "first close arms the reconnect timer");
    assert!(!l.closed(), "second close must not stack a timer");
    assert!(!l.closed(), "third close must not stack a timer");

    assert!(l.reconnect_pending());
    assert!(!l.liveness_armed());
    assert_eq!(l.state(), ConnectionState::Disconnected);
}

#[test]
fn opening_cancels_reconnect_and_arms_liveness() {
    let mut l = Lifecycle::default();
    assert!(l.begin_connect());
    assert!(l.closed());
    assert!(l.reconnect_due());
    assert_eq!(l.state(), ConnectionState::Connecting);

    l.opened();
    assert_eq!(l.state(), ConnectionState::Connected);
    assert!(l.liveness_armed());
    assert!(!l.reconnect_pending());
    assert!(l.should_ping());
}

#[test]
fn liveness_and_reconnect_timers_are_never_both_armed() {
    let mut l = Lifecycle::default();
    let check = |l: &Lifecycle| assert!(!(l.liveness_armed() && l.reconnect_pending()));

    l.begin_connect();
    check(&l);
    for _ in 0..3 {
        l.opened();
        check(&l);
        l.closed();
        check(&l);
        l.reconnect_due();
        check(&l);
    }
}

#[test]
fn begin_connect_is_idempotent() {
    let mut l = Lifecycle::default();
    assert!(l.begin_connect());
    assert!(!l.begin_connect());
    l.opened();
    assert!(!l.begin_connect());
}

#[test]
fn reconnect_due_without_pending_timer_does_nothing() {
    let mut l = Lifecycle::default();
    assert!(!l.reconnect_due());
    assert_eq!(l.state(), ConnectionState::Disconnected);
}

#[test]
fn shutdown_disarms_everything_and_refuses_new_connections() {
    let mut l = Lifecycle::default();
    l.begin_connect();
    l.opened();
    l.shutdown();

    assert!(l.is_stopped());
    assert!(!l.should_ping());
    assert!(!l.closed(), "no reconnect after shutdown");
    assert!(!l.reconnect_pending());
    assert!(!l.begin_connect());
}

// ---- end to end against a local server ----

#[derive(Clone)]
enum Step {
    Send(&'static str),
    /// Close the connection from the server side.
    Close,
    /// Keep reading frames until the client goes away.
    Hold,
}

#[derive(Debug)]
enum ServerEvent {
    Connected(usize),
    Received(usize, String),
    Disconnected(usize),
}

/// Start a WebSocket server that plays `scripts[n]` on its n-th connection
/// (connections past the end just hold). Returns its URL.
fn spawn_server(scripts: Vec<Vec<Step>>) -> (String, mpsc::Receiver<ServerEvent>) {
    let (url_tx, url_rx) = mpsc::channel();
    let (event_tx, event_rx) = mpsc::channel();

    thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async move {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            url_tx.send(format!("ws://{addr}")).unwrap();

            let mut n = 0;
            loop {
                let Ok((tcp, _)) = listener.accept().await else {
                    return;
                };
                let Ok(mut ws) = tokio_tungstenite::accept_async(tcp).await else {
                    continue;
                };
                let _ = event_tx.send(ServerEvent::Connected(n));

                let script = scripts.get(n).cloned().unwrap_or_else(|| vec![Step::Hold]);
                for step in script {
                    match step {
                        Step::Send(text) => {
                            let _ = ws.send(Message::Text(text.to_string())).await;
                        }
                        Step::Close => {
                            let _ = ws.close(None).await;
                            break;
                        }
                        Step::Hold => {
                            while let Some(Ok(msg)) = ws.next().await {
                                if let Message::Text(text) = msg {
                                    let _ = event_tx.send(ServerEvent::Received(n, text));
                                }
                            }
                            break;
                        }
                    }
                }
                let _ = event_tx.send(ServerEvent::Disconnected(n));
                n += 1;
            }
        });
    });

    let url = url_rx.recv_timeout(Duration::from_secs(5)).unwrap();
    (url, event_rx)
}

fn config(endpoint: &str, ping_ms: u64, reconnect_ms: u64) -> ChannelConfig {
    ChannelConfig {
        endpoint: endpoint.to_string(),
        ping_interval: Duration::from_millis(ping_ms),
        reconnect_delay: Duration::from_millis(reconnect_ms),
    }
}

/// Wait until `rx` yields an item matching `pred`, skipping others.
fn wait_for<T>(
    rx: &mpsc::Receiver<T>,
    timeout: Duration,
    mut pred: impl FnMut(&T) -> bool,
) -> Option<T> {
    let deadline = Instant::now() + timeout;
    loop {
        let left = deadline.checked_duration_since(Instant::now())?;
        match rx.recv_timeout(left) {
            Ok(item) if pred(&item) => return Some(item),
            Ok(_) => continue,
            Err(_) => return None,
        }
    }
}

#[test]
fn commands_arrive_in_wire_order_and_bad_frames_are_skipped() {
    let (url, server) = spawn_server(vec![vec![
        Step::Send(r#"{"action":"next","timestamp":1}"#),
        Step::Send("not json"),
        Step::Send(r#"{"action":"dance","timestamp":2}"#),
        Step::Send(r#"{"action":"play_pause","timestamp":3}"#),
        Step::Send(r#"{"action":"toggle_list"}"#),
        Step::Send(r#"{"action":"previous","timestamp":4}"#),
        Step::Hold,
    ]]);
    let (tx, rx) = mpsc::channel();
    let mut channel = RemoteChannel::new(config(&url, 10_000, 50), tx);
    channel.start();

    let got: Vec<ControlCmd> = (0..4)
        .map(|_| rx.recv_timeout(Duration::from_secs(5)).unwrap())
        .collect();
    assert_eq!(
        got,
        vec![
            ControlCmd::Next,
            ControlCmd::PlayPause,
            ControlCmd::ToggleList,
            ControlCmd::Prev
        ]
    );
    assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());

    // The bad frames did not cost us the connection.
    assert_eq!(channel.state(), ConnectionState::Connected);
    assert!(
        wait_for(&server, Duration::from_millis(200), |e| matches!(
            e,
            ServerEvent::Connected(1)
        ))
        .is_none()
    );

    channel.stop();
}

#[test]
fn sends_liveness_pings_while_connected() {
    let (url, server) = spawn_server(vec![vec![Step::Hold]]);
    let (tx, _rx) = mpsc::channel();
    let mut channel = RemoteChannel::new(config(&url, 50, 50), tx);
    channel.start();

    let Some(ServerEvent::Received(_, text)) = wait_for(&server, Duration::from_secs(5), |e| {
        matches!(e, ServerEvent::Received(..))
    }) else {
        panic!("no ping received");
    };
    let ping: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(ping["type"], "ping");
    assert!(ping["timestamp"].as_i64().unwrap() > 0);

    channel.stop();
}

#[test]
fn reconnects_after_the_server_closes() {
    let (url, server) = spawn_server(vec![vec![Step::Close], vec![Step::Close], vec![Step::Hold]]);
    let (tx, _rx) = mpsc::channel();
    let mut channel = RemoteChannel::new(config(&url, 10_000, 50), tx);
    channel.start();

    assert!(
        wait_for(&server, Duration::from_secs(5), |e| matches!(
            e,
            ServerEvent::Connected(2)
        ))
        .is_some(),
        "channel did not come back after two server-side closes"
    );

    let deadline = Instant::now() + Duration::from_secs(2);
    while channel.state() != ConnectionState::Connected && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(10));
    }
    assert_eq!(channel.state(), ConnectionState::Connected);

    channel.stop();
}

#[test]
fn start_twice_keeps_a_single_connection() {
    let (url, server) = spawn_server(vec![vec![Step::Hold], vec![Step::Hold]]);
    let (tx, _rx) = mpsc::channel();
    let mut channel = RemoteChannel::new(config(&url, 10_000, 50), tx);
    channel.start();
    channel.start();

    assert!(
        wait_for(&server, Duration::from_secs(5), |e| matches!(
            e,
            ServerEvent::Connected(0)
        ))
        .is_some()
    );
    assert!(
        wait_for(&server, Duration::from_millis(300), |e| matches!(
            e,
            ServerEvent::Connected(1)
        ))
        .is_none(),
        "second start opened another connection"
    );

    channel.stop();
}

#[test]
fn nothing_reconnects_after_stop() {
    let (url, server) = spawn_server(vec![vec![Step::Hold]]);
    let (tx, _rx) = mpsc::channel();
    let mut channel = RemoteChannel::new(config(&url, 20, 20), tx);
    channel.start();
    assert!(
        wait_for(&server, Duration::from_secs(5), |e| matches!(
            e,
            ServerEvent::Connected(0)
        ))
        .is_some()
    );

    channel.stop();
    assert!(!channel.is_running());
    assert_eq!(channel.state(), ConnectionState::Disconnected);

    assert!(
        wait_for(&server, Duration::from_secs(5), |e| matches!(
            e,
            ServerEvent::Disconnected(0)
        ))
        .is_some()
    );
    assert!(
        wait_for(&server, Duration::from_millis(200), |e| matches!(
            e,
            ServerEvent::Connected(_)
        ))
        .is_none(),
        "a reconnect fired after stop returned"
    );

    // Stopping again is harmless.
    channel.stop();
}

#[test]
fn unreachable_endpoint_keeps_retrying_quietly_and_stops_promptly() {
    // Grab a free port and release it so nothing is listening there.
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let (tx, rx) = mpsc::channel();
    let mut channel = RemoteChannel::new(config(&format!("ws://127.0.0.1:{port}"), 50, 20), tx);
    channel.start();

    thread::sleep(Duration::from_millis(200));
    assert!(channel.is_running());
    assert_ne!(channel.state(), ConnectionState::Connected);
    assert!(rx.try_recv().is_err());

    let started = Instant::now();
    channel.stop();
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[test]
fn close_gives_up_on_a_peer_that_never_takes_the_frame() {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    let mut stalled = futures_util::sink::unfold((), |_, _: Message| {
        futures_util::future::pending::<Result<(), std::io::Error>>()
    });

    let started = Instant::now();
    rt.block_on(send_close(&mut stalled));
    let waited = started.elapsed();
    assert!(waited >= CLOSE_TIMEOUT);
    assert!(waited < CLOSE_TIMEOUT + Duration::from_secs(1));
}
