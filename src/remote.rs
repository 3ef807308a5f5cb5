//! Remote command channel: a WebSocket client that turns gesture commands
//! from a co-located recognizer into player controls.
//!
//! The socket, its liveness ticker and its reconnect delay all live on one
//! worker thread. Commands leave through a `std::sync::mpsc` queue that the
//! runtime event loop drains, so the channel never touches player state.

mod client;
mod lifecycle;
mod protocol;

pub use client::{ChannelConfig, RemoteChannel};
pub use lifecycle::ConnectionState;
pub use protocol::ControlCmd;

#[cfg(test)]
mod tests;
