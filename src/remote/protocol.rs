//! Wire format of the gesture command channel.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Frames larger than this are dropped unparsed.
pub const MAX_FRAME_BYTES: usize = 8192;

/// Player control requested by a remote source or a key binding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlCmd {
    Quit,
    PlayPause,
    Next,
    Prev,
    ToggleList,
}

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed command frame: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("unknown action {0:?}")]
    UnknownAction(String),
    #[error("binary frame is not UTF-8 text")]
    NotText,
    #[error("frame of {0} bytes exceeds the {MAX_FRAME_BYTES} byte limit")]
    Oversized(usize),
}

/// Inbound `{ "action": ..., "timestamp": ... }` envelope.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CommandFrame {
    pub action: String,
    /// Sender's clock in epoch milliseconds. Some sources leave it out.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

/// Outbound keep-alive, `{ "type": "ping", "timestamp": ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PingFrame {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub timestamp: i64,
}

impl PingFrame {
    pub fn at(timestamp: i64) -> Self {
        Self {
            kind: "ping",
            timestamp,
        }
    }

    pub fn to_json(&self) -> String {
        // A struct of a str and an integer always serializes.
        serde_json::to_string(self).unwrap_or_default()
    }
}

impl CommandFrame {
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        if text.len() > MAX_FRAME_BYTES {
            return Err(ProtocolError::Oversized(text.len()));
        }
        Ok(serde_json::from_str(text)?)
    }

    /// Map the action name onto a player control.
    pub fn command(&self) -> Result<ControlCmd, ProtocolError> {
        match self.action.as_str() {
            "play_pause" => Ok(ControlCmd::PlayPause),
            "previous" => Ok(ControlCmd::Prev),
            "next" => Ok(ControlCmd::Next),
            "toggle_list" => Ok(ControlCmd::ToggleList),
            other => Err(ProtocolError::UnknownAction(other.to_string())),
        }
    }
}

/// Parse a text frame all the way to the control it requests.
pub fn decode_command(text: &str) -> Result<ControlCmd, ProtocolError> {
    CommandFrame::parse(text)?.command()
}
