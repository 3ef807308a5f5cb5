use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level application settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/handwave/config.toml` or `~/.config/handwave/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `HANDWAVE__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub remote: RemoteSettings,
    pub library: LibrarySettings,
    pub audio: AudioSettings,
    pub ui: UiSettings,
    pub controls: ControlsSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RemoteSettings {
    /// Whether to connect to the gesture command source at all.
    pub enabled: bool,
    /// WebSocket URL of the command source.
    pub endpoint: String,
    /// Seconds between liveness pings while connected.
    pub ping_interval_secs: u64,
    /// Fixed delay before reconnecting after the connection drops.
    pub reconnect_delay_secs: u64,
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "ws://127.0.0.1:8080".to_string(),
            ping_interval_secs: 30,
            reconnect_delay_secs: 3,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LibrarySettings {
    /// Where the song database lives. Defaults to the XDG data directory.
    pub database_path: Option<PathBuf>,
    /// Artist recorded for imports without an artist tag.
    pub default_artist: String,
    /// File extensions picked up when importing a directory (case-insensitive, without dot).
    pub extensions: Vec<String>,
    /// Whether to follow symlinks when importing a directory.
    pub follow_links: bool,
    /// Folder the player imports from when `i` is pressed.
    /// Defaults to `inbox` under the XDG data directory.
    pub import_dir: Option<PathBuf>,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            database_path: None,
            default_artist: "Unknown Artist".to_string(),
            extensions: vec![
                "mp3".into(),
                "flac".into(),
                "wav".into(),
                "ogg".into(),
                "m4a".into(),
            ],
            follow_links: true,
            import_dir: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AudioSettings {
    /// How often the audio thread reports progress (milliseconds).
    pub tick_ms: u64,
    /// Fade-out duration when quitting (milliseconds).
    /// Set to 0 to stop immediately.
    pub quit_fade_out_ms: u64,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            tick_ms: 250,
            quit_fade_out_ms: 300,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UiSettings {
    /// The text rendered inside the top header box.
    pub header_text: String,
    /// Whether the playlist panel starts visible.
    pub show_playlist: bool,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            header_text: " ~ wave to skip ~ ".to_string(),
            show_playlist: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ControlsSettings {
    /// Number of seconds to scrub when pressing `H` / `L`.
    pub scrub_seconds: u64,
}

impl Default for ControlsSettings {
    fn default() -> Self {
        Self { scrub_seconds: 5 }
    }
}
