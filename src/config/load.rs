use std::{env, path::PathBuf};

use super::schema::Settings;

/// Configuration loading helpers.
///
/// `Settings::load` tries environment variables first (prefix `HANDWAVE__`), then an
/// optional config file and falls back to struct defaults.
impl Settings {
    /// Load settings from environment and optional config file.
    pub fn load() -> Result<Self, ::config::ConfigError> {
        let config_path = resolve_config_path();

        let mut builder = ::config::Config::builder();

        if let Some(path) = &config_path {
            builder = builder.add_source(::config::File::from(path.as_path()).required(false));
        }

        builder = builder.add_source(
            ::config::Environment::with_prefix("HANDWAVE")
                .separator("__")
                .try_parsing(true),
        );

        let cfg = builder.build()?;
        let settings: Settings = cfg.try_deserialize()?;
        Ok(settings)
    }

    /// Perform basic validation checks on loaded settings.
    pub fn validate(&self) -> Result<(), String> {
        if self.remote.endpoint.trim().is_empty() {
            return Err("remote.endpoint must not be empty".to_string());
        }
        if self.remote.ping_interval_secs == 0 {
            return Err("remote.ping_interval_secs must be >= 1".to_string());
        }
        if self.remote.reconnect_delay_secs == 0 {
            return Err("remote.reconnect_delay_secs must be >= 1".to_string());
        }
        if self.audio.tick_ms == 0 {
            return Err("audio.tick_ms must be >= 1".to_string());
        }
        Ok(())
    }

    /// The database path from settings, or the XDG default.
    pub fn database_path(&self) -> Option<PathBuf> {
        self.library
            .database_path
            .clone()
            .or_else(|| default_data_dir().map(|d| d.join("library.db")))
    }

    /// The in-player import folder from settings, or `inbox` in the data directory.
    pub fn import_dir(&self) -> Option<PathBuf> {
        self.library
            .import_dir
            .clone()
            .or_else(|| default_data_dir().map(|d| d.join("inbox")))
    }
}

/// Resolve the config path from `HANDWAVE_CONFIG_PATH` or XDG defaults.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Some(p) = env::var_os("HANDWAVE_CONFIG_PATH") {
        let p = PathBuf::from(p);
        return Some(p);
    }
    default_config_path()
}

/// Compute the default config path under `$XDG_CONFIG_HOME/handwave/config.toml`
/// or `~/.config/handwave/config.toml` when `XDG_CONFIG_HOME` is not set.
pub fn default_config_path() -> Option<PathBuf> {
    let config_home = if let Some(xdg) = env::var_os("XDG_CONFIG_HOME") {
        Some(PathBuf::from(xdg))
    } else if let Some(home) = env::var_os("HOME") {
        Some(PathBuf::from(home).join(".config"))
    } else {
        None
    };

    config_home.map(|d| d.join("handwave").join("config.toml"))
}

/// `$XDG_DATA_HOME/handwave` or `~/.local/share/handwave`.
pub fn default_data_dir() -> Option<PathBuf> {
    let data_home = if let Some(xdg) = env::var_os("XDG_DATA_HOME") {
        Some(PathBuf::from(xdg))
    } else if let Some(home) = env::var_os("HOME") {
        Some(PathBuf::from(home).join(".local").join("share"))
    } else {
        None
    };

    data_home.map(|d| d.join("handwave"))
}
