use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::debug;

use crate::workflow::Verbosity;

pub const DEFAULT_CITY: &str = "London";
pub const DEFAULT_WEATHER_URL: &str = "https://api.openweathermap.org/data/2.5/weather";
pub const DEFAULT_SOCKET_DIR: &str = "/cloudsql";
pub const DEFAULT_MYSQL_PORT: u16 = 3306;

/// Weather API tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherSettings {
    pub base_url: String,
    /// Request timeout. No timeout when absent.
    pub timeout_secs: Option<u64>,
}

impl Default for WeatherSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_WEATHER_URL.to_string(),
            timeout_secs: None,
        }
    }
}

impl WeatherSettings {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Where and how database sessions are opened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// Directory holding the per-instance unix sockets.
    pub socket_dir: PathBuf,
    /// TCP host; takes precedence over the socket when set.
    pub host: Option<String>,
    pub port: u16,
    pub connect_timeout_secs: Option<u64>,
    /// Write to a local SQLite file instead of the managed instance.
    pub sqlite_path: Option<PathBuf>,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            socket_dir: PathBuf::from(DEFAULT_SOCKET_DIR),
            host: None,
            port: DEFAULT_MYSQL_PORT,
            connect_timeout_secs: None,
            sqlite_path: None,
        }
    }
}

impl DatabaseSettings {
    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_secs.map(Duration::from_secs)
    }
}

/// Optional settings stored on disk.
///
/// Example TOML:
/// ```toml
/// city = "Paris"
/// verbosity = "diagnostic"
///
/// [weather]
/// timeout_secs = 10
///
/// [database]
/// host = "127.0.0.1"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub city: String,
    pub verbosity: Verbosity,
    pub weather: WeatherSettings,
    pub database: DatabaseSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            city: DEFAULT_CITY.to_string(),
            verbosity: Verbosity::default(),
            weather: WeatherSettings::default(),
            database: DatabaseSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from the default location, or defaults if no file exists yet.
    ///
    /// Hosts without a resolvable config directory (no `$HOME`, no passwd
    /// entry) also get defaults, since the file is optional.
    pub fn load() -> Result<Self> {
        Self::load_from_candidate(Self::settings_file_path())
    }

    fn load_from_candidate(path: Option<PathBuf>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from(&path),
            None => {
                debug!("no platform config directory; using default settings");
                Ok(Self::default())
            }
        }
    }

    /// Load settings from `path`; a missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;

        let settings: Settings = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse settings file: {}", path.display()))?;

        Ok(settings)
    }

    /// Path to the settings file, if the platform has a config directory.
    pub fn settings_file_path() -> Option<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-ingest", "weather-ingest")?;
        Some(dirs.config_dir().join("config.toml"))
    }
}
