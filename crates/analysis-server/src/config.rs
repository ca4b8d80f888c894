//! Server configuration.
//!
//! Loaded from `analysis.toml` in the working directory, or from the file
//! named by `ANALYSIS_CONFIG`. Every field has a default, so the file is
//! optional. `STOCKFISH_PATH` and `ANALYSIS_BIND` override the file.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chess_analysis::locate;
use chess_analysis::EngineSettings;
use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse the configuration file as valid TOML.
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    /// An environment override could not be parsed.
    #[error("Invalid value for {name}: {value:?}")]
    InvalidOverride { name: &'static str, value: String },
}

/// Top-level server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address to listen on.
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,
    /// Browser origins allowed to call the API.
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
    /// Requests slower than this are logged as warnings.
    #[serde(default = "default_slow_request_ms")]
    pub slow_request_ms: u64,
    #[serde(default)]
    pub engine: EngineSection,
}

/// The `[engine]` table.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineSection {
    /// Engine executable. Tried before `fallback_paths`.
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default = "locate::default_fallback_paths")]
    pub fallback_paths: Vec<PathBuf>,
    #[serde(default = "default_handshake_timeout_secs")]
    pub handshake_timeout_secs: u64,
    /// Extra UCI options, e.g. `Threads = 4` or `Hash = 256`.
    #[serde(default)]
    pub options: BTreeMap<String, toml::Value>,
}

fn default_bind() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8000))
}

fn default_allowed_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "http://localhost:3001".to_string(),
    ]
}

fn default_slow_request_ms() -> u64 {
    2000
}

fn default_handshake_timeout_secs() -> u64 {
    10
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            allowed_origins: default_allowed_origins(),
            slow_request_ms: default_slow_request_ms(),
            engine: EngineSection::default(),
        }
    }
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            path: None,
            fallback_paths: locate::default_fallback_paths(),
            handshake_timeout_secs: default_handshake_timeout_secs(),
            options: BTreeMap::new(),
        }
    }
}

impl EngineSection {
    /// Startup settings for the engine process.
    pub fn settings(&self) -> EngineSettings {
        let options = self
            .options
            .iter()
            .map(|(name, value)| {
                let value = match value {
                    toml::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (name.clone(), value)
            })
            .collect();

        EngineSettings {
            handshake_timeout: Duration::from_secs(self.handshake_timeout_secs),
            options,
        }
    }
}

impl ServerConfig {
    /// Load the configuration file, if any, and apply environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ReadError`] if the file exists but cannot be read,
    /// [`ConfigError::ParseError`] if it contains invalid TOML, or
    /// [`ConfigError::InvalidOverride`] for an unparseable environment value.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file(&Self::config_path())?;
        config.apply_overrides(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// `ANALYSIS_CONFIG` if set, otherwise `analysis.toml`.
    pub fn config_path() -> PathBuf {
        std::env::var_os("ANALYSIS_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("analysis.toml"))
    }

    /// Parse `path`, or return the defaults if it does not exist.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Ok(toml::from_str(&content)?)
        } else {
            Ok(Self::default())
        }
    }

    /// Apply `STOCKFISH_PATH` and `ANALYSIS_BIND` from `lookup`. Empty values
    /// are ignored.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(path) = var("STOCKFISH_PATH") {
            self.engine.path = Some(PathBuf::from(path));
        }
        if let Some(bind) = var("ANALYSIS_BIND") {
            self.bind = bind.trim().parse().map_err(|_| ConfigError::InvalidOverride {
                name: "ANALYSIS_BIND",
                value: bind.clone(),
            })?;
        }
        Ok(())
    }

    pub fn slow_request_threshold(&self) -> Duration {
        Duration::from_millis(self.slow_request_ms)
    }
}
