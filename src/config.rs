//! Agent configuration parsing, validation, and environment overrides.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

use crate::{AppError, Result};

/// Environment variable overriding the periodic upload interval at boot.
pub const UPLOAD_INTERVAL_ENV: &str = "ONDEMAND_AGENT_UPLOAD_INTERVAL";

/// HTTP trigger surface settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct HttpTriggerConfig {
    /// Whether the HTTP control API is served at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Loopback port for the control API.
    #[serde(default = "default_http_port")]
    pub port: u16,
}

impl Default for HttpTriggerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: default_http_port(),
        }
    }
}

/// Signal trigger surface settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct SignalTriggerConfig {
    /// Whether SIGUSR1/SIGUSR2 handlers are registered.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for SignalTriggerConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

fn default_true() -> bool {
    true
}

fn default_http_port() -> u16 {
    8930
}

fn default_duration_seconds() -> u64 {
    30
}

fn default_signal_duration_seconds() -> u64 {
    90
}

fn default_spool_dir() -> PathBuf {
    PathBuf::from("./profile-spool")
}

/// Agent configuration parsed from `config.toml`.
///
/// Every field has a default so the daemon boots without a config file.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct AgentConfig {
    /// Session duration applied when an HTTP start request names none.
    #[serde(default = "default_duration_seconds")]
    pub default_duration_seconds: u64,
    /// Fixed session duration for SIGUSR1-started sessions.
    #[serde(default = "default_signal_duration_seconds")]
    pub signal_default_duration_seconds: u64,
    /// Interval between periodic exports during a session; `0` disables
    /// them and a single snapshot is exported at session end.
    #[serde(default)]
    pub upload_interval_seconds: u64,
    /// Directory where the built-in exporter spools snapshots.
    #[serde(default = "default_spool_dir")]
    pub spool_dir: PathBuf,
    /// HTTP control API settings.
    #[serde(default)]
    pub http_trigger: HttpTriggerConfig,
    /// Signal handler settings.
    #[serde(default)]
    pub signal_trigger: SignalTriggerConfig,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            default_duration_seconds: default_duration_seconds(),
            signal_default_duration_seconds: default_signal_duration_seconds(),
            upload_interval_seconds: 0,
            spool_dir: default_spool_dir(),
            http_trigger: HttpTriggerConfig::default(),
            signal_trigger: SignalTriggerConfig::default(),
        }
    }
}

impl AgentConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or
    /// contains invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides, read once at boot.
    ///
    /// [`UPLOAD_INTERVAL_ENV`] replaces the configured upload interval.
    /// A non-numeric value disables periodic export with a warning; an
    /// absent or empty variable changes nothing.
    pub fn apply_env_overrides(&mut self) {
        let Ok(raw) = env::var(UPLOAD_INTERVAL_ENV) else {
            return;
        };
        if raw.is_empty() {
            return;
        }
        match raw.parse::<u64>() {
            Ok(seconds) => {
                info!(seconds, "upload interval overridden from environment");
                self.upload_interval_seconds = seconds;
            }
            Err(_) => {
                warn!(value = %raw, "invalid {UPLOAD_INTERVAL_ENV}; periodic export disabled");
                self.upload_interval_seconds = 0;
            }
        }
    }

    fn validate(&self) -> Result<()> {
        if self.http_trigger.enabled && self.http_trigger.port == 0 {
            return Err(AppError::Config(
                "http_trigger.port must be non-zero when the HTTP trigger is enabled".into(),
            ));
        }
        Ok(())
    }
}
