//! Error types shared across the application.
//!
//! Business-condition refusals (`AlreadyActive`, `NoActiveSession`) are
//! not errors — they travel inside
//! [`ProfilingResult`](crate::session::ProfilingResult). `AppError`
//! covers everything that genuinely failed.

use std::fmt::{Display, Formatter};

/// Shared application result type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error enumeration covering all domain failure modes.
#[derive(Debug)]
pub enum AppError {
    /// Configuration parsing or validation failure.
    Config(String),
    /// A required collaborator is missing or was registered twice.
    NotInitialized(String),
    /// A trigger surface (HTTP listener, signal registration) failed at
    /// boot. Non-fatal: the surface is disabled, the agent continues.
    Trigger(String),
    /// Snapshot export failure. Non-fatal: the session still
    /// transitions to idle on stop, and sampling resumes on a tick.
    Export(String),
    /// File-system or I/O operation failure.
    Io(String),
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::NotInitialized(msg) => write!(f, "not initialized: {msg}"),
            Self::Trigger(msg) => write!(f, "trigger: {msg}"),
            Self::Export(msg) => write!(f, "export: {msg}"),
            Self::Io(msg) => write!(f, "io: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("invalid config: {err}"))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
