//! Contracts for the external collaborators of the session controller.
//!
//! The [`ProfilerCapability`] is the sampling engine and the
//! [`ExportPipeline`] is the snapshot delivery path. The controller
//! never inspects snapshot contents; it only orchestrates start/stop/
//! export calls and owns the window timing.

pub mod cputime;
pub mod spool;

use std::future::Future;
use std::pin::Pin;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::Result;

/// Half-open time window `[start, end)` a single snapshot covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProfileWindow {
    /// Inclusive window start.
    pub start: DateTime<Utc>,
    /// Exclusive window end.
    pub end: DateTime<Utc>,
}

impl ProfileWindow {
    /// Construct a window, which must not be inverted.
    #[must_use]
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        debug_assert!(end >= start, "inverted profile window");
        Self { start, end }
    }

    /// Window length as a chrono duration.
    #[must_use]
    pub fn length(&self) -> chrono::Duration {
        self.end - self.start
    }
}

/// An opaque profiling artifact covering one [`ProfileWindow`].
///
/// Owned transiently by the controller between production and handoff
/// to the export pipeline; ownership transfers on `export`.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// The window this artifact covers.
    pub window: ProfileWindow,
    /// Serialized profile data, opaque to the control plane.
    pub payload: Vec<u8>,
}

/// The sampling engine abstraction.
///
/// Implementations must tolerate repeated `start` calls (idempotent
/// when already sampling) and must allow `dump_profile` to be called
/// once per window, repeatedly across a session.
pub trait ProfilerCapability: Send + Sync {
    /// Begin raw sampling.
    fn start(&self);

    /// Pause sampling.
    fn stop(&self);

    /// Extract the artifact for the given window.
    ///
    /// Returns `None` when the window produced no data.
    fn dump_profile(&self, window: ProfileWindow) -> Option<Snapshot>;
}

/// The snapshot delivery abstraction.
///
/// Buffering and retry are the implementor's concern. The controller
/// only requires that `export` returns promptly enough not to corrupt
/// session timing, and it treats an `Err` as a non-fatal
/// [`AppError::Export`](crate::AppError::Export).
pub trait ExportPipeline: Send + Sync {
    /// Submit a snapshot for delivery.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Export`](crate::AppError::Export) when the
    /// artifact could not be handed off.
    fn export(&self, snapshot: Snapshot) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}
