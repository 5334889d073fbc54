//! Session lifecycle control: start, stop, status, window rotation.
//!
//! The [`SessionController`] is the single owner of profiling session
//! state. All transitions (`start`, `stop`, and the window rotation
//! performed by a periodic tick) are serialized behind one
//! session-scoped lock, so no two transitions race and no window's
//! snapshot is ever produced from an inconsistent start timestamp.
//! `status` is a lock-free atomic read.
//!
//! The lock is deliberately *not* held across export I/O: the session
//! fields are updated and the snapshot taken under the lock, then the
//! export future is awaited after release, so trigger adapters never
//! stall behind a slow exporter.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::timer::{SessionTimer, SessionTimerHandle};
use crate::capability::{ExportPipeline, ProfileWindow, ProfilerCapability, Snapshot};
use crate::{AppError, Result};

/// Uniform return of `start`/`stop`.
///
/// Expected business conditions (already active, no active session,
/// profiler not registered) are reported here, never as an `Err`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfilingResult {
    /// Whether the request took effect.
    pub success: bool,
    /// Human-readable outcome description.
    pub message: String,
}

impl ProfilingResult {
    fn granted(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    fn refused(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Session fields guarded by the controller lock.
///
/// `window_start` is `Some` if and only if the session is active; the
/// timer handle is present only while a timer is pending.
#[derive(Default)]
struct SessionState {
    window_start: Option<DateTime<Utc>>,
    timer: Option<SessionTimerHandle>,
}

/// Builder producing a usable [`SessionController`].
///
/// The export pipeline is a required dependency: `build` refuses to
/// produce a controller without one, so a constructed controller can
/// never hit a missing-exporter condition at start time.
#[derive(Default)]
pub struct SessionControllerBuilder {
    exporter: Option<Arc<dyn ExportPipeline>>,
    upload_interval: Duration,
}

impl SessionControllerBuilder {
    /// Start an empty builder with periodic export disabled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the export pipeline (required).
    #[must_use]
    pub fn exporter(mut self, exporter: Arc<dyn ExportPipeline>) -> Self {
        self.exporter = Some(exporter);
        self
    }

    /// Interval between periodic exports; `0` disables them and a
    /// single snapshot is exported when the session ends.
    #[must_use]
    pub fn upload_interval_seconds(mut self, seconds: u64) -> Self {
        self.upload_interval = Duration::from_secs(seconds);
        self
    }

    /// Produce the controller in the unarmed state.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotInitialized` when no export pipeline was
    /// provided.
    pub fn build(self) -> Result<Arc<SessionController>> {
        let exporter = self
            .exporter
            .ok_or_else(|| AppError::NotInitialized("export pipeline is required".into()))?;
        Ok(Arc::new(SessionController {
            exporter,
            profiler: OnceLock::new(),
            upload_interval: self.upload_interval,
            active: AtomicBool::new(false),
            state: Mutex::new(SessionState::default()),
            export_failures: AtomicU64::new(0),
        }))
    }
}

/// The profiling session state machine.
///
/// `Unarmed → Armed-Idle` on [`register_profiler`](Self::register_profiler),
/// `→ Active` on [`start`](Self::start), `→ Armed-Idle` on
/// [`stop`](Self::stop) or a timeout-triggered stop. At most one
/// session is active per controller instance at any time.
pub struct SessionController {
    exporter: Arc<dyn ExportPipeline>,
    profiler: OnceLock<Arc<dyn ProfilerCapability>>,
    upload_interval: Duration,
    active: AtomicBool,
    state: Mutex<SessionState>,
    export_failures: AtomicU64,
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("upload_interval", &self.upload_interval)
            .field("active", &self.active)
            .field("export_failures", &self.export_failures)
            .finish_non_exhaustive()
    }
}

impl SessionController {
    /// Arm the controller with the sampling capability.
    ///
    /// Registration is set-once: a second registration is rejected and
    /// changes nothing, whether or not a session is active.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` on a repeated registration.
    pub fn register_profiler(&self, profiler: Arc<dyn ProfilerCapability>) -> Result<()> {
        self.profiler
            .set(profiler)
            .map_err(|_| AppError::Config("profiler already registered".into()))?;
        info!("profiler registered; sampling deferred until a trigger");
        Ok(())
    }

    /// Whether a profiling session is currently active.
    #[must_use]
    pub fn status(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Count of export failures swallowed by ticks and stops.
    #[must_use]
    pub fn export_failures(&self) -> u64 {
        self.export_failures.load(Ordering::Relaxed)
    }

    /// Start a profiling session.
    ///
    /// `duration_seconds == 0` runs until an explicit [`stop`](Self::stop).
    /// Refused with no side effect when the profiler is not registered
    /// or a session is already active.
    pub async fn start(self: &Arc<Self>, duration_seconds: u64) -> ProfilingResult {
        let Some(profiler) = self.profiler.get() else {
            return ProfilingResult::refused("Profiler not initialized");
        };

        let mut state = self.state.lock().await;
        if self.active.load(Ordering::Acquire) {
            return ProfilingResult::refused("Profiling session already active");
        }

        let now = Utc::now();
        state.window_start = Some(now);
        profiler.start();

        let duration = (duration_seconds > 0).then(|| Duration::from_secs(duration_seconds));
        let interval = (!self.upload_interval.is_zero()).then_some(self.upload_interval);
        if duration.is_some() || interval.is_some() {
            let timer = SessionTimer::new(Arc::downgrade(self), duration, interval);
            state.timer = Some(timer.spawn());
        }

        self.active.store(true, Ordering::Release);
        drop(state);

        let message = if duration_seconds > 0 {
            format!("Profiling started for {duration_seconds} seconds")
        } else {
            "Profiling started for an indefinite period".to_owned()
        };
        info!(duration_seconds, window_start = %now, "profiling session started");
        ProfilingResult::granted(message)
    }

    /// Stop the active session and export the final window.
    ///
    /// Idempotent: refused with no side effect when idle. The
    /// transition back to idle is unconditional — the controller never
    /// stays active because the final export failed; the result only
    /// reflects the export outcome.
    pub async fn stop(&self) -> ProfilingResult {
        let snapshot = {
            let mut state = self.state.lock().await;
            if !self.active.load(Ordering::Acquire) {
                return ProfilingResult::refused("No active profiling session");
            }

            // Best-effort, cooperative: a timer task already mid-tick is
            // not interrupted, it only stops firing.
            if let Some(timer) = state.timer.take() {
                timer.cancel();
            }

            let snapshot = self.close_window(&mut state, Utc::now());
            self.active.store(false, Ordering::Release);
            snapshot
        };

        info!("profiling session stopped");
        match self.export(snapshot).await {
            Ok(()) => ProfilingResult::granted("Profiling stopped and data sent"),
            Err(err) => {
                self.export_failures.fetch_add(1, Ordering::Relaxed);
                warn!(%err, "final snapshot export failed; session is idle regardless");
                ProfilingResult::refused(format!("Failed to stop profiling: {err}"))
            }
        }
    }

    /// Close the current window and reopen the next one (periodic tick).
    ///
    /// Fires only from the session timer. Any failure here is caught
    /// and counted; sampling resumes for the next window regardless of
    /// the export outcome, so windows stay contiguous: the end of
    /// window *k* is exactly the start of window *k+1*.
    pub(crate) async fn rotate_window(&self) {
        let snapshot = {
            let mut state = self.state.lock().await;
            if !self.active.load(Ordering::Acquire) {
                // Session ended between the tick firing and the lock.
                return;
            }

            // One timestamp serves as both the closing end and the next start.
            let now = Utc::now();
            let snapshot = self.close_window(&mut state, now);
            state.window_start = Some(now);
            if let Some(profiler) = self.profiler.get() {
                profiler.start();
            }
            debug!(window_start = %now, "window rotated");
            snapshot
        };

        if let Err(err) = self.export(snapshot).await {
            self.export_failures.fetch_add(1, Ordering::Relaxed);
            warn!(
                %err,
                failures = self.export_failures.load(Ordering::Relaxed),
                "periodic export failed; session continues"
            );
        }
    }

    /// Stop sampling and dump the artifact for `[window_start, end)`.
    ///
    /// Must be called with the session lock held and an active session.
    fn close_window(&self, state: &mut SessionState, end: DateTime<Utc>) -> Option<Snapshot> {
        let profiler = self.profiler.get()?;
        profiler.stop();
        let start = state.window_start.take()?;
        let window = ProfileWindow::new(start, end);
        profiler.dump_profile(window)
    }

    /// Hand a snapshot to the export pipeline, outside the lock.
    async fn export(&self, snapshot: Option<Snapshot>) -> Result<()> {
        let Some(snapshot) = snapshot else {
            debug!("window produced no snapshot; nothing to export");
            return Ok(());
        };
        debug!(
            window_start = %snapshot.window.start,
            window_end = %snapshot.window.end,
            bytes = snapshot.payload.len(),
            "exporting snapshot"
        );
        self.exporter.export(snapshot).await
    }

    /// Terminate any active session and release timer resources.
    ///
    /// Called from the daemon's shutdown path; harmless when idle.
    pub async fn shutdown(&self) {
        if !self.status() {
            return;
        }
        let result = self.stop().await;
        info!(success = result.success, message = %result.message, "controller shut down");
    }
}
