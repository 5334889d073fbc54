//! Built-in CPU-time capability backed by `/proc/self/stat`.
//!
//! This is not a sampling engine — it records the process utime/stime
//! counters when a window opens and emits the deltas as a small JSON
//! payload when the window is dumped. It exists so the daemon binary
//! works end to end without an embedded profiler; real deployments
//! plug their own [`ProfilerCapability`] in.

use std::sync::Mutex;

use serde::Serialize;
use tracing::warn;

use super::{ProfileWindow, ProfilerCapability, Snapshot};

/// CPU-time counters in clock ticks, read from `/proc/self/stat`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CpuTicks {
    /// User-mode ticks (`utime`, field 14).
    pub utime: u64,
    /// Kernel-mode ticks (`stime`, field 15).
    pub stime: u64,
}

/// JSON payload emitted for each window.
#[derive(Debug, Serialize)]
struct CpuTimeReport {
    window: ProfileWindow,
    utime_ticks: u64,
    stime_ticks: u64,
}

/// Minimal built-in profiler capability for the daemon binary.
pub struct CpuTimeProfiler {
    baseline: Mutex<Option<CpuTicks>>,
}

impl CpuTimeProfiler {
    /// Construct an idle (not yet sampling) capability.
    #[must_use]
    pub fn new() -> Self {
        Self {
            baseline: Mutex::new(None),
        }
    }

    fn read_ticks() -> Option<CpuTicks> {
        let stat = std::fs::read_to_string("/proc/self/stat").ok()?;
        parse_stat_line(&stat)
    }

    fn lock_baseline(&self) -> std::sync::MutexGuard<'_, Option<CpuTicks>> {
        self.baseline
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Default for CpuTimeProfiler {
    fn default() -> Self {
        Self::new()
    }
}

impl ProfilerCapability for CpuTimeProfiler {
    fn start(&self) {
        let mut baseline = self.lock_baseline();
        // Idempotent: an already-running capability keeps its baseline.
        if baseline.is_none() {
            *baseline = Self::read_ticks();
            if baseline.is_none() {
                warn!("cannot read /proc/self/stat; cpu-time windows will be empty");
            }
        }
    }

    fn stop(&self) {
        // Counters are cumulative; nothing to pause. The baseline is
        // consumed by the next dump_profile call.
    }

    fn dump_profile(&self, window: ProfileWindow) -> Option<Snapshot> {
        let mut guard = self.lock_baseline();
        let baseline = guard.take()?;
        let current = Self::read_ticks()?;

        let report = CpuTimeReport {
            window,
            utime_ticks: current.utime.saturating_sub(baseline.utime),
            stime_ticks: current.stime.saturating_sub(baseline.stime),
        };
        let payload = serde_json::to_vec(&report).ok()?;
        Some(Snapshot { window, payload })
    }
}

/// Parse utime/stime out of a `/proc/<pid>/stat` line.
///
/// The comm field (2) may contain spaces and parentheses, so fields are
/// counted from the closing paren rather than the line start.
#[must_use]
pub fn parse_stat_line(line: &str) -> Option<CpuTicks> {
    let after_comm = &line[line.rfind(')')? + 1..];
    let mut fields = after_comm.split_whitespace();
    // after_comm starts at field 3 (state); utime is field 14, stime 15.
    let utime = fields.nth(11)?.parse().ok()?;
    let stime = fields.next()?.parse().ok()?;
    Some(CpuTicks { utime, stime })
}
