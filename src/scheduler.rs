//! Bridge between the generic profiling-scheduler seam and the
//! session controller.
//!
//! The rest of an agent expects a [`ProfilingScheduler`]: something it
//! can hand a profiler to at boot and tell to stop at shutdown. The
//! on-demand implementation arms the controller without activating
//! sampling — activation only ever happens through a trigger.

use std::sync::Arc;

use tracing::{info, warn};

use crate::capability::ProfilerCapability;
use crate::session::SessionController;

/// Generic scheduling seam expected by the embedding agent.
pub trait ProfilingScheduler: Send + Sync {
    /// Take ownership of the profiler and begin whatever scheduling
    /// policy the implementation defines.
    fn start(&self, profiler: Arc<dyn ProfilerCapability>);

    /// Stop scheduling.
    fn stop(&self);
}

/// Scheduler that defers all sampling until an on-demand trigger.
pub struct OnDemandScheduler {
    controller: Arc<SessionController>,
}

impl OnDemandScheduler {
    /// Wrap the controller that will own session lifecycle.
    #[must_use]
    pub fn new(controller: Arc<SessionController>) -> Self {
        Self { controller }
    }
}

impl ProfilingScheduler for OnDemandScheduler {
    fn start(&self, profiler: Arc<dyn ProfilerCapability>) {
        // Registers only; no sampling begins here.
        if let Err(err) = self.controller.register_profiler(profiler) {
            warn!(%err, "profiler registration rejected");
        } else {
            info!("on-demand scheduler armed; waiting for triggers");
        }
    }

    fn stop(&self) {
        // Termination is exclusively the controller's responsibility,
        // driven by triggers or the session timeout.
    }
}
