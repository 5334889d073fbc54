//! Per-session timer task: one-shot timeout plus periodic export ticks.
//!
//! Both timers for a session run inside a single spawned task, one
//! `select!` loop — a single serialized execution context. That is a
//! deliberate invariant: periodic exports never overlap each other and
//! never overlap a timeout-triggered stop racing on the same task.
//!
//! Cancellation is cooperative via a [`CancellationToken`]: cancelling
//! a task that has already begun a tick has no effect on that in-flight
//! execution, it only prevents future firings. The handle cancels its
//! token when dropped.

use std::sync::Weak;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, Instrument};

use super::controller::SessionController;

/// Timer task for one session (does not run until [`spawn`](Self::spawn)).
pub(crate) struct SessionTimer {
    controller: Weak<SessionController>,
    duration: Option<Duration>,
    upload_interval: Option<Duration>,
    cancel: CancellationToken,
}

impl SessionTimer {
    /// Construct the timer. `duration: None` means no timeout arm;
    /// `upload_interval: None` means no periodic arm.
    pub(crate) fn new(
        controller: Weak<SessionController>,
        duration: Option<Duration>,
        upload_interval: Option<Duration>,
    ) -> Self {
        Self {
            controller,
            duration,
            upload_interval,
            cancel: CancellationToken::new(),
        }
    }

    /// Spawn the timer task and return the cancellation handle.
    ///
    /// The task is detached: it exits on cancellation, on timeout, or
    /// when the controller is gone.
    pub(crate) fn spawn(self) -> SessionTimerHandle {
        let cancel = self.cancel.clone();
        drop(tokio::spawn(self.run().instrument(info_span!("session_timer"))));
        SessionTimerHandle { cancel }
    }

    async fn run(self) {
        let timeout = async {
            match self.duration {
                Some(duration) => tokio::time::sleep(duration).await,
                None => std::future::pending().await,
            }
        };
        tokio::pin!(timeout);

        let mut ticks = self.upload_interval.map(|period| {
            // interval() fires immediately; the first export belongs at
            // start + period.
            let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });

        loop {
            let tick = async {
                match ticks.as_mut() {
                    Some(interval) => {
                        interval.tick().await;
                    }
                    None => std::future::pending().await,
                }
            };

            tokio::select! {
                () = self.cancel.cancelled() => {
                    debug!("session timer cancelled");
                    return;
                }
                () = &mut timeout => {
                    let Some(controller) = self.controller.upgrade() else {
                        return;
                    };
                    let result = controller.stop().await;
                    info!(success = result.success, message = %result.message, "session duration elapsed");
                    return;
                }
                () = tick => {
                    let Some(controller) = self.controller.upgrade() else {
                        return;
                    };
                    controller.rotate_window().await;
                }
            }
        }
    }
}

/// Handle to a spawned [`SessionTimer`], held while the session is active.
pub struct SessionTimerHandle {
    cancel: CancellationToken,
}

impl SessionTimerHandle {
    /// Prevent future timer firings. An execution already in flight
    /// runs to completion.
    pub(crate) fn cancel(&self) {
        self.cancel.cancel();
    }
}

impl Drop for SessionTimerHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
