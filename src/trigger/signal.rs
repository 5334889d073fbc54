//! OS-signal trigger adapter (Unix only).
//!
//! SIGUSR1 starts a session for a fixed default duration; SIGUSR2
//! stops it. Signals carry no response channel, so every outcome is
//! observable only through the logs.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, Instrument};

use crate::session::SessionController;
use crate::{AppError, Result};

/// Register SIGUSR1/SIGUSR2 handlers and spawn the dispatch task.
///
/// The task runs until the token is cancelled. `default_duration_seconds`
/// bounds sessions started by SIGUSR1.
///
/// # Errors
///
/// Returns `AppError::Trigger` when either signal stream cannot be
/// registered; the daemon disables this trigger surface and continues.
#[cfg(unix)]
pub fn spawn(
    controller: Arc<SessionController>,
    default_duration_seconds: u64,
    ct: CancellationToken,
) -> Result<JoinHandle<()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigusr1 = signal(SignalKind::user_defined1())
        .map_err(|err| AppError::Trigger(format!("failed to register SIGUSR1 handler: {err}")))?;
    let mut sigusr2 = signal(SignalKind::user_defined2())
        .map_err(|err| AppError::Trigger(format!("failed to register SIGUSR2 handler: {err}")))?;

    info!("signal trigger enabled (SIGUSR1 to start, SIGUSR2 to stop)");

    let task = async move {
        loop {
            tokio::select! {
                () = ct.cancelled() => {
                    debug!("signal trigger shut down");
                    return;
                }
                _ = sigusr1.recv() => {
                    info!("received SIGUSR1 - starting profiling");
                    let result = controller.start(default_duration_seconds).await;
                    info!(success = result.success, message = %result.message, "profiling start result");
                }
                _ = sigusr2.recv() => {
                    info!("received SIGUSR2 - stopping profiling");
                    let result = controller.stop().await;
                    info!(success = result.success, message = %result.message, "profiling stop result");
                }
            }
        }
    };

    Ok(tokio::spawn(task.instrument(info_span!("signal_trigger"))))
}

/// Signal triggers are unavailable off Unix; report the surface as
/// disabled instead of failing boot.
#[cfg(not(unix))]
pub fn spawn(
    _controller: Arc<SessionController>,
    _default_duration_seconds: u64,
    _ct: CancellationToken,
) -> Result<JoinHandle<()>> {
    Err(AppError::Trigger(
        "signal triggers are only supported on unix".into(),
    ))
}
