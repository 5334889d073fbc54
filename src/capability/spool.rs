//! Spool-directory export pipeline.
//!
//! Writes each snapshot payload to a local directory with a
//! timestamped filename. This is a local sink, not a delivery
//! pipeline: shipping spooled files to a backend (with retry and
//! backpressure) is a separate concern.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use tracing::{debug, warn};

use super::{ExportPipeline, Snapshot};
use crate::{AppError, Result};

/// Exporter that persists snapshots under a spool directory.
pub struct SpoolExporter {
    dir: PathBuf,
}

impl SpoolExporter {
    /// Create the exporter, creating the spool directory if needed.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Io` when the directory cannot be created.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .map_err(|err| AppError::Io(format!("cannot create spool dir {}: {err}", dir.display())))?;
        Ok(Self { dir })
    }

    /// File name for a snapshot, derived from its window bounds.
    #[must_use]
    pub fn file_name(snapshot: &Snapshot) -> String {
        format!(
            "profile_{}_{}.json",
            snapshot.window.start.format("%Y%m%dT%H%M%S%.3f"),
            snapshot.window.end.format("%Y%m%dT%H%M%S%.3f"),
        )
    }
}

impl ExportPipeline for SpoolExporter {
    fn export(&self, snapshot: Snapshot) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            let path = self.dir.join(Self::file_name(&snapshot));
            match tokio::fs::write(&path, &snapshot.payload).await {
                Ok(()) => {
                    debug!(path = %path.display(), bytes = snapshot.payload.len(), "snapshot spooled");
                    Ok(())
                }
                Err(err) => {
                    warn!(path = %path.display(), %err, "failed to spool snapshot");
                    Err(AppError::Export(format!(
                        "cannot write {}: {err}",
                        path.display()
                    )))
                }
            }
        })
    }
}
