//! Version-stamped staleness gating
//!
//! An edit can land between request dispatch and response arrival; without a
//! gate, the old result would overwrite diagnostics describing newer content.
//! The guard captures the document version at dispatch time and applies a
//! result only if the version is still current when it arrives.

use std::sync::Arc;

use tracing::debug;

use crate::diagnostics::DiagnosticBatch;
use crate::host::DocumentHost;

/// Gate that discards results arriving after the document moved on.
pub struct StalenessGuard<H: DocumentHost + ?Sized> {
    host: Arc<H>,
    key: String,
    captured: u64,
}

impl<H: DocumentHost + ?Sized> StalenessGuard<H> {
    /// Capture the document's current version, immediately before the
    /// operation against it is dispatched. Returns `None` if the document is
    /// already closed.
    pub fn capture(host: Arc<H>, key: impl Into<String>) -> Option<Self> {
        let key = key.into();
        let captured = host.version(&key)?;
        Some(Self {
            host,
            key,
            captured,
        })
    }

    pub fn captured_version(&self) -> u64 {
        self.captured
    }

    /// Apply the batch through the host sink unless the document changed or
    /// closed since capture. Returns whether the batch was applied.
    ///
    /// The discard path is silent to the user; it only leaves a debug log.
    pub async fn apply(&self, batch: DiagnosticBatch) -> bool {
        match self.host.version(&self.key) {
            Some(current) if current == self.captured => {
                self.host.apply_diagnostics(&self.key, batch).await;
                true
            }
            current => {
                debug!(
                    key = %self.key,
                    captured = self.captured,
                    current = ?current,
                    "stale analysis result discarded"
                );
                false
            }
        }
    }
}
