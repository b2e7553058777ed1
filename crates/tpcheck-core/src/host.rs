//! Capabilities the embedding editor provides to the core
//!
//! The core never mutates editor state directly; it reads a version counter
//! and hands accepted batches through a single sink method. Everything else
//! about presentation belongs to the host.

use async_trait::async_trait;

use crate::diagnostics::DiagnosticBatch;

/// What the core needs from the host editor, per tracked document.
#[async_trait]
pub trait DocumentHost: Send + Sync {
    /// Current version of the document, or `None` once it is closed.
    ///
    /// The counter is owned by the host and must only ever increase; the
    /// core reads it to stamp outbound work and to detect stale results.
    fn version(&self, key: &str) -> Option<u64>;

    /// Replace the document's diagnostics with an accepted batch.
    ///
    /// Only called for results that passed the staleness gate; this is the
    /// single side-effecting boundary the core crosses.
    async fn apply_diagnostics(&self, key: &str, batch: DiagnosticBatch);
}
