//! First-to-fire merge of cancellation sources
//!
//! A service call aborts on whichever fires first: the caller's token or the
//! client's internal deadline. Neither side is distinguishable downstream;
//! both collapse into the same merged token.

use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Merges any number of upstream cancellation sources into one token.
///
/// Each linked source is watched by a spawned task that forwards the first
/// firing into the merged token; `CancellationToken::cancel` is idempotent,
/// so the merged token completes exactly once no matter how many sources
/// fire. Dropping the merge disposes every watcher, including the deadline
/// timer, so no scheduled work outlives the call it belonged to.
#[derive(Debug)]
pub struct MergedCancellation {
    token: CancellationToken,
    watchers: Vec<JoinHandle<()>>,
}

impl MergedCancellation {
    /// Create a merge with no sources linked yet.
    ///
    /// Must be called from within a tokio runtime; linking spawns watcher
    /// tasks.
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
            watchers: Vec::new(),
        }
    }

    /// Get a clone of the merged token.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Forward cancellation from an upstream source.
    pub fn link(&mut self, upstream: CancellationToken) {
        let downstream = self.token.clone();
        self.watchers.push(tokio::spawn(async move {
            upstream.cancelled().await;
            downstream.cancel();
        }));
    }

    /// Arm an internal deadline source that fires after `after`.
    pub fn link_deadline(&mut self, after: Duration) {
        let downstream = self.token.clone();
        self.watchers.push(tokio::spawn(async move {
            tokio::time::sleep(after).await;
            downstream.cancel();
        }));
    }

    /// Wait until any linked source has fired.
    pub async fn cancelled(&self) {
        self.token.cancelled().await;
    }

    /// Check whether any linked source has fired.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Drop for MergedCancellation {
    fn drop(&mut self) {
        for watcher in &self.watchers {
            watcher.abort();
        }
    }
}

impl Default for MergedCancellation {
    fn default() -> Self {
        Self::new()
    }
}
