//! Analysis engine
//!
//! Owns the control flow from editor trigger to applied diagnostics:
//! trigger → debounce → version capture → check request → validation →
//! staleness gate → host sink. One engine serves every open document; each
//! document is a scheduler key.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::ErrorKind;
use crate::host::DocumentHost;
use crate::scheduler::{DispatchFn, KeyedScheduler};
use crate::service::{CheckOptions, TpServiceClient};
use crate::staleness::StalenessGuard;

/// Default quiet period between an edit burst and the check request.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(500);

/// Debounced check pipeline over a set of tracked documents.
pub struct AnalysisEngine<H: DocumentHost + 'static> {
    client: Arc<TpServiceClient>,
    host: Arc<H>,
    scheduler: KeyedScheduler<String, String>,
    options: CheckOptions,
}

impl<H: DocumentHost + 'static> AnalysisEngine<H> {
    pub fn new(client: TpServiceClient, host: Arc<H>) -> Self {
        Self {
            client: Arc::new(client),
            host,
            scheduler: KeyedScheduler::new(DEFAULT_QUIET_PERIOD),
            options: CheckOptions::default(),
        }
    }

    /// Override the quiet period. Takes effect for subsequent triggers.
    pub fn with_quiet_period(mut self, quiet_period: Duration) -> Self {
        self.scheduler = KeyedScheduler::new(quiet_period);
        self
    }

    /// Override the options sent with every check request.
    pub fn with_check_options(mut self, options: CheckOptions) -> Self {
        self.options = options;
        self
    }

    /// Handle an edit burst for a document: debounce, then check.
    pub fn document_changed(&self, key: &str, content: String) {
        self.scheduler
            .schedule(key.to_string(), content, self.check_dispatch(key));
    }

    /// Check a document immediately (e.g., on save), bypassing the quiet
    /// period and superseding any pending or in-flight work for it.
    pub fn check_now(&self, key: &str, content: String) {
        self.scheduler
            .execute_now(key.to_string(), content, self.check_dispatch(key));
    }

    /// Stop tracking a document; pending and in-flight work for it is
    /// cancelled. Safe to call repeatedly.
    pub fn close_document(&self, key: &str) {
        self.scheduler.teardown(key);
    }

    fn check_dispatch(&self, key: &str) -> DispatchFn<String> {
        let client = Arc::clone(&self.client);
        let host = Arc::clone(&self.host);
        let options = self.options.clone();
        let key = key.to_string();

        Arc::new(move |content, cancel| {
            let client = Arc::clone(&client);
            let host = Arc::clone(&host);
            let options = options.clone();
            let key = key.clone();

            Box::pin(async move {
                let Some(guard) = StalenessGuard::capture(host, &key) else {
                    debug!(key = %key, "document closed before dispatch");
                    return;
                };

                match client.check(&content, &options, Some(cancel)).await {
                    Ok(batch) => {
                        if guard.apply(batch).await {
                            debug!(key = %key, version = guard.captured_version(), "diagnostics applied");
                        }
                    }
                    Err(error) if error.kind() == ErrorKind::Aborted => {
                        debug!(key = %key, "check superseded or timed out");
                    }
                    Err(error) => {
                        warn!(
                            key = %key,
                            kind = ?error.kind(),
                            retriable = error.is_retriable(),
                            error = %error,
                            "check failed"
                        );
                    }
                }
            })
        })
    }
}
