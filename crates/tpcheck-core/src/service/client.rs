//! Service client
//!
//! One `TpServiceClient` per configured endpoint; the underlying HTTP client
//! and its connection pool are reused across calls. Every operation returns
//! an [`ApiResult`]; no classified failure is ever raised as a panic.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::config::{ConfigError, ServiceConfig};
use crate::diagnostics::validate;
use crate::diagnostics::{DiagnosticBatch, FormatResult};
use crate::error::{ApiError, ApiResult};
use crate::interrupt::MergedCancellation;
use crate::service::request::{CheckOptions, ComplianceOptions, Endpoint, RequestDescriptor};
use crate::service::response::{self, ResponseBody};

/// Base delay for the exponential retry backoff.
const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);

/// Content type declared on every outbound request body.
const REQUEST_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Client for the remote TP analysis service.
///
/// # Examples
///
/// ```no_run
/// use tpcheck_core::config::ServiceConfig;
/// use tpcheck_core::service::{CheckOptions, TpServiceClient};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = TpServiceClient::new(ServiceConfig::default())?;
///
/// let program = "/PROG TEST\n/MN\n1: J P[1] 100% FINE;\n/END\n";
/// match client.check(program, &CheckOptions::default(), None).await {
///     Ok(batch) => println!("{} findings", batch.len()),
///     Err(error) => eprintln!("check failed (retriable: {})", error.is_retriable()),
/// }
/// # Ok(())
/// # }
/// ```
pub struct TpServiceClient {
    config: ServiceConfig,
    http_client: reqwest::Client,
}

impl TpServiceClient {
    /// Create a new client from a validated configuration.
    pub fn new(config: ServiceConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut builder =
            reqwest::Client::builder().connect_timeout(config.timeouts.connection_timeout());

        let mut headers = HeaderMap::new();
        for (key, value) in &config.headers {
            if let (Ok(name), Ok(val)) = (
                HeaderName::from_bytes(key.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                headers.insert(name, val);
            }
        }
        if !headers.is_empty() {
            builder = builder.default_headers(headers);
        }

        let http_client = builder
            .build()
            .map_err(|error| ConfigError(format!("failed to create HTTP client: {error}")))?;

        debug!(
            base_url = config.base_url(),
            connection_timeout_ms = config.timeouts.connection_timeout_ms,
            request_timeout_ms = config.timeouts.request_timeout_ms,
            "created service client"
        );

        Ok(Self {
            config,
            http_client,
        })
    }

    /// Get the configuration this client was built from.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Check a program for errors and warnings.
    #[instrument(skip(self, content, cancellation), fields(endpoint = "check"))]
    pub async fn check(
        &self,
        content: &str,
        options: &CheckOptions,
        cancellation: Option<CancellationToken>,
    ) -> ApiResult<DiagnosticBatch> {
        let descriptor = RequestDescriptor {
            endpoint: Endpoint::Check,
            body: content.to_string(),
            query: options.query(),
            timeout: self.config.timeouts.request_timeout(),
            cancellation,
        };
        match self.execute_with_retry(&descriptor).await? {
            ResponseBody::Json(value) => Ok(validate::batch_from_value(&value)),
            ResponseBody::Text(_) => Err(ApiError::invalid_response(
                "expected a JSON diagnostics payload, got text/plain",
            )),
        }
    }

    /// Format a program; the service returns the formatted text verbatim.
    #[instrument(skip(self, content, cancellation), fields(endpoint = "format"))]
    pub async fn format(
        &self,
        content: &str,
        cancellation: Option<CancellationToken>,
    ) -> ApiResult<FormatResult> {
        let descriptor = RequestDescriptor {
            endpoint: Endpoint::Format,
            body: content.to_string(),
            query: Vec::new(),
            timeout: self.config.timeouts.request_timeout(),
            cancellation,
        };
        match self.execute_with_retry(&descriptor).await? {
            ResponseBody::Text(content) => Ok(FormatResult { content }),
            ResponseBody::Json(_) => Err(ApiError::invalid_response(
                "expected a text/plain payload, got application/json",
            )),
        }
    }

    /// Check a program against a compliance rule set.
    #[instrument(skip(self, content, cancellation), fields(endpoint = "compliance"))]
    pub async fn compliance(
        &self,
        content: &str,
        options: &ComplianceOptions,
        cancellation: Option<CancellationToken>,
    ) -> ApiResult<DiagnosticBatch> {
        let descriptor = RequestDescriptor {
            endpoint: Endpoint::Compliance,
            body: content.to_string(),
            query: options.query(),
            timeout: self.config.timeouts.request_timeout(),
            cancellation,
        };
        match self.execute_with_retry(&descriptor).await? {
            ResponseBody::Json(value) => Ok(validate::batch_from_value(&value)),
            ResponseBody::Text(_) => Err(ApiError::invalid_response(
                "expected a JSON diagnostics payload, got text/plain",
            )),
        }
    }

    /// Execute a request, retrying retriable failures with exponential
    /// backoff while the retry budget lasts.
    ///
    /// Aborted, ClientError and InvalidResponse outcomes return immediately;
    /// cancellation is honored during backoff sleeps as well.
    async fn execute_with_retry(&self, descriptor: &RequestDescriptor) -> ApiResult<ResponseBody> {
        let max_retries = self.config.max_retries;
        let mut attempt: u32 = 0;

        loop {
            match self.execute(descriptor).await {
                Ok(body) => {
                    if attempt > 0 {
                        info!(attempt, "request succeeded after retry");
                    }
                    return Ok(body);
                }
                Err(error) => {
                    if !error.is_retriable() || attempt >= max_retries {
                        return Err(error);
                    }
                    let delay = RETRY_BASE_DELAY * 2u32.pow(attempt.min(5));
                    warn!(
                        attempt = attempt + 1,
                        max_attempts = max_retries + 1,
                        delay_ms = delay.as_millis() as u64,
                        kind = ?error.kind(),
                        "request failed, retrying"
                    );
                    if let Some(token) = &descriptor.cancellation {
                        tokio::select! {
                            _ = token.cancelled() => return Err(ApiError::aborted()),
                            _ = tokio::time::sleep(delay) => {}
                        }
                    } else {
                        tokio::time::sleep(delay).await;
                    }
                    attempt += 1;
                }
            }
        }
    }

    /// Execute a single attempt under the merged abort signal.
    async fn execute(&self, descriptor: &RequestDescriptor) -> ApiResult<ResponseBody> {
        let url = format!("{}{}", self.config.base_url(), descriptor.endpoint.path());

        let mut abort = MergedCancellation::new();
        abort.link_deadline(descriptor.timeout);
        if let Some(token) = &descriptor.cancellation {
            abort.link(token.clone());
        }

        let request = self
            .http_client
            .post(&url)
            .header(CONTENT_TYPE, REQUEST_CONTENT_TYPE)
            .query(&descriptor.query)
            .body(descriptor.body.clone());

        let call = async {
            let response = request.send().await.map_err(|error| {
                ApiError::network_with_source(
                    format!("analysis service unreachable at {url}"),
                    error,
                )
            })?;
            response::negotiate(response).await
        };

        tokio::select! {
            _ = abort.cancelled() => {
                debug!("request aborted by cancellation or deadline");
                Err(ApiError::aborted())
            }
            result = call => result,
        }
        // `abort` drops here, disposing the deadline watcher in every outcome
    }
}
