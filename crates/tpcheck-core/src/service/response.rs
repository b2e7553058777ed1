//! Response classification and body negotiation
//!
//! Three independent stages, each with its own error kind: did the transport
//! produce a response at all (handled by the caller), was the status
//! acceptable, and was the body decodable under its declared content type.
//! Keeping them separate is what distinguishes "the service is down" from
//! "the service sent garbage".

use reqwest::Response;
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use tracing::debug;

use crate::error::{classify_failure_response, ApiError, ApiResult};

/// A decoded 2xx payload, keyed by the declared content type.
#[derive(Debug)]
pub(crate) enum ResponseBody {
    Json(Value),
    Text(String),
}

/// Classify the status and negotiate the body encoding of a produced response.
pub(crate) async fn negotiate(response: Response) -> ApiResult<ResponseBody> {
    let status = response.status();

    if !status.is_success() {
        let status_code = status.as_u16();
        let body = response.text().await.unwrap_or_default();
        debug!(status = status_code, "service returned failure status");
        return Err(classify_failure_response(status_code, &body));
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
        .to_string();

    let text = response.text().await.map_err(|error| {
        ApiError::network_with_source("connection lost while reading response body", error)
    })?;

    if content_type.starts_with("application/json") {
        let value: Value = serde_json::from_str(&text).map_err(|error| {
            ApiError::invalid_response_with_source("response declared JSON but failed to parse", error)
        })?;
        Ok(ResponseBody::Json(value))
    } else if content_type.starts_with("text/plain") {
        Ok(ResponseBody::Text(text))
    } else if content_type.is_empty() {
        Err(ApiError::invalid_response(
            "response did not declare a content type",
        ))
    } else {
        Err(ApiError::invalid_response(format!(
            "unexpected content type `{content_type}`"
        )))
    }
}
