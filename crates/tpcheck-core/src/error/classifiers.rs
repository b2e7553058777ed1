//! HTTP status classification

use super::types::{ApiError, ErrorKind};

/// Classify a non-2xx HTTP status into an error kind.
///
/// Evaluated only when the transport actually produced a response; transport
/// failures never reach this function.
pub(crate) fn classify_failure_status(status: u16) -> ErrorKind {
    match status {
        429 => ErrorKind::RateLimited,
        500..=599 => ErrorKind::Server,
        400..=499 => ErrorKind::Client,
        _ => ErrorKind::InvalidResponse,
    }
}

/// Build the `ApiError` for a non-2xx response, folding the body text into
/// the message where the kind carries one.
pub(crate) fn classify_failure_response(status: u16, body: &str) -> ApiError {
    let message = if body.trim().is_empty() {
        "no response body".to_string()
    } else {
        body.trim().to_string()
    };

    match classify_failure_status(status) {
        ErrorKind::RateLimited => ApiError::rate_limited(status),
        ErrorKind::Server => ApiError::server(status, message),
        ErrorKind::Client => ApiError::client(status, message),
        _ => ApiError::invalid_response_with_status(
            format!("unexpected status {status}: {message}"),
            status,
        ),
    }
}
