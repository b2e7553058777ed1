//! Core error types for service calls

use thiserror::Error;

/// Result type alias for service operations
pub type ApiResult<T> = Result<T, ApiError>;

/// Classification of a failed service call.
///
/// Retriability is a pure function of the kind, never of the context the
/// failure occurred in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The transport could not reach the remote host
    Network,
    /// The service returned 429
    RateLimited,
    /// The service returned a 5xx status
    Server,
    /// The service returned another 4xx status
    Client,
    /// The response shape or encoding was unusable
    InvalidResponse,
    /// Local cancellation or timeout fired before completion
    Aborted,
}

impl ErrorKind {
    /// Whether a call that failed with this kind is worth retrying.
    pub fn is_retriable(self) -> bool {
        matches!(
            self,
            ErrorKind::Network | ErrorKind::RateLimited | ErrorKind::Server
        )
    }
}

/// Error type for all service call failures
///
/// Every call path through the client terminates in an `ApiResult`; no
/// classified condition is ever raised as a panic. Each variant carries the
/// context relevant to its kind.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The analysis service could not be reached
    #[error("analysis service unreachable: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The service asked us to back off
    #[error("rate limited by the analysis service (status {status_code})")]
    RateLimited { status_code: u16 },

    /// The service failed on its side
    #[error("analysis service error (status {status_code}): {message}")]
    Server { status_code: u16, message: String },

    /// The service rejected the request
    #[error("request rejected (status {status_code}): {message}")]
    Client { status_code: u16, message: String },

    /// The response could not be used
    #[error("invalid response: {message}")]
    InvalidResponse {
        message: String,
        status_code: Option<u16>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Cancellation or timeout fired before the call completed
    #[error("operation aborted before completion")]
    Aborted,
}

impl ApiError {
    /// Get the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Network { .. } => ErrorKind::Network,
            ApiError::RateLimited { .. } => ErrorKind::RateLimited,
            ApiError::Server { .. } => ErrorKind::Server,
            ApiError::Client { .. } => ErrorKind::Client,
            ApiError::InvalidResponse { .. } => ErrorKind::InvalidResponse,
            ApiError::Aborted => ErrorKind::Aborted,
        }
    }

    /// Get the HTTP status code, when the failure came from a produced response.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ApiError::RateLimited { status_code }
            | ApiError::Server { status_code, .. }
            | ApiError::Client { status_code, .. } => Some(*status_code),
            ApiError::InvalidResponse { status_code, .. } => *status_code,
            ApiError::Network { .. } | ApiError::Aborted => None,
        }
    }

    /// Whether retrying this call is advisable.
    pub fn is_retriable(&self) -> bool {
        self.kind().is_retriable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retriable_kinds() {
        assert!(ErrorKind::Network.is_retriable());
        assert!(ErrorKind::RateLimited.is_retriable());
        assert!(ErrorKind::Server.is_retriable());
        assert!(!ErrorKind::Client.is_retriable());
        assert!(!ErrorKind::InvalidResponse.is_retriable());
        assert!(!ErrorKind::Aborted.is_retriable());
    }

    #[test]
    fn test_status_code_accessor() {
        assert_eq!(ApiError::rate_limited(429).status_code(), Some(429));
        assert_eq!(ApiError::server(503, "down").status_code(), Some(503));
        assert_eq!(ApiError::client(404, "missing").status_code(), Some(404));
        assert_eq!(ApiError::network("unreachable").status_code(), None);
        assert_eq!(ApiError::aborted().status_code(), None);
    }

    #[test]
    fn test_error_retriability_matches_kind() {
        assert!(ApiError::network("unreachable").is_retriable());
        assert!(ApiError::rate_limited(429).is_retriable());
        assert!(!ApiError::client(400, "bad request").is_retriable());
        assert!(!ApiError::aborted().is_retriable());
    }
}
