//! Constructor methods for ApiError

use super::types::ApiError;

impl ApiError {
    /// Create a network error
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            source: None,
        }
    }

    /// Create a network error carrying the underlying transport failure
    pub fn network_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Network {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a rate-limit error
    pub fn rate_limited(status_code: u16) -> Self {
        Self::RateLimited { status_code }
    }

    /// Create a server-side error
    pub fn server(status_code: u16, message: impl Into<String>) -> Self {
        Self::Server {
            status_code,
            message: message.into(),
        }
    }

    /// Create a client-side rejection error
    pub fn client(status_code: u16, message: impl Into<String>) -> Self {
        Self::Client {
            status_code,
            message: message.into(),
        }
    }

    /// Create an invalid-response error
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
            status_code: None,
            source: None,
        }
    }

    /// Create an invalid-response error for an unclassifiable status
    pub fn invalid_response_with_status(message: impl Into<String>, status_code: u16) -> Self {
        Self::InvalidResponse {
            message: message.into(),
            status_code: Some(status_code),
            source: None,
        }
    }

    /// Create an invalid-response error carrying the parse failure
    pub fn invalid_response_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::InvalidResponse {
            message: message.into(),
            status_code: None,
            source: Some(Box::new(source)),
        }
    }

    /// Create an aborted error
    pub fn aborted() -> Self {
        Self::Aborted
    }
}
