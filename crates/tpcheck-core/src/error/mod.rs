//! Error types for service calls
//!
//! Every failure mode of a service call is classified into one of six kinds,
//! and retriability is a pure function of the kind. The client never raises
//! for a classified condition; every call path terminates in an [`ApiResult`].

mod classifiers;
mod constructors;
mod types;

pub(crate) use classifiers::classify_failure_response;
pub use types::{ApiError, ApiResult, ErrorKind};
