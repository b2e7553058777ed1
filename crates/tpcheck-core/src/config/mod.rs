//! Client configuration

mod service;

pub use service::{ConfigError, ServiceConfig, TimeoutConfig, DEFAULT_BASE_URL};
