//! tpcheck editor integration core
//!
//! This crate is the integration layer between an interactive editor and the
//! remote tpcheck analysis service. It provides the resilient transport
//! client with its error taxonomy, the fail-open response validator, the
//! per-document debounce/supersede scheduler, the staleness gate, and the
//! engine that wires them together. Editor surfaces (decorations, status
//! bars, command registration) live with the embedder and talk to this crate
//! through [`host::DocumentHost`] and the engine/client entry points.

pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod host;
pub mod interrupt;
pub mod scheduler;
pub mod service;
pub mod staleness;


// Re-export commonly used types
pub use config::{ServiceConfig, TimeoutConfig, DEFAULT_BASE_URL};
pub use diagnostics::{
    Diagnostic, DiagnosticBatch, DiagnosticCode, FormatResult, Position, Range, Severity,
};
pub use engine::AnalysisEngine;
pub use error::{ApiError, ApiResult, ErrorKind};
pub use host::DocumentHost;
pub use interrupt::MergedCancellation;
pub use scheduler::{DispatchFn, KeyedScheduler};
pub use service::{CheckOptions, ComplianceOptions, TpServiceClient};
pub use staleness::StalenessGuard;
