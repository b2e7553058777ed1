//! Diagnostic wire types and payload validation

pub mod types;
pub mod validate;


pub use types::{
    Diagnostic, DiagnosticBatch, DiagnosticCode, FormatResult, Position, Range, Severity,
};
