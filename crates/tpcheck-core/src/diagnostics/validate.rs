//! Structural validation of decoded service payloads
//!
//! The service is trusted for availability, not for shape: every payload is
//! checked field by field before anything downstream sees it. Validation
//! fails open; a malformed payload becomes an empty batch with a warning,
//! never a panic or an error surfaced to the consumer pipeline.

use serde_json::Value;
use tracing::warn;

use super::types::{Diagnostic, DiagnosticBatch, DiagnosticCode, Position, Range, Severity};

fn position(value: &Value) -> Option<Position> {
    let object = value.as_object()?;
    let line = u32::try_from(object.get("line")?.as_u64()?).ok()?;
    let character = u32::try_from(object.get("character")?.as_u64()?).ok()?;
    Some(Position::new(line, character))
}

fn range(value: &Value) -> Option<Range> {
    let object = value.as_object()?;
    Some(Range::new(
        position(object.get("start")?)?,
        position(object.get("end")?)?,
    ))
}

fn code(value: &Value) -> Option<DiagnosticCode> {
    match value {
        Value::String(text) => Some(DiagnosticCode::Text(text.clone())),
        Value::Number(number) => number.as_i64().map(DiagnosticCode::Number),
        _ => None,
    }
}

fn diagnostic(value: &Value) -> Option<Diagnostic> {
    let object = value.as_object()?;
    let range = range(object.get("range")?)?;
    let severity = Severity::from_wire(object.get("severity")?.as_u64()?)?;
    let message = object.get("message")?.as_str()?.to_string();
    let code = match object.get("code") {
        None => None,
        Some(value) => Some(code(value)?),
    };
    let source = match object.get("source") {
        None => None,
        Some(value) => Some(value.as_str()?.to_string()),
    };
    Some(Diagnostic {
        range,
        severity,
        message,
        code,
        source,
    })
}

fn batch(value: &Value) -> Option<DiagnosticBatch> {
    let items = value.as_object()?.get("diagnostics")?.as_array()?;
    let mut diagnostics = Vec::with_capacity(items.len());
    for item in items {
        diagnostics.push(diagnostic(item)?);
    }
    Some(DiagnosticBatch { diagnostics })
}

/// Validate an already-decoded payload against the diagnostics schema.
///
/// Any non-conformance anywhere in the payload drops the whole batch, not
/// just the offending entry; a partially-validated batch would misrepresent
/// what the service said.
pub fn batch_from_value(value: &Value) -> DiagnosticBatch {
    match batch(value) {
        Some(batch) => batch,
        None => {
            warn!("malformed diagnostics payload dropped");
            DiagnosticBatch::empty()
        }
    }
}

/// Validate a raw response body.
///
/// Empty and whitespace-only input is a valid "nothing to report"; input
/// that fails to decode as JSON at all is dropped with a warning.
pub fn batch_from_text(text: &str) -> DiagnosticBatch {
    if text.trim().is_empty() {
        return DiagnosticBatch::empty();
    }
    match serde_json::from_str::<Value>(text) {
        Ok(value) => batch_from_value(&value),
        Err(error) => {
            warn!(error = %error, "undecodable diagnostics payload dropped");
            DiagnosticBatch::empty()
        }
    }
}
