//! Terminal payload decoding
//!
//! Normalizes a terminal result payload into a single output-or-error
//! outcome. Decoding is pure: the same payload and encoding always
//! produce the same outcome.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::domain::outcome::ExecutionOutcome;
use crate::domain::status::ExecutionStatus;
use crate::dto::result::ResultResponse;

/// Sentinel output for a successful run that produced no text at all
pub const NO_OUTPUT: &str = "No output";

/// Transport encoding applied by the service to stdout/stderr
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportEncoding {
    Plain,
    Base64,
}

/// Decode a terminal payload into an outcome.
///
/// Selection order: non-empty stdout wins, then non-empty stderr, then a
/// fixed sentinel. A success status routes the selected stdout to
/// `output`; any other terminal status routes it to `error`. Stderr
/// always lands in `error`, and a terminal failure with no text at all
/// surfaces the status description.
pub fn decode(payload: &ResultResponse, encoding: TransportEncoding) -> ExecutionOutcome {
    let status = payload.status.interpret();
    let stdout = text_field(payload.stdout.as_deref(), encoding);
    let stderr = text_field(payload.stderr.as_deref(), encoding);

    match (stdout, stderr, status) {
        (Some(out), _, ExecutionStatus::Succeeded) => ExecutionOutcome::output(out),
        (Some(out), _, _) => ExecutionOutcome::error(out),
        (None, Some(err), _) => ExecutionOutcome::error(err),
        (None, None, ExecutionStatus::Succeeded) => ExecutionOutcome::output(NO_OUTPUT),
        (None, None, ExecutionStatus::Failed(description)) => ExecutionOutcome::error(description),
        // Callers pass terminal payloads; a non-terminal one falls back
        // to its status description.
        (None, None, ExecutionStatus::Processing) => {
            ExecutionOutcome::error(payload.status.description.clone())
        }
    }
}

/// Decodes one optional stream field, dropping it when empty after
/// decoding.
fn text_field(raw: Option<&str>, encoding: TransportEncoding) -> Option<String> {
    let raw = raw?;
    let text = match encoding {
        TransportEncoding::Plain => raw.to_string(),
        TransportEncoding::Base64 => decode_base64_lossy(raw),
    };
    if text.is_empty() { None } else { Some(text) }
}

/// Best-effort base64 decode.
///
/// The service appends newlines to encoded fields, so ASCII whitespace is
/// stripped before decoding. Malformed input and non-UTF-8 payloads fall
/// back to the raw string; this function never fails.
fn decode_base64_lossy(raw: &str) -> String {
    let compact: String = raw.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    match STANDARD.decode(compact.as_bytes()) {
        Ok(bytes) => String::from_utf8(bytes).unwrap_or_else(|_| raw.to_string()),
        Err(_) => raw.to_string(),
    }
}
