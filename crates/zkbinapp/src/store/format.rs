//! On-disk record encoding.
//!
//! Current records start with a protection line followed by the JSON payload:
//!
//! ```text
//! <?php http_response_code(403); /*
//! {"adata":[...],"ct":"...","meta":{"created":1344803344},"v":2}
//! ```
//!
//! A server that naively executes or serves the raw file answers 403 and
//! treats the payload as a comment. Every `/` inside the JSON is written as
//! `\/`, so the payload can never contain the `*/` that would close it.
//!
//! Legacy records are the bare JSON encoding with no protection line.
//! JSON text never starts with `<`, so the two encodings cannot be confused.

use crate::error::{Result, ZkbinError};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// First line of every current-format file.
pub const PROTECTION_LINE: &str = "<?php http_response_code(403); /*";

/// True if `raw` starts with the current-format protection line.
pub fn is_current(raw: &[u8]) -> bool {
    raw.starts_with(PROTECTION_LINE.as_bytes())
}

/// Encodes a record in the current format.
pub fn encode_record<T: Serialize>(record: &T) -> Result<Vec<u8>> {
    let json = serde_json::to_string(record)?;
    Ok(wrap(&json.replace('/', "\\/")))
}

/// Decodes a current-format record. Fails if the protection line is missing
/// or the payload does not parse as `T`.
pub fn decode_record<T: DeserializeOwned>(raw: &[u8], location: &str) -> Result<T> {
    let payload = unwrap(raw).ok_or_else(|| ZkbinError::CorruptRecord(location.to_string()))?;
    Ok(serde_json::from_slice(payload)?)
}

/// Parses a legacy record: bare JSON, no protection line.
pub fn decode_legacy<T: DeserializeOwned>(raw: &[u8]) -> Result<T> {
    Ok(serde_json::from_slice(raw)?)
}

/// Encodes a scalar namespace value.
pub fn encode_value(value: &str) -> Vec<u8> {
    wrap(value)
}

/// Decodes a scalar namespace value, `None` when the protection line is missing.
pub fn decode_value(raw: &[u8]) -> Option<String> {
    unwrap(raw).and_then(|payload| String::from_utf8(payload.to_vec()).ok())
}

fn wrap(payload: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(PROTECTION_LINE.len() + 1 + payload.len());
    out.extend_from_slice(PROTECTION_LINE.as_bytes());
    out.push(b'\n');
    out.extend_from_slice(payload.as_bytes());
    out
}

fn unwrap(raw: &[u8]) -> Option<&[u8]> {
    let rest = raw.strip_prefix(PROTECTION_LINE.as_bytes())?;
    // tolerate CRLF written by other implementations
    let rest = rest.strip_prefix(b"\r").unwrap_or(rest);
    Some(rest.strip_prefix(b"\n").unwrap_or(rest))
}
