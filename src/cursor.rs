//! Cursor encoding and decoding
//!
//! A cursor is the sort-key tuple of a boundary row serialized as
//! base64 over a JSON array. Tokens are opaque to callers,
//! deterministic for a given row and spec, and self-validating on
//! arity: a token that does not decode to exactly one value per spec
//! column is rejected.

use crate::error::{Error, Result};
use crate::sortkey::SortKeySpec;
use crate::types::{JsonValue, Row};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

/// Upper bound on accepted token length, checked before any decoding
/// work. Real cursors stay far below this.
pub const MAX_CURSOR_LEN: usize = 4096;

/// Encode the cursor for `row` under `spec`.
///
/// Values are extracted in spec column order; a column absent from the
/// row encodes as null.
pub fn encode(row: &Row, spec: &SortKeySpec) -> Result<String> {
    let tuple: Vec<JsonValue> = spec
        .columns
        .iter()
        .map(|col| row.get(&col.column).cloned().unwrap_or(JsonValue::Null))
        .collect();
    encode_tuple(&tuple)
}

/// Encode an already-projected tuple
pub fn encode_tuple(tuple: &[JsonValue]) -> Result<String> {
    let payload = serde_json::to_string(tuple)?;
    Ok(STANDARD.encode(payload))
}

/// Decode a token against `spec`, returning the cursor tuple.
///
/// Fails with `InvalidCursor` when the token is oversized, is not
/// valid base64, does not hold a JSON array, or the array length does
/// not match the spec arity.
pub fn decode(token: &str, spec: &SortKeySpec) -> Result<Vec<JsonValue>> {
    let tuple = decode_unchecked(token)?;

    if tuple.len() != spec.arity() {
        return Err(Error::invalid_cursor(format!(
            "expected {} values, got {}",
            spec.arity(),
            tuple.len()
        )));
    }

    Ok(tuple)
}

/// Decode a token without checking arity.
///
/// For inspecting tokens with no spec at hand; paging paths go through
/// `decode`, which also enforces arity.
pub fn decode_unchecked(token: &str) -> Result<Vec<JsonValue>> {
    if token.len() > MAX_CURSOR_LEN {
        return Err(Error::invalid_cursor(format!(
            "token exceeds {MAX_CURSOR_LEN} bytes"
        )));
    }

    let bytes = STANDARD
        .decode(token)
        .map_err(|_| Error::invalid_cursor("token is not valid base64"))?;

    let tuple: Vec<JsonValue> = serde_json::from_slice(&bytes)
        .map_err(|_| Error::invalid_cursor("payload is not a JSON array"))?;

    Ok(tuple)
}
