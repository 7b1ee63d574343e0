//! Global node identifiers
//!
//! A global id pairs a type name with a row id in a single opaque
//! token, base64 over `"type:id"`. Same codec family as cursors:
//! deterministic, URL-safe enough for query strings, and never
//! inspected by clients.

use std::fmt::Display;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::error::{Error, Result};

/// Encode a type name and row id into a global id token.
///
/// The id can be any displayable value; numeric ids render in decimal.
pub fn encode(type_name: &str, id: impl Display) -> String {
    STANDARD.encode(format!("{type_name}:{id}"))
}

/// Decode a token into its `(type_name, id)` parts.
///
/// The payload splits on the first `:`, so ids may themselves contain
/// colons. Fails with `GlobalId` when the token is not base64 text or
/// either part comes back empty.
pub fn decode(token: &str) -> Result<(String, String)> {
    let bytes = STANDARD
        .decode(token)
        .map_err(|_| Error::global_id("token is not valid base64"))?;
    let payload =
        String::from_utf8(bytes).map_err(|_| Error::global_id("token is not valid UTF-8"))?;

    let (type_name, id) = payload
        .split_once(':')
        .ok_or_else(|| Error::global_id("token carries no type:id payload"))?;
    if type_name.is_empty() || id.is_empty() {
        return Err(Error::global_id("node type or id is missing"));
    }

    Ok((type_name.to_string(), id.to_string()))
}

/// Decode a token that must belong to `type_name`, returning the id.
///
/// Fails with `GlobalId` when the embedded type differs, so callers
/// resolving a typed lookup never touch another table's ids.
pub fn decode_expected(token: &str, type_name: &str) -> Result<String> {
    let (embedded, id) = decode(token)?;
    if embedded != type_name {
        return Err(Error::global_id(format!(
            "expected a '{type_name}' id, token holds '{embedded}'"
        )));
    }
    Ok(id)
}
