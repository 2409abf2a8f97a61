//! Cursor encoding and decoding
//!
//! Fields are joined with a delimiter and base64 encoded (standard alphabet,
//! padded). Decoding never falls back to a default: anything that is not a
//! valid token is reported as a malformed cursor.

use crate::error::{Error, Result};
use base64::Engine as _;
use std::fmt::Display;

/// Delimiter placed between cursor fields
pub const DEFAULT_DELIMITER: &str = "|||";

/// Encode an ordered sequence of fields into an opaque token
pub fn encode_cursor<I, T>(fields: I, delimiter: &str) -> String
where
    I: IntoIterator<Item = T>,
    T: Display,
{
    let joined = fields
        .into_iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join(delimiter);
    base64::engine::general_purpose::STANDARD.encode(joined)
}

/// Decode an opaque token into its ordered fields.
///
/// Returns `Ok(None)` for an empty token, which marks the start of a
/// traversal. Field count is not checked here; typed cursors do that.
pub fn decode_cursor(token: &str, delimiter: &str) -> Result<Option<Vec<String>>> {
    Ok(decode_text(token)?.map(|text| text.split(delimiter).map(str::to_string).collect()))
}

/// Decode a token into its joined field text, before any splitting
pub(crate) fn decode_text(token: &str) -> Result<Option<String>> {
    let token = token.trim();
    if token.is_empty() {
        return Ok(None);
    }

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(token)
        .map_err(|e| Error::malformed_cursor(token, format!("not a valid page token ({e})")))?;

    String::from_utf8(bytes)
        .map(Some)
        .map_err(|_| Error::malformed_cursor(token, "page token is not valid UTF-8"))
}
