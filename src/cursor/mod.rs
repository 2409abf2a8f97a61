//! Cursor module
//!
//! Opaque page tokens that carry everything needed to resume a traversal.
//!
//! # Overview
//!
//! A cursor is an ordered tuple of fields joined with a delimiter and then
//! base64 encoded. The last field is always the page size the traversal was
//! started with, so a resumed request keeps the original page size even if
//! the client asks for a different one.
//!
//! - `encode_cursor` / `decode_cursor` - the untyped codec
//! - `TimeCursor` - `(resume instant, total estimate?, page size)`
//! - `CatalogCursor` - `(office/identifier, total, page size)`

mod codec;
mod types;

pub use codec::{decode_cursor, encode_cursor, DEFAULT_DELIMITER};
pub use types::{CatalogCursor, CatalogKey, ResumePoint, TimeCursor};

#[cfg(test)]
mod tests;
