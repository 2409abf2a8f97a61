//! Typed cursors for the two paginators

use super::codec::{decode_cursor, decode_text, encode_cursor, DEFAULT_DELIMITER};
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use std::fmt;

// ============================================================================
// Time Window Cursor
// ============================================================================

/// Where the next time-window page starts.
///
/// `skip` counts rows at exactly `instant` that earlier pages already
/// emitted, so rows sharing a timestamp are never repeated or lost.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResumePoint {
    pub instant: DateTime<Utc>,
    pub skip: usize,
}

impl ResumePoint {
    /// Resume point at an instant with nothing to skip
    pub fn at(instant: DateTime<Utc>) -> Self {
        Self { instant, skip: 0 }
    }

    fn parse(field: &str, token: &str) -> Result<Self> {
        let (millis, skip) = match field.split_once('+') {
            Some((millis, skip)) => {
                let skip = skip.parse::<usize>().map_err(|_| {
                    Error::malformed_cursor(token, format!("invalid tie offset '{skip}'"))
                })?;
                (millis, skip)
            }
            None => (field, 0),
        };

        let millis = millis.parse::<i64>().map_err(|_| {
            Error::malformed_cursor(token, format!("invalid resume time '{millis}'"))
        })?;
        let instant = DateTime::from_timestamp_millis(millis).ok_or_else(|| {
            Error::malformed_cursor(token, format!("resume time {millis} is out of range"))
        })?;

        Ok(Self { instant, skip })
    }
}

impl fmt::Display for ResumePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.skip == 0 {
            write!(f, "{}", self.instant.timestamp_millis())
        } else {
            write!(f, "{}+{}", self.instant.timestamp_millis(), self.skip)
        }
    }
}

/// Cursor of a time-window traversal: `(resume instant, total?, page size)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeCursor {
    pub resume: ResumePoint,
    /// Advisory total taken from the first page
    pub total: Option<u64>,
    pub page_size: i64,
}

impl TimeCursor {
    /// Encode into an opaque token
    pub fn encode(&self) -> String {
        let mut fields = vec![self.resume.to_string()];
        if let Some(total) = self.total {
            fields.push(total.to_string());
        }
        fields.push(self.page_size.to_string());
        encode_cursor(fields, DEFAULT_DELIMITER)
    }

    /// Decode a token; `Ok(None)` when the token is empty
    pub fn decode(token: &str) -> Result<Option<Self>> {
        let Some(parts) = decode_cursor(token, DEFAULT_DELIMITER)? else {
            return Ok(None);
        };

        let (resume, total, page_size) = match parts.as_slice() {
            [resume, page_size] => (resume, None, page_size),
            [resume, total, page_size] => (resume, Some(total), page_size),
            _ => {
                return Err(Error::malformed_cursor(
                    token,
                    format!("expected 2 or 3 fields, found {}", parts.len()),
                ))
            }
        };

        let total = total
            .map(|t| {
                t.parse::<u64>()
                    .map_err(|_| Error::malformed_cursor(token, format!("invalid total '{t}'")))
            })
            .transpose()?;

        Ok(Some(Self {
            resume: ResumePoint::parse(resume, token)?,
            total,
            page_size: parse_page_size(page_size, token)?,
        }))
    }
}

// ============================================================================
// Catalog Cursor
// ============================================================================

/// Compound `office/identifier` position in a catalog
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CatalogKey {
    pub office: String,
    pub identifier: String,
}

impl CatalogKey {
    /// Create a key
    pub fn new(office: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self {
            office: office.into(),
            identifier: identifier.into(),
        }
    }

    /// Sentinel that sorts before every real identifier
    pub fn start() -> Self {
        Self::default()
    }

    /// Whether this is the start sentinel
    pub fn is_start(&self) -> bool {
        self.office.is_empty() && self.identifier.is_empty()
    }

    /// Case-insensitive ordering key: identifier first, office as tie-break
    pub fn sort_key(&self) -> (String, String) {
        (self.identifier.to_uppercase(), self.office.to_uppercase())
    }

    /// Split a cursor field on its first `/` only
    fn from_field(field: &str) -> Self {
        match field.split_once('/') {
            Some((office, identifier)) => Self::new(office, identifier),
            None => Self::new("", field),
        }
    }
}

impl fmt::Display for CatalogKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.office, self.identifier)
    }
}

/// Cursor of a catalog traversal: `(office/identifier, total, page size)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogCursor {
    pub last_seen: CatalogKey,
    /// Exact total counted on the first page, pinned for the traversal
    pub total: u64,
    pub page_size: i64,
}

impl CatalogCursor {
    /// Encode into an opaque token
    pub fn encode(&self) -> String {
        encode_cursor(
            [
                self.last_seen.to_string(),
                self.total.to_string(),
                self.page_size.to_string(),
            ],
            DEFAULT_DELIMITER,
        )
    }

    /// Decode a token; `Ok(None)` when the token is empty.
    ///
    /// Total and page size are split off from the right so an identifier
    /// containing or ending in delimiter characters stays a single key.
    pub fn decode(token: &str) -> Result<Option<Self>> {
        let Some(text) = decode_text(token)? else {
            return Ok(None);
        };

        let mut fields = text.rsplitn(3, DEFAULT_DELIMITER);
        let (Some(page_size), Some(total), Some(key)) = (fields.next(), fields.next(), fields.next())
        else {
            return Err(Error::malformed_cursor(
                token,
                format!("expected 3 fields, found {}", text.split(DEFAULT_DELIMITER).count()),
            ));
        };

        let total = total
            .parse::<u64>()
            .map_err(|_| Error::malformed_cursor(token, format!("invalid total '{total}'")))?;

        Ok(Some(Self {
            last_seen: CatalogKey::from_field(key),
            total,
            page_size: parse_page_size(page_size, token)?,
        }))
    }
}

fn parse_page_size(field: &str, token: &str) -> Result<i64> {
    match field.parse::<i64>() {
        Ok(size) if size >= 0 => Ok(size),
        _ => Err(Error::malformed_cursor(
            token,
            format!("invalid page size '{field}'"),
        )),
    }
}
