//! Page requests, page results and catalog entries
//!
//! Everything here is request-scoped: built for one response and dropped
//! with it. The only value that outlives a request is the opaque cursor
//! carried in `page` / `next-page`.

use crate::cursor::CatalogKey;
use crate::error::{Error, Result};
use crate::source::TimeSeriesRow;
use crate::time::format_zoned;
use crate::types::{DatasetKind, JsonObject, JsonValue, UnitSelector};
use chrono::{DateTime, Duration};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize, Serializer};

// ============================================================================
// Paging Options
// ============================================================================

/// Service-wide paging limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagingOptions {
    /// Page size used when a request names none
    pub default_page_size: i64,
    /// Requested sizes above this are clamped
    pub max_page_size: i64,
    /// Trailing window used when `begin` is absent
    pub default_window: Duration,
}

impl Default for PagingOptions {
    fn default() -> Self {
        Self {
            default_page_size: 500,
            max_page_size: 5000,
            default_window: Duration::hours(24),
        }
    }
}

impl PagingOptions {
    /// Page size for the first page of a traversal.
    ///
    /// `0` is kept as the metadata-only sentinel.
    pub fn effective_page_size(&self, requested: Option<i64>) -> Result<i64> {
        match requested {
            None => Ok(self.default_page_size),
            Some(size) if size < 0 => Err(Error::invalid_parameter(
                "page-size",
                format!("page size must not be negative, got {size}"),
            )),
            Some(size) if size > self.max_page_size => {
                tracing::warn!(
                    requested = size,
                    max = self.max_page_size,
                    "Requested page size clamped"
                );
                Ok(self.max_page_size)
            }
            Some(size) => Ok(size),
        }
    }
}

// ============================================================================
// Requests
// ============================================================================

/// Request for one page of a time series
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimeSeriesRequest {
    pub name: String,
    pub office: Option<String>,
    pub units: UnitSelector,
    pub begin: Option<String>,
    pub end: Option<String>,
    pub timezone: Option<String>,
    /// Opaque cursor from a previous page
    pub page: Option<String>,
    /// Ignored when `page` carries a cursor
    pub page_size: Option<i64>,
}

impl TimeSeriesRequest {
    /// Request the first page of a series
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the office
    pub fn with_office(mut self, office: impl Into<String>) -> Self {
        self.office = Some(office.into());
        self
    }

    /// Set the window bounds
    pub fn with_window(mut self, begin: impl Into<String>, end: impl Into<String>) -> Self {
        self.begin = Some(begin.into());
        self.end = Some(end.into());
        self
    }

    /// Set the timezone
    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = Some(timezone.into());
        self
    }

    /// Set the requested page size
    pub fn with_page_size(mut self, page_size: i64) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Continue from a cursor
    pub fn with_page(mut self, page: impl Into<String>) -> Self {
        self.page = Some(page.into());
        self
    }
}

/// Request for one page of a catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogRequest {
    pub dataset: DatasetKind,
    pub office: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<i64>,
}

impl CatalogRequest {
    /// Request the first page of a catalog
    pub fn new(dataset: DatasetKind) -> Self {
        Self {
            dataset,
            office: None,
            page: None,
            page_size: None,
        }
    }

    /// Restrict to one office
    pub fn with_office(mut self, office: impl Into<String>) -> Self {
        self.office = Some(office.into());
        self
    }

    /// Set the requested page size
    pub fn with_page_size(mut self, page_size: i64) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Continue from a cursor
    pub fn with_page(mut self, page: impl Into<String>) -> Self {
        self.page = Some(page.into());
        self
    }
}

// ============================================================================
// Pages
// ============================================================================

/// Paging fields shared by every page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PageInfo {
    /// Cursor reproducing this page
    pub page: Option<String>,
    /// Cursor of the following page; absent once the traversal is exhausted
    pub next_page: Option<String>,
    pub page_size: i64,
    /// Advisory for time series, exact-at-start for catalogs
    pub total: u64,
}

impl PageInfo {
    /// Whether more pages follow
    pub fn has_more(&self) -> bool {
        self.next_page.is_some()
    }
}

/// Column description for `values` arrays
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValueColumn {
    pub name: &'static str,
    pub ordinal: u8,
    pub datatype: &'static str,
}

/// Columns of a `[epochMillis, value, qualityCode]` row
pub static VALUE_COLUMNS: [ValueColumn; 3] = [
    ValueColumn {
        name: "date-time",
        ordinal: 1,
        datatype: "timestamp",
    },
    ValueColumn {
        name: "value",
        ordinal: 2,
        datatype: "double",
    },
    ValueColumn {
        name: "quality-code",
        ordinal: 3,
        datatype: "integer",
    },
];

fn serialize_zoned<S: Serializer>(
    dt: &DateTime<Tz>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_zoned(dt))
}

/// ISO-8601 duration in hours and minutes, `PT0S` for irregular series
pub(crate) fn iso_interval(minutes: i64) -> String {
    let (hours, minutes) = (minutes / 60, minutes % 60);
    match (hours, minutes) {
        (0, 0) => "PT0S".to_string(),
        (0, m) => format!("PT{m}M"),
        (h, 0) => format!("PT{h}H"),
        (h, m) => format!("PT{h}H{m}M"),
    }
}

fn serialize_interval<S: Serializer>(
    minutes: &i64,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&iso_interval(*minutes))
}

/// One page of a time series
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct TimeSeriesPage {
    pub name: String,
    pub office_id: String,
    pub units: String,
    /// Sampling interval, rendered as an ISO-8601 duration
    #[serde(serialize_with = "serialize_interval")]
    pub interval: i64,
    pub interval_minutes: i64,
    #[serde(serialize_with = "serialize_zoned")]
    pub begin: DateTime<Tz>,
    #[serde(serialize_with = "serialize_zoned")]
    pub end: DateTime<Tz>,
    #[serde(flatten)]
    pub paging: PageInfo,
    pub value_columns: &'static [ValueColumn],
    pub values: Vec<TimeSeriesRow>,
}

/// One page of a catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Catalog {
    #[serde(flatten)]
    pub paging: PageInfo,
    pub entries: Vec<CatalogEntry>,
}

// ============================================================================
// Catalog Entries
// ============================================================================

/// A time series listed in a catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TimeSeriesEntry {
    pub office: String,
    pub name: String,
    pub units: String,
    pub interval_minutes: i64,
}

/// Alternate name of a location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationAlias {
    pub name: String,
    pub value: String,
}

fn default_active() -> bool {
    true
}

/// A location listed in a catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LocationEntry {
    pub office: String,
    pub name: String,
    #[serde(default)]
    pub nearest_city: Option<String>,
    #[serde(default)]
    pub public_name: Option<String>,
    #[serde(default)]
    pub long_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub location_type: Option<String>,
    #[serde(default)]
    pub time_zone: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub elevation: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub aliases: Vec<LocationAlias>,
}

impl LocationEntry {
    /// An active location with no descriptive fields
    pub fn new(office: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            office: office.into(),
            name: name.into(),
            nearest_city: None,
            public_name: None,
            long_name: None,
            description: None,
            kind: None,
            location_type: None,
            time_zone: None,
            latitude: None,
            longitude: None,
            elevation: None,
            unit: None,
            state: None,
            active: true,
            aliases: Vec::new(),
        }
    }
}

/// Catalog entry, tagged by `entry-type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "entry-type", rename_all = "kebab-case")]
pub enum CatalogEntry {
    Timeseries(TimeSeriesEntry),
    Location(LocationEntry),
}

impl CatalogEntry {
    /// Owning office
    pub fn office(&self) -> &str {
        match self {
            CatalogEntry::Timeseries(e) => &e.office,
            CatalogEntry::Location(e) => &e.office,
        }
    }

    /// Identifier within the office
    pub fn identifier(&self) -> &str {
        match self {
            CatalogEntry::Timeseries(e) => &e.name,
            CatalogEntry::Location(e) => &e.name,
        }
    }

    /// Position of this entry in catalog order
    pub fn key(&self) -> CatalogKey {
        CatalogKey::new(self.office(), self.identifier())
    }

    /// Flat record: descriptive fields as top-level keys, absent values
    /// omitted, aliases as `alias.<name>` keys.
    pub fn to_record(&self) -> JsonObject {
        let mut record = JsonObject::new();
        let Ok(JsonValue::Object(fields)) = serde_json::to_value(self) else {
            return record;
        };

        for (key, value) in fields {
            match value {
                JsonValue::Null => {}
                JsonValue::Array(aliases) if key == "aliases" => {
                    for alias in aliases {
                        if let (Some(name), Some(value)) = (
                            alias.get("name").and_then(JsonValue::as_str),
                            alias.get("value"),
                        ) {
                            record.insert(format!("alias.{name}"), value.clone());
                        }
                    }
                }
                other => {
                    record.insert(key, other);
                }
            }
        }
        record
    }
}
