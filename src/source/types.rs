//! Data source capability and the rows it returns

use crate::cursor::CatalogKey;
use crate::error::Result;
use crate::pagination::CatalogEntry;
use crate::types::{DatasetKind, TimeSeriesId, UnitSelector};
use crate::units;
use chrono::{DateTime, Utc};
use serde::ser::SerializeTuple;
use serde::{Serialize, Serializer};

/// One time series sample.
///
/// Serialized as `[epochMillis, value, qualityCode]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSeriesRow {
    pub instant: DateTime<Utc>,
    pub value: Option<f64>,
    pub quality: i32,
}

impl TimeSeriesRow {
    /// Create a row from epoch milliseconds
    pub fn from_millis(millis: i64, value: Option<f64>, quality: i32) -> Option<Self> {
        DateTime::from_timestamp_millis(millis).map(|instant| Self {
            instant,
            value,
            quality,
        })
    }

    /// Epoch milliseconds of the sample
    pub fn millis(&self) -> i64 {
        self.instant.timestamp_millis()
    }
}

impl Serialize for TimeSeriesRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(3)?;
        tuple.serialize_element(&self.millis())?;
        tuple.serialize_element(&self.value)?;
        tuple.serialize_element(&self.quality)?;
        tuple.end()
    }
}

/// Descriptive information about a resolved series
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesMetadata {
    /// Name as stored by the source
    pub name: String,
    /// Owning office as stored by the source
    pub office: String,
    /// Unit values are returned in
    pub units: String,
    pub interval_minutes: i64,
}

impl SeriesMetadata {
    /// Build metadata for a stored series, resolving the requested units.
    ///
    /// Fails with `UnitConversion` when stored values cannot be expressed in
    /// the requested unit.
    pub fn resolve(
        name: &str,
        office: &str,
        stored_units: &str,
        selector: &UnitSelector,
    ) -> Result<Self> {
        let units = units::resolve_units(name, stored_units, selector);
        units::conversion(stored_units, &units)?;

        let interval_minutes = name
            .parse::<TimeSeriesId>()
            .map(|id| id.interval_minutes())
            .unwrap_or(0);

        Ok(Self {
            name: name.to_string(),
            office: office.to_string(),
            units,
            interval_minutes,
        })
    }
}

/// Query capability consumed by the paginators.
///
/// Calls are synchronous and may block on I/O; async callers run them on a
/// blocking thread. Implementations must return rows sharing an instant in a
/// stable order so tie offsets in cursors stay meaningful.
pub trait DataSource: Send + Sync {
    /// Resolve a series by name (case-insensitive).
    ///
    /// `office` may be omitted only when the name is unique across offices.
    fn series_metadata(
        &self,
        name: &str,
        office: Option<&str>,
        units: &UnitSelector,
    ) -> Result<SeriesMetadata>;

    /// Rows with `from <= instant <= to`, ascending, converted into `units`
    fn query_time_window(
        &self,
        series: &str,
        office: &str,
        units: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        limit: Option<usize>,
    ) -> Result<Vec<TimeSeriesRow>>;

    /// Advisory number of rows in `[from, to]`
    fn query_window_count(
        &self,
        series: &str,
        office: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<u64>;

    /// Entries strictly after `after` in `(upper(identifier), upper(office))` order
    fn query_identifiers_after(
        &self,
        kind: DatasetKind,
        after: &CatalogKey,
        office: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<CatalogEntry>>;

    /// Exact number of entries of a kind
    fn count_identifiers(&self, kind: DatasetKind, office: Option<&str>) -> Result<u64>;
}
