//! JSON seed documents
//!
//! ```json
//! {
//!   "timeseries": [
//!     { "office": "SWT", "name": "Keystone.Flow.Inst.1Hour.0.Rev", "units": "cfs",
//!       "values": [[1704067200000, 1250.0, 0]] }
//!   ],
//!   "locations": [{ "office": "SWT", "name": "Keystone", "time-zone": "America/Chicago" }]
//! }
//! ```

use super::types::TimeSeriesRow;
use crate::error::{Error, Result, ResultExt};
use crate::pagination::LocationEntry;
use serde::Deserialize;
use std::path::Path;

/// Anything a seed can be written into
pub trait SeedTarget {
    /// Register a series stored in `units`
    fn add_series(&self, office: &str, name: &str, units: &str) -> Result<()>;

    /// Append samples to a registered series
    fn append_values(&self, office: &str, name: &str, rows: &[TimeSeriesRow]) -> Result<usize>;

    /// Add or replace a location
    fn add_location(&self, location: LocationEntry) -> Result<()>;
}

/// One series in a seed document
#[derive(Debug, Clone, Deserialize)]
pub struct SeedSeries {
    pub office: String,
    pub name: String,
    pub units: String,
    /// `[epochMillis, value, qualityCode]`
    #[serde(default)]
    pub values: Vec<(i64, Option<f64>, i32)>,
}

/// A seed document
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Seed {
    #[serde(default)]
    pub timeseries: Vec<SeedSeries>,
    #[serde(default)]
    pub locations: Vec<LocationEntry>,
}

/// What a seed load wrote
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub series: usize,
    pub values: usize,
    pub locations: usize,
}

impl Seed {
    /// Read a seed from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.display().to_string(),
            });
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read seed {}", path.display()))?;
        Self::from_json_str(&content)
    }

    /// Parse a seed from JSON text
    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Write the seed into a target
    pub fn load_into<T: SeedTarget + ?Sized>(&self, target: &T) -> Result<SeedSummary> {
        let mut summary = SeedSummary::default();

        for series in &self.timeseries {
            target.add_series(&series.office, &series.name, &series.units)?;

            let rows = series
                .values
                .iter()
                .map(|&(millis, value, quality)| {
                    TimeSeriesRow::from_millis(millis, value, quality).ok_or_else(|| {
                        Error::invalid_parameter(
                            "values",
                            format!("{millis} is out of range for {}", series.name),
                        )
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            summary.values += target.append_values(&series.office, &series.name, &rows)?;
            summary.series += 1;
        }

        for location in &self.locations {
            target.add_location(location.clone())?;
            summary.locations += 1;
        }

        tracing::info!(
            series = summary.series,
            values = summary.values,
            locations = summary.locations,
            "Loaded seed data"
        );
        Ok(summary)
    }
}
