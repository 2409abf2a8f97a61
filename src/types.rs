//! Common types used throughout series-pager
//!
//! This module contains shared type definitions, type aliases,
//! and identifier parsing used across multiple modules.

use crate::error::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

/// Office identifiers: letters, digits, dash or underscore
static OFFICE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{2,16}$").unwrap());

/// Validate an optional office (scope) filter.
///
/// Empty strings are treated as "no filter" so that `?office=` behaves like
/// an absent parameter.
pub fn normalize_office(office: Option<&str>) -> Result<Option<String>> {
    match office.map(str::trim) {
        None | Some("") => Ok(None),
        Some(o) if OFFICE_REGEX.is_match(o) => Ok(Some(o.to_string())),
        Some(o) => Err(Error::invalid_parameter(
            "office",
            format!("'{o}' is not a valid office identifier"),
        )),
    }
}

// ============================================================================
// Dataset Kind
// ============================================================================

/// Kind of data a catalog lists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetKind {
    /// Time series identifiers
    Timeseries,
    /// Location identifiers
    Locations,
}

impl DatasetKind {
    /// Canonical lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetKind::Timeseries => "timeseries",
            DatasetKind::Locations => "locations",
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatasetKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "timeseries" => Ok(DatasetKind::Timeseries),
            "locations" | "location" => Ok(DatasetKind::Locations),
            _ => Err(Error::UnknownDataset {
                dataset: s.to_string(),
            }),
        }
    }
}

// ============================================================================
// Unit Selection
// ============================================================================

/// Unit system of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitSystem {
    /// Metric (International System)
    #[serde(rename = "SI")]
    Si,
    /// English (US customary)
    #[serde(rename = "EN")]
    En,
}

/// Units requested for time series values
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitSelector {
    /// Default unit of the series' parameter in a unit system
    System(UnitSystem),
    /// An explicit unit such as `cfs`
    Named(String),
}

impl Default for UnitSelector {
    fn default() -> Self {
        Self::System(UnitSystem::En)
    }
}

impl UnitSelector {
    /// Parse a `unit` request parameter. `SI` and `EN` are case-insensitive.
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            None | Some("") => Self::default(),
            Some(v) if v.eq_ignore_ascii_case("SI") => Self::System(UnitSystem::Si),
            Some(v) if v.eq_ignore_ascii_case("EN") => Self::System(UnitSystem::En),
            Some(v) => Self::Named(v.to_string()),
        }
    }
}

impl fmt::Display for UnitSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitSelector::System(UnitSystem::Si) => f.write_str("SI"),
            UnitSelector::System(UnitSystem::En) => f.write_str("EN"),
            UnitSelector::Named(unit) => f.write_str(unit),
        }
    }
}

// ============================================================================
// Time Series Identifier
// ============================================================================

/// A parsed time series identifier.
///
/// Identifiers have six dot-separated parts:
/// `Location.Parameter.ParameterType.Interval.Duration.Version`,
/// e.g. `Barren-Lake.Elev.Inst.1Hour.0.Ccp-Rev`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeSeriesId {
    pub location: String,
    pub parameter: String,
    pub parameter_type: String,
    pub interval: String,
    pub duration: String,
    pub version: String,
}

impl TimeSeriesId {
    /// Parameter without its sub-parameter (`Elev-Pool` -> `Elev`)
    pub fn base_parameter(&self) -> &str {
        self.parameter
            .split_once('-')
            .map_or(self.parameter.as_str(), |(base, _)| base)
    }

    /// Regular interval in minutes, 0 for irregular series
    pub fn interval_minutes(&self) -> i64 {
        parse_interval_minutes(&self.interval)
    }
}

impl FromStr for TimeSeriesId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split('.').collect();
        if parts.len() != 6 || parts.iter().any(|p| p.is_empty()) {
            return Err(Error::invalid_parameter(
                "name",
                format!("'{s}' is not a six-part time series identifier"),
            ));
        }

        Ok(Self {
            location: parts[0].to_string(),
            parameter: parts[1].to_string(),
            parameter_type: parts[2].to_string(),
            interval: parts[3].to_string(),
            duration: parts[4].to_string(),
            version: parts[5].to_string(),
        })
    }
}

impl fmt::Display for TimeSeriesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}.{}.{}",
            self.location,
            self.parameter,
            self.parameter_type,
            self.interval,
            self.duration,
            self.version
        )
    }
}

/// Parse an interval part like "15Minutes", "1Hour" or "1Day" into minutes.
///
/// "0" and "~"-prefixed (local regular) intervals count as irregular.
pub fn parse_interval_minutes(interval: &str) -> i64 {
    if interval.starts_with('~') {
        return 0;
    }

    let split = interval
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(interval.len());
    let (count, unit) = interval.split_at(split);
    let Ok(count) = count.parse::<i64>() else {
        return 0;
    };

    let per_unit = match unit.to_lowercase().as_str() {
        "minute" | "minutes" => 1,
        "hour" | "hours" => 60,
        "day" | "days" => 1_440,
        "week" | "weeks" => 10_080,
        "month" | "months" => 43_200,
        "year" | "years" => 525_600,
        "decade" | "decades" => 5_256_000,
        _ => 0,
    };

    count * per_unit
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("15Minutes", 15)]
    #[test_case("1Hour", 60)]
    #[test_case("6Hours", 360)]
    #[test_case("1Day", 1_440)]
    #[test_case("1Month", 43_200)]
    #[test_case("0", 0)]
    #[test_case("~1Day", 0)]
    #[test_case("Irregular", 0)]
    fn test_parse_interval_minutes(interval: &str, expected: i64) {
        assert_eq!(parse_interval_minutes(interval), expected);
    }

    #[test]
    fn test_time_series_id_parse() {
        let id: TimeSeriesId = "Barren-Lake.Elev-Pool.Inst.1Hour.0.Ccp-Rev".parse().unwrap();
        assert_eq!(id.location, "Barren-Lake");
        assert_eq!(id.base_parameter(), "Elev");
        assert_eq!(id.interval_minutes(), 60);
        assert_eq!(id.to_string(), "Barren-Lake.Elev-Pool.Inst.1Hour.0.Ccp-Rev");
    }

    #[test]
    fn test_time_series_id_rejects_short_names() {
        let err = "Barren-Lake.Elev".parse::<TimeSeriesId>().unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { .. }));
    }

    #[test]
    fn test_dataset_kind_from_str() {
        assert_eq!(
            "TimeSeries".parse::<DatasetKind>().unwrap(),
            DatasetKind::Timeseries
        );
        assert_eq!(
            "locations".parse::<DatasetKind>().unwrap(),
            DatasetKind::Locations
        );
        assert!(matches!(
            "ratings".parse::<DatasetKind>(),
            Err(Error::UnknownDataset { .. })
        ));
    }

    #[test]
    fn test_unit_selector_parse() {
        assert_eq!(UnitSelector::parse(None), UnitSelector::System(UnitSystem::En));
        assert_eq!(
            UnitSelector::parse(Some("si")),
            UnitSelector::System(UnitSystem::Si)
        );
        assert_eq!(
            UnitSelector::parse(Some("cfs")),
            UnitSelector::Named("cfs".to_string())
        );
    }

    #[test]
    fn test_normalize_office() {
        assert_eq!(normalize_office(None).unwrap(), None);
        assert_eq!(normalize_office(Some("")).unwrap(), None);
        assert_eq!(normalize_office(Some("SWT")).unwrap(), Some("SWT".to_string()));
        assert!(normalize_office(Some("S W T")).is_err());
    }
}
