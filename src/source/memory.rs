//! In-memory data source

use super::seed::SeedTarget;
use super::types::{DataSource, SeriesMetadata, TimeSeriesRow};
use crate::cursor::CatalogKey;
use crate::error::{Error, Result};
use crate::pagination::{CatalogEntry, LocationEntry, TimeSeriesEntry};
use crate::types::{DatasetKind, TimeSeriesId, UnitSelector};
use crate::units;
use chrono::{DateTime, Utc};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug)]
struct StoredSeries {
    office: String,
    name: String,
    units: String,
    /// Sorted by instant; rows sharing an instant keep insertion order
    rows: Vec<TimeSeriesRow>,
}

impl StoredSeries {
    fn matches(&self, name: &str, office: Option<&str>) -> bool {
        self.name.eq_ignore_ascii_case(name)
            && office.map_or(true, |o| self.office.eq_ignore_ascii_case(o))
    }

    fn entry(&self) -> TimeSeriesEntry {
        let interval_minutes = self
            .name
            .parse::<TimeSeriesId>()
            .map(|id| id.interval_minutes())
            .unwrap_or(0);
        TimeSeriesEntry {
            office: self.office.clone(),
            name: self.name.clone(),
            units: self.units.clone(),
            interval_minutes,
        }
    }
}

#[derive(Debug, Default)]
struct Inventory {
    series: Vec<StoredSeries>,
    locations: Vec<LocationEntry>,
}

/// Data source holding everything in process memory.
///
/// Appends may run concurrently with page requests; readers see a
/// consistent snapshot per call.
#[derive(Debug, Default)]
pub struct InMemorySource {
    inventory: RwLock<Inventory>,
}

impl InMemorySource {
    /// Create an empty source
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Inventory>> {
        self.inventory
            .read()
            .map_err(|_| Error::upstream("in-memory inventory lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Inventory>> {
        self.inventory
            .write()
            .map_err(|_| Error::upstream("in-memory inventory lock poisoned"))
    }

    /// Register a series, replacing the stored unit of an existing one
    pub fn add_series(&self, office: &str, name: &str, units: &str) -> Result<()> {
        let mut inventory = self.write()?;
        match inventory
            .series
            .iter_mut()
            .find(|s| s.matches(name, Some(office)))
        {
            Some(existing) => existing.units = units.to_string(),
            None => inventory.series.push(StoredSeries {
                office: office.to_string(),
                name: name.to_string(),
                units: units.to_string(),
                rows: Vec::new(),
            }),
        }
        Ok(())
    }

    /// Append samples to a registered series. Returns the number stored.
    pub fn append_values(&self, office: &str, name: &str, rows: &[TimeSeriesRow]) -> Result<usize> {
        let mut inventory = self.write()?;
        let series = inventory
            .series
            .iter_mut()
            .find(|s| s.matches(name, Some(office)))
            .ok_or_else(|| Error::not_found(format!("time series {office}/{name}")))?;

        for row in rows {
            let at = series.rows.partition_point(|r| r.instant <= row.instant);
            series.rows.insert(at, *row);
        }
        Ok(rows.len())
    }

    /// Add or replace a location
    pub fn add_location(&self, location: LocationEntry) -> Result<()> {
        let mut inventory = self.write()?;
        inventory.locations.retain(|l| {
            !(l.office.eq_ignore_ascii_case(&location.office)
                && l.name.eq_ignore_ascii_case(&location.name))
        });
        inventory.locations.push(location);
        Ok(())
    }

    fn catalog_entries(inventory: &Inventory, kind: DatasetKind) -> Vec<CatalogEntry> {
        match kind {
            DatasetKind::Timeseries => inventory
                .series
                .iter()
                .map(|s| CatalogEntry::Timeseries(s.entry()))
                .collect(),
            DatasetKind::Locations => inventory
                .locations
                .iter()
                .cloned()
                .map(CatalogEntry::Location)
                .collect(),
        }
    }
}

fn office_matches(entry: &CatalogEntry, office: Option<&str>) -> bool {
    office.map_or(true, |o| entry.office().eq_ignore_ascii_case(o))
}

impl DataSource for InMemorySource {
    fn series_metadata(
        &self,
        name: &str,
        office: Option<&str>,
        units: &UnitSelector,
    ) -> Result<SeriesMetadata> {
        let inventory = self.read()?;
        let mut candidates = inventory.series.iter().filter(|s| s.matches(name, office));

        let Some(series) = candidates.next() else {
            return Err(Error::not_found(match office {
                Some(o) => format!("time series {o}/{name}"),
                None => format!("time series {name}"),
            }));
        };
        if candidates.next().is_some() {
            return Err(Error::invalid_parameter(
                "office",
                format!("'{name}' exists in more than one office, specify an office"),
            ));
        }

        SeriesMetadata::resolve(&series.name, &series.office, &series.units, units)
    }

    fn query_time_window(
        &self,
        series: &str,
        office: &str,
        units: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        limit: Option<usize>,
    ) -> Result<Vec<TimeSeriesRow>> {
        let inventory = self.read()?;
        let stored = inventory
            .series
            .iter()
            .find(|s| s.matches(series, Some(office)))
            .ok_or_else(|| Error::not_found(format!("time series {office}/{series}")))?;
        let conversion = units::conversion(&stored.units, units)?;

        let start = stored.rows.partition_point(|r| r.instant < from);
        Ok(stored.rows[start..]
            .iter()
            .take_while(|r| r.instant <= to)
            .take(limit.unwrap_or(usize::MAX))
            .map(|r| TimeSeriesRow {
                value: r.value.map(|v| conversion.apply(v)),
                ..*r
            })
            .collect())
    }

    fn query_window_count(
        &self,
        series: &str,
        office: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<u64> {
        let inventory = self.read()?;
        let stored = inventory
            .series
            .iter()
            .find(|s| s.matches(series, Some(office)))
            .ok_or_else(|| Error::not_found(format!("time series {office}/{series}")))?;

        let count = stored
            .rows
            .iter()
            .filter(|r| r.instant >= from && r.instant <= to)
            .count();
        Ok(count as u64)
    }

    fn query_identifiers_after(
        &self,
        kind: DatasetKind,
        after: &CatalogKey,
        office: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<CatalogEntry>> {
        let inventory = self.read()?;
        let lower = after.sort_key();

        let mut entries: Vec<CatalogEntry> = Self::catalog_entries(&inventory, kind)
            .into_iter()
            .filter(|e| office_matches(e, office))
            .filter(|e| e.key().sort_key() > lower)
            .collect();
        entries.sort_by_cached_key(|e| e.key().sort_key());
        entries.truncate(limit.unwrap_or(usize::MAX));
        Ok(entries)
    }

    fn count_identifiers(&self, kind: DatasetKind, office: Option<&str>) -> Result<u64> {
        let inventory = self.read()?;
        let count = Self::catalog_entries(&inventory, kind)
            .iter()
            .filter(|e| office_matches(e, office))
            .count();
        Ok(count as u64)
    }
}

impl SeedTarget for InMemorySource {
    fn add_series(&self, office: &str, name: &str, units: &str) -> Result<()> {
        InMemorySource::add_series(self, office, name, units)
    }

    fn append_values(&self, office: &str, name: &str, rows: &[TimeSeriesRow]) -> Result<usize> {
        InMemorySource::append_values(self, office, name, rows)
    }

    fn add_location(&self, location: LocationEntry) -> Result<()> {
        InMemorySource::add_location(self, location)
    }
}
