//! DuckDB-backed data source
//!
//! Stores series, samples and locations in a DuckDB database file (or an
//! in-memory database). Samples carry an insertion sequence that orders rows
//! sharing a timestamp.

use super::seed::SeedTarget;
use super::types::{DataSource, SeriesMetadata, TimeSeriesRow};
use crate::cursor::CatalogKey;
use crate::error::{Error, Result};
use crate::pagination::{CatalogEntry, LocationAlias, LocationEntry, TimeSeriesEntry};
use crate::types::{DatasetKind, TimeSeriesId, UnitSelector};
use crate::units;
use chrono::{DateTime, Utc};
use duckdb::types::ToSql;
use duckdb::{params, Connection};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const SCHEMA: &str = "
CREATE SEQUENCE IF NOT EXISTS timeseries_values_seq;

CREATE TABLE IF NOT EXISTS timeseries (
    office VARCHAR NOT NULL,
    name VARCHAR NOT NULL,
    units VARCHAR NOT NULL,
    interval_minutes BIGINT NOT NULL
);

CREATE TABLE IF NOT EXISTS timeseries_values (
    office VARCHAR NOT NULL,
    name VARCHAR NOT NULL,
    date_time BIGINT NOT NULL,
    value DOUBLE,
    quality_code INTEGER NOT NULL,
    seq BIGINT NOT NULL DEFAULT nextval('timeseries_values_seq')
);

CREATE TABLE IF NOT EXISTS locations (
    office VARCHAR NOT NULL,
    name VARCHAR NOT NULL,
    nearest_city VARCHAR,
    public_name VARCHAR,
    long_name VARCHAR,
    description VARCHAR,
    kind VARCHAR,
    location_type VARCHAR,
    time_zone VARCHAR,
    latitude DOUBLE,
    longitude DOUBLE,
    elevation DOUBLE,
    unit VARCHAR,
    state VARCHAR,
    active BOOLEAN NOT NULL
);

CREATE TABLE IF NOT EXISTS location_aliases (
    office VARCHAR NOT NULL,
    location VARCHAR NOT NULL,
    alias_name VARCHAR NOT NULL,
    alias_value VARCHAR NOT NULL
);
";

const SERIES_MATCH: &str = "upper(office) = upper(?) AND upper(name) = upper(?)";

/// Data source backed by a single guarded DuckDB connection
pub struct DuckDbSource {
    conn: Mutex<Connection>,
    /// Database location (for logging)
    location: String,
}

impl std::fmt::Debug for DuckDbSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DuckDbSource")
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}

impl DuckDbSource {
    /// Open (or create) a database file
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|e| {
            Error::config(format!(
                "Failed to open DuckDB database {}: {e}",
                path.display()
            ))
        })?;
        Self::with_connection(conn, path.display().to_string())
    }

    /// Create an empty in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::config(format!("Failed to create DuckDB connection: {e}")))?;
        Self::with_connection(conn, ":memory:".to_string())
    }

    fn with_connection(conn: Connection, location: String) -> Result<Self> {
        conn.execute_batch(SCHEMA)
            .map_err(|e| Error::config(format!("Failed to create schema: {e}")))?;
        tracing::debug!(location = %location, "Opened DuckDB source");
        Ok(Self {
            conn: Mutex::new(conn),
            location,
        })
    }

    /// Where the database lives
    pub fn location(&self) -> &str {
        &self.location
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::upstream("DuckDB connection lock poisoned"))
    }

    /// Register a series, replacing the stored unit of an existing one
    pub fn add_series(&self, office: &str, name: &str, units: &str) -> Result<()> {
        let conn = self.lock()?;
        let updated = conn
            .execute(
                &format!("UPDATE timeseries SET units = ? WHERE {SERIES_MATCH}"),
                params![units, office, name],
            )
            .map_err(|e| Error::upstream(format!("Failed to update series: {e}")))?;

        if updated == 0 {
            let interval_minutes = name
                .parse::<TimeSeriesId>()
                .map(|id| id.interval_minutes())
                .unwrap_or(0);
            conn.execute(
                "INSERT INTO timeseries (office, name, units, interval_minutes) VALUES (?, ?, ?, ?)",
                params![office, name, units, interval_minutes],
            )
            .map_err(|e| Error::upstream(format!("Failed to insert series: {e}")))?;
        }
        Ok(())
    }

    /// Append samples to a registered series. Returns the number stored.
    pub fn append_values(&self, office: &str, name: &str, rows: &[TimeSeriesRow]) -> Result<usize> {
        let mut conn = self.lock()?;
        stored_units(&conn, office, name)?;

        let tx = conn
            .transaction()
            .map_err(|e| Error::upstream(format!("Failed to start transaction: {e}")))?;
        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO timeseries_values (office, name, date_time, value, quality_code)
                     VALUES (?, ?, ?, ?, ?)",
                )
                .map_err(|e| Error::upstream(format!("Failed to prepare insert: {e}")))?;
            for row in rows {
                stmt.execute(params![office, name, row.millis(), row.value, row.quality])
                    .map_err(|e| Error::upstream(format!("Failed to insert value: {e}")))?;
            }
        }
        tx.commit()
            .map_err(|e| Error::upstream(format!("Failed to commit values: {e}")))?;

        Ok(rows.len())
    }

    /// Add or replace a location and its aliases
    pub fn add_location(&self, location: LocationEntry) -> Result<()> {
        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .map_err(|e| Error::upstream(format!("Failed to start transaction: {e}")))?;

        tx.execute(
            "DELETE FROM locations WHERE upper(office) = upper(?) AND upper(name) = upper(?)",
            params![location.office, location.name],
        )
        .map_err(|e| Error::upstream(format!("Failed to replace location: {e}")))?;
        tx.execute(
            "DELETE FROM location_aliases WHERE upper(office) = upper(?) AND upper(location) = upper(?)",
            params![location.office, location.name],
        )
        .map_err(|e| Error::upstream(format!("Failed to replace aliases: {e}")))?;

        tx.execute(
            "INSERT INTO locations VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                location.office,
                location.name,
                location.nearest_city,
                location.public_name,
                location.long_name,
                location.description,
                location.kind,
                location.location_type,
                location.time_zone,
                location.latitude,
                location.longitude,
                location.elevation,
                location.unit,
                location.state,
                location.active,
            ],
        )
        .map_err(|e| Error::upstream(format!("Failed to insert location: {e}")))?;

        for alias in &location.aliases {
            tx.execute(
                "INSERT INTO location_aliases VALUES (?, ?, ?, ?)",
                params![location.office, location.name, alias.name, alias.value],
            )
            .map_err(|e| Error::upstream(format!("Failed to insert alias: {e}")))?;
        }

        tx.commit()
            .map_err(|e| Error::upstream(format!("Failed to commit location: {e}")))
    }
}

fn stored_units(conn: &Connection, office: &str, name: &str) -> Result<String> {
    let mut stmt = conn
        .prepare(&format!("SELECT units FROM timeseries WHERE {SERIES_MATCH}"))
        .map_err(|e| Error::upstream(format!("Failed to prepare query: {e}")))?;
    let units = stmt
        .query_map(params![office, name], |row| row.get::<_, String>(0))
        .map_err(|e| Error::upstream(format!("Failed to query series: {e}")))?
        .next()
        .transpose()
        .map_err(|e| Error::upstream(format!("Failed to read series: {e}")))?;

    units.ok_or_else(|| Error::not_found(format!("time series {office}/{name}")))
}

/// Bind values for an optional office filter
fn scope_clause(office: Option<&str>, column: &str) -> (String, Vec<String>) {
    match office {
        Some(o) => (format!(" AND upper({column}) = upper(?)"), vec![o.to_string()]),
        None => (String::new(), Vec::new()),
    }
}

fn bind_refs(values: &[String]) -> Vec<&dyn ToSql> {
    values.iter().map(|v| v as &dyn ToSql).collect()
}

fn limit_clause(limit: Option<usize>) -> String {
    limit.map(|n| format!(" LIMIT {n}")).unwrap_or_default()
}

impl DuckDbSource {
    fn timeseries_entries(
        conn: &Connection,
        after: &CatalogKey,
        office: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<CatalogEntry>> {
        let (scope, scope_args) = scope_clause(office, "office");
        let sql = format!(
            "SELECT office, name, units, interval_minutes FROM timeseries
             WHERE (upper(name) > ? OR (upper(name) = ? AND upper(office) > ?)){scope}
             ORDER BY upper(name), upper(office){}",
            limit_clause(limit)
        );
        let (id, off) = after.sort_key();
        let mut args = vec![id.clone(), id, off];
        args.extend(scope_args);

        tracing::debug!("Executing catalog query: {}", sql);
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| Error::upstream(format!("Failed to prepare catalog query: {e}")))?;
        let entries = stmt
            .query_map(bind_refs(&args).as_slice(), |row| {
                Ok(CatalogEntry::Timeseries(TimeSeriesEntry {
                    office: row.get(0)?,
                    name: row.get(1)?,
                    units: row.get(2)?,
                    interval_minutes: row.get(3)?,
                }))
            })
            .map_err(|e| Error::upstream(format!("Failed to query catalog: {e}")))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::upstream(format!("Failed to read catalog row: {e}")))?;
        Ok(entries)
    }

    fn location_entries(
        conn: &Connection,
        after: &CatalogKey,
        office: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<CatalogEntry>> {
        let (scope, scope_args) = scope_clause(office, "office");
        let sql = format!(
            "SELECT office, name, nearest_city, public_name, long_name, description, kind,
                    location_type, time_zone, latitude, longitude, elevation, unit, state, active
             FROM locations
             WHERE (upper(name) > ? OR (upper(name) = ? AND upper(office) > ?)){scope}
             ORDER BY upper(name), upper(office){}",
            limit_clause(limit)
        );
        let (id, off) = after.sort_key();
        let mut args = vec![id.clone(), id, off];
        args.extend(scope_args);

        tracing::debug!("Executing catalog query: {}", sql);
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| Error::upstream(format!("Failed to prepare catalog query: {e}")))?;
        let mut locations = stmt
            .query_map(bind_refs(&args).as_slice(), |row| {
                Ok(LocationEntry {
                    office: row.get(0)?,
                    name: row.get(1)?,
                    nearest_city: row.get(2)?,
                    public_name: row.get(3)?,
                    long_name: row.get(4)?,
                    description: row.get(5)?,
                    kind: row.get(6)?,
                    location_type: row.get(7)?,
                    time_zone: row.get(8)?,
                    latitude: row.get(9)?,
                    longitude: row.get(10)?,
                    elevation: row.get(11)?,
                    unit: row.get(12)?,
                    state: row.get(13)?,
                    active: row.get(14)?,
                    aliases: Vec::new(),
                })
            })
            .map_err(|e| Error::upstream(format!("Failed to query catalog: {e}")))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::upstream(format!("Failed to read catalog row: {e}")))?;

        let mut alias_stmt = conn
            .prepare(
                "SELECT alias_name, alias_value FROM location_aliases
                 WHERE upper(office) = upper(?) AND upper(location) = upper(?)
                 ORDER BY alias_name",
            )
            .map_err(|e| Error::upstream(format!("Failed to prepare alias query: {e}")))?;
        for location in &mut locations {
            location.aliases = alias_stmt
                .query_map(params![location.office, location.name], |row| {
                    Ok(LocationAlias {
                        name: row.get(0)?,
                        value: row.get(1)?,
                    })
                })
                .map_err(|e| Error::upstream(format!("Failed to query aliases: {e}")))?
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| Error::upstream(format!("Failed to read alias row: {e}")))?;
        }

        Ok(locations.into_iter().map(CatalogEntry::Location).collect())
    }
}

impl DataSource for DuckDbSource {
    fn series_metadata(
        &self,
        name: &str,
        office: Option<&str>,
        units: &UnitSelector,
    ) -> Result<SeriesMetadata> {
        let conn = self.lock()?;
        let (scope, scope_args) = scope_clause(office, "office");
        let sql = format!(
            "SELECT office, name, units FROM timeseries WHERE upper(name) = upper(?){scope} LIMIT 2"
        );
        let mut args = vec![name.to_string()];
        args.extend(scope_args);

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| Error::upstream(format!("Failed to prepare query: {e}")))?;
        let found = stmt
            .query_map(bind_refs(&args).as_slice(), |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })
            .map_err(|e| Error::upstream(format!("Failed to query series: {e}")))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::upstream(format!("Failed to read series: {e}")))?;

        match found.as_slice() {
            [] => Err(Error::not_found(match office {
                Some(o) => format!("time series {o}/{name}"),
                None => format!("time series {name}"),
            })),
            [(office, name, stored)] => SeriesMetadata::resolve(name, office, stored, units),
            _ => Err(Error::invalid_parameter(
                "office",
                format!("'{name}' exists in more than one office, specify an office"),
            )),
        }
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
        let conn = self.lock()?;
        let conversion = units::conversion(&stored_units(&conn, office, series)?, units)?;

        let sql = format!(
            "SELECT date_time, value, quality_code FROM timeseries_values
             WHERE {SERIES_MATCH} AND date_time >= {} AND date_time <= {}
             ORDER BY date_time, seq{}",
            from.timestamp_millis(),
            to.timestamp_millis(),
            limit_clause(limit)
        );
        tracing::debug!("Executing window query: {}", sql);

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| Error::upstream(format!("Failed to prepare window query: {e}")))?;
        let raw = stmt
            .query_map(params![office, series], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, Option<f64>>(1)?,
                    row.get::<_, i32>(2)?,
                ))
            })
            .map_err(|e| Error::upstream(format!("Failed to query window: {e}")))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::upstream(format!("Failed to read window row: {e}")))?;

        raw.into_iter()
            .map(|(millis, value, quality)| {
                TimeSeriesRow::from_millis(millis, value.map(|v| conversion.apply(v)), quality)
                    .ok_or_else(|| Error::upstream(format!("Stored time {millis} is out of range")))
            })
            .collect()
    }

    fn query_window_count(
        &self,
        series: &str,
        office: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<u64> {
        let conn = self.lock()?;
        stored_units(&conn, office, series)?;

        let sql = format!(
            "SELECT COUNT(*) FROM timeseries_values
             WHERE {SERIES_MATCH} AND date_time >= {} AND date_time <= {}",
            from.timestamp_millis(),
            to.timestamp_millis()
        );
        let count: i64 = conn
            .query_row(&sql, params![office, series], |row| row.get(0))
            .map_err(|e| Error::upstream(format!("Failed to count window: {e}")))?;
        Ok(count.max(0) as u64)
    }

    fn query_identifiers_after(
        &self,
        kind: DatasetKind,
        after: &CatalogKey,
        office: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<CatalogEntry>> {
        let conn = self.lock()?;
        match kind {
            DatasetKind::Timeseries => Self::timeseries_entries(&conn, after, office, limit),
            DatasetKind::Locations => Self::location_entries(&conn, after, office, limit),
        }
    }

    fn count_identifiers(&self, kind: DatasetKind, office: Option<&str>) -> Result<u64> {
        let conn = self.lock()?;
        let table = match kind {
            DatasetKind::Timeseries => "timeseries",
            DatasetKind::Locations => "locations",
        };
        let (scope, args) = scope_clause(office, "office");
        let sql = format!("SELECT COUNT(*) FROM {table} WHERE 1 = 1{scope}");

        let count: i64 = conn
            .query_row(&sql, bind_refs(&args).as_slice(), |row| row.get(0))
            .map_err(|e| Error::upstream(format!("Failed to count {table}: {e}")))?;
        Ok(count.max(0) as u64)
    }
}

impl SeedTarget for DuckDbSource {
    fn add_series(&self, office: &str, name: &str, units: &str) -> Result<()> {
        DuckDbSource::add_series(self, office, name, units)
    }

    fn append_values(&self, office: &str, name: &str, rows: &[TimeSeriesRow]) -> Result<usize> {
        DuckDbSource::append_values(self, office, name, rows)
    }

    fn add_location(&self, location: LocationEntry) -> Result<()> {
        DuckDbSource::add_location(self, location)
    }
}
