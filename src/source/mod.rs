//! Data sources
//!
//! The paginators talk to storage only through [`DataSource`]: ordered rows
//! for a time window, counts, and identifiers after a catalog key. Two
//! implementations are provided:
//!
//! - [`InMemorySource`]: process-local inventory, used by tests and demos
//! - [`DuckDbSource`]: a DuckDB database file or in-memory database
//!
//! Either can be populated from a JSON [`Seed`].

mod database;
mod memory;
mod seed;
mod types;

pub use database::DuckDbSource;
pub use memory::InMemorySource;
pub use seed::{Seed, SeedSeries, SeedSummary, SeedTarget};
pub use types::{DataSource, SeriesMetadata, TimeSeriesRow};
