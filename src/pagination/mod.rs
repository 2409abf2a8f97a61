//! Pagination module
//!
//! Two traversal flavors share one pattern: an opaque cursor carries all
//! resume state, so the server keeps nothing between requests.
//!
//! # Overview
//!
//! - [`TimeSeriesPaginator`]: rows of one series inside a time window,
//!   resumed from the instant of the first row not yet emitted
//! - [`CatalogPaginator`]: identifiers in case-insensitive order, resumed
//!   strictly after the last identifier emitted, with a pinned total
//!
//! A page size of `0` returns metadata only. The page size of the first page
//! is embedded in every cursor and wins over later requests.

mod strategies;
mod types;

pub use strategies::{
    fetch_catalog_page, fetch_time_series_page, CatalogPaginator, Paginator, TimeSeriesPaginator,
};
pub use types::{
    Catalog, CatalogEntry, CatalogRequest, LocationAlias, LocationEntry, PageInfo, PagingOptions,
    TimeSeriesEntry, TimeSeriesPage, TimeSeriesRequest, ValueColumn, VALUE_COLUMNS,
};
