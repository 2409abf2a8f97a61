// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]

//! # series-pager
//!
//! Stateless, cursor-driven pagination over time-ordered measurement series
//! and over catalogs of series and locations.
//!
//! ## Features
//!
//! - **Opaque cursors**: every page token carries its own resume position,
//!   total estimate and page size, so the server keeps no session state
//! - **Exact traversal**: rows sharing a timestamp are never dropped or
//!   repeated across a page boundary
//! - **Timezone-aware windows**: zone-less bounds inherit a named zone;
//!   offset-only bounds without a zone are rejected
//! - **Catalogs**: time series and location identifiers, ordered by
//!   `(identifier, office)`, optionally scoped to one office
//! - **Pluggable sources**: in-memory store or DuckDB
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use series_pager::pagination::{fetch_time_series_page, PagingOptions, TimeSeriesRequest};
//! use series_pager::source::InMemorySource;
//!
//! let source = InMemorySource::new();
//! let options = PagingOptions::default();
//! let mut request = TimeSeriesRequest::new("Keystone.Flow.Inst.1Hour.0.Rev")
//!     .with_office("SWT")
//!     .with_page_size(100);
//!
//! loop {
//!     let page = fetch_time_series_page(&source, &request, &options)?;
//!     // use page.values
//!     match page.paging.next_page {
//!         Some(next) => request = request.with_page(next),
//!         None => break,
//!     }
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │              CLI / HTTP  (GET /timeseries, /catalog)         │
//! └─────────────────────────────┬───────────────────────────────┘
//!                               │
//! ┌──────────┬──────────────────┴──────────┬────────────────────┐
//! │  Time    │        Pagination           │      Cursor        │
//! ├──────────┼─────────────────────────────┼────────────────────┤
//! │ Windows  │ TimeSeriesPaginator         │ base64 + delimiter │
//! │ Zones    │ CatalogPaginator            │ TimeCursor         │
//! │ DST      │ PagingOptions               │ CatalogCursor      │
//! └──────────┴──────────────────┬──────────┴────────────────────┘
//!                               │
//! ┌─────────────────────────────┴───────────────────────────────┐
//! │           DataSource  (InMemorySource | DuckDbSource)        │
//! └─────────────────────────────────────────────────────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and identifier parsing
pub mod types;

/// Unit systems and conversions
pub mod units;

/// Opaque page cursors
pub mod cursor;

/// Time window normalization
pub mod time;

/// Data sources for rows and catalog entries
pub mod source;

/// Paginators and page documents
pub mod pagination;

/// Service configuration
pub mod config;

/// Command-line interface and HTTP server
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use config::ServiceConfig;
pub use cursor::{CatalogCursor, TimeCursor};
pub use pagination::{
    fetch_catalog_page, fetch_time_series_page, Catalog, CatalogRequest, PagingOptions,
    TimeSeriesPage, TimeSeriesRequest,
};
pub use source::{DataSource, DuckDbSource, InMemorySource};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
