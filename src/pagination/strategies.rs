//! Paginator implementations
//!
//! Both paginators are pure functions of `(request, cursor, data source)`:
//! nothing is remembered between calls, so pages of one traversal may be
//! fetched concurrently, retried, or out of order.

use super::types::{
    Catalog, CatalogRequest, PageInfo, PagingOptions, TimeSeriesPage, TimeSeriesRequest,
    VALUE_COLUMNS,
};
use crate::cursor::{CatalogCursor, CatalogKey, ResumePoint, TimeCursor};
use crate::error::{Error, Result};
use crate::source::{DataSource, SeriesMetadata, TimeSeriesRow};
use crate::time::{TimeNormalizer, TimeWindow};
use crate::types::normalize_office;
use chrono::{DateTime, Utc};

/// Common interface for paginators
pub trait Paginator {
    /// Request type
    type Request;
    /// Page type
    type Page;

    /// Fetch the page described by a request (and the cursor it carries)
    fn fetch_page(&self, source: &dyn DataSource, request: &Self::Request) -> Result<Self::Page>;
}

fn page_limit(page_size: i64) -> Result<usize> {
    usize::try_from(page_size).map_err(|_| {
        Error::invalid_parameter("page-size", format!("page size {page_size} is out of range"))
    })
}

// ============================================================================
// Time Window Paginator
// ============================================================================

/// Pages through a time series window, oldest rows first.
///
/// One query per page fetches `page size + 1` rows (plus any rows already
/// emitted at the resume instant); the extra row only signals that another
/// page exists and becomes the next resume point.
#[derive(Debug, Clone)]
pub struct TimeSeriesPaginator {
    options: PagingOptions,
    normalizer: TimeNormalizer,
    /// Pinned clock, used instead of the system time when set
    now: Option<DateTime<Utc>>,
}

impl TimeSeriesPaginator {
    /// Create a paginator
    pub fn new(options: PagingOptions) -> Self {
        Self {
            options,
            normalizer: TimeNormalizer::new(options.default_window),
            now: None,
        }
    }

    /// Evaluate default windows against a fixed instant
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    fn now(&self) -> DateTime<Utc> {
        self.now.unwrap_or_else(Utc::now)
    }

    fn fetch_rows(
        &self,
        source: &dyn DataSource,
        series: &SeriesMetadata,
        window: &TimeWindow,
        resume: ResumePoint,
        total: u64,
        page_size: i64,
    ) -> Result<(Vec<TimeSeriesRow>, Option<String>)> {
        if page_size == 0 {
            return Ok((Vec::new(), None));
        }

        let n = page_limit(page_size)?;
        let limit = n.saturating_add(1).saturating_add(resume.skip);

        tracing::debug!(
            series = %series.name,
            office = %series.office,
            from = %resume.instant,
            to = %window.end_utc(),
            limit,
            "Querying time window"
        );
        let mut rows = source.query_time_window(
            &series.name,
            &series.office,
            &series.units,
            resume.instant,
            window.end_utc(),
            Some(limit),
        )?;

        // Rows at the resume instant that an earlier page already emitted
        let tied = rows
            .iter()
            .take(resume.skip)
            .take_while(|r| r.instant == resume.instant)
            .count();
        rows.drain(..tied);

        if rows.len() <= n {
            return Ok((rows, None));
        }

        let boundary = rows[n].instant;
        let carried = if boundary == resume.instant { tied } else { 0 };
        let emitted_at_boundary = rows[..n].iter().filter(|r| r.instant == boundary).count();
        rows.truncate(n);

        let next = TimeCursor {
            resume: ResumePoint {
                instant: boundary,
                skip: carried + emitted_at_boundary,
            },
            total: Some(total),
            page_size,
        };
        Ok((rows, Some(next.encode())))
    }
}

impl Paginator for TimeSeriesPaginator {
    type Request = TimeSeriesRequest;
    type Page = TimeSeriesPage;

    fn fetch_page(&self, source: &dyn DataSource, request: &TimeSeriesRequest) -> Result<TimeSeriesPage> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(Error::invalid_parameter("name", "a time series name is required"));
        }
        let office = normalize_office(request.office.as_deref())?;

        let cursor = match request.page.as_deref() {
            Some(token) => TimeCursor::decode(token)?,
            None => None,
        };

        let window = self.normalizer.resolve(
            request.begin.as_deref(),
            request.end.as_deref(),
            request.timezone.as_deref(),
            self.now(),
        )?;
        let series = source.series_metadata(name, office.as_deref(), &request.units)?;

        let (resume, total, page_size, page) = match cursor {
            Some(cursor) => {
                let total = match cursor.total {
                    Some(total) => total,
                    None => source.query_window_count(
                        &series.name,
                        &series.office,
                        window.begin_utc(),
                        window.end_utc(),
                    )?,
                };
                (cursor.resume, total, cursor.page_size, request.page.clone())
            }
            None => {
                let page_size = self.options.effective_page_size(request.page_size)?;
                let total = source.query_window_count(
                    &series.name,
                    &series.office,
                    window.begin_utc(),
                    window.end_utc(),
                )?;
                let resume = ResumePoint::at(window.begin_utc());
                tracing::info!(
                    series = %series.name,
                    office = %series.office,
                    begin = %window.begin_utc(),
                    end = %window.end_utc(),
                    total,
                    page_size,
                    "Starting time series traversal"
                );
                let first = TimeCursor {
                    resume,
                    total: Some(total),
                    page_size,
                };
                (resume, total, page_size, Some(first.encode()))
            }
        };

        let (values, next_page) =
            self.fetch_rows(source, &series, &window, resume, total, page_size)?;

        Ok(TimeSeriesPage {
            name: series.name,
            office_id: series.office,
            units: series.units,
            interval: series.interval_minutes,
            interval_minutes: series.interval_minutes,
            begin: window.begin,
            end: window.end,
            paging: PageInfo {
                page,
                next_page,
                page_size,
                total,
            },
            value_columns: &VALUE_COLUMNS,
            values,
        })
    }
}

// ============================================================================
// Lexical Catalog Paginator
// ============================================================================

/// Pages through catalog identifiers in case-insensitive order.
///
/// The total is counted once, on the first page, and carried in the cursor
/// so every page of a traversal reports the same value.
#[derive(Debug, Clone)]
pub struct CatalogPaginator {
    options: PagingOptions,
}

impl CatalogPaginator {
    /// Create a paginator
    pub fn new(options: PagingOptions) -> Self {
        Self { options }
    }
}

impl Paginator for CatalogPaginator {
    type Request = CatalogRequest;
    type Page = Catalog;

    fn fetch_page(&self, source: &dyn DataSource, request: &CatalogRequest) -> Result<Catalog> {
        let office = normalize_office(request.office.as_deref())?;
        let cursor = match request.page.as_deref() {
            Some(token) => CatalogCursor::decode(token)?,
            None => None,
        };

        let (after, total, page_size, page) = match cursor {
            Some(cursor) => (
                cursor.last_seen,
                cursor.total,
                cursor.page_size,
                request.page.clone(),
            ),
            None => {
                let page_size = self.options.effective_page_size(request.page_size)?;
                let total = source.count_identifiers(request.dataset, office.as_deref())?;
                tracing::info!(
                    dataset = %request.dataset,
                    office = office.as_deref().unwrap_or("*"),
                    total,
                    page_size,
                    "Starting catalog traversal"
                );
                let first = CatalogCursor {
                    last_seen: CatalogKey::start(),
                    total,
                    page_size,
                };
                (CatalogKey::start(), total, page_size, Some(first.encode()))
            }
        };

        let (entries, next_page) = if page_size == 0 {
            (Vec::new(), None)
        } else {
            let n = page_limit(page_size)?;
            tracing::debug!(
                dataset = %request.dataset,
                after = %after,
                limit = n,
                "Querying catalog"
            );
            let entries = source.query_identifiers_after(
                request.dataset,
                &after,
                office.as_deref(),
                Some(n),
            )?;

            let next_page = match entries.last() {
                Some(last) if entries.len() == n => Some(
                    CatalogCursor {
                        last_seen: last.key(),
                        total,
                        page_size,
                    }
                    .encode(),
                ),
                _ => None,
            };
            (entries, next_page)
        };

        Ok(Catalog {
            paging: PageInfo {
                page,
                next_page,
                page_size,
                total,
            },
            entries,
        })
    }
}

// ============================================================================
// Boundary Entry Points
// ============================================================================

/// Fetch one page of a time series
pub fn fetch_time_series_page(
    source: &dyn DataSource,
    request: &TimeSeriesRequest,
    options: &PagingOptions,
) -> Result<TimeSeriesPage> {
    TimeSeriesPaginator::new(*options).fetch_page(source, request)
}

/// Fetch one page of a catalog
pub fn fetch_catalog_page(
    source: &dyn DataSource,
    request: &CatalogRequest,
    options: &PagingOptions,
) -> Result<Catalog> {
    CatalogPaginator::new(*options).fetch_page(source, request)
}
