//! HTTP server mode for paged time series and catalog access

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tokio::task::JoinError;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::error::{Error, Result};
use crate::pagination::{
    fetch_catalog_page, fetch_time_series_page, CatalogRequest, PagingOptions, TimeSeriesRequest,
};
use crate::source::DataSource;
use crate::types::{DatasetKind, UnitSelector};

/// App state shared across handlers
#[derive(Clone)]
struct AppState {
    source: Arc<dyn DataSource>,
    paging: PagingOptions,
}

/// Query string of `GET /timeseries`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct TimeSeriesQuery {
    name: Option<String>,
    office: Option<String>,
    unit: Option<String>,
    begin: Option<String>,
    end: Option<String>,
    timezone: Option<String>,
    page: Option<String>,
    page_size: Option<String>,
}

impl TimeSeriesQuery {
    fn into_request(self) -> Result<TimeSeriesRequest> {
        let name = self
            .name
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| Error::invalid_parameter("name", "a time series name is required"))?;

        Ok(TimeSeriesRequest {
            name,
            office: self.office,
            units: UnitSelector::parse(self.unit.as_deref()),
            begin: self.begin,
            end: self.end,
            timezone: self.timezone,
            page: self.page,
            page_size: parse_page_size(self.page_size.as_deref())?,
        })
    }
}

/// Query string of `GET /catalog/{dataset}`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct CatalogQuery {
    office: Option<String>,
    page: Option<String>,
    page_size: Option<String>,
}

fn parse_page_size(value: Option<&str>) -> Result<Option<i64>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => v.parse::<i64>().map(Some).map_err(|_| {
            Error::invalid_parameter("page-size", format!("'{v}' is not an integer"))
        }),
    }
}

/// Response wrapper
#[derive(Debug, Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

impl ApiResponse<()> {
    fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

fn error_response(err: &Error) -> Response {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_server_error() {
        tracing::error!(error = %err, "Request failed");
    } else {
        tracing::debug!(error = %err, "Rejected request");
    }
    (status, Json(ApiResponse::error(err.to_string()))).into_response()
}

fn respond<T: Serialize>(result: std::result::Result<Result<T>, JoinError>) -> Response {
    match result {
        Ok(Ok(data)) => (StatusCode::OK, Json(ApiResponse::success(data))).into_response(),
        Ok(Err(e)) => error_response(&e),
        Err(e) => error_response(&Error::Other(format!("Request task failed: {e}"))),
    }
}

/// Build the router; exposed so tests can serve it on an ephemeral port
pub fn router(source: Arc<dyn DataSource>, paging: PagingOptions) -> Router {
    let state = AppState { source, paging };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/timeseries", get(get_timeseries))
        .route("/catalog/:dataset", get(get_catalog))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

/// Start the HTTP server
pub async fn serve(
    config: &ServerConfig,
    paging: PagingOptions,
    source: Arc<dyn DataSource>,
) -> Result<()> {
    let app = router(source, paging);
    let addr = config.bind_address();

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| Error::config(format!("Failed to bind to {addr}: {e}")))?;
    tracing::info!("Starting HTTP server on http://{}", addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| Error::config(format!("Server error: {e}")))?;

    Ok(())
}

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok", "version": crate::VERSION }))
}

/// One page of a time series
async fn get_timeseries(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TimeSeriesQuery>,
) -> Response {
    let request = match query.into_request() {
        Ok(request) => request,
        Err(e) => return error_response(&e),
    };

    let source = Arc::clone(&state.source);
    let paging = state.paging;
    let result = tokio::task::spawn_blocking(move || {
        fetch_time_series_page(source.as_ref(), &request, &paging)
    })
    .await;
    respond(result)
}

/// One page of a catalog
async fn get_catalog(
    State(state): State<Arc<AppState>>,
    Path(dataset): Path<String>,
    Query(query): Query<CatalogQuery>,
) -> Response {
    let request = match dataset.parse::<DatasetKind>().and_then(|dataset| {
        Ok(CatalogRequest {
            dataset,
            office: query.office,
            page: query.page,
            page_size: parse_page_size(query.page_size.as_deref())?,
        })
    }) {
        Ok(request) => request,
        Err(e) => return error_response(&e),
    };

    let source = Arc::clone(&state.source);
    let paging = state.paging;
    let result = tokio::task::spawn_blocking(move || {
        fetch_catalog_page(source.as_ref(), &request, &paging)
    })
    .await;
    respond(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_page_size() {
        assert_eq!(parse_page_size(None).unwrap(), None);
        assert_eq!(parse_page_size(Some(" ")).unwrap(), None);
        assert_eq!(parse_page_size(Some("25")).unwrap(), Some(25));
        assert_eq!(parse_page_size(Some("-3")).unwrap(), Some(-3));
        assert!(matches!(
            parse_page_size(Some("lots")),
            Err(Error::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_query_requires_name() {
        let err = TimeSeriesQuery::default().into_request().unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { field, .. } if field == "name"));
    }

    #[test]
    fn test_query_defaults_to_english_units() {
        let request = TimeSeriesQuery {
            name: Some("Keystone.Flow.Inst.1Hour.0.Rev".into()),
            ..TimeSeriesQuery::default()
        }
        .into_request()
        .unwrap();
        assert_eq!(request.units, UnitSelector::default());
        assert_eq!(request.page_size, None);
    }

    #[test]
    fn test_error_status() {
        let response = error_response(&Error::malformed_cursor("x", "bad"));
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = error_response(&Error::not_found("series"));
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = error_response(&Error::upstream("down"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
