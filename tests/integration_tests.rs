//! Integration tests against a live HTTP server
//!
//! Tests the full end-to-end flow: query string → paginator → data source → JSON envelope

use chrono::{Duration, TimeZone, Utc};
use futures::future::join_all;
use serde_json::Value;
use series_pager::cli::router;
use series_pager::pagination::{LocationEntry, PagingOptions};
use series_pager::source::{DataSource, InMemorySource, TimeSeriesRow};
use std::sync::Arc;

const FLOW: &str = "Keystone.Flow.Inst.1Hour.0.Rev";

// ============================================================================
// Fixtures
// ============================================================================

/// 48 hourly rows starting 2024-01-01T00:00Z, plus two rows tied at hour 10
fn fixture() -> InMemorySource {
    let source = InMemorySource::new();
    source.add_series("SWT", FLOW, "cfs").unwrap();
    source
        .add_series("SWT", "Keystone.Elev.Inst.1Hour.0.Ccp-Rev", "ft")
        .unwrap();
    source
        .add_series("LRL", "Barkley.Elev.Inst.1Hour.0.Ccp-Rev", "ft")
        .unwrap();

    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let mut rows: Vec<_> = (0..48)
        .map(|h| TimeSeriesRow {
            instant: start + Duration::hours(h),
            value: Some(h as f64),
            quality: 0,
        })
        .collect();
    rows.extend([100.0, 101.0].map(|v| TimeSeriesRow {
        instant: start + Duration::hours(10),
        value: Some(v),
        quality: 3,
    }));
    source.append_values("SWT", FLOW, &rows).unwrap();

    for (office, name) in [("SWT", "Keystone"), ("SWT", "Eufaula"), ("LRL", "Barkley")] {
        source.add_location(LocationEntry::new(office, name)).unwrap();
    }
    source
}

/// Serve the router on an ephemeral port and return its base URL
async fn spawn_server() -> String {
    let source: Arc<dyn DataSource> = Arc::new(fixture());
    let app = router(source, PagingOptions::default());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

async fn get(client: &reqwest::Client, url: &str, query: &[(&str, &str)]) -> (u16, Value) {
    let response = client.get(url).query(query).send().await.unwrap();
    let status = response.status().as_u16();
    (status, response.json().await.unwrap())
}

fn window_query<'a>(extra: &[(&'a str, &'a str)]) -> Vec<(&'a str, &'a str)> {
    let mut query = vec![
        ("name", FLOW),
        ("office", "SWT"),
        ("begin", "2024-01-01T00:00:00"),
        ("end", "2024-01-03T00:00:00"),
        ("timezone", "UTC"),
    ];
    query.extend_from_slice(extra);
    query
}

// ============================================================================
// Time Series
// ============================================================================

#[tokio::test]
async fn test_full_traversal_over_http() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();
    let url = format!("{base}/timeseries");

    let (status, first) = get(&client, &url, &window_query(&[("page-size", "7")])).await;
    assert_eq!(status, 200);
    assert_eq!(first["success"], true);
    assert_eq!(first["data"]["total"], 50);
    assert_eq!(first["data"]["page-size"], 7);
    assert_eq!(first["data"]["interval"], "PT1H");

    let mut values = Vec::new();
    let mut page = first["data"].clone();
    let mut pages = 1;
    loop {
        for row in page["values"].as_array().unwrap() {
            values.push(row[1].as_f64().unwrap());
        }
        let Some(next) = page["next-page"].as_str().map(str::to_string) else {
            break;
        };
        // page-size on a resumed request is ignored in favor of the cursor's
        let (status, body) = get(
            &client,
            &url,
            &window_query(&[("page", next.as_str()), ("page-size", "2")]),
        )
        .await;
        assert_eq!(status, 200);
        assert_eq!(body["data"]["page-size"], 7);
        page = body["data"].clone();
        pages += 1;
        assert!(pages < 100, "traversal did not terminate");
    }

    assert_eq!(values.len(), 50);
    assert_eq!(pages, 8);
    let tied: Vec<_> = values
        .iter()
        .filter(|v| [10.0, 100.0, 101.0].contains(v))
        .collect();
    assert_eq!(tied, vec![&10.0, &100.0, &101.0]);
}

#[tokio::test]
async fn test_concurrent_traversals_out_of_order() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();
    let url = format!("{base}/timeseries");

    // Collect every cursor of one traversal first
    let mut cursors = Vec::new();
    let (_, mut body) = get(&client, &url, &window_query(&[("page-size", "10")])).await;
    while let Some(next) = body["data"]["next-page"].as_str().map(str::to_string) {
        cursors.push(next.clone());
        body = get(&client, &url, &window_query(&[("page", next.as_str())])).await.1;
    }
    assert_eq!(cursors.len(), 4);

    // Replaying them concurrently in reverse yields the same pages
    let replays = join_all(cursors.iter().rev().map(|cursor| {
        let client = client.clone();
        let url = url.clone();
        async move { get(&client, &url, &window_query(&[("page", cursor.as_str())])).await }
    }))
    .await;

    let mut total_rows = 10;
    for (status, body) in replays {
        assert_eq!(status, 200);
        total_rows += body["data"]["values"].as_array().unwrap().len();
    }
    assert_eq!(total_rows, 50);
}

#[tokio::test]
async fn test_malformed_cursor_is_bad_request() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();

    let (status, body) = get(
        &client,
        &format!("{base}/timeseries"),
        &window_query(&[("page", "not a cursor!")]),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("cursor"));
}

#[tokio::test]
async fn test_offset_without_zone_is_bad_request() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();

    let (status, body) = get(
        &client,
        &format!("{base}/timeseries"),
        &[
            ("name", FLOW),
            ("office", "SWT"),
            ("begin", "2024-01-01T00:00:00-06:00"),
        ],
    )
    .await;
    assert_eq!(status, 400);
    assert!(body["error"].as_str().unwrap().contains("timezone"));
}

#[tokio::test]
async fn test_unknown_series_is_not_found() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();

    let (status, body) = get(
        &client,
        &format!("{base}/timeseries"),
        &[("name", "Nowhere.Flow.Inst.1Hour.0.Rev"), ("office", "SWT")],
    )
    .await;
    assert_eq!(status, 404);
    assert_eq!(body["success"], false);
}

// ============================================================================
// Catalogs
// ============================================================================

#[tokio::test]
async fn test_catalog_traversal_pins_total() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();
    let url = format!("{base}/catalog/locations");

    let (status, first) = get(&client, &url, &[("page-size", "2")]).await;
    assert_eq!(status, 200);
    assert_eq!(first["data"]["total"], 3);
    let names: Vec<_> = first["data"]["entries"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["Barkley", "Eufaula"]);

    let next = first["data"]["next-page"].as_str().unwrap().to_string();
    let (_, second) = get(&client, &url, &[("page", next.as_str())]).await;
    assert_eq!(second["data"]["total"], 3);
    assert_eq!(second["data"]["entries"][0]["name"], "Keystone");
    assert!(second["data"]["next-page"].is_null());
}

#[tokio::test]
async fn test_catalog_office_filter() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();

    let (status, body) = get(
        &client,
        &format!("{base}/catalog/timeseries"),
        &[("office", "swt")],
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["total"], 2);
    for entry in body["data"]["entries"].as_array().unwrap() {
        assert_eq!(entry["office"], "SWT");
    }
}

#[tokio::test]
async fn test_unknown_dataset_is_bad_request() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();

    let (status, body) = get(&client, &format!("{base}/catalog/basins"), &[]).await;
    assert_eq!(status, 400);
    assert!(body["error"].as_str().unwrap().contains("basins"));
}

#[tokio::test]
async fn test_health() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();

    let (status, body) = get(&client, &format!("{base}/health"), &[]).await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], series_pager::VERSION);
}
