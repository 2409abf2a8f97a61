//! Tests for cursor module

use super::*;
use crate::error::Error;
use base64::Engine as _;
use chrono::{DateTime, TimeZone, Utc};
use pretty_assertions::assert_eq;
use test_case::test_case;

fn raw(text: &str) -> String {
    base64::engine::general_purpose::STANDARD.encode(text)
}

// ============================================================================
// Codec Tests
// ============================================================================

#[test_case(&["1704067200000", "480", "50"] ; "time cursor fields")]
#[test_case(&["SWT/Keystone.Flow.Inst.1Hour.0.Rev", "1200", "500"] ; "catalog cursor fields")]
#[test_case(&["only"] ; "single field")]
#[test_case(&["", "", "0"] ; "empty fields")]
fn test_round_trip_preserves_order(fields: &[&str]) {
    let token = encode_cursor(fields.iter(), DEFAULT_DELIMITER);
    let decoded = decode_cursor(&token, DEFAULT_DELIMITER).unwrap().unwrap();
    assert_eq!(decoded, fields.to_vec());
}

#[test]
fn test_custom_delimiter() {
    let token = encode_cursor([1, 2, 3], ",");
    assert_eq!(token, raw("1,2,3"));
    assert_eq!(
        decode_cursor(&token, ",").unwrap(),
        Some(vec!["1".to_string(), "2".to_string(), "3".to_string()])
    );
}

#[test_case("" ; "empty")]
#[test_case("   " ; "whitespace")]
fn test_empty_token_starts_traversal(token: &str) {
    assert_eq!(decode_cursor(token, DEFAULT_DELIMITER).unwrap(), None);
    assert_eq!(TimeCursor::decode(token).unwrap(), None);
    assert_eq!(CatalogCursor::decode(token).unwrap(), None);
}

#[test]
fn test_invalid_token_is_rejected() {
    let err = decode_cursor("not-a-valid-cursor", DEFAULT_DELIMITER).unwrap_err();
    match err {
        Error::MalformedCursor { cursor, .. } => assert_eq!(cursor, "not-a-valid-cursor"),
        other => panic!("Expected MalformedCursor, got {other:?}"),
    }
}

#[test]
fn test_non_utf8_token_is_rejected() {
    let token = base64::engine::general_purpose::STANDARD.encode([0xff, 0xfe, 0xfd]);
    assert!(matches!(
        decode_cursor(&token, DEFAULT_DELIMITER),
        Err(Error::MalformedCursor { .. })
    ));
}

// ============================================================================
// TimeCursor Tests
// ============================================================================

fn instant(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis).unwrap()
}

#[test]
fn test_time_cursor_round_trip() {
    let cursor = TimeCursor {
        resume: ResumePoint::at(instant(1_704_067_200_000)),
        total: Some(480),
        page_size: 50,
    };
    let token = cursor.encode();
    assert_eq!(token, raw("1704067200000|||480|||50"));
    assert_eq!(TimeCursor::decode(&token).unwrap(), Some(cursor));
}

#[test]
fn test_time_cursor_without_total() {
    let decoded = TimeCursor::decode(&raw("1704067200000|||25")).unwrap().unwrap();
    assert_eq!(decoded.total, None);
    assert_eq!(decoded.page_size, 25);
    assert_eq!(
        decoded.resume.instant,
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    );
}

#[test]
fn test_time_cursor_tie_offset() {
    let cursor = TimeCursor {
        resume: ResumePoint {
            instant: instant(1_000),
            skip: 3,
        },
        total: Some(10),
        page_size: 2,
    };
    let token = cursor.encode();
    assert_eq!(token, raw("1000+3|||10|||2"));
    assert_eq!(TimeCursor::decode(&token).unwrap(), Some(cursor));
}

#[test_case("1704067200000" ; "missing page size")]
#[test_case("a|||b|||c|||d" ; "too many fields")]
#[test_case("yesterday|||50" ; "non numeric time")]
#[test_case("1000|||many|||50" ; "non numeric total")]
#[test_case("1000|||10|||-5" ; "negative page size")]
#[test_case("1000+x|||10|||5" ; "bad tie offset")]
fn test_time_cursor_malformed(text: &str) {
    let err = TimeCursor::decode(&raw(text)).unwrap_err();
    assert!(
        matches!(err, Error::MalformedCursor { .. }),
        "expected MalformedCursor for {text}, got {err:?}"
    );
}

#[test]
fn test_page_size_is_last_field() {
    let decoded = TimeCursor::decode(&raw("0|||7|||50")).unwrap().unwrap();
    assert_eq!(decoded.page_size, 50);
    assert_eq!(decoded.total, Some(7));
}

// ============================================================================
// CatalogCursor Tests
// ============================================================================

#[test]
fn test_catalog_cursor_round_trip() {
    let cursor = CatalogCursor {
        last_seen: CatalogKey::new("SWT", "Keystone.Flow.Inst.1Hour.0.Rev"),
        total: 1200,
        page_size: 500,
    };
    let token = cursor.encode();
    assert_eq!(
        token,
        raw("SWT/Keystone.Flow.Inst.1Hour.0.Rev|||1200|||500")
    );
    assert_eq!(CatalogCursor::decode(&token).unwrap(), Some(cursor));
}

#[test]
fn test_catalog_key_splits_on_first_slash() {
    let decoded = CatalogCursor::decode(&raw("LRL/Gage/North.Stage.Inst.0.0.Raw|||3|||10"))
        .unwrap()
        .unwrap();
    assert_eq!(decoded.last_seen.office, "LRL");
    assert_eq!(decoded.last_seen.identifier, "Gage/North.Stage.Inst.0.0.Raw");
}

#[test]
fn test_catalog_key_without_office() {
    let decoded = CatalogCursor::decode(&raw("Keystone|||3|||10"))
        .unwrap()
        .unwrap();
    assert_eq!(decoded.last_seen, CatalogKey::new("", "Keystone"));
}

#[test]
fn test_catalog_identifier_containing_delimiter() {
    let cursor = CatalogCursor {
        last_seen: CatalogKey::new("SWT", "odd|||name"),
        total: 4,
        page_size: 2,
    };
    assert_eq!(CatalogCursor::decode(&cursor.encode()).unwrap(), Some(cursor));
}

#[test_case("Gauge|" ; "one trailing pipe")]
#[test_case("Gauge||" ; "two trailing pipes")]
#[test_case("|Gauge" ; "leading pipe")]
fn test_catalog_identifier_with_pipes(identifier: &str) {
    let cursor = CatalogCursor {
        last_seen: CatalogKey::new("SWT", identifier),
        total: 2,
        page_size: 1,
    };
    assert_eq!(CatalogCursor::decode(&cursor.encode()).unwrap(), Some(cursor));
}

#[test_case("SWT/Keystone|||10" ; "missing field")]
#[test_case("SWT/Keystone|||ten|||10" ; "bad total")]
#[test_case("SWT/Keystone|||10|||big" ; "bad page size")]
fn test_catalog_cursor_malformed(text: &str) {
    assert!(matches!(
        CatalogCursor::decode(&raw(text)),
        Err(Error::MalformedCursor { .. })
    ));
}

#[test]
fn test_catalog_key_ordering_is_case_insensitive() {
    let a = CatalogKey::new("swt", "alpha");
    let b = CatalogKey::new("SWT", "Beta");
    assert!(a.sort_key() < b.sort_key());
    assert!(CatalogKey::start().sort_key() < a.sort_key());
    assert!(CatalogKey::start().is_start());
}
