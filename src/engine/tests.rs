//! Tests for engine module

use super::*;
use crate::http::HttpClientConfig;
use crate::output::MemorySink;
use crate::state::StateManager;
use crate::http::tests::stalling_server;
use crate::types::format_business_date;
use chrono::{Days, NaiveDate};
use futures::TryStreamExt;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn engine(server: &MockServer, max_retries: u32) -> SyncEngine {
    let config = HttpClientConfig::builder()
        .base_url(server.uri())
        .max_retries(max_retries)
        .backoff(Duration::from_millis(5), Duration::from_millis(20))
        .build();
    SyncEngine::new(
        HttpClient::with_config(config).unwrap(),
        StateManager::in_memory(),
        "LOC1",
    )
}

fn token() -> BearerToken {
    BearerToken::new("tok-xyz")
}

fn guest_checks_body(ids: &[u64]) -> String {
    let checks: Vec<String> = ids
        .iter()
        .map(|id| format!(r#"{{"guestCheckId": {id}, "opnLcl": "2025-03-0{}T12:00:00", "subTtl": 12.10}}"#, id % 10))
        .collect();
    format!(r#"{{"curUTC": "2025-03-10T00:00:00", "guestChecks": [{}]}}"#, checks.join(","))
}

async fn mount_day(server: &MockServer, day: &str, body: String) {
    Mock::given(method("POST"))
        .and(path("/getGuestChecks"))
        .and(header("Authorization", "Bearer tok-xyz"))
        .and(body_partial_json(json!({"locRef": "LOC1", "busDt": day})))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(1)
        .mount(server)
        .await;
}

// ============================================================================
// SyncStats Tests
// ============================================================================

#[test]
fn test_sync_stats() {
    let mut stats = SyncStats::new();
    stats.add_records(10);
    stats.add_pages(2);
    stats.add_stream();
    stats.set_duration(1500);

    assert_eq!(stats.records_synced, 10);
    assert_eq!(stats.pages_fetched, 2);
    assert_eq!(stats.streams_synced, 1);
    assert_eq!(stats.duration_ms, 1500);
}

#[test]
fn test_request_counter() {
    let mut counter = RequestCounter::new("guest_checks", "/getGuestChecks");
    counter.increment();
    counter.increment();
    assert_eq!(counter.count(), 2);
}

#[test]
fn test_page_label() {
    let mut params = JsonObject::new();
    assert_eq!(page_label(&params, 3), "3");
    params.insert("busDt".to_string(), json!("2025-03-05"));
    assert_eq!(page_label(&params, 3), "2025-03-05");
}

// ============================================================================
// Business Date Pagination
// ============================================================================

#[tokio::test]
async fn test_empty_day_does_not_stop_pagination() {
    let server = MockServer::start().await;
    mount_day(&server, "2025-03-01", guest_checks_body(&[])).await;
    mount_day(&server, "2025-03-02", guest_checks_body(&[1, 2, 3])).await;
    mount_day(&server, "2025-03-03", guest_checks_body(&[4])).await;

    let engine = engine(&server, 0);
    let definition = Stream::GuestChecks.definition();
    let token = token();
    let window = DateWindow::new(date("2025-03-01"), date("2025-03-03"));

    let records: Vec<Value> = engine
        .records(&definition, &token, Some(window))
        .try_collect()
        .await
        .unwrap();

    assert_eq!(records.len(), 4);
    assert_eq!(records[0]["guestCheckId"], json!(1));
    assert_eq!(records[3]["guestCheckId"], json!(4));
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_pages_report_empty_days_explicitly() {
    let server = MockServer::start().await;
    mount_day(&server, "2025-03-01", guest_checks_body(&[])).await;
    mount_day(&server, "2025-03-02", guest_checks_body(&[1])).await;

    let engine = engine(&server, 0);
    let definition = Stream::GuestChecks.definition();
    let token = token();
    let window = DateWindow::new(date("2025-03-01"), date("2025-03-02"));

    let pages: Vec<Page> = engine
        .pages(&definition, &token, Some(window))
        .try_collect()
        .await
        .unwrap();

    assert_eq!(pages.len(), 2);
    assert_eq!(pages[0], Page::Empty);
    assert_eq!(pages[1].len(), 1);
}

#[tokio::test]
async fn test_one_request_per_day_in_order() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/getGuestChecks"))
        .respond_with(ResponseTemplate::new(200).set_body_string(guest_checks_body(&[])))
        .expect(5)
        .mount(&server)
        .await;

    let engine = engine(&server, 0);
    let definition = Stream::GuestChecks.definition();
    let token = token();
    let window = DateWindow::new(date("2025-02-26"), date("2025-03-02"));

    let records: Vec<Value> = engine
        .records(&definition, &token, Some(window))
        .try_collect()
        .await
        .unwrap();
    assert!(records.is_empty());

    let dates: Vec<String> = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|r| {
            let body: Value = serde_json::from_slice(&r.body).unwrap();
            body["busDt"].as_str().unwrap().to_string()
        })
        .collect();
    assert_eq!(
        dates,
        vec!["2025-02-26", "2025-02-27", "2025-02-28", "2025-03-01", "2025-03-02"]
    );
}

#[tokio::test]
async fn test_inverted_window_issues_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string(guest_checks_body(&[1])))
        .expect(0)
        .mount(&server)
        .await;

    let engine = engine(&server, 0);
    let definition = Stream::GuestChecks.definition();
    let token = token();
    let window = DateWindow::new(date("2025-03-05"), date("2025-03-04"));

    let records: Vec<Value> = engine
        .records(&definition, &token, Some(window))
        .try_collect()
        .await
        .unwrap();
    assert!(records.is_empty());
}

#[tokio::test]
async fn test_failed_day_is_a_pagination_error() {
    let server = MockServer::start().await;
    mount_day(&server, "2025-03-01", guest_checks_body(&[1])).await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"busDt": "2025-03-02"})))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let engine = engine(&server, 0);
    let definition = Stream::GuestChecks.definition();
    let token = token();
    let window = DateWindow::new(date("2025-03-01"), date("2025-03-03"));

    let err = engine
        .records(&definition, &token, Some(window))
        .try_collect::<Vec<Value>>()
        .await
        .unwrap_err();

    match err {
        Error::Pagination {
            stream,
            page,
            source,
        } => {
            assert_eq!(stream, "guest_checks");
            assert_eq!(page, "2025-03-02");
            assert!(matches!(*source, Error::HttpStatus { status: 500, .. }));
        }
        other => panic!("Expected pagination error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_transient_failure_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_day(&server, "2025-03-01", guest_checks_body(&[1])).await;

    let engine = engine(&server, 2);
    let definition = Stream::GuestChecks.definition();
    let token = token();
    let window = DateWindow::new(date("2025-03-01"), date("2025-03-01"));

    let records: Vec<Value> = engine
        .records(&definition, &token, Some(window))
        .try_collect()
        .await
        .unwrap();
    assert_eq!(records.len(), 1);
}

#[tokio::test]
async fn test_day_with_stalled_body_is_refetched() {
    let (base_url, connections) = stalling_server(
        1,
        r#"{"guestChecks": [{"guestCheckId": 1, "opnLcl": "2025-03-01T12:00:00", "subTtl": 12.10}]}"#,
    )
    .await;

    let client = HttpClient::with_config(
        HttpClientConfig::builder()
            .base_url(base_url)
            .timeout(Duration::from_millis(300))
            .max_retries(3)
            .backoff(Duration::from_millis(5), Duration::from_millis(20))
            .build(),
    )
    .unwrap();
    let engine = SyncEngine::new(client, StateManager::in_memory(), "LOC1");
    let definition = Stream::GuestChecks.definition();
    let token = token();
    let window = DateWindow::new(date("2025-03-01"), date("2025-03-01"));

    let records: Vec<Value> = engine
        .records(&definition, &token, Some(window))
        .try_collect()
        .await
        .unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["guestCheckId"], json!(1));
    assert_eq!(connections.load(std::sync::atomic::Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_malformed_body_is_a_pagination_error() {
    let server = MockServer::start().await;
    mount_day(&server, "2025-03-01", "<html>oops</html>".to_string()).await;

    let engine = engine(&server, 0);
    let definition = Stream::GuestChecks.definition();
    let token = token();
    let window = DateWindow::new(date("2025-03-01"), date("2025-03-01"));

    let err = engine
        .records(&definition, &token, Some(window))
        .try_collect::<Vec<Value>>()
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Pagination { .. }));
    assert!(err.to_string().contains("guest_checks"));
}

// ============================================================================
// Next-Page Token Streams
// ============================================================================

#[tokio::test]
async fn test_token_stream_follows_next_page() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/getTaxDimensions"))
        .and(body_partial_json(json!({"nextPage": "p2"})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"taxes": [{"num": 3, "name": "City"}]})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/getTaxDimensions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "taxes": [{"num": 1, "name": "VAT"}, {"num": 2, "name": "State"}],
            "next_page": "p2"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let engine = engine(&server, 0);
    let definition = Stream::TaxDimensions.definition();
    let token = token();

    let records: Vec<Value> = engine
        .records(&definition, &token, None)
        .try_collect()
        .await
        .unwrap();

    let nums: Vec<Value> = records.iter().map(|r| r["num"].clone()).collect();
    assert_eq!(nums, vec![json!(1), json!(2), json!(3)]);
}

#[tokio::test]
async fn test_workstations_come_from_first_location() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/getLocationDimensions"))
        .and(body_partial_json(json!({"locRef": "LOC1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "locations": [
                {"workstations": [{"wsNum": 1, "wsName": "Bar"}, {"wsNum": 2, "wsName": "Patio"}]},
                {"workstations": [{"wsNum": 9, "wsName": "Elsewhere"}]}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let engine = engine(&server, 0);
    let definition = Stream::WorkstationsDimensions.definition();
    let token = token();

    let records: Vec<Value> = engine
        .records(&definition, &token, None)
        .try_collect()
        .await
        .unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[1]["wsName"], json!("Patio"));
}

// ============================================================================
// Sync
// ============================================================================

#[tokio::test]
async fn test_sync_stream_emits_schema_records_and_state() {
    let server = MockServer::start().await;
    mount_day(
        &server,
        "2025-03-01",
        r#"{"guestChecks": [
            {"guestCheckId": 1, "opnLcl": "2025-03-01T09:00:00", "subTtl": 12.10},
            {"guestCheckId": 2, "opnLcl": "2025-03-01T21:30:00", "subTtl": 3.5}
        ]}"#
        .to_string(),
    )
    .await;
    mount_day(
        &server,
        "2025-03-02",
        r#"{"guestChecks": [{"guestCheckId": 3, "opnLcl": "2025-03-01T23:59:00"}]}"#.to_string(),
    )
    .await;

    let mut engine = engine(&server, 0);
    let definition = Stream::GuestChecks.definition();
    let mut sink = MemorySink::new();
    let window = DateWindow::new(date("2025-03-01"), date("2025-03-02"));

    engine
        .sync_stream(&definition, &token(), Some(window), &mut sink)
        .await
        .unwrap();

    assert!(matches!(sink.messages[0], Message::Schema { .. }));
    assert!(sink.messages[1..4]
        .iter()
        .all(|m| matches!(m, Message::Record { .. })));
    assert!(matches!(sink.messages[4], Message::State { .. }));
    assert_eq!(sink.messages.len(), 5);

    let line = sink.messages[1].to_line().unwrap();
    assert!(line.contains(r#""subTtl":12.10"#));

    let Message::State { value } = &sink.messages[4] else {
        panic!("Expected state");
    };
    assert_eq!(
        value["bookmarks"]["guest_checks"],
        json!({"replication_key": "opnLcl", "replication_key_value": "2025-03-01T23:59:00"})
    );

    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_full_table_stream_emits_no_state() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/getRevenueCenterDimensions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"revenueCenters": [{"num": 1, "name": "Dining"}]})),
        )
        .mount(&server)
        .await;

    let mut engine = engine(&server, 0);
    let mut sink = MemorySink::new();
    engine
        .sync_stream(
            &Stream::RevenueCenterDimensions.definition(),
            &token(),
            None,
            &mut sink,
        )
        .await
        .unwrap();

    assert_eq!(sink.messages.len(), 2);
    assert!(!sink
        .messages
        .iter()
        .any(|m| matches!(m, Message::State { .. })));
}

#[tokio::test]
async fn test_sync_resumes_from_bookmark_until_yesterday() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/getGuestChecks"))
        .respond_with(ResponseTemplate::new(200).set_body_string(guest_checks_body(&[])))
        .expect(2)
        .mount(&server)
        .await;

    let yesterday = crate::pagination::yesterday();
    let day_before = yesterday.checked_sub_days(Days::new(1)).unwrap();
    let state = StateManager::from_json(
        &json!({"bookmarks": {"guest_checks": {
            "replication_key": "opnLcl",
            "replication_key_value": format!("{}T08:15:00", format_business_date(day_before))
        }}})
        .to_string(),
    )
    .unwrap();

    let client = HttpClient::with_config(
        HttpClientConfig::builder()
            .base_url(server.uri())
            .build(),
    )
    .unwrap();
    let mut engine =
        SyncEngine::new(client, state.clone(), "LOC1").with_start_date(Some(date("2020-01-01")));
    let mut sink = MemorySink::new();

    let stats = engine
        .sync(&token(), &[Stream::GuestChecks], &mut sink)
        .await
        .unwrap();
    assert_eq!(stats.pages_fetched, 2);
    assert_eq!(stats.streams_synced, 1);

    let requested: Vec<String> = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|r| {
            let body: Value = serde_json::from_slice(&r.body).unwrap();
            body["busDt"].as_str().unwrap().to_string()
        })
        .collect();
    assert_eq!(
        requested,
        vec![format_business_date(day_before), format_business_date(yesterday)]
    );

    // No new records, so the bookmark stays put
    let bookmark = state.snapshot().await.get_bookmark("guest_checks").cloned().unwrap();
    assert!(bookmark
        .replication_key_value
        .starts_with(&format_business_date(day_before)));
}

#[tokio::test]
async fn test_sync_runs_streams_in_order() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/getTaxDimensions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"taxes": [{"num": 1}]})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/getTenderMediaDimensions"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"tenderMedias": [{"num": 7}]})),
        )
        .mount(&server)
        .await;

    let mut engine = engine(&server, 0);
    let mut sink = MemorySink::new();
    engine
        .sync(
            &token(),
            &[Stream::TenderMediaDimensions, Stream::TaxDimensions],
            &mut sink,
        )
        .await
        .unwrap();

    let streams: Vec<&str> = sink
        .messages
        .iter()
        .filter_map(|m| match m {
            Message::Schema { stream, .. } => Some(stream.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(streams, vec!["tender_media_dimensions", "tax_dimensions"]);
    assert_eq!(sink.records("tax_dimensions").len(), 1);
}
