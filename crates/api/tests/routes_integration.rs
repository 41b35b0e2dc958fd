//! HTTP routes end to end: router, admin guard, SQLite ledger, mock upstreams.

mod support;

use axum::http::{Method, StatusCode};
use serde_json::{json, Value};
use support::TestApp;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

/// Matches the card transaction partition for one upstream sync state.
struct Partition(&'static str);

impl Match for Partition {
    fn matches(&self, request: &Request) -> bool {
        request.url.query_pairs().any(|(key, value)| key == "filter" && value.contains(self.0))
    }
}

fn transaction(id: &str, amount: f64) -> Value {
    json!({
        "id": id,
        "occurredTime": "2025-10-02T14:11:00Z",
        "amount": amount,
        "currency": "USD",
        "merchantName": "Acme Supply",
        "userId": "u1",
        "transactionType": "POSTED",
        "completionStatus": "COMPLETE",
        "customFields": []
    })
}

/// Card API with two not-yet-synced transactions and empty other partitions.
async fn card_upstream() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/transactions"))
        .and(Partition("syncStatus:eq:NOT_SYNCED"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [transaction("t1", 42.5), transaction("t2", 9.0)]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/transactions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "id": "u1", "firstName": "Dana", "lastName": "Reyes" }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/custom-fields"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn health_is_public() {
    let upstream = MockServer::start().await;
    let app = TestApp::new(&upstream.uri(), None);

    let (status, body) = app.send(Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "ok");
}

#[tokio::test]
async fn protected_routes_require_admin_token() {
    let upstream = MockServer::start().await;
    let app = TestApp::new(&upstream.uri(), None);

    let (missing, body) = app.send(Method::GET, "/ledger", None, None).await;
    assert_eq!(missing, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");

    let (wrong, _) = app.send(Method::GET, "/sync/runs", None, Some("nope")).await;
    assert_eq!(wrong, StatusCode::UNAUTHORIZED);

    let (ok, _) = app.call(Method::GET, "/ledger", None).await;
    assert_eq!(ok, StatusCode::OK);
}

#[tokio::test]
async fn card_sync_populates_ledger_and_run_log() {
    let upstream = card_upstream().await;
    let app = TestApp::new(&upstream.uri(), None);

    let (status, report) = app.call(Method::POST, "/sync/card", Some(json!({ "daysBack": 7 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["kind"], "card");
    assert_eq!(report["status"], "success");
    assert_eq!(report["fetched"], 2);
    assert_eq!(report["created"], 2);

    let (status, rows) = app.call(Method::GET, "/ledger?type=Credit%20Card", None).await;
    assert_eq!(status, StatusCode::OK);
    let rows = rows.as_array().expect("ledger list");
    assert_eq!(rows.len(), 2);
    let t1 = rows.iter().find(|row| row["id"] == "card_t1").expect("card_t1 stored");
    assert_eq!(t1["amountCents"], 4250);
    assert_eq!(t1["cardholder"], "Dana Reyes");
    assert_eq!(t1["syncStatus"], "Not Synced");

    let (_, bills) = app.call(Method::GET, "/ledger?type=Vendor%20Bill", None).await;
    assert!(bills.as_array().expect("ledger list").is_empty());

    let (status, runs) = app.call(Method::GET, "/sync/runs?limit=5", None).await;
    assert_eq!(status, StatusCode::OK);
    let runs = runs.as_array().expect("run list");
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0]["status"], "success");
    assert_eq!(runs[0]["created"], 2);
    assert!(runs[0]["finishedAt"].is_string());
}

#[tokio::test]
async fn reviewer_flag_survives_resync() {
    let upstream = card_upstream().await;
    let app = TestApp::new(&upstream.uri(), None);
    app.call(Method::POST, "/sync/card", Some(json!({}))).await;

    let (status, row) =
        app.call(Method::PUT, "/ledger/card_t1/flag", Some(json!({ "flag": "Personal" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(row["flagCategory"], "Personal");

    let (status, report) = app.call(Method::POST, "/sync/card", Some(json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["updated"], 2);
    assert_eq!(report["created"], 0);
    assert!(report["flagsPreserved"].as_u64().unwrap_or_default() >= 1);

    let (_, flagged) = app.call(Method::GET, "/ledger?flag=Personal", None).await;
    let flagged = flagged.as_array().expect("ledger list");
    assert_eq!(flagged.len(), 1);
    assert_eq!(flagged[0]["id"], "card_t1");

    let (status, cleared) = app.call(Method::PUT, "/ledger/card_t1/flag", Some(json!({ "flag": null }))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(cleared["flagCategory"].is_null());
}

#[tokio::test]
async fn flagging_unknown_row_is_not_found() {
    let upstream = MockServer::start().await;
    let app = TestApp::new(&upstream.uri(), None);

    let (status, body) =
        app.call(Method::PUT, "/ledger/card_missing/flag", Some(json!({ "flag": "Good to Sync" }))).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn inverted_date_range_is_rejected() {
    let upstream = MockServer::start().await;
    let app = TestApp::new(&upstream.uri(), None);

    let (status, body) = app.call(Method::GET, "/ledger?from=2025-10-10&to=2025-10-01", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_input");
}

#[tokio::test]
async fn failing_upstream_is_recorded_as_failed_run() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/transactions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&upstream)
        .await;
    let app = TestApp::new(&upstream.uri(), None);

    let (status, report) = app.call(Method::POST, "/sync/card", Some(json!({}))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["status"], "failed");
    assert_eq!(report["fetched"], 0);
    assert!(!report["errors"].as_array().expect("errors").is_empty());
}

#[tokio::test]
async fn notify_without_webhook_is_rejected() {
    let upstream = MockServer::start().await;
    let app = TestApp::new(&upstream.uri(), None);

    let (status, body) = app.call(Method::POST, "/notify", Some(json!({ "text": "hello" }))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_input");
}

#[tokio::test]
async fn notify_posts_ledger_row_to_webhook() {
    let upstream = card_upstream().await;
    let webhook = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .and(body_partial_json(json!({ "text": "please check this one" })))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&webhook)
        .await;
    let app = TestApp::new(&upstream.uri(), Some(format!("{}/hook", webhook.uri())));
    app.call(Method::POST, "/sync/card", Some(json!({}))).await;

    let (status, body) = app
        .call(Method::POST, "/notify", Some(json!({ "text": "please check this one", "ledgerId": "card_t2" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["delivered"], true);

    let (status, _) = app
        .call(Method::POST, "/notify", Some(json!({ "text": "missing", "ledgerId": "card_nope" })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
