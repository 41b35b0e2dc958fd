//! ERP adapter against a mock HTTP server.

mod support;

use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;
use spendledger_core::WorkSetSource;
use spendledger_domain::{SourceKind, SyncKind};
use spendledger_infra::integrations::{BillSyncRequest, BillWorkSetSource, ErpClient};
use support::{erp_config, SignedFor};
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SUITEQL: &str = "/services/rest/query/v1/suiteql";

#[derive(Debug, Deserialize)]
struct Row {
    id: String,
}

#[tokio::test]
async fn suiteql_stops_after_a_short_page() {
    let server = MockServer::start().await;
    let mut config = erp_config(&server.uri());
    config.page_size = 2;

    Mock::given(method("POST"))
        .and(path(SUITEQL))
        .and(query_param("offset", "0"))
        .and(query_param("limit", "2"))
        .and(header("prefer", "transient"))
        .and(SignedFor("1234567"))
        .and(body_string_contains("SELECT id FROM vendor"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{ "id": "1" }, { "id": "2" }],
            "hasMore": true
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(SUITEQL))
        .and(query_param("offset", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{ "id": "3" }],
            "hasMore": true
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(SUITEQL))
        .and(query_param("offset", "4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [] })))
        .expect(0)
        .mount(&server)
        .await;

    let client = ErpClient::new(&config).unwrap();
    let rows: Vec<Row> = client.suiteql("SELECT id FROM vendor").await.unwrap();

    let ids: Vec<&str> = rows.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2", "3"]);
}

#[tokio::test]
async fn suiteql_honours_has_more_false_on_a_full_page() {
    let server = MockServer::start().await;
    let mut config = erp_config(&server.uri());
    config.page_size = 1;

    Mock::given(method("POST"))
        .and(path(SUITEQL))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{ "id": "1" }],
            "hasMore": false
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = ErpClient::new(&config).unwrap();
    let rows: Vec<Row> = client.suiteql("SELECT id FROM vendor").await.unwrap();
    assert_eq!(rows.len(), 1);
}

#[tokio::test]
async fn bill_work_set_falls_back_per_bill_and_caches_vendors() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(SUITEQL))
        .and(body_string_contains("VendBill"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                { "id": "101", "trandate": "10/02/2025", "entity": "77", "foreigntotal": "1200.50",
                  "memo": "October lease", "status": "Open", "currency": "US Dollar" },
                { "id": "102", "trandate": "10/03/2025", "entity": "77", "foreigntotal": 80 },
                { "id": "103", "trandate": "10/04/2025", "entity": "88", "foreigntotal": "n/a" }
            ],
            "hasMore": false
        })))
        .mount(&server)
        .await;

    // bill 101: header fields on the record, category from the first expense line
    Mock::given(method("GET"))
        .and(path("/services/rest/record/v1/vendorBill/101"))
        .and(SignedFor("1234567"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "location": { "id": "4", "refName": "Phoenix:Phx - North" },
            "department": { "id": "9", "refName": "Service" }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/services/rest/record/v1/vendorBill/101/expense"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                { "category": { "refName": "Rent" }, "department": { "refName": "Admin" }, "memo": "line memo" },
                { "category": { "refName": "Utilities" } }
            ]
        })))
        .mount(&server)
        .await;

    // bill 102: detail fetch fails, the bill is still kept
    Mock::given(method("GET"))
        .and(path("/services/rest/record/v1/vendorBill/102"))
        .respond_with(ResponseTemplate::new(404).set_body_string("missing"))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/services/rest/record/v1/vendor/77"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "companyName": "Desert Properties LLC",
            "entityId": "V-77"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/services/rest/record/v1/vendor/88"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "companyName": "Ridge Supply" })))
        .mount(&server)
        .await;

    let client = Arc::new(ErpClient::new(&erp_config(&server.uri())).unwrap());
    let source = BillWorkSetSource::new(client, BillSyncRequest { days_back: 60 });

    assert_eq!(source.kind(), SyncKind::Bills);
    let work_set = source.fetch_work_set().await.unwrap();

    // bill 103 has an unreadable total and is carried as a record error
    assert_eq!(work_set.records.len(), 2);
    assert_eq!(work_set.rejected.len(), 1);
    assert_eq!(work_set.rejected[0].record_id.as_deref(), Some("bill_103"));
    assert_eq!(work_set.rejected[0].vendor.as_deref(), Some("Ridge Supply"));
    assert!(work_set.rejected[0].message.contains("unreadable total"));
    assert!(work_set.references.user_names.is_empty());

    let lease = &work_set.records[0];
    assert_eq!(lease.source, SourceKind::VendorBill);
    assert_eq!(lease.ledger_id(), "bill_101");
    assert_eq!(lease.amount_cents, 120_050);
    assert_eq!(lease.vendor_name, "Desert Properties LLC");
    assert_eq!(lease.currency, "US Dollar");
    assert_eq!(lease.memo.as_deref(), Some("October lease"));
    assert_eq!(lease.prefilled.branch.as_deref(), Some("Phoenix:Phx - North"));
    assert_eq!(lease.prefilled.department.as_deref(), Some("Service"));
    assert_eq!(lease.prefilled.category.as_deref(), Some("Rent"));
    assert_eq!(lease.prefilled.memo.as_deref(), Some("line memo"));

    let second = &work_set.records[1];
    assert_eq!(second.vendor_name, "Desert Properties LLC");
    assert_eq!(second.amount_cents, 8000);
    assert_eq!(second.prefilled, Default::default());
}

#[tokio::test]
async fn failed_header_query_fails_the_fetch() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(SUITEQL))
        .respond_with(ResponseTemplate::new(400).set_body_string("Invalid search query"))
        .mount(&server)
        .await;

    let client = Arc::new(ErpClient::new(&erp_config(&server.uri())).unwrap());
    let source = BillWorkSetSource::new(client, BillSyncRequest { days_back: 7 });

    let err = source.fetch_work_set().await.unwrap_err();
    assert!(err.to_string().contains("Invalid search query"), "unexpected error: {err}");
}

#[tokio::test]
async fn unknown_vendor_is_labelled() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(SUITEQL))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{ "id": "5", "trandate": "2025-10-01", "entity": "404", "foreigntotal": "10" }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/services/rest/record/v1/vendor/404"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = Arc::new(ErpClient::new(&erp_config(&server.uri())).unwrap());
    let source = BillWorkSetSource::new(client, BillSyncRequest { days_back: 7 });

    let work_set = source.fetch_work_set().await.unwrap();
    assert_eq!(work_set.records[0].vendor_name, "Unknown Vendor");
}

#[tokio::test]
async fn bill_without_a_total_is_rejected_not_dropped() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(SUITEQL))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{ "id": "6", "trandate": "2025-10-01" }]
        })))
        .mount(&server)
        .await;

    let client = Arc::new(ErpClient::new(&erp_config(&server.uri())).unwrap());
    let source = BillWorkSetSource::new(client, BillSyncRequest { days_back: 7 });

    let work_set = source.fetch_work_set().await.unwrap();
    assert!(work_set.records.is_empty());
    assert_eq!(work_set.rejected.len(), 1);
    assert_eq!(work_set.rejected[0].record_id.as_deref(), Some("bill_6"));
    assert_eq!(work_set.rejected[0].vendor.as_deref(), Some("Unknown Vendor"));
    assert_eq!(work_set.rejected[0].message, "bill has no total");
}
