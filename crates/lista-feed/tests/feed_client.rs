//! Integration tests for `FeedClient` and `RateClient`.
//!
//! Uses `wiremock` to stand up a local HTTP server for each test so no real
//! network traffic is made.

use std::io::Write;

use flate2::write::GzEncoder;
use flate2::Compression;
use lista_core::{Catalog, Product, SnapshotId, UnitKind};
use rust_decimal::Decimal;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use lista_feed::{encode_catalog, ErrorKind, FeedClient, FeedError, RateClient};

const LOCATOR_PATH: &str = "/price-lists-json/latest-json-filename.txt";

fn test_client(server: &MockServer) -> FeedClient {
    FeedClient::with_base_url(&server.uri()).expect("failed to build test FeedClient")
}

fn gzip(bytes: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes).unwrap();
    encoder.finish().unwrap()
}

fn sample_catalog() -> Catalog {
    Catalog::new(vec![
        Product {
            name: "Caño galvanizado".to_owned(),
            detail: "Ø 20mm x 6m".to_owned(),
            brand: "Tigre".to_owned(),
            unit_kind: UnitKind::Unit,
            currency: "USD".to_owned(),
            price: Decimal::new(1875, 2),
        },
        Product {
            name: "Cable unipolar".to_owned(),
            detail: "2.5mm² rojo".to_owned(),
            brand: "Pirelli".to_owned(),
            unit_kind: UnitKind::Length,
            currency: "$".to_owned(),
            price: Decimal::new(83010, 2),
        },
    ])
}

// ---------------------------------------------------------------------------
// Locator
// ---------------------------------------------------------------------------

#[tokio::test]
async fn resolve_latest_returns_trimmed_identifier() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LOCATOR_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("  lista-24-06-25.json.gz\r\n"))
        .mount(&server)
        .await;

    let identifier = test_client(&server).resolve_latest().await.unwrap();

    assert_eq!(identifier, SnapshotId::new("lista-24-06-25.json.gz"));
    assert_eq!(identifier.date(), Some("24-06-25"));
}

#[tokio::test]
async fn resolve_latest_fails_on_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LOCATOR_PATH))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let result = test_client(&server).resolve_latest().await;

    assert!(
        matches!(result, Err(FeedError::LocatorUnavailable { ref reason, .. }) if reason.contains("404")),
        "expected LocatorUnavailable(404), got: {result:?}"
    );
}

#[tokio::test]
async fn resolve_latest_fails_on_blank_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LOCATOR_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(" \n"))
        .mount(&server)
        .await;

    let result = test_client(&server).resolve_latest().await;

    assert!(
        matches!(result, Err(FeedError::LocatorUnavailable { .. })),
        "expected LocatorUnavailable, got: {result:?}"
    );
}

#[tokio::test]
async fn resolve_latest_rejects_identifier_with_path_separator() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LOCATOR_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("../../etc/passwd"))
        .mount(&server)
        .await;

    let result = test_client(&server).resolve_latest().await;

    assert!(
        matches!(result, Err(FeedError::LocatorUnavailable { .. })),
        "expected LocatorUnavailable, got: {result:?}"
    );
}

#[tokio::test]
async fn resolve_latest_fails_when_server_unreachable() {
    let client = FeedClient::with_base_url("http://127.0.0.1:1").unwrap();

    let err = client.resolve_latest().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::LocatorUnavailable);
}

#[tokio::test]
async fn custom_locator_path_and_prefix_are_honoured() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/feeds/current.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("b.json.gz"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/feeds/snapshots/b.json.gz"))
        .respond_with(
            ResponseTemplate::new(200).set_body_bytes(encode_catalog(&sample_catalog()).unwrap()),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = FeedClient::new(
        &server.uri(),
        "/feeds/current.txt",
        "/feeds/snapshots",
        5,
        "lista-test/0.1",
    )
    .unwrap();
    let identifier = client.resolve_latest().await.unwrap();
    let catalog = client.fetch_snapshot(&identifier).await.unwrap();

    assert_eq!(catalog, sample_catalog());
}

// ---------------------------------------------------------------------------
// Snapshot fetch + decode
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fetch_snapshot_decodes_gzip_catalog() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/price-lists-json/lista-24-06-25.json.gz"))
        .respond_with(
            ResponseTemplate::new(200).set_body_bytes(encode_catalog(&sample_catalog()).unwrap()),
        )
        .mount(&server)
        .await;

    let catalog = test_client(&server)
        .fetch_snapshot(&SnapshotId::new("lista-24-06-25.json.gz"))
        .await
        .unwrap();

    assert_eq!(catalog, sample_catalog());
}

#[tokio::test]
async fn fetch_snapshot_reads_feed_field_names() {
    let server = MockServer::start().await;
    let body = gzip(
        r#"[{"producto":"Llave térmica","detalle":"2x16A","marca":"Sica","unidad":"UN","moneda":"USD","precio":9.9}]"#
            .as_bytes(),
    );
    Mock::given(method("GET"))
        .and(path("/price-lists-json/a.json.gz"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
        .mount(&server)
        .await;

    let catalog = test_client(&server)
        .fetch_snapshot(&SnapshotId::new("a.json.gz"))
        .await
        .unwrap();

    assert_eq!(catalog.len(), 1);
    let product = &catalog.products()[0];
    assert_eq!(product.name, "Llave térmica");
    assert_eq!(product.brand, "Sica");
    assert_eq!(product.unit_kind, UnitKind::Unit);
    assert_eq!(product.price, Decimal::new(99, 1));
}

#[tokio::test]
async fn fetch_snapshot_fails_on_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/price-lists-json/a.json.gz"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let result = test_client(&server)
        .fetch_snapshot(&SnapshotId::new("a.json.gz"))
        .await;

    assert!(
        matches!(result, Err(FeedError::Transfer { status: Some(500), .. })),
        "expected Transfer(500), got: {result:?}"
    );
}

#[tokio::test]
async fn fetch_snapshot_fails_on_uncompressed_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/price-lists-json/a.json.gz"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[{\"producto\":\"plain json, not gzip\"}]"))
        .mount(&server)
        .await;

    let err = test_client(&server)
        .fetch_snapshot(&SnapshotId::new("a.json.gz"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Decompression, "got: {err:?}");
}

#[tokio::test]
async fn fetch_snapshot_fails_on_malformed_json() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/price-lists-json/a.json.gz"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(gzip(b"{\"producto\": [")))
        .mount(&server)
        .await;

    let result = test_client(&server)
        .fetch_snapshot(&SnapshotId::new("a.json.gz"))
        .await;

    assert!(
        matches!(result, Err(FeedError::Parse { ref context, .. }) if context == "a.json.gz"),
        "expected Parse, got: {result:?}"
    );
}

#[tokio::test]
async fn fetch_snapshot_fails_on_invalid_utf8() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/price-lists-json/a.json.gz"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(gzip(&[b'[', 0xc3, 0x28, b']'])))
        .mount(&server)
        .await;

    let err = test_client(&server)
        .fetch_snapshot(&SnapshotId::new("a.json.gz"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Parse, "got: {err:?}");
}

// ---------------------------------------------------------------------------
// Currency reference
// ---------------------------------------------------------------------------

#[tokio::test]
async fn rate_client_reads_sale_price() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/dolares/oficial"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "compra": 1010.0,
            "venta": 1050.5,
            "fechaActualizacion": "2025-06-24T15:00:00.000Z"
        })))
        .mount(&server)
        .await;

    let client = RateClient::new(&format!("{}/v1/dolares/oficial", server.uri()), 5, "lista-test")
        .unwrap();
    let price = client.fetch_sale_price().await.unwrap();

    assert_eq!(price, Decimal::new(10505, 1));
    assert_eq!(lista_feed::format_sale_price(Some(price)), "$1050.50");
}

#[tokio::test]
async fn rate_client_fails_on_unavailable_service() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = RateClient::new(&server.uri(), 5, "lista-test").unwrap();
    let err = client.fetch_sale_price().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Transfer);
}

#[tokio::test]
async fn rate_client_fails_on_missing_field() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"compra": 1})))
        .mount(&server)
        .await;

    let client = RateClient::new(&server.uri(), 5, "lista-test").unwrap();
    let err = client.fetch_sale_price().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Parse);
}
