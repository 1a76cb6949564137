//! Collection reads

use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, ResponseTemplate};

use erpsync_core::domain::{Collection, Currency, EntityKind};
use erpsync_core::ports::IRemoteGateway;
use erpsync_gateway::{GatewayError, HttpErpGateway};

use crate::common;

#[tokio::test]
async fn test_fetch_stock_bare_array() {
    let (server, gateway) = common::setup_gateway_mock().await;
    common::mount_collection(
        &server,
        "/stock",
        json!([
            {"stokKodu": "SKU001", "depo": "MERKEZ", "miktar": "1.234,56"},
            {"code": "SKU002", "warehouse": "DEPO2", "quantity": 3}
        ]),
    )
    .await;

    let raw = gateway.fetch_stock().await.expect("fetch_stock failed");

    assert_eq!(raw.len(), 2);
    assert_eq!(raw[0].code, Some(json!("SKU001")));
    assert_eq!(raw[0].quantity, Some(json!("1.234,56")));
    assert_eq!(raw[1].warehouse, Some(json!("DEPO2")));
}

#[tokio::test]
async fn test_fetch_invoices_data_envelope() {
    let (server, gateway) = common::setup_gateway_mock().await;
    common::mount_collection(
        &server,
        "/invoices",
        json!({"data": [{"faturaNo": "F-1", "tarih": "01.02.2024"}], "total": 1}),
    )
    .await;

    let raw = gateway.fetch_invoices().await.unwrap();

    assert_eq!(raw.len(), 1);
    assert_eq!(raw[0].invoice_number, Some(json!("F-1")));
}

#[tokio::test]
async fn test_non_object_elements_are_dropped() {
    let (server, gateway) = common::setup_gateway_mock().await;
    common::mount_collection(
        &server,
        "/quotes",
        json!([{"teklifNo": "Q-1"}, 42, "junk", null]),
    )
    .await;

    let raw = gateway.fetch_quotes().await.unwrap();
    assert_eq!(raw.len(), 1);
}

#[tokio::test]
async fn test_fetch_collection_normalizes_records() {
    let (server, gateway) = common::setup_gateway_mock().await;
    common::mount_collection(
        &server,
        "/ledger",
        json!([{
            "cariKodu": "120.01",
            "tarih": "2024-01-15",
            "belgeNo": "D-7",
            "borc": "1.500,00",
            "alacak": 0,
            "dovizCinsi": "XYZ"
        }]),
    )
    .await;

    let collection = gateway
        .fetch_collection(EntityKind::Ledger)
        .await
        .unwrap();

    let Collection::Ledger(entries) = collection else {
        panic!("expected ledger collection");
    };
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].account_code, "120.01");
    assert_eq!(entries[0].document_number, "D-7");
    assert_eq!(entries[0].debit, Some(1500.0));
    assert_eq!(entries[0].currency, Currency::Try);
}

#[tokio::test]
async fn test_server_error_maps_to_server_error() {
    let (server, gateway) = common::setup_gateway_mock().await;
    common::mount_status(&server, "GET", "/stock", 503).await;

    let err = gateway.fetch_stock().await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<GatewayError>(),
        Some(GatewayError::ServerError(_))
    ));
}

#[tokio::test]
async fn test_unauthorized_maps_to_unauthorized() {
    let (server, gateway) = common::setup_gateway_mock().await;
    common::mount_status(&server, "GET", "/ledger", 401).await;

    let err = gateway.fetch_ledger().await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<GatewayError>(),
        Some(GatewayError::Unauthorized(_))
    ));
}

#[tokio::test]
async fn test_non_json_body_is_invalid_response() {
    let (server, gateway) = common::setup_gateway_mock().await;
    Mock::given(method("GET"))
        .and(path("/stock"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
        .mount(&server)
        .await;

    let err = gateway.fetch_stock().await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<GatewayError>(),
        Some(GatewayError::InvalidResponse(_))
    ));
}

#[tokio::test]
async fn test_bearer_token_is_sent() {
    let server = wiremock::MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/stock"))
        .and(header("Authorization", "Bearer secret-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = HttpErpGateway::with_base_url(server.uri()).with_api_token("secret-token");

    assert!(gateway.fetch_stock().await.unwrap().is_empty());
}
