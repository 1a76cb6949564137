//! Sync trigger, queue replay and health check

use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, ResponseTemplate};

use erpsync_core::domain::{EntityKind, QueueOperation, SyncQueueItem};
use erpsync_core::ports::IRemoteGateway;
use erpsync_gateway::{GatewayError, HttpErpGateway};

use crate::common;

#[tokio::test]
async fn test_trigger_sync_success() {
    let (server, gateway) = common::setup_gateway_mock().await;
    Mock::given(method("POST"))
        .and(path("/sync"))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    gateway.trigger_sync().await.expect("trigger_sync failed");
}

#[tokio::test]
async fn test_trigger_sync_failure() {
    let (server, gateway) = common::setup_gateway_mock().await;
    common::mount_status(&server, "POST", "/sync", 500).await;

    assert!(gateway.trigger_sync().await.is_err());
}

#[tokio::test]
async fn test_apply_posts_item_to_entity_endpoint() {
    let (server, gateway) = common::setup_gateway_mock().await;
    let item = SyncQueueItem::new(
        EntityKind::Quote,
        QueueOperation::Create,
        json!({"quoteNumber": "Q-9", "total": 250}),
    );

    Mock::given(method("POST"))
        .and(path("/sync/quote"))
        .and(body_partial_json(json!({
            "id": item.id().to_string(),
            "operation": "create",
            "payload": {"quoteNumber": "Q-9", "total": 250}
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    gateway.apply(&item).await.expect("apply failed");
}

#[tokio::test]
async fn test_apply_rejection_is_error() {
    let (server, gateway) = common::setup_gateway_mock().await;
    common::mount_status(&server, "POST", "/sync/stock", 409).await;

    let item = SyncQueueItem::new(EntityKind::Stock, QueueOperation::Delete, json!({}));
    let err = gateway.apply(&item).await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<GatewayError>(),
        Some(GatewayError::Status { status: 409, .. })
    ));
}

#[tokio::test]
async fn test_health_check() {
    let (server, gateway) = common::setup_gateway_mock().await;
    common::mount_status(&server, "GET", "/health", 200).await;

    assert!(gateway.is_reachable().await);
}

#[tokio::test]
async fn test_health_check_unhealthy() {
    let (server, gateway) = common::setup_gateway_mock().await;
    common::mount_status(&server, "GET", "/health", 503).await;

    assert!(!gateway.is_reachable().await);
}

#[tokio::test]
async fn test_unreachable_host_is_offline() {
    // Nothing listens on port 9 in the test environment
    let gateway = HttpErpGateway::with_base_url("http://127.0.0.1:9");
    assert!(!gateway.is_reachable().await);
}
