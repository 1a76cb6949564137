//! Shared helpers for gateway integration tests

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use erpsync_gateway::HttpErpGateway;

/// Starts a mock server and returns a gateway pointing at it
pub async fn setup_gateway_mock() -> (MockServer, HttpErpGateway) {
    let server = MockServer::start().await;
    let gateway = HttpErpGateway::with_base_url(server.uri());
    (server, gateway)
}

/// Mounts a GET collection endpoint answering with `body`
pub async fn mount_collection(server: &MockServer, endpoint: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(endpoint))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Mounts an endpoint answering every request with `status`
pub async fn mount_status(server: &MockServer, verb: &str, endpoint: &str, status: u16) {
    Mock::given(method(verb))
        .and(path(endpoint))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}
