//! ERP gateway HTTP client
//!
//! Typed HTTP client for the remote ERP gateway. Handles the optional bearer
//! token, the request timeout, status mapping and the two accepted
//! collection envelopes.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use erpsync_core::config::GatewayConfig;
//! use erpsync_core::ports::IRemoteGateway;
//! use erpsync_gateway::HttpErpGateway;
//!
//! # async fn example(config: &GatewayConfig) -> anyhow::Result<()> {
//! let gateway = HttpErpGateway::new(config)?;
//! let stock = gateway.fetch_stock().await?;
//! println!("{} stock rows", stock.len());
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use erpsync_core::adapters::{RawInvoiceRecord, RawLedgerRecord, RawQuoteRecord, RawStockRecord};
use erpsync_core::config::GatewayConfig;
use erpsync_core::domain::{QueueItemId, QueueOperation, SyncQueueItem};
use erpsync_core::ports::IRemoteGateway;

use crate::GatewayError;

// ============================================================================
// Wire types
// ============================================================================

/// Body of `POST /sync/{entity}`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApplyRequest<'a> {
    id: &'a QueueItemId,
    operation: QueueOperation,
    payload: &'a Value,
    enqueued_at: DateTime<Utc>,
}

/// Extracts the record array from a collection response
///
/// Accepts a bare JSON array or an object with a `data` array. Elements that
/// are not JSON objects are dropped.
fn unwrap_records(path: &str, body: Value) -> Result<Vec<Value>, GatewayError> {
    let items = match body {
        Value::Array(items) => items,
        Value::Object(mut envelope) => match envelope.remove("data") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(GatewayError::InvalidResponse(format!(
                    "{} returned an object without a 'data' array",
                    path
                )))
            }
        },
        other => {
            return Err(GatewayError::InvalidResponse(format!(
                "{} returned {} instead of an array",
                path,
                json_type(&other)
            )))
        }
    };

    let total = items.len();
    let records: Vec<Value> = items.into_iter().filter(Value::is_object).collect();
    if records.len() < total {
        warn!(
            path,
            dropped = total - records.len(),
            "Dropped non-object elements from collection response"
        );
    }
    Ok(records)
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ============================================================================
// HttpErpGateway
// ============================================================================

/// HTTP client for the remote ERP gateway
pub struct HttpErpGateway {
    client: Client,
    /// Base URL without a trailing slash
    base_url: String,
    api_token: Option<String>,
}

impl HttpErpGateway {
    /// Creates a client from the `gateway` config section
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::NetworkError` if the HTTP client cannot be
    /// constructed (e.g. TLS backend initialization failure).
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone().filter(|t| !t.is_empty()),
        })
    }

    /// Creates a client with a custom base URL and no token (useful for testing)
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token: None,
        }
    }

    /// Sets the bearer token sent with every request
    #[must_use]
    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    /// Returns the base URL for API requests
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Creates a request builder for `path`, relative to the base URL
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let builder = self.client.request(method, &url);
        match &self.api_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Sends a request and maps non-success statuses to typed errors
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&(impl Serialize + Sync)>,
    ) -> Result<Response, GatewayError> {
        let mut builder = self.request(method.clone(), path);
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        debug!(%method, path, status = status.as_u16(), "Gateway returned error status");
        Err(GatewayError::from_status(status, body))
    }

    /// Fetches one collection endpoint as raw JSON objects
    pub async fn fetch_raw(&self, path: &str) -> Result<Vec<Value>, GatewayError> {
        debug!(path, "Fetching collection");

        let response = self.send(Method::GET, path, None::<&()>).await?;
        let body: Value = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(format!("{}: {}", path, e)))?;

        let records = unwrap_records(path, body)?;
        debug!(path, count = records.len(), "Collection fetched");
        Ok(records)
    }

    async fn fetch_as<R: From<Value>>(&self, path: &str) -> Result<Vec<R>, GatewayError> {
        Ok(self
            .fetch_raw(path)
            .await?
            .into_iter()
            .map(R::from)
            .collect())
    }
}

// ============================================================================
// IRemoteGateway
// ============================================================================

#[async_trait::async_trait]
impl IRemoteGateway for HttpErpGateway {
    async fn fetch_stock(&self) -> anyhow::Result<Vec<RawStockRecord>> {
        Ok(self.fetch_as("/stock").await?)
    }

    async fn fetch_invoices(&self) -> anyhow::Result<Vec<RawInvoiceRecord>> {
        Ok(self.fetch_as("/invoices").await?)
    }

    async fn fetch_ledger(&self) -> anyhow::Result<Vec<RawLedgerRecord>> {
        Ok(self.fetch_as("/ledger").await?)
    }

    async fn fetch_quotes(&self) -> anyhow::Result<Vec<RawQuoteRecord>> {
        Ok(self.fetch_as("/quotes").await?)
    }

    async fn trigger_sync(&self) -> anyhow::Result<()> {
        debug!("Triggering remote sync");
        self.send(Method::POST, "/sync", None::<&()>).await?;
        Ok(())
    }

    async fn apply(&self, item: &SyncQueueItem) -> anyhow::Result<()> {
        let path = format!("/sync/{}", item.entity().name());
        let body = ApplyRequest {
            id: item.id(),
            operation: item.operation(),
            payload: item.payload(),
            enqueued_at: item.enqueued_at(),
        };

        match self.send(Method::POST, &path, Some(&body)).await {
            Ok(_) => {
                debug!(id = %item.id(), path, "Queue item applied remotely");
                Ok(())
            }
            Err(e) => {
                if !e.is_transient() {
                    warn!(id = %item.id(), path, error = %e, "Remote rejected queue item");
                }
                Err(e.into())
            }
        }
    }

    async fn is_reachable(&self) -> bool {
        match self.send(Method::GET, "/health", None::<&()>).await {
            Ok(_) => true,
            Err(e) => {
                debug!(error = %e, "Health check failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_unwrap_bare_array() {
        let records = unwrap_records("/stock", json!([{"a": 1}, {"b": 2}])).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_unwrap_data_envelope() {
        let records = unwrap_records("/stock", json!({"data": [{"a": 1}], "total": 1})).unwrap();
        assert_eq!(records, vec![json!({"a": 1})]);
    }

    #[test]
    fn test_unwrap_drops_non_objects() {
        let records = unwrap_records("/stock", json!([{"a": 1}, 3, "x", null, [1]])).unwrap();
        assert_eq!(records, vec![json!({"a": 1})]);
    }

    #[test]
    fn test_unwrap_rejects_other_shapes() {
        assert!(unwrap_records("/stock", json!("nope")).is_err());
        assert!(unwrap_records("/stock", json!({"items": []})).is_err());
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let gateway = HttpErpGateway::with_base_url("http://localhost:8080/api/");
        assert_eq!(gateway.base_url(), "http://localhost:8080/api");
    }

    #[test]
    fn test_new_from_config() {
        let config = GatewayConfig {
            base_url: "https://erp.example.com/api".to_string(),
            api_token: Some(String::new()),
            timeout_secs: 5,
        };
        let gateway = HttpErpGateway::new(&config).unwrap();
        assert_eq!(gateway.base_url(), "https://erp.example.com/api");
        assert!(gateway.api_token.is_none());
    }
}
