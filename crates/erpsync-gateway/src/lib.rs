//! erpsync Gateway - Remote ERP HTTP client
//!
//! Provides the async client behind the `IRemoteGateway` port:
//! - Collection reads (`GET /stock`, `/invoices`, `/ledger`, `/quotes`)
//! - The remote sync trigger (`POST /sync`)
//! - Replay of queued mutations (`POST /sync/{entity}`)
//! - A reachability check (`GET /health`)
//!
//! ## Modules
//!
//! - [`client`] - HTTP client and port implementation

pub mod client;

pub use client::HttpErpGateway;

use thiserror::Error;

/// Errors that can occur when talking to the ERP gateway
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The API token was rejected (401/403)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The endpoint does not exist (404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// A server-side error occurred (5xx)
    #[error("Server error: {0}")]
    ServerError(String),

    /// Any other non-success status
    #[error("Unexpected status {status}: {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body or reason phrase
        message: String,
    },

    /// A network-level error occurred
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// The response body could not be parsed or had an unexpected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl GatewayError {
    /// Maps a non-success status and its body to a typed error
    pub fn from_status(status: reqwest::StatusCode, body: String) -> Self {
        let message = if body.trim().is_empty() {
            status
                .canonical_reason()
                .unwrap_or("no response body")
                .to_string()
        } else {
            body
        };

        match status.as_u16() {
            401 | 403 => GatewayError::Unauthorized(message),
            404 => GatewayError::NotFound(message),
            500..=599 => GatewayError::ServerError(message),
            code => GatewayError::Status {
                status: code,
                message,
            },
        }
    }

    /// Returns true for failures worth retrying later
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            GatewayError::ServerError(_) | GatewayError::NetworkError(_)
        ) || matches!(self, GatewayError::Status { status: 408 | 429, .. })
    }
}
