//! Integration tests for erpsync-gateway
//!
//! Uses wiremock to simulate the ERP gateway and verifies collection reads,
//! the sync trigger, queue item replay and the health check.

mod common;

mod test_fetch;
mod test_sync_operations;
