//! Queue command - Inspect and replay the sync queue
//!
//! Provides the `erpsync queue` CLI subcommands:
//! - `list`     - every queued mutation in replay order
//! - `drain`    - replay the queue now, ignoring retry backoff
//! - `requeue`  - move parked items back to pending
//! - `enqueue`  - apply a mutation locally and queue it for the remote

use std::path::Path;

use anyhow::{Context, Result};
use clap::Subcommand;
use tracing::info;

use erpsync_core::domain::{EntityKind, QueueOperation, SyncQueueItem};
use erpsync_sync::DrainMode;

use super::context::AppContext;
use super::sync::{describe_report, drain_json};
use crate::output::{get_formatter, print_serialized, OutputFormat};

#[derive(Debug, Subcommand)]
pub enum QueueCommand {
    /// List queued mutations
    List,
    /// Replay queued mutations now
    Drain,
    /// Retry mutations that were parked after repeated failures
    Requeue,
    /// Apply a mutation locally and queue it for the remote ERP
    Enqueue {
        /// Entity kind (stock, ledger, invoice, quote)
        #[arg(long)]
        entity: EntityKind,
        /// Mutation kind (create, update, delete)
        #[arg(long)]
        operation: QueueOperation,
        /// Record as a JSON object, in the remote ERP's field names
        #[arg(long)]
        payload: String,
    },
}

impl QueueCommand {
    pub async fn execute(&self, format: OutputFormat, config: Option<&Path>) -> Result<()> {
        let ctx = AppContext::open(config).await?;
        let result = match self {
            QueueCommand::List => execute_list(&ctx, format).await,
            QueueCommand::Drain => execute_drain(&ctx, format).await,
            QueueCommand::Requeue => execute_requeue(&ctx, format).await,
            QueueCommand::Enqueue {
                entity,
                operation,
                payload,
            } => execute_enqueue(&ctx, format, *entity, *operation, payload).await,
        };
        ctx.close().await;
        result
    }
}

async fn execute_list(ctx: &AppContext, format: OutputFormat) -> Result<()> {
    let formatter = get_formatter(format);
    let items = ctx
        .orchestrator
        .queue_items()
        .await
        .context("Failed to read the sync queue")?;

    if format.is_json() {
        return print_serialized(formatter.as_ref(), &items);
    }

    if items.is_empty() {
        formatter.success("Sync queue is empty");
        return Ok(());
    }

    formatter.success(&format!("{} queued change(s)", items.len()));
    formatter.info("");
    formatter.info(&format!(
        "{:>5}  {:<8} {:<7} {:<8} {:>8}  {}",
        "SEQ", "ENTITY", "OP", "STATUS", "ATTEMPTS", "ENQUEUED"
    ));
    for item in &items {
        formatter.info(&list_row(item));
        if let Some(error) = item.last_error() {
            formatter.info(&format!("       last error: {}", error));
        }
    }
    Ok(())
}

fn list_row(item: &SyncQueueItem) -> String {
    format!(
        "{:>5}  {:<8} {:<7} {:<8} {:>8}  {}",
        item.sequence(),
        item.entity().name(),
        item.operation().name(),
        item.status().name(),
        item.attempts(),
        item.enqueued_at().format("%Y-%m-%d %H:%M:%S")
    )
}

async fn execute_drain(ctx: &AppContext, format: OutputFormat) -> Result<()> {
    let formatter = get_formatter(format);
    let outcome = ctx
        .orchestrator
        .attempt_queue_drain(DrainMode::Manual)
        .await
        .context("Failed to replay the sync queue")?;

    if format.is_json() {
        formatter.print_json(&drain_json(&outcome));
        return Ok(());
    }

    match outcome.report() {
        Some(report) if report.failed + report.parked > 0 => {
            formatter.warn(&describe_report(report));
            formatter.info("Run 'erpsync queue list' to see the errors");
        }
        Some(report) => formatter.success(&describe_report(report)),
        None => formatter.warn("Another queue replay is already running"),
    }
    Ok(())
}

async fn execute_requeue(ctx: &AppContext, format: OutputFormat) -> Result<()> {
    let formatter = get_formatter(format);
    let moved = ctx
        .orchestrator
        .requeue_parked()
        .await
        .context("Failed to requeue parked items")?;

    if format.is_json() {
        formatter.print_json(&serde_json::json!({ "requeued": moved }));
    } else if moved == 0 {
        formatter.success("No parked items");
    } else {
        formatter.success(&format!("{} parked item(s) moved back to pending", moved));
    }
    Ok(())
}

async fn execute_enqueue(
    ctx: &AppContext,
    format: OutputFormat,
    entity: EntityKind,
    operation: QueueOperation,
    payload: &str,
) -> Result<()> {
    let formatter = get_formatter(format);
    let payload = parse_payload(payload)?;

    let item = ctx
        .orchestrator
        .enqueue(entity, operation, payload)
        .await
        .context("Failed to queue the mutation")?;
    info!(id = %item.id(), "Mutation queued from the command line");

    if format.is_json() {
        print_serialized(formatter.as_ref(), &item)?;
    } else {
        formatter.success(&format!(
            "Queued {} {} as #{} ({})",
            operation,
            entity,
            item.sequence(),
            item.id()
        ));
        formatter.info("It will be sent on the next sync or queue drain");
    }
    Ok(())
}

fn parse_payload(raw: &str) -> Result<serde_json::Value> {
    let value: serde_json::Value =
        serde_json::from_str(raw).context("--payload is not valid JSON")?;
    if !value.is_object() {
        anyhow::bail!("--payload must be a JSON object");
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    use super::*;

    #[test]
    fn test_parse_payload_accepts_object() {
        let value = parse_payload(r#"{"code": "SKU001", "quantity": "12,5"}"#).unwrap();
        assert_eq!(value["code"], "SKU001");
    }

    #[test]
    fn test_parse_payload_rejects_invalid_json() {
        let err = parse_payload("{code: SKU001}").unwrap_err();
        assert!(err.to_string().contains("not valid JSON"));
    }

    #[test]
    fn test_parse_payload_rejects_non_object() {
        assert!(parse_payload("[1, 2]").is_err());
        assert!(parse_payload("\"SKU001\"").is_err());
    }

    #[test]
    fn test_list_row() {
        let enqueued_at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();
        let item = SyncQueueItem::new(EntityKind::Stock, QueueOperation::Update, json!({}))
            .with_sequence(7)
            .with_enqueued_at(enqueued_at);

        let row = list_row(&item);
        assert!(row.starts_with("    7  stock"));
        assert!(row.contains("update"));
        assert!(row.contains("pending"));
        assert!(row.ends_with("2024-03-01 09:30:00"));
    }
}
