//! Sync command - Replay local changes and synchronize with the remote ERP
//!
//! Provides the `erpsync sync` CLI command which:
//! 1. Replays every queued mutation, ignoring retry backoff
//! 2. Triggers the remote-side sync
//! 3. Invalidates the cached remote collections

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use erpsync_sync::{DrainMode, DrainOutcome, DrainReport};

use super::context::AppContext;
use crate::output::{get_formatter, OutputFormat};

#[derive(Debug, Args)]
pub struct SyncCommand {
    /// Trigger the remote sync without replaying the queue first
    #[arg(long)]
    pub skip_queue: bool,
}

impl SyncCommand {
    pub async fn execute(&self, format: OutputFormat, config: Option<&Path>) -> Result<()> {
        let formatter = get_formatter(format);
        let ctx = AppContext::open(config).await?;

        let drain = if self.skip_queue {
            None
        } else {
            formatter.info("Replaying queued changes...");
            Some(
                ctx.orchestrator
                    .attempt_queue_drain(DrainMode::Manual)
                    .await
                    .context("Failed to replay the sync queue")?,
            )
        };

        formatter.info("Triggering remote sync...");
        let synced = ctx.orchestrator.sync_now().await;
        ctx.close().await;

        if format.is_json() {
            let json = serde_json::json!({
                "success": synced.is_ok(),
                "queue": drain.as_ref().map(drain_json),
                "error": synced.as_ref().err().map(|e| format!("{e:#}")),
            });
            formatter.print_json(&json);
        } else if let Some(outcome) = &drain {
            match outcome.report() {
                Some(report) => formatter.info(&describe_report(report)),
                None => formatter.warn("Another queue replay is already running"),
            }
        }

        synced.context("Remote sync failed")?;
        info!("Sync command completed");
        formatter.success("Remote sync complete, cached collections refreshed");
        Ok(())
    }
}

/// JSON form of a drain outcome, shared with `queue drain`
pub fn drain_json(outcome: &DrainOutcome) -> serde_json::Value {
    match outcome {
        DrainOutcome::Completed(report) => serde_json::json!({
            "status": "completed",
            "report": report,
        }),
        DrainOutcome::AlreadyRunning => serde_json::json!({ "status": "already_running" }),
    }
}

/// One-line summary of a drain, shared with `queue drain`
pub fn describe_report(report: &DrainReport) -> String {
    if report.attempted == 0 && report.skipped == 0 && report.contended == 0 {
        return "Sync queue is empty".to_string();
    }
    let mut line = format!(
        "Replayed {} queued change(s): {} committed, {} failed",
        report.attempted, report.committed, report.failed
    );
    if report.parked > 0 {
        line.push_str(&format!(", {} parked", report.parked));
    }
    if report.skipped > 0 {
        line.push_str(&format!(", {} waiting for backoff", report.skipped));
    }
    if report.contended > 0 {
        line.push_str(&format!(", {} handled by another drain", report.contended));
    }
    line
}
