//! Reconcile command - Compare local records with the remote ERP
//!
//! Provides the `erpsync reconcile` CLI command which diffs the local store
//! against the (cached) remote collections, per entity kind, by composite
//! key. Nothing is written to either side.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;

use erpsync_core::domain::{display_key, EntityKind};
use erpsync_reconcile::{EntityDiff, ReconciliationService};

use super::context::AppContext;
use crate::output::{get_formatter, OutputFormat, OutputFormatter};

#[derive(Debug, Args)]
pub struct ReconcileCommand {
    /// Only reconcile one entity kind (stock, ledger, invoice, quote)
    #[arg(long)]
    pub entity: Option<EntityKind>,

    /// List the differing records, not just the counts
    #[arg(long)]
    pub details: bool,
}

impl ReconcileCommand {
    pub async fn execute(&self, format: OutputFormat, config: Option<&Path>) -> Result<()> {
        let formatter = get_formatter(format);
        let ctx = AppContext::open(config).await?;

        let service = ReconciliationService::new(ctx.store.clone(), ctx.orchestrator.cache());
        let diffs = self.compute(&service).await;
        ctx.close().await;
        let diffs = diffs.context("Reconciliation failed")?;

        if format.is_json() {
            let entries = diffs
                .iter()
                .map(|diff| self.diff_json(diff))
                .collect::<Result<Vec<_>>>()?;
            formatter.print_json(&serde_json::Value::Array(entries));
            return Ok(());
        }

        for diff in &diffs {
            self.print_human(formatter.as_ref(), diff);
        }
        if diffs.iter().all(|diff| diff.is_reconciled()) {
            formatter.success("Local and remote records agree");
        }
        Ok(())
    }

    async fn compute(&self, service: &ReconciliationService) -> Result<Vec<Arc<EntityDiff>>> {
        match self.entity {
            Some(kind) => Ok(vec![service.diff_for(kind).await?]),
            None => {
                let snapshot = service.snapshot().await?;
                Ok(snapshot.iter().cloned().map(Arc::new).collect())
            }
        }
    }

    fn diff_json(&self, diff: &EntityDiff) -> Result<serde_json::Value> {
        if self.details {
            return serde_json::to_value(diff).context("Failed to serialize diff");
        }
        Ok(serde_json::json!({
            "entity": diff.kind().name(),
            "summary": diff.summary(),
        }))
    }

    fn print_human(&self, formatter: &dyn OutputFormatter, diff: &EntityDiff) {
        let summary = diff.summary();
        let line = format!(
            "{}: {} only local, {} only remote, {} conflicting",
            diff.kind().name(),
            summary.only_local,
            summary.only_remote,
            summary.conflicts
        );
        if diff.is_reconciled() {
            formatter.info(&line);
        } else {
            formatter.warn(&line);
        }
        if summary.duplicates_discarded > 0 {
            formatter.info(&format!(
                "  {} duplicate record(s) ignored (last occurrence kept)",
                summary.duplicates_discarded
            ));
        }

        if self.details {
            let (only_local, only_remote, conflicts) = diff.keys();
            for (label, keys) in [
                ("only local ", only_local),
                ("only remote", only_remote),
                ("conflict   ", conflicts),
            ] {
                for key in keys {
                    formatter.info(&format!("  {}  {}", label, display_key(&key)));
                }
            }
        }
    }
}
