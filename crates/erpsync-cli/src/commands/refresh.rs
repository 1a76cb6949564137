//! Refresh command - Re-fetch every remote collection

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;

use erpsync_core::domain::{EntityKind, ErpCollections};

use super::context::AppContext;
use crate::output::{get_formatter, print_serialized, OutputFormat};

#[derive(Debug, Args)]
pub struct RefreshCommand {
    /// With --json, print the records themselves instead of counts
    #[arg(long)]
    pub records: bool,
}

impl RefreshCommand {
    pub async fn execute(&self, format: OutputFormat, config: Option<&Path>) -> Result<()> {
        let formatter = get_formatter(format);
        let ctx = AppContext::open(config).await?;

        ctx.orchestrator.refresh_all().await;
        let collections = ctx.orchestrator.collections().await;
        ctx.close().await;
        let collections = collections.context("Failed to fetch remote collections")?;

        if format.is_json() && self.records {
            print_serialized(formatter.as_ref(), &collections)?;
        } else if format.is_json() {
            formatter.print_json(&counts_json(&collections));
        } else {
            formatter.success("Remote collections refreshed");
            for kind in EntityKind::ALL {
                formatter.info(&format!("{:<8} {:>6}", kind.name(), collections.count(kind)));
            }
        }
        Ok(())
    }
}

fn counts_json(collections: &ErpCollections) -> serde_json::Value {
    let counts: serde_json::Map<String, serde_json::Value> = EntityKind::ALL
        .into_iter()
        .map(|kind| (kind.name().to_string(), collections.count(kind).into()))
        .collect();
    serde_json::Value::Object(counts)
}
