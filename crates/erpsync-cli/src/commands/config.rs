//! Config command - View and check the erpsync configuration
//!
//! Provides the `erpsync config` CLI command which:
//! 1. Shows the effective configuration (YAML or JSON)
//! 2. Validates the configuration file and reports every error
//! 3. Prints the configuration file location

use std::path::Path;

use anyhow::{Context, Result};
use clap::Subcommand;
use tracing::info;

use erpsync_core::config::Config;

use super::context::{load_config, resolve_config_path};
use crate::output::{get_formatter, print_serialized, OutputFormat};

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display the effective configuration
    Show,
    /// Validate the configuration file
    Validate,
    /// Print the configuration file path
    Path,
}

impl ConfigCommand {
    pub async fn execute(&self, format: OutputFormat, config: Option<&Path>) -> Result<()> {
        match self {
            ConfigCommand::Show => execute_show(format, config),
            ConfigCommand::Validate => execute_validate(format, config),
            ConfigCommand::Path => execute_path(format, config),
        }
    }
}

fn execute_show(format: OutputFormat, explicit: Option<&Path>) -> Result<()> {
    let formatter = get_formatter(format);
    let (config, config_path) = load_config(explicit)?;
    info!(config_path = %config_path.display(), "Showing configuration");

    if format.is_json() {
        return print_serialized(formatter.as_ref(), &redacted(config));
    }

    let source = if config_path.exists() {
        config_path.display().to_string()
    } else {
        format!("{} not found, using defaults", config_path.display())
    };
    formatter.success(&format!("Configuration ({})", source));
    formatter.info("");

    let yaml =
        serde_yaml::to_string(&redacted(config)).context("Failed to serialize configuration")?;
    for line in yaml.lines() {
        formatter.info(line);
    }
    Ok(())
}

/// Hides the API token
fn redacted(mut config: Config) -> Config {
    if config.gateway.api_token.is_some() {
        config.gateway.api_token = Some("********".to_string());
    }
    config
}

fn execute_validate(format: OutputFormat, explicit: Option<&Path>) -> Result<()> {
    let formatter = get_formatter(format);
    let config_path = resolve_config_path(explicit);

    // Load explicitly: a parse error must be reported, not replaced by defaults
    let config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            let message = format!("Failed to load {}: {}", config_path.display(), e);
            if format.is_json() {
                formatter.print_json(&serde_json::json!({
                    "valid": false,
                    "config_path": config_path.display().to_string(),
                    "errors": [message],
                }));
            } else {
                formatter.error(&message);
            }
            anyhow::bail!("configuration could not be loaded");
        }
    };

    let errors = config.validate();
    if format.is_json() {
        let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
        formatter.print_json(&serde_json::json!({
            "valid": errors.is_empty(),
            "config_path": config_path.display().to_string(),
            "errors": messages,
        }));
    } else if errors.is_empty() {
        formatter.success(&format!("{} is valid", config_path.display()));
    } else {
        formatter.error(&format!(
            "{} has {} error(s):",
            config_path.display(),
            errors.len()
        ));
        for error in &errors {
            formatter.info(&format!("- {}", error));
        }
    }

    if !errors.is_empty() {
        anyhow::bail!("configuration is invalid");
    }
    Ok(())
}

fn execute_path(format: OutputFormat, explicit: Option<&Path>) -> Result<()> {
    let config_path = resolve_config_path(explicit);
    if format.is_json() {
        get_formatter(format).print_json(&serde_json::json!({
            "config_path": config_path.display().to_string(),
            "exists": config_path.exists(),
        }));
    } else {
        println!("{}", config_path.display());
    }
    Ok(())
}
