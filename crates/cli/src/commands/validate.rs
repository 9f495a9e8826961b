//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{RelayConfig, MIN_PUSH_INTERVAL_SECS};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    events_url: String,
    push_url: String,
    server_id: i64,
    push_interval_secs: u64,
    webhook_configured: bool,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(config) => {
            let warnings = collect_warnings(&config);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", config.version),
                    events_url: config.monitor.events_url(),
                    push_url: config.monitor.push_url(),
                    server_id: config.monitor.server_id,
                    push_interval_secs: config.monitor.push_interval().as_secs(),
                    webhook_configured: config.webhook_url().is_some(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &RelayConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.webhook_url().is_none() {
        warnings.push("No webhook configured - events go to the monitoring API only".to_string());
    }

    if config.monitor.push_interval_secs < MIN_PUSH_INTERVAL_SECS {
        warnings.push(format!(
            "push_interval_secs = {} is below the minimum, clamped to {}",
            config.monitor.push_interval_secs, MIN_PUSH_INTERVAL_SECS
        ));
    }

    if config.monitor.base_url.starts_with("http://") {
        warnings.push("Monitoring API uses plain HTTP - the API key is sent unencrypted".to_string());
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Events URL: {}", summary.events_url);
            println!("  Push URL: {}", summary.push_url);
            println!("  Server id: {}", summary.server_id);
            println!("  Push interval: {}s", summary.push_interval_secs);
            println!("  Webhook: {}", if summary.webhook_configured { "yes" } else { "no" });
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
