//! `run` command implementation.

use anyhow::{Context, Result};
use config_loader::ConfigLoader;
use contracts::{RelayConfig, WebhookConfig};
use std::time::Duration;
use tracing::{info, warn};

use super::mask_secret;
use crate::cli::RunArgs;
use crate::error::CliError;
use crate::pipeline::{RelayPipeline, RelayPipelineConfig};

/// Execute the `run` command
///
/// A configuration that fails validation leaves the relay disabled: a warning
/// is logged and the command exits successfully.
pub async fn run_relay(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        return Err(CliError::config_not_found(args.config.display().to_string()).into());
    }

    let mut config = ConfigLoader::parse_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;
    apply_overrides(&mut config, args);

    if let Err(e) = ConfigLoader::validate(&config) {
        warn!(error = %e, "Relay is not configured, nothing started");
        return Ok(());
    }

    info!(
        base_url = %config.monitor.base_url_trimmed(),
        server_id = config.monitor.server_id,
        game = %config.monitor.game,
        push_interval_secs = config.monitor.push_interval().as_secs(),
        webhook = config.webhook_url().is_some(),
        "Configuration loaded"
    );

    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&config);
        return Ok(());
    }

    let pipeline = RelayPipeline::new(RelayPipelineConfig {
        relay: config,
        world_path: args.world.clone(),
        events_stdin: args.events_stdin,
        demo: args.demo,
        timeout: (args.timeout > 0).then(|| Duration::from_secs(args.timeout)),
        metrics_port: (args.metrics_port > 0).then_some(args.metrics_port),
    });

    let stats = pipeline
        .run(shutdown_signal())
        .await
        .context("Relay execution failed")?;
    stats.print_summary();

    info!("Telemetry Relay finished");
    Ok(())
}

/// Apply CLI / environment overrides on top of the file configuration
fn apply_overrides(config: &mut RelayConfig, args: &RunArgs) {
    if let Some(ref base_url) = args.base_url {
        info!(base_url = %base_url, "Overriding base URL from CLI");
        config.monitor.base_url = base_url.clone();
    }
    if let Some(ref api_key) = args.api_key {
        info!("Overriding API key from CLI");
        config.monitor.api_key = api_key.clone();
    }
    if let Some(server_id) = args.server_id {
        info!(server_id, "Overriding server id from CLI");
        config.monitor.server_id = server_id;
    }
    if let Some(ref url) = args.webhook_url {
        info!(configured = !url.trim().is_empty(), "Overriding webhook URL from CLI");
        config.webhook = Some(WebhookConfig { url: url.clone() });
    }
    if let Some(secs) = args.push_interval {
        info!(push_interval_secs = secs, "Overriding push interval from CLI");
        config.monitor.push_interval_secs = secs;
    }
}

/// Resolve on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    warn!("Received shutdown signal, stopping relay...");
}

/// Print configuration summary for dry-run mode
fn print_config_summary(config: &RelayConfig) {
    println!("\n=== Configuration Summary ===\n");
    println!("Monitor:");
    println!("  Events URL: {}", config.monitor.events_url());
    println!("  Push URL: {}", config.monitor.push_url());
    println!("  API key: {}", mask_secret(&config.monitor.api_key));
    println!("  Server id: {}", config.monitor.server_id);
    println!(
        "  Push interval: {}s",
        config.monitor.push_interval().as_secs()
    );
    match config.webhook_url() {
        Some(_) => println!("\nWebhook: configured"),
        None => println!("\nWebhook: not configured"),
    }
    println!();
}
