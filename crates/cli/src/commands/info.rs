//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::RelayConfig;
use serde::Serialize;
use tracing::info;

use super::mask_secret;
use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    monitor: MonitorInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    webhook: Option<WebhookInfo>,
}

#[derive(Serialize)]
struct MonitorInfo {
    base_url: String,
    events_url: String,
    push_url: String,
    api_key: String,
    server_id: i64,
    game: String,
    push_interval_secs: u64,
}

#[derive(Serialize)]
struct WebhookInfo {
    url: String,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let config = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    let info = build_config_info(&config);
    if args.json {
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&info);
    }

    Ok(())
}

/// Secrets are masked; webhook URLs embed their token
fn build_config_info(config: &RelayConfig) -> ConfigInfo {
    let monitor = &config.monitor;
    ConfigInfo {
        version: format!("{:?}", config.version),
        monitor: MonitorInfo {
            base_url: monitor.base_url_trimmed().to_string(),
            events_url: monitor.events_url(),
            push_url: monitor.push_url(),
            api_key: mask_secret(&monitor.api_key),
            server_id: monitor.server_id,
            game: monitor.game.clone(),
            push_interval_secs: monitor.push_interval().as_secs(),
        },
        webhook: config.webhook_url().map(|url| WebhookInfo {
            url: mask_secret(url),
        }),
    }
}

fn print_config_info(info: &ConfigInfo) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║               Telemetry Relay Configuration                  ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    let monitor = &info.monitor;
    println!("📡 Monitoring API");
    println!("   ├─ Version: {}", info.version);
    println!("   ├─ Base URL: {}", monitor.base_url);
    println!("   ├─ Events: {}", monitor.events_url);
    println!("   ├─ Push: {}", monitor.push_url);
    println!("   ├─ API key: {}", monitor.api_key);
    println!("   ├─ Server id: {}", monitor.server_id);
    println!("   ├─ Game: {}", monitor.game);
    println!("   └─ Push interval: {}s", monitor.push_interval_secs);

    match &info.webhook {
        Some(webhook) => {
            println!("\n💬 Webhook");
            println!("   └─ URL: {}", webhook.url);
        }
        None => {
            println!("\n💬 Webhook");
            println!("   └─ (not configured)");
        }
    }

    println!();
}
