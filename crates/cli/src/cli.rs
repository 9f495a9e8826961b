//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Telemetry Relay - forwards game-server events and world snapshots
#[derive(Parser, Debug)]
#[command(
    name = "telemetry-relay",
    author,
    version,
    about = "Game-server telemetry relay",
    long_about = "Relays in-game chat and connection events to a chat webhook and a \n\
                  monitoring API, and periodically pushes a snapshot of players, \n\
                  castles and free plots."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "TELEMETRY_RELAY_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "TELEMETRY_RELAY_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the relay
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, default_value = "relay.toml", env = "TELEMETRY_RELAY_CONFIG")]
    pub config: PathBuf,

    /// Override monitoring API base URL
    #[arg(long, env = "TELEMETRY_RELAY_BASE_URL")]
    pub base_url: Option<String>,

    /// Override monitoring API key
    #[arg(long, env = "TELEMETRY_RELAY_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Override server id
    #[arg(long, env = "TELEMETRY_RELAY_SERVER_ID")]
    pub server_id: Option<i64>,

    /// Override webhook URL (empty string disables the webhook)
    #[arg(long, env = "TELEMETRY_RELAY_WEBHOOK_URL", hide_env_values = true)]
    pub webhook_url: Option<String>,

    /// Override snapshot push interval in seconds (minimum 10)
    #[arg(long, env = "TELEMETRY_RELAY_PUSH_INTERVAL")]
    pub push_interval: Option<u64>,

    /// JSON world dump re-read every snapshot cycle (default: built-in demo world)
    #[arg(long, env = "TELEMETRY_RELAY_WORLD")]
    pub world: Option<PathBuf>,

    /// Read raw events as JSON lines from stdin
    #[arg(long)]
    pub events_stdin: bool,

    /// Emit synthetic chat and connection events
    #[arg(long)]
    pub demo: bool,

    /// Stop after this many seconds (0 = run until interrupted)
    #[arg(long, default_value = "0", env = "TELEMETRY_RELAY_TIMEOUT")]
    pub timeout: u64,

    /// Validate configuration and exit without starting the relay
    #[arg(long)]
    pub dry_run: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "TELEMETRY_RELAY_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "relay.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "relay.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}
