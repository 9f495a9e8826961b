//! Relay orchestration module.

mod orchestrator;
mod stats;

pub use orchestrator::{RelayPipeline, RelayPipelineConfig};
pub use stats::RelayStats;
