//! Snapshot - Snapshot Assembler output
//!
//! One immutable view of the world, rebuilt wholesale every snapshot cycle.

use serde::{Deserialize, Serialize};

/// Connected player with a resolved position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub name: String,

    /// Empty if unaffiliated
    pub clan: String,

    pub x: f32,
    pub z: f32,

    /// 0.0 - 1.0, 0 if unknown
    #[serde(rename = "health")]
    pub health_fraction: f32,

    pub is_admin: bool,
}

/// Castle heart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureRecord {
    /// Empty if unowned or unresolved
    pub owner: String,

    /// Empty if none
    pub clan: String,

    pub x: f32,
    pub z: f32,

    /// 1-based display rank
    pub tier: u32,
}

/// Unclaimed castle plot
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FreePlot {
    pub x: f32,
    pub z: f32,
}

/// Immutable world snapshot
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub players: Vec<PlayerRecord>,
    pub structures: Vec<StructureRecord>,
    /// May be empty when the plot source cannot be resolved
    pub free_plots: Vec<FreePlot>,
}

impl Snapshot {
    pub fn new(
        players: Vec<PlayerRecord>,
        structures: Vec<StructureRecord>,
        free_plots: Vec<FreePlot>,
    ) -> Self {
        Self {
            players,
            structures,
            free_plots,
        }
    }
}

/// Convert a zero-based castle level into its display tier
pub fn tier_from_level(level: u32) -> u32 {
    level.saturating_add(1)
}

/// Health as a fraction of max health; 0 when max health is not positive
pub fn health_fraction(value: f32, max_health: f32) -> f32 {
    if max_health > 0.0 {
        (value / max_health).clamp(0.0, 1.0)
    } else {
        0.0
    }
}
