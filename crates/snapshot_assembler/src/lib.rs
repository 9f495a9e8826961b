//! # Snapshot Assembler
//!
//! World snapshot module.
//!
//! Responsibilities:
//! - Read raw entities through a `WorldReader`
//! - Filter and convert them into player / castle / free plot records
//! - Skip entities that fail to resolve without failing the snapshot
//! - Provide Mock and File world readers

pub mod assembler;
pub mod file_world;
pub mod mock_world;

pub use assembler::{AssemblyStats, SnapshotAssembler};
pub use contracts::{Snapshot, SnapshotSource, WorldReader};
pub use file_world::FileWorld;
pub use mock_world::MockWorld;
