//! World-state reader seam
//!
//! Decouples the snapshot pipeline from how a game server's entity tables are
//! enumerated. A reader hands back raw entities; each entity is a `Result` so
//! one unresolvable record never poisons the whole view.

use serde::{Deserialize, Serialize};

use crate::{ContractError, Snapshot};

/// World-space position projected onto the ground plane
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub z: f32,
}

/// Health component
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Health {
    pub value: f32,
    pub max_health: f32,
}

/// Character controlled by a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterEntity {
    #[serde(default)]
    pub position: Option<Position>,

    #[serde(default)]
    pub health: Option<Health>,
}

/// User account entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserEntity {
    pub name: String,

    #[serde(default)]
    pub clan: Option<String>,

    pub connected: bool,

    #[serde(default)]
    pub is_admin: bool,

    /// None when the character entity no longer exists
    #[serde(default)]
    pub character: Option<CharacterEntity>,
}

/// Resolved castle owner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnerRef {
    pub name: String,

    #[serde(default)]
    pub clan: Option<String>,
}

/// Castle heart entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CastleHeartEntity {
    pub position: Position,

    /// Zero-based internal level
    pub level: u32,

    #[serde(default)]
    pub owner: Option<OwnerRef>,
}

/// Castle territory zone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerritoryEntity {
    pub position: Position,

    /// Heart entities also carry territory data
    #[serde(default)]
    pub has_castle_heart: bool,

    /// A player has claimed the plot
    #[serde(default)]
    pub claimed: bool,
}

/// Entity enumeration result
pub type EntityResult<T> = Result<T, ContractError>;

/// Raw view of the current world
#[derive(Debug, Default)]
pub struct WorldView {
    pub users: Vec<EntityResult<UserEntity>>,
    pub castle_hearts: Vec<EntityResult<CastleHeartEntity>>,
    /// None when the territory source cannot be resolved
    pub territories: Option<Vec<EntityResult<TerritoryEntity>>>,
}

/// World-state reader
///
/// Implementations must be cheap to call once per snapshot cycle and must not
/// retain the returned view. Blocking IO is allowed; the snapshot cycle calls
/// readers off the async workers.
pub trait WorldReader: Send + Sync {
    /// Reader name (used for logging)
    fn name(&self) -> &str;

    /// Enumerate the current world
    ///
    /// # Errors
    /// `ContractError::WorldNotReady` while the server world does not exist yet
    fn read_world(&self) -> Result<WorldView, ContractError>;
}

/// Pull-based snapshot accessor, invoked once per snapshot cycle
pub trait SnapshotSource: Send + Sync {
    /// Build one immutable snapshot of the current world
    ///
    /// # Errors
    /// `ContractError::WorldNotReady` is a transient condition, not a failure
    fn assemble(&self) -> Result<Snapshot, ContractError>;
}

impl<T: WorldReader + ?Sized> WorldReader for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn read_world(&self) -> Result<WorldView, ContractError> {
        (**self).read_world()
    }
}

impl<T: WorldReader + ?Sized> WorldReader for std::sync::Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn read_world(&self) -> Result<WorldView, ContractError> {
        (**self).read_world()
    }
}

impl<T: SnapshotSource + ?Sized> SnapshotSource for std::sync::Arc<T> {
    fn assemble(&self) -> Result<Snapshot, ContractError> {
        (**self).assemble()
    }
}
