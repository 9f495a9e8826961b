//! Snapshot Assembler
//!
//! Builds one immutable `Snapshot` from a `WorldReader`'s raw entities.
//! Entities that cannot be resolved are skipped individually.

use std::sync::atomic::{AtomicU64, Ordering};

use contracts::{
    health_fraction, tier_from_level, CastleHeartEntity, ContractError, EntityResult, FreePlot,
    PlayerRecord, Snapshot, SnapshotSource, StructureRecord, TerritoryEntity, UserEntity,
    WorldReader,
};
use tracing::{debug, instrument};

/// Assembly counters
#[derive(Debug, Default)]
pub struct AssemblyStats {
    /// Snapshots successfully built
    pub snapshots: AtomicU64,

    /// Cycles where the world did not exist yet
    pub not_ready: AtomicU64,

    /// Entities skipped because they failed to resolve
    pub skipped_entities: AtomicU64,
}

impl AssemblyStats {
    pub fn snapshots(&self) -> u64 {
        self.snapshots.load(Ordering::Relaxed)
    }

    pub fn not_ready(&self) -> u64 {
        self.not_ready.load(Ordering::Relaxed)
    }

    pub fn skipped_entities(&self) -> u64 {
        self.skipped_entities.load(Ordering::Relaxed)
    }
}

/// Snapshot Assembler
pub struct SnapshotAssembler<R> {
    reader: R,
    stats: AssemblyStats,
}

impl<R: WorldReader> SnapshotAssembler<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            stats: AssemblyStats::default(),
        }
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    pub fn stats(&self) -> &AssemblyStats {
        &self.stats
    }

    fn players(&self, users: Vec<EntityResult<UserEntity>>) -> Vec<PlayerRecord> {
        self.resolved("user", users)
            .filter_map(|user| {
                if !user.connected {
                    return None;
                }
                let character = user.character?;
                let position = character.position?;
                let health = character
                    .health
                    .map(|h| health_fraction(h.value, h.max_health))
                    .unwrap_or(0.0);

                Some(PlayerRecord {
                    name: user.name,
                    clan: user.clan.unwrap_or_default(),
                    x: position.x,
                    z: position.z,
                    health_fraction: health,
                    is_admin: user.is_admin,
                })
            })
            .collect()
    }

    fn structures(&self, hearts: Vec<EntityResult<CastleHeartEntity>>) -> Vec<StructureRecord> {
        self.resolved("castle_heart", hearts)
            .map(|heart| {
                let (owner, clan) = match heart.owner {
                    Some(owner) => (owner.name, owner.clan.unwrap_or_default()),
                    None => (String::new(), String::new()),
                };
                StructureRecord {
                    owner,
                    clan,
                    x: heart.position.x,
                    z: heart.position.z,
                    tier: tier_from_level(heart.level),
                }
            })
            .collect()
    }

    fn free_plots(&self, territories: Option<Vec<EntityResult<TerritoryEntity>>>) -> Vec<FreePlot> {
        let Some(territories) = territories else {
            debug!(reader = %self.reader.name(), "territory source unavailable, no free plots");
            return Vec::new();
        };
        self.resolved("territory", territories)
            .filter(|t| !t.has_castle_heart && !t.claimed)
            .map(|t| FreePlot {
                x: t.position.x,
                z: t.position.z,
            })
            .collect()
    }

    /// Yield resolved entities, counting and logging the rest
    fn resolved<'a, T: 'a>(
        &'a self,
        entity: &'static str,
        items: Vec<EntityResult<T>>,
    ) -> impl Iterator<Item = T> + 'a {
        items.into_iter().filter_map(move |item| match item {
            Ok(value) => Some(value),
            Err(e) => {
                debug!(entity, error = %e, "skipping unresolved entity");
                self.stats.skipped_entities.fetch_add(1, Ordering::Relaxed);
                None
            }
        })
    }
}

impl<R: WorldReader> SnapshotSource for SnapshotAssembler<R> {
    #[instrument(name = "snapshot_assemble", skip(self), fields(reader = %self.reader.name()))]
    fn assemble(&self) -> Result<Snapshot, ContractError> {
        let view = match self.reader.read_world() {
            Ok(view) => view,
            Err(e) => {
                if e.is_world_not_ready() {
                    self.stats.not_ready.fetch_add(1, Ordering::Relaxed);
                }
                return Err(e);
            }
        };

        let snapshot = Snapshot::new(
            self.players(view.users),
            self.structures(view.castle_hearts),
            self.free_plots(view.territories),
        );
        self.stats.snapshots.fetch_add(1, Ordering::Relaxed);

        debug!(
            players = snapshot.players.len(),
            structures = snapshot.structures.len(),
            free_plots = snapshot.free_plots.len(),
            "snapshot assembled"
        );
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_world::MockWorld;
    use contracts::{CharacterEntity, Health, OwnerRef, Position};

    fn user(name: &str, connected: bool, position: Option<(f32, f32)>) -> UserEntity {
        UserEntity {
            name: name.into(),
            clan: None,
            connected,
            is_admin: false,
            character: Some(CharacterEntity {
                position: position.map(|(x, z)| Position { x, z }),
                health: Some(Health {
                    value: 50.0,
                    max_health: 200.0,
                }),
            }),
        }
    }

    fn territory(x: f32, has_castle_heart: bool, claimed: bool) -> TerritoryEntity {
        TerritoryEntity {
            position: Position { x, z: 0.0 },
            has_castle_heart,
            claimed,
        }
    }

    #[test]
    fn test_players_filtered_to_connected_with_position() {
        let mut alice = user("Alice", true, Some((10.0, 20.0)));
        alice.clan = Some("Night".into());
        alice.is_admin = true;
        let offline = user("Bob", false, Some((0.0, 0.0)));
        let no_position = user("Carol", true, None);
        let mut no_character = user("Dave", true, Some((1.0, 1.0)));
        no_character.character = None;

        let world = MockWorld::new()
            .with_user(alice)
            .with_user(offline)
            .with_user(no_position)
            .with_user(no_character);
        let snapshot = SnapshotAssembler::new(world).assemble().unwrap();

        assert_eq!(snapshot.players.len(), 1);
        let p = &snapshot.players[0];
        assert_eq!(p.name, "Alice");
        assert_eq!(p.clan, "Night");
        assert_eq!((p.x, p.z), (10.0, 20.0));
        assert!((p.health_fraction - 0.25).abs() < f32::EPSILON);
        assert!(p.is_admin);
    }

    #[test]
    fn test_missing_health_is_zero() {
        let mut u = user("Alice", true, Some((1.0, 2.0)));
        if let Some(c) = u.character.as_mut() {
            c.health = None;
        }
        let snapshot = SnapshotAssembler::new(MockWorld::new().with_user(u))
            .assemble()
            .unwrap();
        assert_eq!(snapshot.players[0].health_fraction, 0.0);
        assert_eq!(snapshot.players[0].clan, "");
    }

    #[test]
    fn test_structures_tier_and_owner() {
        let owned = CastleHeartEntity {
            position: Position { x: 5.0, z: 6.0 },
            level: 2,
            owner: Some(OwnerRef {
                name: "Alice".into(),
                clan: Some("Night".into()),
            }),
        };
        let orphan = CastleHeartEntity {
            position: Position { x: 7.0, z: 8.0 },
            level: 0,
            owner: None,
        };
        let world = MockWorld::new().with_castle_heart(owned).with_castle_heart(orphan);
        let snapshot = SnapshotAssembler::new(world).assemble().unwrap();

        assert_eq!(snapshot.structures.len(), 2);
        assert_eq!(snapshot.structures[0].owner, "Alice");
        assert_eq!(snapshot.structures[0].clan, "Night");
        assert_eq!(snapshot.structures[0].tier, 3);
        assert_eq!(snapshot.structures[1].owner, "");
        assert_eq!(snapshot.structures[1].tier, 1);
    }

    #[test]
    fn test_free_plots_exclude_hearts_and_claimed() {
        let world = MockWorld::new()
            .with_territory(territory(1.0, false, false))
            .with_territory(territory(2.0, true, false))
            .with_territory(territory(3.0, false, true))
            .with_territory(territory(4.0, false, false));
        let snapshot = SnapshotAssembler::new(world).assemble().unwrap();

        let xs: Vec<f32> = snapshot.free_plots.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![1.0, 4.0]);
    }

    #[test]
    fn test_territory_source_unavailable() {
        let world = MockWorld::new()
            .with_territory(territory(1.0, false, false))
            .without_territories();
        let snapshot = SnapshotAssembler::new(world).assemble().unwrap();
        assert!(snapshot.free_plots.is_empty());
    }

    #[test]
    fn test_failing_entity_skipped() {
        let world = MockWorld::new()
            .with_user(user("Alice", true, Some((1.0, 1.0))))
            .with_failing_user("character lookup failed")
            .with_user(user("Bob", true, Some((2.0, 2.0))));
        let assembler = SnapshotAssembler::new(world);
        let snapshot = assembler.assemble().unwrap();

        let names: Vec<&str> = snapshot.players.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Alice", "Bob"]);
        assert_eq!(assembler.stats().skipped_entities(), 1);
    }

    #[test]
    fn test_world_not_ready() {
        let world = MockWorld::new().with_ready(false);
        let assembler = SnapshotAssembler::new(world);
        let err = assembler.assemble().unwrap_err();
        assert!(err.is_world_not_ready());
        assert_eq!(assembler.stats().not_ready(), 1);

        assembler.reader().set_ready(true);
        assert!(assembler.assemble().is_ok());
        assert_eq!(assembler.stats().snapshots(), 1);
    }

    #[test]
    fn test_empty_world() {
        let snapshot = SnapshotAssembler::new(MockWorld::new()).assemble().unwrap();
        assert_eq!(snapshot, Snapshot::default());
    }
}
