//! # Dungeon Synthesizer
//!
//! The mutable, per-dungeon generation session.
//!
//! ## Probe / Commit
//!
//! Growth is split in two:
//!
//! 1. [`DungeonSynthesizer::random_placement`] is a pure probe. It draws one
//!    room, tries the four rotations in random order and returns the first
//!    collision-free fit. It never mutates the synthesizer.
//! 2. [`DungeonSynthesizer::commit`] stamps the placement, records its
//!    regions, advances progression and seals the new room's doors.
//!
//! A failed probe therefore needs no rollback: the caller simply probes the
//! next pool of its fallback chain.
//!
//! ## Invariants
//!
//! - `collision_regions` only grows, and no two committed regions intersect.
//! - `rooms_placed` is monotonic.
//! - Every door in the frontier has a seal in the world.

use std::collections::BTreeMap;
use std::sync::Arc;

use labyrinth_shared::{Area, BlockPos, Direction, Rotation, Transform};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::config::SynthesisConfig;
use crate::door::{resolve_doors, ActivatingDoor, Door};
use crate::error::DungeonResult;
use crate::progression::ProgressionGate;
use crate::registry::ContentRegistry;
use crate::stamping::stamp_room;
use crate::template::{DoorType, PoolId, RoomTemplate};
use crate::world::DungeonWorld;

/// Open doors: type -> world facing -> world positions.
pub type DoorFrontier = BTreeMap<DoorType, BTreeMap<Direction, Vec<BlockPos>>>;

/// Observable growth state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GrowthPhase {
    /// Nothing placed yet.
    Empty,
    /// Sealed doors or unlocked special pools remain.
    Growing,
    /// Every door has been used or walled up and no special pool is waiting.
    Quiescent,
}

/// Where the initial room put its markers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InitialRoom {
    /// Player spawn point.
    pub spawn: BlockPos,
    /// Return portal position.
    pub portal: BlockPos,
}

/// A collision-free fit found by a probe. Not yet committed.
#[derive(Clone, Debug, PartialEq)]
pub struct Placement {
    /// Room to stamp.
    pub room: Arc<RoomTemplate>,
    /// Pool the room was drawn from (`None` for the flat set).
    pub pool: Option<PoolId>,
    /// Rotation (mirror is always none).
    pub transform: Transform,
    /// World position of the room's local origin.
    pub origin: BlockPos,
    /// World facing and position of the door that connects back.
    pub connecting_door: (Direction, BlockPos),
    /// World-space collision regions.
    pub regions: Vec<Area>,
}

/// What a commit did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommitReport {
    /// Depth of the new room.
    pub depth: u32,
    /// Doors that received a seal.
    pub sealed: usize,
    /// Doors that were walled up.
    pub filled: usize,
    /// Special pools unlocked by this commit.
    pub unlocked: Vec<PoolId>,
}

/// One dungeon's generation state. Owned by exactly one controller.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DungeonSynthesizer {
    pub(crate) controller_pos: BlockPos,
    pub(crate) open_doors: DoorFrontier,
    pub(crate) collision_regions: Vec<Area>,
    pub(crate) rooms_placed: u32,
    pub(crate) special_pool_buffer: Vec<PoolId>,
    pub(crate) cooldown_since_placed: BTreeMap<PoolId, u32>,
}

impl DungeonSynthesizer {
    /// Creates an empty synthesizer for the controller at `controller_pos`.
    #[must_use]
    pub fn new(controller_pos: BlockPos) -> Self {
        Self {
            controller_pos,
            ..Self::default()
        }
    }

    /// Position of the owning controller.
    #[must_use]
    pub fn controller_pos(&self) -> BlockPos {
        self.controller_pos
    }

    /// The growth frontier.
    #[must_use]
    pub fn open_doors(&self) -> &DoorFrontier {
        &self.open_doors
    }

    /// Number of doors in the frontier.
    #[must_use]
    pub fn open_door_count(&self) -> usize {
        self.open_doors
            .values()
            .flat_map(BTreeMap::values)
            .map(Vec::len)
            .sum()
    }

    /// Returns true if a door is in the frontier.
    #[must_use]
    pub fn is_open(&self, door_type: &str, facing: Direction, position: BlockPos) -> bool {
        self.open_doors
            .get(door_type)
            .and_then(|by_facing| by_facing.get(&facing))
            .is_some_and(|positions| positions.contains(&position))
    }

    /// Every committed world-space region.
    #[must_use]
    pub fn collision_regions(&self) -> &[Area] {
        &self.collision_regions
    }

    /// Rooms grown so far (the initial room does not count).
    #[must_use]
    pub fn rooms_placed(&self) -> u32 {
        self.rooms_placed
    }

    /// Unlocked special pools waiting to be placed.
    #[must_use]
    pub fn special_pool_buffer(&self) -> &[PoolId] {
        &self.special_pool_buffer
    }

    /// Unlock checks since each special pool was last placed.
    #[must_use]
    pub fn cooldowns(&self) -> &BTreeMap<PoolId, u32> {
        &self.cooldown_since_placed
    }

    /// Current growth phase.
    #[must_use]
    pub fn phase(&self) -> GrowthPhase {
        if self.collision_regions.is_empty() && self.open_doors.is_empty() {
            GrowthPhase::Empty
        } else if self.open_door_count() > 0 || !self.special_pool_buffer.is_empty() {
            GrowthPhase::Growing
        } else {
            GrowthPhase::Quiescent
        }
    }

    /// Returns true if `area` intersects any committed region.
    #[must_use]
    pub fn is_occupied(&self, area: &Area) -> bool {
        self.collision_regions.iter().any(|region| region.intersects(area))
    }

    /// Stamps the first room so its controller marker lands on `anchor`,
    /// then seals every door it exposes.
    ///
    /// With no room available the anchor itself is returned as both spawn
    /// and portal.
    ///
    /// # Errors
    ///
    /// Returns `StampFailed` if the world refuses a structure. Nothing is
    /// written and the synthesizer is left unchanged.
    pub fn generate_initial_room<R, W>(
        &mut self,
        registry: &ContentRegistry,
        pool: Option<&str>,
        rng: &mut R,
        world: &mut W,
        anchor: BlockPos,
        config: &SynthesisConfig,
    ) -> DungeonResult<InitialRoom>
    where
        R: Rng + ?Sized,
        W: DungeonWorld + ?Sized,
    {
        let Some(room) = registry.tables().draw(pool, rng) else {
            tracing::warn!(pool = ?pool, %anchor, "no initial room available");
            return Ok(InitialRoom {
                spawn: anchor,
                portal: anchor,
            });
        };

        let transform = Transform::IDENTITY;
        let origin = anchor - room.controller_offset;
        stamp_room(&room, origin, transform, rng, world, &config.blocks)?;

        self.controller_pos = anchor;
        self.collision_regions.extend(
            room.collision_regions
                .iter()
                .map(|region| region.to_world(transform, origin)),
        );
        world.set_block(anchor, config.blocks.controller());

        let (sealed, filled) = self.seal_doors(resolve_doors(&room, transform, origin, 0), world, config);
        tracing::info!(room = %room.id, %anchor, sealed, filled, "initial room stamped");

        Ok(InitialRoom {
            spawn: origin + transform.apply_pos(room.spawn_offset),
            portal: origin + transform.apply_pos(room.portal_offset),
        })
    }

    /// Probes for a room that fits against `door`.
    ///
    /// Draws exactly one room, then tries the four rotations in random
    /// order. The first rotation whose regions stay in height bounds and
    /// clear every committed region wins. Never retries with another room
    /// and never mutates state.
    pub fn random_placement<R, W>(
        &self,
        registry: &ContentRegistry,
        pool: Option<&str>,
        rng: &mut R,
        world: &W,
        door: &ActivatingDoor,
    ) -> Option<Placement>
    where
        R: Rng + ?Sized,
        W: DungeonWorld + ?Sized,
    {
        let room = registry.tables().draw(pool, rng)?;
        let opposite = door.facing.opposite();
        let threshold = door.position + door.facing.unit();

        let mut rotations = Rotation::ALL;
        rotations.shuffle(rng);

        for rotation in rotations {
            let transform = Transform::rotated(rotation);
            let local_facing = transform.inverse_direction(opposite);
            let Some(local) = room.doors_facing(&door.door_type, local_facing).choose(rng) else {
                continue;
            };

            let origin = threshold - transform.apply_pos(local.position);
            let regions: Vec<Area> = room
                .collision_regions
                .iter()
                .map(|region| region.to_world(transform, origin))
                .collect();

            if !regions.iter().all(|region| world.is_in_height_bounds(region)) {
                tracing::debug!(room = %room.id, ?rotation, "rotation leaves build height");
                continue;
            }
            if regions.iter().any(|region| self.is_occupied(region)) {
                tracing::debug!(room = %room.id, ?rotation, "rotation collides");
                continue;
            }

            return Some(Placement {
                room,
                pool: pool.map(str::to_owned),
                transform,
                origin,
                connecting_door: (opposite, threshold),
                regions,
            });
        }

        tracing::debug!(room = %room.id, pool = ?pool, "no rotation fits");
        None
    }

    /// Commits a placement found by [`Self::random_placement`] for `door`.
    ///
    /// # Errors
    ///
    /// Returns `StampFailed` if the world refuses a structure. Nothing is
    /// written and the synthesizer is left unchanged.
    pub fn commit<R, W>(
        &mut self,
        registry: &ContentRegistry,
        placement: &Placement,
        door: &ActivatingDoor,
        rng: &mut R,
        world: &mut W,
        config: &SynthesisConfig,
    ) -> DungeonResult<CommitReport>
    where
        R: Rng + ?Sized,
        W: DungeonWorld + ?Sized,
    {
        let room = &placement.room;
        stamp_room(room, placement.origin, placement.transform, rng, world, &config.blocks)?;

        self.collision_regions.extend(placement.regions.iter().copied());
        self.rooms_placed += 1;

        let depth = door.depth + 1;
        let tables = registry.tables();
        let unlocked = self.check_unlocks(tables.progression(), depth, config.special_cooldown);

        self.close_door(&door.door_type, door.facing, door.position);

        let (facing, position) = placement.connecting_door;
        let doors = resolve_doors(room, placement.transform, placement.origin, depth)
            .into_iter()
            .filter(|d| !(d.world_facing == facing && d.world_position == position))
            .collect();
        let (sealed, filled) = self.seal_doors(doors, world, config);

        tracing::info!(
            room = %room.id,
            origin = %placement.origin,
            rooms_placed = self.rooms_placed,
            depth,
            sealed,
            filled,
            "room committed"
        );

        Ok(CommitReport {
            depth,
            sealed,
            filled,
            unlocked,
        })
    }

    /// Walls up a door that nothing could grow from and drops it from the
    /// frontier.
    pub fn fill_door<W>(&mut self, door: &ActivatingDoor, world: &mut W, config: &SynthesisConfig)
    where
        W: DungeonWorld + ?Sized,
    {
        world.fill_solid(&door.opening(), config.blocks.seal_fill());
        self.close_door(&door.door_type, door.facing, door.position);
        tracing::debug!(position = %door.position, "door filled solid");
    }

    /// Removes a door from the frontier. Returns true if it was there.
    pub fn close_door(&mut self, door_type: &str, facing: Direction, position: BlockPos) -> bool {
        let Some(by_facing) = self.open_doors.get_mut(door_type) else {
            return false;
        };
        let Some(positions) = by_facing.get_mut(&facing) else {
            return false;
        };
        let Some(index) = positions.iter().position(|p| *p == position) else {
            return false;
        };
        positions.remove(index);
        if positions.is_empty() {
            by_facing.remove(&facing);
        }
        if by_facing.is_empty() {
            self.open_doors.remove(door_type);
        }
        true
    }

    /// Records that a room from a special pool was placed: the pool leaves
    /// the buffer and starts resting. Returns false if it was not buffered.
    pub fn mark_special_placed(&mut self, pool: &str) -> bool {
        let Some(index) = self.special_pool_buffer.iter().position(|p| p == pool) else {
            return false;
        };
        let pool = self.special_pool_buffer.remove(index);
        tracing::info!(pool = %pool, "special pool placed");
        self.cooldown_since_placed.insert(pool, 0);
        true
    }

    /// Ages every cooldown, expires rested pools, then buffers newly
    /// unlocked ones.
    fn check_unlocks(&mut self, gate: &ProgressionGate, depth: u32, cooldown: u32) -> Vec<PoolId> {
        for ticks in self.cooldown_since_placed.values_mut() {
            *ticks += 1;
        }
        self.cooldown_since_placed.retain(|_, ticks| *ticks <= cooldown);

        let unlocked = gate.check(
            self.rooms_placed,
            depth,
            &self.cooldown_since_placed,
            &self.special_pool_buffer,
        );
        for pool in &unlocked {
            tracing::info!(pool = %pool, rooms_placed = self.rooms_placed, depth, "special pool unlocked");
        }
        self.special_pool_buffer.extend(unlocked.iter().cloned());
        unlocked
    }

    /// Seals each door, or walls it up when its threshold is already
    /// occupied or the world will not take a seal. Returns (sealed, filled).
    fn seal_doors<W>(&mut self, doors: Vec<Door>, world: &mut W, config: &SynthesisConfig) -> (usize, usize)
    where
        W: DungeonWorld + ?Sized,
    {
        let mut sealed = 0;
        let mut filled = 0;
        for door in doors {
            if self.is_occupied(&door.fill_region) {
                world.fill_solid(&door.opening(), config.blocks.seal_fill());
                filled += 1;
                continue;
            }
            if world.place_seal(&door.to_seal(self.controller_pos)) {
                self.open_doors
                    .entry(door.door_type)
                    .or_default()
                    .entry(door.world_facing)
                    .or_default()
                    .push(door.world_position);
                sealed += 1;
            } else {
                tracing::warn!(position = %door.world_position, "world refused seal, filling door");
                world.fill_solid(&door.opening(), config.blocks.seal_fill());
                filled += 1;
            }
        }
        (sealed, filled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::Block;
    use crate::memory_world::{MemoryWorld, TemplatePattern};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    /// 5x5x5 room spanning local x,z in [-2, 2], one corridor door per side.
    fn cross_room(id: &str) -> RoomTemplate {
        let mut room = RoomTemplate::new(id)
            .with_structure(BlockPos::new(-2, 0, -2), "test:cell")
            .with_region(Area::cuboid(BlockPos::new(-2, 0, -2), BlockPos::new(2, 4, 2)))
            .with_pools_for_index(0, ["test:halls"]);
        for facing in Direction::HORIZONTAL {
            let unit = facing.unit();
            room = room.with_door("corridor", facing, BlockPos::new(unit.x * 2, 1, unit.z * 2), 0);
        }
        room
    }

    fn setup() -> (ContentRegistry, MemoryWorld, SynthesisConfig) {
        let registry = ContentRegistry::new();
        registry.register_room("test:cross", cross_room("test:cross"), 1);
        registry.register_pool("test:halls", [("test:cross", 1)]);

        let mut world = MemoryWorld::new();
        world.register_pattern(
            "test:cell",
            TemplatePattern::hollow(BlockPos::ORIGIN, BlockPos::new(4, 4, 4), Block::DUNGEON_BRICK),
        );
        (registry, world, SynthesisConfig::default())
    }

    #[test]
    fn test_initial_room_seals_every_door() {
        let (registry, mut world, config) = setup();
        let mut synth = DungeonSynthesizer::new(BlockPos::ORIGIN);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(synth.phase(), GrowthPhase::Empty);

        let anchor = BlockPos::new(0, 64, 0);
        synth
            .generate_initial_room(&registry, Some("test:halls"), &mut rng, &mut world, anchor, &config)
            .unwrap();

        assert_eq!(synth.open_door_count(), 4);
        assert_eq!(world.seals().len(), 4);
        assert_eq!(synth.rooms_placed(), 0);
        assert_eq!(synth.collision_regions().len(), 1);
        assert_eq!(world.get_block(anchor), Block::CONTROLLER);
        assert_eq!(synth.phase(), GrowthPhase::Growing);
        assert!(synth.is_open("corridor", Direction::East, BlockPos::new(2, 65, 0)));
    }

    #[test]
    fn test_missing_initial_room_falls_back_to_anchor() {
        let (registry, mut world, config) = setup();
        let mut synth = DungeonSynthesizer::new(BlockPos::ORIGIN);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let anchor = BlockPos::new(7, 70, 7);
        let initial = synth
            .generate_initial_room(&registry, Some("test:none"), &mut rng, &mut world, anchor, &config)
            .unwrap();
        assert_eq!(initial, InitialRoom { spawn: anchor, portal: anchor });
        assert_eq!(synth.phase(), GrowthPhase::Empty);
    }

    #[test]
    fn test_placement_shares_the_threshold() {
        let (registry, mut world, config) = setup();
        let mut synth = DungeonSynthesizer::new(BlockPos::ORIGIN);
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        synth
            .generate_initial_room(&registry, Some("test:halls"), &mut rng, &mut world, BlockPos::new(0, 64, 0), &config)
            .unwrap();

        let door = ActivatingDoor::new(BlockPos::new(2, 65, 0), Direction::East, "corridor", 0);
        let placement = synth
            .random_placement(&registry, Some("test:halls"), &mut rng, &world, &door)
            .unwrap();
        assert_eq!(placement.connecting_door, (Direction::West, BlockPos::new(3, 65, 0)));
        assert_eq!(placement.origin, BlockPos::new(5, 64, 0));
        assert!(placement.regions.iter().all(|r| !synth.is_occupied(r)));

        let report = synth
            .commit(&registry, &placement, &door, &mut rng, &mut world, &config)
            .unwrap();
        assert_eq!(report.depth, 1);
        assert_eq!(report.sealed, 3);
        assert_eq!(synth.rooms_placed(), 1);
        assert!(!synth.is_open("corridor", Direction::East, door.position));
        assert_eq!(synth.open_door_count(), 6);
    }

    #[test]
    fn test_probe_rejects_occupied_space() {
        let (registry, mut world, config) = setup();
        let mut synth = DungeonSynthesizer::new(BlockPos::ORIGIN);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        synth
            .generate_initial_room(&registry, Some("test:halls"), &mut rng, &mut world, BlockPos::new(0, 64, 0), &config)
            .unwrap();
        // Pretend something already sits east of the room.
        synth
            .collision_regions
            .push(Area::cuboid(BlockPos::new(3, 64, -5), BlockPos::new(9, 70, 5)));

        let door = ActivatingDoor::new(BlockPos::new(2, 65, 0), Direction::East, "corridor", 0);
        for seed in 0..16 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            assert!(synth
                .random_placement(&registry, Some("test:halls"), &mut rng, &world, &door)
                .is_none());
        }
    }

    #[test]
    fn test_probe_rejects_height_overflow() {
        let (registry, world, _) = setup();
        let synth = DungeonSynthesizer::new(BlockPos::ORIGIN);
        let door = ActivatingDoor::new(BlockPos::new(2, 253, 0), Direction::East, "corridor", 0);
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        assert!(synth
            .random_placement(&registry, Some("test:halls"), &mut rng, &world, &door)
            .is_none());
    }

    #[test]
    fn test_mismatched_door_type_never_fits() {
        let (registry, world, _) = setup();
        let synth = DungeonSynthesizer::new(BlockPos::ORIGIN);
        let door = ActivatingDoor::new(BlockPos::new(2, 65, 0), Direction::East, "shaft", 0);
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        assert!(synth
            .random_placement(&registry, Some("test:halls"), &mut rng, &world, &door)
            .is_none());
    }

    #[test]
    fn test_refused_seals_become_solid() {
        let (registry, mut world, config) = setup();
        world.set_refuse_seals(true);
        let mut synth = DungeonSynthesizer::new(BlockPos::ORIGIN);
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        synth
            .generate_initial_room(&registry, Some("test:halls"), &mut rng, &mut world, BlockPos::new(0, 64, 0), &config)
            .unwrap();
        assert_eq!(synth.open_door_count(), 0);
        assert_eq!(world.get_block(BlockPos::new(2, 65, 0)), config.blocks.seal_fill());
        assert_eq!(synth.phase(), GrowthPhase::Quiescent);
    }

    #[test]
    fn test_cooldown_lifecycle() {
        let mut gate = ProgressionGate::new();
        gate.register("test:vault", 0, 0);
        let mut synth = DungeonSynthesizer::new(BlockPos::ORIGIN);

        assert_eq!(synth.check_unlocks(&gate, 1, 2), vec!["test:vault"]);
        assert!(synth.check_unlocks(&gate, 1, 2).is_empty());
        assert!(synth.mark_special_placed("test:vault"));
        assert!(!synth.mark_special_placed("test:vault"));

        // Rests for two checks, unlocks on the third.
        assert!(synth.check_unlocks(&gate, 1, 2).is_empty());
        assert!(synth.check_unlocks(&gate, 1, 2).is_empty());
        assert_eq!(synth.check_unlocks(&gate, 1, 2), vec!["test:vault"]);
        assert!(synth.cooldowns().is_empty());
    }

    #[test]
    fn test_close_door_prunes_empty_groups() {
        let mut synth = DungeonSynthesizer::new(BlockPos::ORIGIN);
        synth
            .open_doors
            .entry("corridor".into())
            .or_default()
            .entry(Direction::North)
            .or_default()
            .push(BlockPos::ORIGIN);
        assert!(synth.close_door("corridor", Direction::North, BlockPos::ORIGIN));
        assert!(!synth.close_door("corridor", Direction::North, BlockPos::ORIGIN));
        assert!(synth.open_doors().is_empty());
    }
}
