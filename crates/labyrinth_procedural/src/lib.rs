//! # LABYRINTH Procedural Dungeons
//!
//! Grows dungeons room by room from pre-authored templates.
//!
//! ## Design Principles
//!
//! 1. **Deterministic**: Same seed and same pools always produce the same dungeon
//! 2. **Lazy**: Rooms are only grown when a sealed door is activated
//! 3. **Greedy**: One room, four rotations, first fit wins; no backtracking
//! 4. **Forgiving**: Missing content or a bad fit never fails the host
//!
//! ## Core Components
//!
//! - `ContentRegistry`: room templates, weighted pools, special-pool rules
//! - `DungeonSynthesizer`: frontier, collision regions, probe and commit
//! - `ProgressionGate`: unlocks special pools by rooms placed and depth
//! - `stamp_room`: writes structures into the world with the ore pass
//! - `DungeonController`: fallback chains, keys, snapshots
//!
//! ## Example
//!
//! ```rust
//! use labyrinth_procedural::{
//!     dungeon_rng, Block, ContentRegistry, DungeonSynthesizer, MemoryWorld, RoomTemplate,
//!     SynthesisConfig, TemplatePattern,
//! };
//! use labyrinth_shared::{Area, BlockPos, Direction};
//!
//! let registry = ContentRegistry::new();
//! let room = RoomTemplate::new("labyrinth:cell")
//!     .with_structure(BlockPos::new(-2, 0, -2), "labyrinth:cell")
//!     .with_region(Area::cuboid(BlockPos::new(-2, 0, -2), BlockPos::new(2, 4, 2)))
//!     .with_door("corridor", Direction::North, BlockPos::new(0, 1, -2), 0);
//! registry.register_room("labyrinth:cell", room, 1);
//! registry.register_pool("labyrinth:entrances", [("labyrinth:cell", 1)]);
//!
//! let mut world = MemoryWorld::new();
//! world.register_pattern(
//!     "labyrinth:cell",
//!     TemplatePattern::hollow(BlockPos::ORIGIN, BlockPos::new(4, 4, 4), Block::DUNGEON_BRICK),
//! );
//!
//! let mut synth = DungeonSynthesizer::new(BlockPos::new(0, 64, 0));
//! let mut rng = dungeon_rng(42);
//! synth
//!     .generate_initial_room(
//!         &registry,
//!         Some("labyrinth:entrances"),
//!         &mut rng,
//!         &mut world,
//!         BlockPos::new(0, 64, 0),
//!         &SynthesisConfig::default(),
//!     )
//!     .unwrap();
//!
//! assert_eq!(synth.open_door_count(), 1);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod block;
pub mod config;
pub mod controller;
pub mod door;
pub mod error;
pub mod memory_world;
pub mod persistence;
pub mod progression;
pub mod registry;
pub mod stamping;
pub mod synthesizer;
pub mod template;
pub mod world;

use rand::SeedableRng;

pub use block::Block;
pub use config::{BlockPalette, SynthesisConfig};
pub use controller::{ActivationOutcome, AttunedKeyFilter, DungeonController, DungeonKey, KeyFilter};
pub use door::{opening_area, resolve_door, resolve_doors, ActivatingDoor, Door, SealRecord};
pub use error::{DungeonError, DungeonResult};
pub use memory_world::{ChunkCoord, MemoryWorld, TemplatePattern, CHUNK_HEIGHT, CHUNK_SIZE};
pub use persistence::{
    FileStateStore, MemoryStateStore, OpenDoorEntry, StateStore, SynthesizerSnapshot,
    SNAPSHOT_VERSION,
};
pub use progression::{ProgressionGate, UnlockRule};
pub use registry::{ContentRegistry, PoolEntry, RegistryTables, RoomPool};
pub use stamping::{stamp_room, OreProcessor};
pub use synthesizer::{
    CommitReport, DoorFrontier, DungeonSynthesizer, GrowthPhase, InitialRoom, Placement,
};
pub use template::{DoorExtent, DoorType, LocalDoor, PoolId, RoomId, RoomTemplate, TemplateId};
pub use world::{BlockProcessor, DungeonWorld, PassThrough};

/// The reproducible generator every dungeon runs on.
pub type DungeonRng = rand_chacha::ChaCha8Rng;

/// Creates a seeded dungeon RNG.
#[inline]
#[must_use]
pub fn dungeon_rng(seed: u64) -> DungeonRng {
    DungeonRng::seed_from_u64(seed)
}
