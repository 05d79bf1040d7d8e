//! # Room Templates
//!
//! Immutable definitions of stampable dungeon rooms.
//!
//! Everything in a template is expressed in the room's local frame. The
//! synthesizer moves doors, regions and structure anchors into world space
//! through a [`Transform`](labyrinth_shared::Transform) and an origin.
//!
//! ## Example
//!
//! ```rust
//! use labyrinth_procedural::RoomTemplate;
//! use labyrinth_shared::{Area, BlockPos, Direction};
//!
//! let room = RoomTemplate::new("labyrinth:cell")
//!     .with_weight(3)
//!     .with_structure(BlockPos::new(-2, 0, -2), "labyrinth:cell_a")
//!     .with_region(Area::cuboid(BlockPos::new(-2, 0, -2), BlockPos::new(2, 4, 2)))
//!     .with_door("corridor", Direction::North, BlockPos::new(0, 1, -2), 0)
//!     .with_pools_for_index(0, ["labyrinth:halls", "labyrinth:dead_ends"]);
//!
//! assert_eq!(room.doors_facing("corridor", Direction::North).len(), 1);
//! ```

use std::collections::BTreeMap;

use labyrinth_shared::{Area, BlockPos, Direction};
use serde::{Deserialize, Serialize};

/// Namespaced room identifier, e.g. `labyrinth:cell`.
pub type RoomId = String;
/// Namespaced pool identifier.
pub type PoolId = String;
/// Door type tag. Only doors of the same type connect.
pub type DoorType = String;
/// Structure-template identifier understood by the world.
pub type TemplateId = String;

/// Size of a door opening.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DoorExtent {
    /// Blocks along the wall. Odd widths center on the door position.
    pub width: u8,
    /// Blocks upward from the door position.
    pub height: u8,
}

impl DoorExtent {
    /// Creates a new extent. Zero dimensions are raised to one.
    #[must_use]
    pub fn new(width: u8, height: u8) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }
}

impl Default for DoorExtent {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

/// A door as authored, in the room's local frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LocalDoor {
    /// Local position on the room shell.
    pub position: BlockPos,
    /// Logical door index. Selects the candidate pools for whatever grows here.
    pub index: u32,
}

/// An immutable dungeon room definition.
#[derive(Clone, Debug, PartialEq)]
pub struct RoomTemplate {
    /// Namespaced identifier.
    pub id: RoomId,
    /// Selection weight in the flat room set (at least 1).
    pub weight: u32,
    /// Structure anchors. Several templates at one anchor are alternatives.
    pub structures: BTreeMap<BlockPos, Vec<TemplateId>>,
    /// Doors grouped by type, then by local facing.
    pub doors: BTreeMap<DoorType, BTreeMap<Direction, Vec<LocalDoor>>>,
    /// Ordered candidate pools (normal, special, dead-end) per door index.
    pub room_pool_for_index: BTreeMap<u32, Vec<PoolId>>,
    /// Opening size per door type. Missing types default to 1x1.
    pub door_extents: BTreeMap<DoorType, DoorExtent>,
    /// Local-space collision regions.
    pub collision_regions: Vec<Area>,
    /// Probability in [0, 1] that a fillable block becomes ore.
    pub ore_density: f32,
    /// Player spawn point (initial rooms only).
    pub spawn_offset: BlockPos,
    /// Controller position (initial rooms only).
    pub controller_offset: BlockPos,
    /// Return portal position (initial rooms only).
    pub portal_offset: BlockPos,
}

impl RoomTemplate {
    /// Creates an empty template with weight 1.
    #[must_use]
    pub fn new(id: impl Into<RoomId>) -> Self {
        Self {
            id: id.into(),
            weight: 1,
            structures: BTreeMap::new(),
            doors: BTreeMap::new(),
            room_pool_for_index: BTreeMap::new(),
            door_extents: BTreeMap::new(),
            collision_regions: Vec::new(),
            ore_density: 0.0,
            spawn_offset: BlockPos::ORIGIN,
            controller_offset: BlockPos::ORIGIN,
            portal_offset: BlockPos::ORIGIN,
        }
    }

    /// Sets the flat-set selection weight.
    #[must_use]
    pub fn with_weight(mut self, weight: u32) -> Self {
        self.weight = weight.max(1);
        self
    }

    /// Adds a structure template at a local anchor.
    #[must_use]
    pub fn with_structure(mut self, anchor: BlockPos, template: impl Into<TemplateId>) -> Self {
        self.structures.entry(anchor).or_default().push(template.into());
        self
    }

    /// Adds a door.
    #[must_use]
    pub fn with_door(
        mut self,
        door_type: impl Into<DoorType>,
        facing: Direction,
        position: BlockPos,
        index: u32,
    ) -> Self {
        self.doors
            .entry(door_type.into())
            .or_default()
            .entry(facing)
            .or_default()
            .push(LocalDoor { position, index });
        self
    }

    /// Sets the candidate pools for a door index.
    #[must_use]
    pub fn with_pools_for_index<I, P>(mut self, index: u32, pools: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PoolId>,
    {
        self.room_pool_for_index
            .insert(index, pools.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the opening size for a door type.
    #[must_use]
    pub fn with_door_extent(mut self, door_type: impl Into<DoorType>, extent: DoorExtent) -> Self {
        self.door_extents.insert(door_type.into(), extent);
        self
    }

    /// Adds a collision region.
    #[must_use]
    pub fn with_region(mut self, region: Area) -> Self {
        self.collision_regions.push(region);
        self
    }

    /// Sets the ore density, clamped to [0, 1].
    #[must_use]
    pub fn with_ore_density(mut self, density: f32) -> Self {
        self.ore_density = if density.is_nan() { 0.0 } else { density.clamp(0.0, 1.0) };
        self
    }

    /// Sets the spawn, controller and portal offsets.
    #[must_use]
    pub fn with_markers(mut self, spawn: BlockPos, controller: BlockPos, portal: BlockPos) -> Self {
        self.spawn_offset = spawn;
        self.controller_offset = controller;
        self.portal_offset = portal;
        self
    }

    /// Local doors of a type facing a local direction.
    #[must_use]
    pub fn doors_facing(&self, door_type: &str, facing: Direction) -> &[LocalDoor] {
        self.doors
            .get(door_type)
            .and_then(|by_facing| by_facing.get(&facing))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every door as (type, local facing, door).
    pub fn all_doors(&self) -> impl Iterator<Item = (&str, Direction, &LocalDoor)> {
        self.doors.iter().flat_map(|(door_type, by_facing)| {
            by_facing.iter().flat_map(move |(facing, doors)| {
                doors.iter().map(move |door| (door_type.as_str(), *facing, door))
            })
        })
    }

    /// Number of doors across every type and facing.
    #[must_use]
    pub fn door_count(&self) -> usize {
        self.doors
            .values()
            .flat_map(BTreeMap::values)
            .map(Vec::len)
            .sum()
    }

    /// Candidate pools for a door index. Empty when the index has none.
    #[must_use]
    pub fn pools_for_index(&self, index: u32) -> &[PoolId] {
        self.room_pool_for_index
            .get(&index)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Opening size for a door type.
    #[must_use]
    pub fn door_extent(&self, door_type: &str) -> DoorExtent {
        self.door_extents.get(door_type).copied().unwrap_or_default()
    }
}
