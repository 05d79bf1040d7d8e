//! # Doors
//!
//! A [`Door`] is a connection point of a *placed* room: a template door
//! resolved through the room's transform and origin. Doors are transient;
//! the only thing that outlives a commit is the [`SealRecord`] the world
//! stores for each door left open.
//!
//! ## Geometry
//!
//! ```text
//!        room shell
//!   ┌──────────────┐
//!   │              │
//!   │           [opening]  <- door position, on the shell
//!   │              │ [fill region] <- one block further out along the facing
//!   └──────────────┘
//! ```
//!
//! The fill region is where a neighbour's matching doorway would sit. If it
//! is already occupied, the door can never connect and is walled up.

use labyrinth_shared::{Area, BlockPos, Cuboid, Direction, Transform};
use serde::{Deserialize, Serialize};

use crate::template::{DoorExtent, DoorType, LocalDoor, PoolId, RoomTemplate};

/// A door of a placed room, in world space.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Door {
    /// World position of the doorway block.
    pub world_position: BlockPos,
    /// Outward facing in world space.
    pub world_facing: Direction,
    /// Door type tag.
    pub door_type: DoorType,
    /// Ordered pools a neighbour grown here is drawn from.
    pub candidate_pools: Vec<PoolId>,
    /// Opening size.
    pub extent: DoorExtent,
    /// Threshold just outside the opening.
    pub fill_region: Area,
    /// Depth of the room that owns this door.
    pub depth: u32,
}

impl Door {
    /// The doorway itself, on the room shell.
    #[must_use]
    pub fn opening(&self) -> Area {
        opening_area(self.world_position, self.world_facing, self.extent)
    }

    /// The record a seal keeps for later reactivation.
    #[must_use]
    pub fn to_seal(&self, controller_pos: BlockPos) -> SealRecord {
        SealRecord {
            controller_pos,
            door_pos: self.world_position,
            door_facing: self.world_facing,
            door_type: self.door_type.clone(),
            candidate_pools: self.candidate_pools.clone(),
            extent: self.extent,
            depth: self.depth,
        }
    }
}

/// Data stored by a world-side seal on an unused door.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealRecord {
    /// Position of the owning controller.
    pub controller_pos: BlockPos,
    /// World position of the sealed doorway.
    pub door_pos: BlockPos,
    /// Outward facing of the sealed doorway.
    pub door_facing: Direction,
    /// Door type tag.
    pub door_type: DoorType,
    /// Ordered candidate pools for the neighbour.
    pub candidate_pools: Vec<PoolId>,
    /// Opening size.
    #[serde(default)]
    pub extent: DoorExtent,
    /// Depth of the room that owns the door.
    pub depth: u32,
}

/// The door a growth request starts from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActivatingDoor {
    /// World position of the doorway block.
    pub position: BlockPos,
    /// Outward facing in world space.
    pub facing: Direction,
    /// Door type tag. The new room must expose a door of the same type.
    pub door_type: DoorType,
    /// Opening size, used when the door has to be walled up.
    pub extent: DoorExtent,
    /// Depth of the room that owns the door. The new room sits one deeper.
    pub depth: u32,
}

impl ActivatingDoor {
    /// Creates an activating door with a 1x1 opening.
    #[must_use]
    pub fn new(position: BlockPos, facing: Direction, door_type: impl Into<DoorType>, depth: u32) -> Self {
        Self {
            position,
            facing,
            door_type: door_type.into(),
            extent: DoorExtent::default(),
            depth,
        }
    }

    /// The doorway on the owning room's shell.
    #[must_use]
    pub fn opening(&self) -> Area {
        opening_area(self.position, self.facing, self.extent)
    }
}

impl From<&SealRecord> for ActivatingDoor {
    fn from(seal: &SealRecord) -> Self {
        Self {
            position: seal.door_pos,
            facing: seal.door_facing,
            door_type: seal.door_type.clone(),
            extent: seal.extent,
            depth: seal.depth,
        }
    }
}

/// The opening of a door with the given extent, in world space.
///
/// Horizontal doors span `width` blocks along the wall (centered for odd
/// widths) and `height` blocks upward. Vertical doors are a `width x width`
/// square hatch.
#[must_use]
pub fn opening_area(position: BlockPos, facing: Direction, extent: DoorExtent) -> Area {
    let width = i32::from(extent.width.max(1));
    let height = i32::from(extent.height.max(1));
    let low = -(width - 1) / 2;
    let high = low + width - 1;

    let cuboid = if facing.is_horizontal() {
        let tangent = facing.clockwise().unit();
        Cuboid::new(
            position.offset(tangent.x * low, 0, tangent.z * low),
            position.offset(tangent.x * high, height - 1, tangent.z * high),
        )
    } else {
        Cuboid::new(position.offset(low, 0, low), position.offset(high, 0, high))
    };
    Area::Cuboid(cuboid)
}

/// Resolves one template door through a placement.
#[must_use]
pub fn resolve_door(
    template: &RoomTemplate,
    door_type: &str,
    local_facing: Direction,
    local: &LocalDoor,
    transform: Transform,
    origin: BlockPos,
    depth: u32,
) -> Door {
    let world_position = origin + transform.apply_pos(local.position);
    let world_facing = transform.apply_direction(local_facing);
    let extent = template.door_extent(door_type);
    let opening = opening_area(world_position, world_facing, extent);
    Door {
        world_position,
        world_facing,
        door_type: door_type.to_owned(),
        candidate_pools: template.pools_for_index(local.index).to_vec(),
        extent,
        fill_region: opening.offset(world_facing.unit()),
        depth,
    }
}

/// Resolves every door of a template through a placement.
#[must_use]
pub fn resolve_doors(
    template: &RoomTemplate,
    transform: Transform,
    origin: BlockPos,
    depth: u32,
) -> Vec<Door> {
    template
        .all_doors()
        .map(|(door_type, facing, local)| {
            resolve_door(template, door_type, facing, local, transform, origin, depth)
        })
        .collect()
}
