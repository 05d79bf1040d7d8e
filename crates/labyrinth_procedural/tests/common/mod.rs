//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use labyrinth_procedural::{
    Block, ContentRegistry, MemoryWorld, RoomTemplate, SynthesisConfig, TemplatePattern,
};
use labyrinth_shared::{Area, BlockPos, Direction};

/// 5x5x5 room on local x,z in [-2, 2] with a corridor door on every side.
pub fn cell_room() -> RoomTemplate {
    let mut room = RoomTemplate::new("test:cell")
        .with_structure(BlockPos::new(-2, 0, -2), "test:cell")
        .with_region(Area::cuboid(BlockPos::new(-2, 0, -2), BlockPos::new(2, 4, 2)))
        .with_pools_for_index(0, ["test:halls", "test:closets"]);
    for facing in Direction::HORIZONTAL {
        let unit = facing.unit();
        room = room.with_door("corridor", facing, BlockPos::new(unit.x * 2, 1, unit.z * 2), 0);
    }
    room
}

/// One-block-wide, two-high dead end whose only door faces north.
pub fn closet_room() -> RoomTemplate {
    RoomTemplate::new("test:closet")
        .with_structure(BlockPos::ORIGIN, "test:closet")
        .with_region(Area::cuboid(BlockPos::ORIGIN, BlockPos::new(0, 1, 0)))
        .with_door("corridor", Direction::North, BlockPos::ORIGIN, 0)
}

/// A room too tall for any world.
pub fn giant_room() -> RoomTemplate {
    RoomTemplate::new("test:giant")
        .with_region(Area::cuboid(BlockPos::new(-2, 0, -2), BlockPos::new(2, 400, 2)))
        .with_door("corridor", Direction::West, BlockPos::new(-2, 1, 0), 0)
        .with_door("corridor", Direction::East, BlockPos::new(2, 1, 0), 0)
}

/// Registry with `test:halls` (cells), `test:closets` (dead ends) and
/// `test:giants` (never fits).
pub fn registry() -> ContentRegistry {
    let registry = ContentRegistry::new();
    registry.register_room("test:cell", cell_room(), 1);
    registry.register_room("test:closet", closet_room(), 1);
    registry.register_room("test:giant", giant_room(), 1);
    registry.register_pool("test:halls", [("test:cell", 1)]);
    registry.register_pool("test:closets", [("test:closet", 1)]);
    registry.register_pool("test:giants", [("test:giant", 1)]);
    registry
}

/// World that knows every fixture structure.
pub fn world() -> MemoryWorld {
    let mut world = MemoryWorld::new();
    world.register_pattern(
        "test:cell",
        TemplatePattern::hollow(BlockPos::ORIGIN, BlockPos::new(4, 4, 4), Block::DUNGEON_BRICK),
    );
    world.register_pattern(
        "test:closet",
        TemplatePattern::filled(BlockPos::ORIGIN, BlockPos::new(0, 1, 0), Block::STONE),
    );
    world
}

/// Config drawing the first room from `test:halls` with `test:closets` as dead end.
pub fn config() -> SynthesisConfig {
    SynthesisConfig {
        initial_pool: "test:halls".into(),
        dead_end_pool: "test:closets".into(),
        special_cooldown: 4,
        ..SynthesisConfig::default()
    }
}

/// Returns true if no two regions intersect.
pub fn pairwise_disjoint(regions: &[Area]) -> bool {
    regions
        .iter()
        .enumerate()
        .all(|(i, a)| regions[i + 1..].iter().all(|b| !a.intersects(b)))
}
