//! # In-Memory World
//!
//! A sparse chunked voxel world implementing [`DungeonWorld`].
//!
//! ## Chunk Format
//!
//! Chunks are 16x16x256 blocks (width x depth x height), allocated on first
//! write. Unwritten space reads as air.
//!
//! ## Templates
//!
//! Structure templates are registered up front as [`TemplatePattern`]s: a
//! list of (local offset, block) pairs. Placement rotates every offset
//! through the transform and refuses (writing nothing) if the template is
//! unknown or any block would leave the build-height range.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use labyrinth_shared::{Area, BlockPos, Transform};

use crate::block::Block;
use crate::door::SealRecord;
use crate::template::TemplateId;
use crate::world::{BlockProcessor, DungeonWorld};

/// Chunk width/depth in blocks.
pub const CHUNK_SIZE: usize = 16;

/// Chunk height in blocks. Also the exclusive build-height limit.
pub const CHUNK_HEIGHT: usize = 256;

/// Total blocks per chunk.
pub const BLOCKS_PER_CHUNK: usize = CHUNK_SIZE * CHUNK_SIZE * CHUNK_HEIGHT;

/// Chunk coordinate (identifies a chunk in the world grid).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ChunkCoord {
    /// X coordinate (in chunks, not blocks).
    pub x: i32,
    /// Z coordinate (in chunks, not blocks).
    pub z: i32,
}

impl ChunkCoord {
    /// Chunk containing a block position.
    #[inline]
    #[must_use]
    pub const fn containing(pos: BlockPos) -> Self {
        Self {
            x: pos.x.div_euclid(CHUNK_SIZE as i32),
            z: pos.z.div_euclid(CHUNK_SIZE as i32),
        }
    }
}

/// One 16x16x256 column of blocks.
#[derive(Clone)]
struct Chunk {
    /// Block data (indexed as [y][z][x]).
    blocks: Box<[Block]>,
}

impl Chunk {
    fn new() -> Self {
        Self {
            blocks: vec![Block::AIR; BLOCKS_PER_CHUNK].into_boxed_slice(),
        }
    }

    /// Index of a world position inside its chunk. `None` outside the height range.
    #[inline]
    fn index(pos: BlockPos) -> Option<usize> {
        let y = usize::try_from(pos.y).ok().filter(|&y| y < CHUNK_HEIGHT)?;
        let x = pos.x.rem_euclid(CHUNK_SIZE as i32) as usize;
        let z = pos.z.rem_euclid(CHUNK_SIZE as i32) as usize;
        Some((y * CHUNK_SIZE + z) * CHUNK_SIZE + x)
    }
}

/// A structure template as a block list in its local frame.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TemplatePattern {
    /// (local offset, block) pairs.
    pub blocks: Vec<(BlockPos, Block)>,
}

impl TemplatePattern {
    /// Creates an empty pattern.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one block.
    #[must_use]
    pub fn with_block(mut self, offset: BlockPos, block: Block) -> Self {
        self.blocks.push((offset, block));
        self
    }

    /// A solid box between two corners (inclusive).
    #[must_use]
    pub fn filled(a: BlockPos, b: BlockPos, block: Block) -> Self {
        Self {
            blocks: Area::cuboid(a, b).positions().map(|p| (p, block)).collect(),
        }
    }

    /// A box between two corners with walls of `wall` and an air interior.
    #[must_use]
    pub fn hollow(a: BlockPos, b: BlockPos, wall: Block) -> Self {
        let bounds = Area::cuboid(a, b).bounds();
        let (min, max) = (bounds.min, bounds.max);
        let blocks = bounds
            .positions()
            .map(|p| {
                let on_shell = p.x == min.x
                    || p.x == max.x
                    || p.y == min.y
                    || p.y == max.y
                    || p.z == min.z
                    || p.z == max.z;
                (p, if on_shell { wall } else { Block::AIR })
            })
            .collect();
        Self { blocks }
    }
}

/// Sparse in-memory world.
#[derive(Default)]
pub struct MemoryWorld {
    chunks: HashMap<ChunkCoord, Chunk>,
    patterns: HashMap<TemplateId, TemplatePattern>,
    seals: Vec<SealRecord>,
    placements: Vec<(TemplateId, BlockPos, Transform)>,
    refuse_seals: bool,
}

impl MemoryWorld {
    /// Creates an empty world with no patterns.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) a structure template.
    pub fn register_pattern(&mut self, id: impl Into<TemplateId>, pattern: TemplatePattern) {
        self.patterns.insert(id.into(), pattern);
    }

    /// Makes every later `place_seal` call fail, as a world without seal
    /// support would.
    pub fn set_refuse_seals(&mut self, refuse: bool) {
        self.refuse_seals = refuse;
    }

    /// Seals currently in the world.
    #[must_use]
    pub fn seals(&self) -> &[SealRecord] {
        &self.seals
    }

    /// Removes and returns the seal on a doorway.
    pub fn take_seal(&mut self, door_pos: BlockPos) -> Option<SealRecord> {
        let index = self.seals.iter().position(|s| s.door_pos == door_pos)?;
        Some(self.seals.swap_remove(index))
    }

    /// Every accepted template placement, in order.
    #[must_use]
    pub fn placements(&self) -> &[(TemplateId, BlockPos, Transform)] {
        &self.placements
    }

    /// Number of allocated chunks.
    #[must_use]
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// World positions of a template's blocks, or `None` if it cannot be
    /// placed there.
    fn resolve(&self, template: &str, origin: BlockPos, transform: Transform) -> Option<Vec<(BlockPos, Block)>> {
        let Some(pattern) = self.patterns.get(template) else {
            tracing::warn!(template = %template, "unknown structure template");
            return None;
        };
        let resolved: Vec<(BlockPos, Block)> = pattern
            .blocks
            .iter()
            .map(|&(offset, block)| (origin + transform.apply_pos(offset), block))
            .collect();
        if resolved.iter().any(|(pos, _)| Chunk::index(*pos).is_none()) {
            tracing::debug!(template = %template, %origin, "template leaves build height");
            return None;
        }
        Some(resolved)
    }
}

impl DungeonWorld for MemoryWorld {
    fn can_place_template(&self, template: &str, origin: BlockPos, transform: Transform) -> bool {
        self.resolve(template, origin, transform).is_some()
    }

    fn place_template(
        &mut self,
        template: &str,
        origin: BlockPos,
        transform: Transform,
        processor: &mut dyn BlockProcessor,
    ) -> bool {
        let Some(resolved) = self.resolve(template, origin, transform) else {
            return false;
        };
        for (pos, block) in resolved {
            let block = processor.process(pos, block);
            self.set_block(pos, block);
        }
        self.placements.push((template.to_owned(), origin, transform));
        true
    }

    fn is_in_height_bounds(&self, area: &Area) -> bool {
        let bounds = area.bounds();
        bounds.min.y >= 0 && bounds.max.y < CHUNK_HEIGHT as i32
    }

    fn get_block(&self, pos: BlockPos) -> Block {
        let Some(index) = Chunk::index(pos) else {
            return Block::AIR;
        };
        self.chunks
            .get(&ChunkCoord::containing(pos))
            .map_or(Block::AIR, |chunk| chunk.blocks[index])
    }

    fn set_block(&mut self, pos: BlockPos, block: Block) {
        let Some(index) = Chunk::index(pos) else {
            return;
        };
        let chunk = match self.chunks.entry(ChunkCoord::containing(pos)) {
            Entry::Occupied(entry) => entry.into_mut(),
            // Writing air into unallocated space is a no-op.
            Entry::Vacant(_) if block.is_air() => return,
            Entry::Vacant(entry) => entry.insert(Chunk::new()),
        };
        chunk.blocks[index] = block;
    }

    fn place_seal(&mut self, seal: &SealRecord) -> bool {
        if self.refuse_seals {
            return false;
        }
        self.seals.push(seal.clone());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::PassThrough;
    use labyrinth_shared::Rotation;

    #[test]
    fn test_sparse_reads_and_writes() {
        let mut world = MemoryWorld::new();
        assert!(world.get_block(BlockPos::new(-40, 12, 99)).is_air());
        world.set_block(BlockPos::new(-40, 12, 99), Block::STONE);
        assert_eq!(world.get_block(BlockPos::new(-40, 12, 99)), Block::STONE);
        assert_eq!(world.chunk_count(), 1);

        world.set_block(BlockPos::new(500, 0, 500), Block::AIR);
        world.set_block(BlockPos::new(0, 300, 0), Block::STONE);
        assert_eq!(world.chunk_count(), 1);
        assert!(world.get_block(BlockPos::new(0, 300, 0)).is_air());
    }

    #[test]
    fn test_rotated_placement() {
        let mut world = MemoryWorld::new();
        world.register_pattern(
            "test:bar",
            TemplatePattern::new()
                .with_block(BlockPos::ORIGIN, Block::STONE)
                .with_block(BlockPos::new(1, 0, 0), Block::BEDROCK),
        );
        let origin = BlockPos::new(5, 5, 5);
        assert!(world.place_template(
            "test:bar",
            origin,
            Transform::rotated(Rotation::Clockwise90),
            &mut PassThrough
        ));
        assert_eq!(world.get_block(origin), Block::STONE);
        assert_eq!(world.get_block(BlockPos::new(5, 5, 6)), Block::BEDROCK);
        assert_eq!(world.placements().len(), 1);
    }

    #[test]
    fn test_refused_placement_writes_nothing() {
        let mut world = MemoryWorld::new();
        world.register_pattern(
            "test:tower",
            TemplatePattern::filled(BlockPos::ORIGIN, BlockPos::new(0, 9, 0), Block::STONE),
        );
        assert!(!world.place_template("test:tower", BlockPos::new(0, 250, 0), Transform::IDENTITY, &mut PassThrough));
        assert!(world.get_block(BlockPos::new(0, 250, 0)).is_air());
        assert!(!world.place_template("test:missing", BlockPos::ORIGIN, Transform::IDENTITY, &mut PassThrough));
        assert!(world.placements().is_empty());

        assert!(!world.can_place_template("test:tower", BlockPos::new(0, 250, 0), Transform::IDENTITY));
        assert!(!world.can_place_template("test:missing", BlockPos::ORIGIN, Transform::IDENTITY));
        assert!(world.can_place_template("test:tower", BlockPos::new(0, 64, 0), Transform::IDENTITY));
        assert_eq!(world.chunk_count(), 0);
    }

    #[test]
    fn test_height_bounds() {
        let world = MemoryWorld::new();
        assert!(world.is_in_height_bounds(&Area::cuboid(BlockPos::new(0, 0, 0), BlockPos::new(4, 255, 4))));
        assert!(!world.is_in_height_bounds(&Area::cuboid(BlockPos::new(0, -1, 0), BlockPos::new(4, 4, 4))));
        assert!(!world.is_in_height_bounds(&Area::cuboid(BlockPos::new(0, 250, 0), BlockPos::new(4, 256, 4))));
    }

    #[test]
    fn test_hollow_pattern() {
        let pattern = TemplatePattern::hollow(BlockPos::ORIGIN, BlockPos::new(2, 2, 2), Block::DUNGEON_BRICK);
        assert_eq!(pattern.blocks.len(), 27);
        let interior = pattern.blocks.iter().filter(|(_, b)| b.is_air()).count();
        assert_eq!(interior, 1);
    }

    #[test]
    fn test_seals() {
        let mut world = MemoryWorld::new();
        let seal = SealRecord {
            controller_pos: BlockPos::ORIGIN,
            door_pos: BlockPos::new(1, 2, 3),
            door_facing: labyrinth_shared::Direction::North,
            door_type: "corridor".into(),
            candidate_pools: vec![],
            extent: crate::template::DoorExtent::default(),
            depth: 0,
        };
        assert!(world.place_seal(&seal));
        world.set_refuse_seals(true);
        assert!(!world.place_seal(&seal));
        assert_eq!(world.seals().len(), 1);
        assert_eq!(world.take_seal(BlockPos::new(1, 2, 3)), Some(seal));
        assert!(world.seals().is_empty());
    }
}
