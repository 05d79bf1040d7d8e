//! # World Collaborator
//!
//! The synthesizer never touches voxels directly. Everything it needs from
//! the host world goes through [`DungeonWorld`]:
//!
//! - checking and stamping structure templates (with a per-block
//!   [`BlockProcessor`])
//! - build-height checks for candidate regions
//! - single-block writes (controller marker, solid door fills)
//! - creating seals on unused doors

use labyrinth_shared::{Area, BlockPos, Transform};

use crate::block::Block;
use crate::door::SealRecord;

/// Per-block hook applied while a template is written into the world.
pub trait BlockProcessor {
    /// Returns the block to write at `pos` in place of `block`.
    fn process(&mut self, pos: BlockPos, block: Block) -> Block;
}

/// Writes every block unchanged.
#[derive(Clone, Copy, Debug, Default)]
pub struct PassThrough;

impl BlockProcessor for PassThrough {
    #[inline]
    fn process(&mut self, _pos: BlockPos, block: Block) -> Block {
        block
    }
}

/// Everything the engine needs from the host world.
pub trait DungeonWorld {
    /// Returns true if `place_template` would accept this template here.
    /// Must not write anything.
    fn can_place_template(&self, template: &str, origin: BlockPos, transform: Transform) -> bool;

    /// Places a structure template with its local origin at `origin`.
    ///
    /// Returns false if the world refused (unknown template, unloaded or
    /// out-of-range area). A refused placement must write nothing.
    fn place_template(
        &mut self,
        template: &str,
        origin: BlockPos,
        transform: Transform,
        processor: &mut dyn BlockProcessor,
    ) -> bool;

    /// Returns true if the whole area lies inside the buildable height range.
    fn is_in_height_bounds(&self, area: &Area) -> bool;

    /// Reads a block.
    fn get_block(&self, pos: BlockPos) -> Block;

    /// Writes a block.
    fn set_block(&mut self, pos: BlockPos, block: Block);

    /// Creates a seal for an unused door.
    ///
    /// Returns false if the world could not create it; the engine then
    /// fills the door solid instead.
    fn place_seal(&mut self, seal: &SealRecord) -> bool;

    /// Fills every block of an area.
    fn fill_solid(&mut self, area: &Area, block: Block) {
        for pos in area.positions() {
            self.set_block(pos, block);
        }
    }
}
