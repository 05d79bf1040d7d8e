//! # Blocks
//!
//! A block is a type ID plus metadata. The engine only cares about a handful
//! of them: the filler that ore may replace, the ore itself, the block used
//! to wall off dead doors, and the controller marker.

use serde::{Deserialize, Serialize};

/// A single block in the world.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Block {
    /// Block type ID.
    pub id: u16,
    /// Block metadata (orientation, variant, etc.).
    pub meta: u16,
}

impl Block {
    /// Air block (empty).
    pub const AIR: Self = Self::new(0);
    /// Stone block. The default fillable block.
    pub const STONE: Self = Self::new(2);
    /// Bedrock block.
    pub const BEDROCK: Self = Self::new(7);
    /// Dungeon brick. The default block for sealing dead doors.
    pub const DUNGEON_BRICK: Self = Self::new(98);
    /// Dungeon ore. Replaces stone during stamping.
    pub const DUNGEON_ORE: Self = Self::new(129);
    /// Controller marker.
    pub const CONTROLLER: Self = Self::new(250);

    /// Creates a new block with given ID.
    #[inline]
    #[must_use]
    pub const fn new(id: u16) -> Self {
        Self { id, meta: 0 }
    }

    /// Creates a block with ID and metadata.
    #[inline]
    #[must_use]
    pub const fn with_meta(id: u16, meta: u16) -> Self {
        Self { id, meta }
    }

    /// Returns true if this is an air block.
    #[inline]
    #[must_use]
    pub const fn is_air(self) -> bool {
        self.id == 0
    }
}
