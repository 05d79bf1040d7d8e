//! # Synthesis Configuration
//!
//! Loaded once at startup from TOML:
//!
//! ```toml
//! initial_pool = "labyrinth:entrances"
//! dead_end_pool = "labyrinth:dead_ends"
//! special_cooldown = 8
//!
//! [blocks]
//! fillable = 2
//! ore = 129
//! seal_fill = 98
//! controller = 250
//! ```
//!
//! Every field has a default, so a partial file is fine.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::block::Block;
use crate::error::{DungeonError, DungeonResult};
use crate::template::PoolId;

/// Block IDs the engine writes or inspects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockPalette {
    /// Block the ore post-process may replace.
    pub fillable: u16,
    /// Block substituted for fillable blocks.
    pub ore: u16,
    /// Block used to wall off doors that can never connect.
    pub seal_fill: u16,
    /// Controller marker block.
    pub controller: u16,
}

impl BlockPalette {
    /// Fillable block.
    #[inline]
    #[must_use]
    pub const fn fillable(&self) -> Block {
        Block::new(self.fillable)
    }

    /// Ore block.
    #[inline]
    #[must_use]
    pub const fn ore(&self) -> Block {
        Block::new(self.ore)
    }

    /// Solid door fill block.
    #[inline]
    #[must_use]
    pub const fn seal_fill(&self) -> Block {
        Block::new(self.seal_fill)
    }

    /// Controller marker block.
    #[inline]
    #[must_use]
    pub const fn controller(&self) -> Block {
        Block::new(self.controller)
    }
}

impl Default for BlockPalette {
    fn default() -> Self {
        Self {
            fillable: Block::STONE.id,
            ore: Block::DUNGEON_ORE.id,
            seal_fill: Block::DUNGEON_BRICK.id,
            controller: Block::CONTROLLER.id,
        }
    }
}

/// Per-dungeon synthesis settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    /// Pool the first room is drawn from.
    pub initial_pool: PoolId,
    /// Last pool of every fallback chain. Should hold small rooms that fit anywhere.
    pub dead_end_pool: PoolId,
    /// Unlock checks a placed special pool rests before it may unlock again.
    pub special_cooldown: u32,
    /// Block palette.
    pub blocks: BlockPalette,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            initial_pool: "labyrinth:entrances".to_owned(),
            dead_end_pool: "labyrinth:dead_ends".to_owned(),
            special_cooldown: 8,
            blocks: BlockPalette::default(),
        }
    }
}

impl SynthesisConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` on malformed TOML or failed validation.
    pub fn from_toml_str(source: &str) -> DungeonResult<Self> {
        let config: Self =
            toml::from_str(source).map_err(|e| DungeonError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be read, `InvalidConfig` otherwise.
    pub fn load(path: impl AsRef<Path>) -> DungeonResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&source)?;
        tracing::info!(path = %path.display(), "loaded synthesis config");
        Ok(config)
    }

    /// Checks invariants serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` naming the first offending field.
    pub fn validate(&self) -> DungeonResult<()> {
        if self.initial_pool.is_empty() {
            return Err(DungeonError::InvalidConfig("initial_pool is empty".into()));
        }
        if self.dead_end_pool.is_empty() {
            return Err(DungeonError::InvalidConfig("dead_end_pool is empty".into()));
        }
        if self.special_cooldown == 0 {
            return Err(DungeonError::InvalidConfig(
                "special_cooldown must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
