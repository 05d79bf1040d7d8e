//! # Dungeon Error Types
//!
//! Errors that can escape the synthesis engine.
//!
//! Missing content and geometric rejection are NOT errors: they surface as
//! `None` so callers can fall through to the next pool.

use labyrinth_shared::BlockPos;
use thiserror::Error;

/// Errors that can occur while synthesizing or persisting a dungeon.
#[derive(Error, Debug)]
pub enum DungeonError {
    /// The world refused to place a structure template.
    #[error("world refused template {template} at {position}")]
    StampFailed {
        /// Template that failed.
        template: String,
        /// World anchor it was placed at.
        position: BlockPos,
    },

    /// A snapshot could not be decoded at all.
    #[error("corrupt snapshot: {0}")]
    CorruptSnapshot(String),

    /// A snapshot could not be encoded.
    #[error("snapshot encoding failed: {0}")]
    Encode(#[from] serde_json::Error),

    /// Invalid configuration file.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Underlying storage failure.
    #[error("storage error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for dungeon operations.
pub type DungeonResult<T> = Result<T, DungeonError>;
