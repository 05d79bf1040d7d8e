//! # LABYRINTH Shared
//!
//! Grid geometry used by every LABYRINTH crate.
//!
//! ## Contents
//!
//! - `math`: block positions, directions, rotations, mirrors, transforms
//! - `area`: collision regions (box, hemisphere, cross)
//!
//! Everything here is pure: no world access, no randomness, no I/O.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod area;
pub mod math;

pub use area::{Area, Cuboid};
pub use math::{
    inverse_rotate_direction, local_to_world, rotate_direction, world_to_local, BlockPos,
    Direction, Mirror, Rotation, Transform,
};
