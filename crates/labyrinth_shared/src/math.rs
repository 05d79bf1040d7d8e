//! # Grid Math
//!
//! Integer block coordinates and the rotation/mirror transforms that move a
//! room between its local frame and world space.
//!
//! ## Conventions
//!
//! - Y is up. North is -Z, south is +Z, west is -X, east is +X.
//! - Rotations turn about the Y axis through the local origin, clockwise
//!   when viewed from above.
//! - A [`Transform`] applies its mirror first, then its rotation. The inverse
//!   undoes the rotation first, then re-applies the (self-inverse) mirror.

use serde::{Deserialize, Serialize};

/// A block position in the voxel grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlockPos {
    /// X coordinate (east is positive).
    pub x: i32,
    /// Y coordinate (up is positive).
    pub y: i32,
    /// Z coordinate (south is positive).
    pub z: i32,
}

impl BlockPos {
    /// The origin.
    pub const ORIGIN: Self = Self::new(0, 0, 0);

    /// Creates a new position.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Returns this position shifted by the given deltas.
    #[inline]
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// Returns the neighbouring position one block along `direction`.
    #[inline]
    #[must_use]
    pub const fn step(self, direction: Direction) -> Self {
        let unit = direction.unit();
        self.offset(unit.x, unit.y, unit.z)
    }

    /// Component-wise minimum.
    #[inline]
    #[must_use]
    pub fn min(self, other: Self) -> Self {
        Self::new(self.x.min(other.x), self.y.min(other.y), self.z.min(other.z))
    }

    /// Component-wise maximum.
    #[inline]
    #[must_use]
    pub fn max(self, other: Self) -> Self {
        Self::new(self.x.max(other.x), self.y.max(other.y), self.z.max(other.z))
    }

    /// Squared euclidean distance (avoids sqrt).
    #[inline]
    #[must_use]
    pub fn distance_squared(self, other: Self) -> i64 {
        let dx = i64::from(self.x - other.x);
        let dy = i64::from(self.y - other.y);
        let dz = i64::from(self.z - other.z);
        dx * dx + dy * dy + dz * dz
    }
}

impl std::ops::Add for BlockPos {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl std::ops::Sub for BlockPos {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl std::ops::Neg for BlockPos {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

impl std::fmt::Display for BlockPos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// One of the six axis-aligned facings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// -Y
    Down,
    /// +Y
    Up,
    /// -Z
    North,
    /// +Z
    South,
    /// -X
    West,
    /// +X
    East,
}

impl Direction {
    /// All six directions.
    pub const ALL: [Self; 6] = [
        Self::Down,
        Self::Up,
        Self::North,
        Self::South,
        Self::West,
        Self::East,
    ];

    /// The four horizontal directions, clockwise from north.
    pub const HORIZONTAL: [Self; 4] = [Self::North, Self::East, Self::South, Self::West];

    /// Returns the direction pointing the other way.
    #[inline]
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Down => Self::Up,
            Self::Up => Self::Down,
            Self::North => Self::South,
            Self::South => Self::North,
            Self::West => Self::East,
            Self::East => Self::West,
        }
    }

    /// Unit vector of this direction.
    #[inline]
    #[must_use]
    pub const fn unit(self) -> BlockPos {
        match self {
            Self::Down => BlockPos::new(0, -1, 0),
            Self::Up => BlockPos::new(0, 1, 0),
            Self::North => BlockPos::new(0, 0, -1),
            Self::South => BlockPos::new(0, 0, 1),
            Self::West => BlockPos::new(-1, 0, 0),
            Self::East => BlockPos::new(1, 0, 0),
        }
    }

    /// Returns true for north, south, east and west.
    #[inline]
    #[must_use]
    pub const fn is_horizontal(self) -> bool {
        !matches!(self, Self::Up | Self::Down)
    }

    /// The next horizontal direction clockwise. Vertical directions are unchanged.
    #[inline]
    #[must_use]
    pub const fn clockwise(self) -> Self {
        match self {
            Self::North => Self::East,
            Self::East => Self::South,
            Self::South => Self::West,
            Self::West => Self::North,
            vertical => vertical,
        }
    }
}

/// A quarter-turn rotation about the Y axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rotation {
    /// No rotation.
    #[default]
    None,
    /// 90 degrees clockwise.
    Clockwise90,
    /// 180 degrees.
    Clockwise180,
    /// 90 degrees counter-clockwise.
    CounterClockwise90,
}

impl Rotation {
    /// All four rotations.
    pub const ALL: [Self; 4] = [
        Self::None,
        Self::Clockwise90,
        Self::Clockwise180,
        Self::CounterClockwise90,
    ];

    /// Number of clockwise quarter turns.
    #[inline]
    #[must_use]
    pub const fn quarter_turns(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Clockwise90 => 1,
            Self::Clockwise180 => 2,
            Self::CounterClockwise90 => 3,
        }
    }

    /// The rotation that undoes this one.
    #[inline]
    #[must_use]
    pub const fn inverse(self) -> Self {
        match self {
            Self::Clockwise90 => Self::CounterClockwise90,
            Self::CounterClockwise90 => Self::Clockwise90,
            other => other,
        }
    }

    /// Rotates a direction. Up and down are unaffected.
    #[must_use]
    pub const fn rotate(self, direction: Direction) -> Direction {
        let mut out = direction;
        let mut turns = self.quarter_turns();
        while turns > 0 {
            out = out.clockwise();
            turns -= 1;
        }
        out
    }

    /// Rotates a position about the local origin.
    #[inline]
    #[must_use]
    pub const fn rotate_pos(self, pos: BlockPos) -> BlockPos {
        match self {
            Self::None => pos,
            Self::Clockwise90 => BlockPos::new(-pos.z, pos.y, pos.x),
            Self::Clockwise180 => BlockPos::new(-pos.x, pos.y, -pos.z),
            Self::CounterClockwise90 => BlockPos::new(pos.z, pos.y, -pos.x),
        }
    }
}

/// A reflection in the horizontal plane.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mirror {
    /// No reflection.
    #[default]
    None,
    /// Flips Z: north and south swap.
    LeftRight,
    /// Flips X: east and west swap.
    FrontBack,
}

impl Mirror {
    /// All three mirrors.
    pub const ALL: [Self; 3] = [Self::None, Self::LeftRight, Self::FrontBack];

    /// Mirrors a direction.
    #[inline]
    #[must_use]
    pub const fn mirror(self, direction: Direction) -> Direction {
        match (self, direction) {
            (Self::LeftRight, Direction::North | Direction::South)
            | (Self::FrontBack, Direction::East | Direction::West) => direction.opposite(),
            _ => direction,
        }
    }

    /// Mirrors a position through the local origin.
    #[inline]
    #[must_use]
    pub const fn mirror_pos(self, pos: BlockPos) -> BlockPos {
        match self {
            Self::None => pos,
            Self::LeftRight => BlockPos::new(pos.x, pos.y, -pos.z),
            Self::FrontBack => BlockPos::new(-pos.x, pos.y, pos.z),
        }
    }
}

/// A (mirror, rotation) pair mapping a room's local frame onto the world.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Transform {
    /// Applied first.
    pub mirror: Mirror,
    /// Applied after the mirror.
    pub rotation: Rotation,
}

impl Transform {
    /// No mirror, no rotation.
    pub const IDENTITY: Self = Self::new(Mirror::None, Rotation::None);

    /// Creates a new transform.
    #[inline]
    #[must_use]
    pub const fn new(mirror: Mirror, rotation: Rotation) -> Self {
        Self { mirror, rotation }
    }

    /// A pure rotation.
    #[inline]
    #[must_use]
    pub const fn rotated(rotation: Rotation) -> Self {
        Self::new(Mirror::None, rotation)
    }

    /// Maps a local direction to world space.
    #[inline]
    #[must_use]
    pub const fn apply_direction(self, direction: Direction) -> Direction {
        rotate_direction(self.mirror, self.rotation, direction)
    }

    /// Maps a world direction back to local space.
    #[inline]
    #[must_use]
    pub const fn inverse_direction(self, direction: Direction) -> Direction {
        inverse_rotate_direction(self.mirror, self.rotation, direction)
    }

    /// Maps a local offset to a world offset (no translation).
    #[inline]
    #[must_use]
    pub const fn apply_pos(self, pos: BlockPos) -> BlockPos {
        self.rotation.rotate_pos(self.mirror.mirror_pos(pos))
    }

    /// Maps a world offset back to a local offset (no translation).
    #[inline]
    #[must_use]
    pub const fn inverse_pos(self, pos: BlockPos) -> BlockPos {
        self.mirror.mirror_pos(self.rotation.inverse().rotate_pos(pos))
    }
}

/// Applies `mirror`, then `rotation`, to a direction.
#[inline]
#[must_use]
pub const fn rotate_direction(mirror: Mirror, rotation: Rotation, direction: Direction) -> Direction {
    rotation.rotate(mirror.mirror(direction))
}

/// Recovers the direction that [`rotate_direction`] was given.
#[inline]
#[must_use]
pub const fn inverse_rotate_direction(
    mirror: Mirror,
    rotation: Rotation,
    direction: Direction,
) -> Direction {
    mirror.mirror(rotation.inverse().rotate(direction))
}

/// Moves a local position into world space for a room placed at `origin`.
#[inline]
#[must_use]
pub fn local_to_world(transform: Transform, origin: BlockPos, local: BlockPos) -> BlockPos {
    origin + transform.apply_pos(local)
}

/// Moves a world position into the local frame of a room placed at `origin`.
#[inline]
#[must_use]
pub fn world_to_local(transform: Transform, origin: BlockPos, world: BlockPos) -> BlockPos {
    transform.inverse_pos(world - origin)
}
