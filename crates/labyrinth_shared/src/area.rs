//! # Area Descriptors
//!
//! Regions of the voxel grid used for collision between placed rooms.
//!
//! ## Shapes
//!
//! - [`Cuboid`]: an inclusive axis-aligned box
//! - Hemisphere: the upper or lower half of a ball
//! - Cross: a plus-shaped slab in the XZ plane
//!
//! Intersection is exact at block resolution. Box-like shapes are tested
//! box-against-box. A hemisphere against a box clamps the center into the
//! box (clipped to the dome's side of the cut plane) and compares squared
//! distances. Two hemispheres compare z-spans column by column over the
//! overlap of their bounds.

use serde::{Deserialize, Serialize};

use crate::math::{BlockPos, Transform};

/// An inclusive axis-aligned box of blocks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cuboid {
    /// Lowest corner (inclusive).
    pub min: BlockPos,
    /// Highest corner (inclusive).
    pub max: BlockPos,
}

impl Cuboid {
    /// Creates a box spanning two corners, in any order.
    #[must_use]
    pub fn new(a: BlockPos, b: BlockPos) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Creates a box from its lowest corner and a size in blocks.
    ///
    /// Sizes below one are clamped to one.
    #[must_use]
    pub fn from_size(min: BlockPos, size_x: i32, size_y: i32, size_z: i32) -> Self {
        Self {
            min,
            max: min.offset(size_x.max(1) - 1, size_y.max(1) - 1, size_z.max(1) - 1),
        }
    }

    /// A single block.
    #[must_use]
    pub const fn single(pos: BlockPos) -> Self {
        Self { min: pos, max: pos }
    }

    /// Returns true if the block lies inside the box.
    #[inline]
    #[must_use]
    pub const fn contains(&self, p: BlockPos) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }

    /// Returns true if the two boxes share at least one block.
    #[inline]
    #[must_use]
    pub const fn intersects(&self, other: &Self) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    /// The shared blocks of two boxes, if any.
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        if !self.intersects(other) {
            return None;
        }
        Some(Self {
            min: self.min.max(other.min),
            max: self.max.min(other.max),
        })
    }

    /// Shifts the box.
    #[inline]
    #[must_use]
    pub fn offset(&self, delta: BlockPos) -> Self {
        Self {
            min: self.min + delta,
            max: self.max + delta,
        }
    }

    /// Rotates/mirrors the box about the local origin.
    #[must_use]
    pub fn transformed(&self, transform: Transform) -> Self {
        Self::new(transform.apply_pos(self.min), transform.apply_pos(self.max))
    }

    /// Size along each axis, in blocks.
    #[must_use]
    pub fn size(&self) -> BlockPos {
        self.max - self.min + BlockPos::new(1, 1, 1)
    }

    /// Number of blocks in the box.
    #[must_use]
    pub fn volume(&self) -> u64 {
        let s = self.size();
        [s.x, s.y, s.z]
            .into_iter()
            .map(|v| u64::try_from(v).unwrap_or(0))
            .product()
    }

    /// Iterates every block, Y-major then Z then X.
    pub fn positions(&self) -> impl Iterator<Item = BlockPos> {
        let (min, max) = (self.min, self.max);
        (min.y..=max.y).flat_map(move |y| {
            (min.z..=max.z)
                .flat_map(move |z| (min.x..=max.x).map(move |x| BlockPos::new(x, y, z)))
        })
    }
}

/// A collision region.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum Area {
    /// Axis-aligned box.
    Cuboid(Cuboid),
    /// Half of a ball, cut by the horizontal plane through its center.
    Hemisphere {
        /// Center of the full ball (lies on the cut plane).
        center: BlockPos,
        /// Radius in blocks.
        radius: i32,
        /// Dome points up (true) or down (false).
        upward: bool,
    },
    /// Two perpendicular horizontal arms crossing at `center`.
    Cross {
        /// Center of the floor of the crossing.
        center: BlockPos,
        /// Arm reach from the center, in blocks.
        arm: i32,
        /// Half the arm thickness; the arm is `2 * half_width + 1` wide.
        half_width: i32,
        /// Height in blocks, rising from `center.y`.
        height: i32,
    },
}

impl Area {
    /// Convenience constructor for a box between two corners.
    #[must_use]
    pub fn cuboid(a: BlockPos, b: BlockPos) -> Self {
        Self::Cuboid(Cuboid::new(a, b))
    }

    /// Smallest box containing the whole area.
    #[must_use]
    pub fn bounds(&self) -> Cuboid {
        match *self {
            Self::Cuboid(c) => c,
            Self::Hemisphere {
                center,
                radius,
                upward,
            } => {
                let r = radius.max(0);
                let (lo, hi) = if upward { (0, r) } else { (-r, 0) };
                Cuboid::new(center.offset(-r, lo, -r), center.offset(r, hi, r))
            }
            Self::Cross {
                center,
                arm,
                height,
                ..
            } => {
                let a = arm.max(0);
                Cuboid::new(
                    center.offset(-a, 0, -a),
                    center.offset(a, height.max(1) - 1, a),
                )
            }
        }
    }

    /// The area as a union of boxes, when it has an exact box decomposition.
    fn boxes(&self) -> Option<[Cuboid; 2]> {
        match *self {
            Self::Cuboid(c) => Some([c, c]),
            Self::Cross {
                center,
                arm,
                half_width,
                height,
            } => {
                let (a, w, top) = (arm.max(0), half_width.max(0), height.max(1) - 1);
                Some([
                    Cuboid::new(center.offset(-a, 0, -w), center.offset(a, top, w)),
                    Cuboid::new(center.offset(-w, 0, -a), center.offset(w, top, a)),
                ])
            }
            Self::Hemisphere { .. } => None,
        }
    }

    /// Returns true if the block lies inside the area.
    #[must_use]
    pub fn contains(&self, p: BlockPos) -> bool {
        match *self {
            Self::Hemisphere {
                center,
                radius,
                upward,
            } => {
                let r = i64::from(radius.max(0));
                let on_side = if upward { p.y >= center.y } else { p.y <= center.y };
                on_side && p.distance_squared(center) <= r * r
            }
            _ => self
                .boxes()
                .is_some_and(|boxes| boxes.iter().any(|b| b.contains(p))),
        }
    }

    /// Returns true if the two areas share at least one block.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        let Some(overlap) = self.bounds().intersection(&other.bounds()) else {
            return false;
        };
        match (self.boxes(), other.boxes()) {
            (Some(ours), Some(theirs)) => ours
                .iter()
                .any(|a| theirs.iter().any(|b| a.intersects(b))),
            (None, Some(theirs)) => theirs.iter().any(|b| self.hemisphere_hits_box(b)),
            (Some(ours), None) => ours.iter().any(|b| other.hemisphere_hits_box(b)),
            (None, None) => (overlap.min.y..=overlap.max.y).any(|y| {
                (overlap.min.x..=overlap.max.x).any(|x| {
                    match (self.column_span(x, y), other.column_span(x, y)) {
                        (Some(a), Some(b)) => {
                            a.0.max(b.0).max(overlap.min.z) <= a.1.min(b.1).min(overlap.max.z)
                        }
                        _ => false,
                    }
                })
            }),
        }
    }

    /// Hemisphere against box: the box block nearest the center, on the
    /// dome's side of the cut plane, decides.
    fn hemisphere_hits_box(&self, b: &Cuboid) -> bool {
        let Self::Hemisphere {
            center,
            radius,
            upward,
        } = *self
        else {
            return false;
        };
        let (lo, hi) = if upward {
            (b.min.y.max(center.y), b.max.y)
        } else {
            (b.min.y, b.max.y.min(center.y))
        };
        if lo > hi {
            return false;
        }
        let nearest = BlockPos::new(
            center.x.clamp(b.min.x, b.max.x),
            center.y.clamp(lo, hi),
            center.z.clamp(b.min.z, b.max.z),
        );
        let r = i64::from(radius.max(0));
        nearest.distance_squared(center) <= r * r
    }

    /// Inclusive z-range of a hemisphere's blocks in the column at (x, y).
    fn column_span(&self, x: i32, y: i32) -> Option<(i32, i32)> {
        let Self::Hemisphere {
            center,
            radius,
            upward,
        } = *self
        else {
            return None;
        };
        let on_side = if upward { y >= center.y } else { y <= center.y };
        if !on_side {
            return None;
        }
        let (dx, dy) = (i64::from(x - center.x), i64::from(y - center.y));
        let r = i64::from(radius.max(0));
        let rest = r * r - dx * dx - dy * dy;
        if rest < 0 {
            return None;
        }
        let half = i32::try_from(isqrt(rest)).unwrap_or(i32::MAX);
        Some((center.z.saturating_sub(half), center.z.saturating_add(half)))
    }

    /// Shifts the area.
    #[must_use]
    pub fn offset(&self, delta: BlockPos) -> Self {
        match *self {
            Self::Cuboid(c) => Self::Cuboid(c.offset(delta)),
            Self::Hemisphere {
                center,
                radius,
                upward,
            } => Self::Hemisphere {
                center: center + delta,
                radius,
                upward,
            },
            Self::Cross {
                center,
                arm,
                half_width,
                height,
            } => Self::Cross {
                center: center + delta,
                arm,
                half_width,
                height,
            },
        }
    }

    /// Rotates/mirrors the area about the local origin.
    ///
    /// Both non-box shapes are symmetric under quarter turns and horizontal
    /// mirrors, so only their centers move.
    #[must_use]
    pub fn transformed(&self, transform: Transform) -> Self {
        match *self {
            Self::Cuboid(c) => Self::Cuboid(c.transformed(transform)),
            Self::Hemisphere {
                center,
                radius,
                upward,
            } => Self::Hemisphere {
                center: transform.apply_pos(center),
                radius,
                upward,
            },
            Self::Cross {
                center,
                arm,
                half_width,
                height,
            } => Self::Cross {
                center: transform.apply_pos(center),
                arm,
                half_width,
                height,
            },
        }
    }

    /// Local-space area to world space: transform, then translate to `origin`.
    #[must_use]
    pub fn to_world(&self, transform: Transform, origin: BlockPos) -> Self {
        self.transformed(transform).offset(origin)
    }

    /// Iterates every block of the area.
    pub fn positions(&self) -> impl Iterator<Item = BlockPos> {
        let area = *self;
        self.bounds().positions().filter(move |p| area.contains(*p))
    }
}

/// Largest `h` with `h * h <= n`.
fn isqrt(n: i64) -> i64 {
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    let mut h = (n as f64).sqrt() as i64;
    while h > 0 && h * h > n {
        h -= 1;
    }
    while (h + 1) * (h + 1) <= n {
        h += 1;
    }
    h
}

impl From<Cuboid> for Area {
    fn from(c: Cuboid) -> Self {
        Self::Cuboid(c)
    }
}
