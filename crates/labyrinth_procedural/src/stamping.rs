//! # Structure Stamping
//!
//! Writes a placed room into the world: one structure template per anchor,
//! with an optional ore post-process on every block written.
//!
//! Anchors are visited in position order, so a seeded RNG always picks the
//! same alternatives.

use labyrinth_shared::{BlockPos, Transform};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::block::Block;
use crate::config::BlockPalette;
use crate::error::{DungeonError, DungeonResult};
use crate::template::RoomTemplate;
use crate::world::{BlockProcessor, DungeonWorld, PassThrough};

/// Swaps fillable blocks for ore with a fixed probability.
///
/// Every fillable block is an independent Bernoulli trial.
pub struct OreProcessor<'r, R: Rng + ?Sized> {
    rng: &'r mut R,
    density: f32,
    fillable: Block,
    ore: Block,
}

impl<'r, R: Rng + ?Sized> OreProcessor<'r, R> {
    /// Creates a processor replacing `fillable` with `ore` at `density`.
    pub fn new(rng: &'r mut R, density: f32, fillable: Block, ore: Block) -> Self {
        Self {
            rng,
            density,
            fillable,
            ore,
        }
    }
}

impl<R: Rng + ?Sized> BlockProcessor for OreProcessor<'_, R> {
    fn process(&mut self, _pos: BlockPos, block: Block) -> Block {
        if block == self.fillable && self.rng.gen::<f32>() < self.density {
            self.ore
        } else {
            block
        }
    }
}

/// Stamps every structure anchor of a room.
///
/// Alternatives are picked and checked against the world for every anchor
/// before anything is written, so a refused anchor leaves the world as it
/// was.
///
/// # Errors
///
/// Returns `StampFailed` naming the first anchor the world refuses.
pub fn stamp_room<R, W>(
    room: &RoomTemplate,
    origin: BlockPos,
    transform: Transform,
    rng: &mut R,
    world: &mut W,
    palette: &BlockPalette,
) -> DungeonResult<()>
where
    R: Rng + ?Sized,
    W: DungeonWorld + ?Sized,
{
    let mut chosen = Vec::with_capacity(room.structures.len());
    for (anchor, alternatives) in &room.structures {
        let Some(template) = alternatives.choose(rng) else {
            continue;
        };
        let position = origin + transform.apply_pos(*anchor);
        if !world.can_place_template(template, position, transform) {
            return Err(refused(room, template, position));
        }
        chosen.push((template, position));
    }

    for (template, position) in chosen {
        let placed = if room.ore_density > 0.0 {
            let mut ore = OreProcessor::new(
                &mut *rng,
                room.ore_density,
                palette.fillable(),
                palette.ore(),
            );
            world.place_template(template, position, transform, &mut ore)
        } else {
            world.place_template(template, position, transform, &mut PassThrough)
        };
        if !placed {
            return Err(refused(room, template, position));
        }
    }
    tracing::debug!(room = %room.id, %origin, anchors = room.structures.len(), "stamped room");
    Ok(())
}

fn refused(room: &RoomTemplate, template: &str, position: BlockPos) -> DungeonError {
    tracing::warn!(room = %room.id, template = %template, %position, "world refused structure");
    DungeonError::StampFailed {
        template: template.to_owned(),
        position,
    }
}
