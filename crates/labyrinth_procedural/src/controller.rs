//! # Dungeon Controller
//!
//! Owns one synthesizer and turns seal activations into growth.
//!
//! ## Fallback Chain
//!
//! When a seal is activated the controller probes pools in order:
//!
//! 1. the pool a key narrows the candidates to, if the player holds one, or
//!    else every unlocked special pool followed by the seal's own candidates
//! 2. the configured dead-end pool, always last
//!
//! The first successful probe is committed. If nothing fits, the doorway is
//! walled up. A snapshot is saved after every mutation. Seals whose door is
//! no longer in the frontier are ignored.

use labyrinth_shared::BlockPos;
use rand::Rng;

use crate::config::SynthesisConfig;
use crate::door::{ActivatingDoor, SealRecord};
use crate::error::{DungeonError, DungeonResult};
use crate::persistence::{StateStore, SynthesizerSnapshot};
use crate::registry::ContentRegistry;
use crate::synthesizer::{CommitReport, DungeonSynthesizer, InitialRoom};
use crate::template::{PoolId, RoomId};
use crate::world::DungeonWorld;

/// An item that steers growth toward particular pools.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DungeonKey {
    /// Pools this key is attuned to.
    pub pools: Vec<PoolId>,
}

impl DungeonKey {
    /// Creates a key attuned to the given pools.
    #[must_use]
    pub fn new<I, P>(pools: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PoolId>,
    {
        Self {
            pools: pools.into_iter().map(Into::into).collect(),
        }
    }
}

/// Narrows a seal's candidate pools using a key.
pub trait KeyFilter {
    /// Returns the single pool to use, or `None` to leave the chain alone.
    fn filter(&self, candidates: &[PoolId], key: &DungeonKey) -> Option<PoolId>;
}

/// Picks the first candidate the key is attuned to.
#[derive(Clone, Copy, Debug, Default)]
pub struct AttunedKeyFilter;

impl KeyFilter for AttunedKeyFilter {
    fn filter(&self, candidates: &[PoolId], key: &DungeonKey) -> Option<PoolId> {
        candidates.iter().find(|pool| key.pools.contains(pool)).cloned()
    }
}

/// Result of activating a seal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ActivationOutcome {
    /// A room was grown.
    Placed {
        /// Room that was placed.
        room: RoomId,
        /// Pool it came from.
        pool: PoolId,
        /// World origin of the room.
        origin: BlockPos,
        /// Commit details.
        report: CommitReport,
    },
    /// Nothing fit; the doorway was walled up.
    FilledSolid,
    /// The seal's door is not open in this dungeon (already grown, walled
    /// up, or owned by another controller). Nothing was changed.
    Stale,
}

/// Owns a synthesizer, its configuration and its state store.
#[derive(Debug)]
pub struct DungeonController<S: StateStore> {
    synthesizer: DungeonSynthesizer,
    config: SynthesisConfig,
    store: S,
}

impl<S: StateStore> DungeonController<S> {
    /// Creates a controller with an empty synthesizer.
    #[must_use]
    pub fn new(controller_pos: BlockPos, config: SynthesisConfig, store: S) -> Self {
        Self {
            synthesizer: DungeonSynthesizer::new(controller_pos),
            config,
            store,
        }
    }

    /// Rebuilds a controller from its store.
    ///
    /// An empty store or an unreadable snapshot yields an empty
    /// synthesizer.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the store itself fails.
    pub fn restore(store: S, config: SynthesisConfig, controller_pos: BlockPos) -> DungeonResult<Self> {
        let synthesizer = match store.load()? {
            None => DungeonSynthesizer::new(controller_pos),
            Some(bytes) => match SynthesizerSnapshot::decode(&bytes) {
                Ok(snapshot) => {
                    let synth = snapshot.restore();
                    tracing::info!(
                        controller = %controller_pos,
                        rooms_placed = synth.rooms_placed(),
                        open_doors = synth.open_door_count(),
                        "restored dungeon"
                    );
                    synth
                }
                Err(error) => {
                    tracing::warn!(controller = %controller_pos, %error, "discarding unreadable snapshot");
                    DungeonSynthesizer::new(controller_pos)
                }
            },
        };
        Ok(Self {
            synthesizer,
            config,
            store,
        })
    }

    /// The owned synthesizer.
    #[must_use]
    pub fn synthesizer(&self) -> &DungeonSynthesizer {
        &self.synthesizer
    }

    /// The configuration.
    #[must_use]
    pub fn config(&self) -> &SynthesisConfig {
        &self.config
    }

    /// The state store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Stamps the initial room at the controller position.
    ///
    /// # Errors
    ///
    /// Returns `StampFailed` if the world refuses the room, or a storage
    /// error if the snapshot cannot be saved.
    pub fn initialize<R, W>(
        &mut self,
        registry: &ContentRegistry,
        rng: &mut R,
        world: &mut W,
    ) -> DungeonResult<InitialRoom>
    where
        R: Rng + ?Sized,
        W: DungeonWorld + ?Sized,
    {
        let anchor = self.synthesizer.controller_pos();
        let initial = self.synthesizer.generate_initial_room(
            registry,
            Some(self.config.initial_pool.as_str()),
            rng,
            world,
            anchor,
            &self.config,
        )?;
        self.persist()?;
        Ok(initial)
    }

    /// Pools to probe for a seal, in order, without duplicates.
    #[must_use]
    pub fn fallback_chain(
        &self,
        seal: &SealRecord,
        key: Option<&DungeonKey>,
        filter: &dyn KeyFilter,
    ) -> Vec<PoolId> {
        let mut chain: Vec<PoolId> = Vec::new();
        match key.and_then(|key| filter.filter(&seal.candidate_pools, key)) {
            Some(pool) => chain.push(pool),
            None => {
                chain.extend(self.synthesizer.special_pool_buffer().iter().cloned());
                chain.extend(seal.candidate_pools.iter().cloned());
            }
        }
        chain.push(self.config.dead_end_pool.clone());

        let mut seen = std::collections::HashSet::new();
        chain.retain(|pool| seen.insert(pool.clone()));
        chain
    }

    /// Grows a room from an activated seal.
    ///
    /// A pool whose room the world refuses to stamp counts as a pool that
    /// did not fit, so the chain moves on and the world stays consistent
    /// with the frontier.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the snapshot cannot be saved.
    pub fn activate_seal<R, W>(
        &mut self,
        registry: &ContentRegistry,
        seal: &SealRecord,
        key: Option<&DungeonKey>,
        filter: &dyn KeyFilter,
        rng: &mut R,
        world: &mut W,
    ) -> DungeonResult<ActivationOutcome>
    where
        R: Rng + ?Sized,
        W: DungeonWorld + ?Sized,
    {
        if seal.controller_pos != self.synthesizer.controller_pos() {
            tracing::warn!(
                seal = %seal.door_pos,
                owner = %seal.controller_pos,
                "seal belongs to another controller"
            );
            return Ok(ActivationOutcome::Stale);
        }
        if !self.synthesizer.is_open(&seal.door_type, seal.door_facing, seal.door_pos) {
            tracing::warn!(seal = %seal.door_pos, "seal's door is no longer open");
            return Ok(ActivationOutcome::Stale);
        }

        let door = ActivatingDoor::from(seal);
        for pool in self.fallback_chain(seal, key, filter) {
            let probe = self
                .synthesizer
                .random_placement(registry, Some(pool.as_str()), rng, &*world, &door);
            let Some(placement) = probe else {
                tracing::debug!(pool = %pool, door = %door.position, "pool did not fit");
                continue;
            };

            let report = match self
                .synthesizer
                .commit(registry, &placement, &door, rng, world, &self.config)
            {
                Ok(report) => report,
                Err(DungeonError::StampFailed { template, position }) => {
                    tracing::warn!(
                        pool = %pool,
                        template = %template,
                        %position,
                        "stamping failed after placement, trying next pool"
                    );
                    continue;
                }
                Err(error) => return Err(error),
            };
            self.synthesizer.mark_special_placed(&pool);
            self.persist()?;

            return Ok(ActivationOutcome::Placed {
                room: placement.room.id.clone(),
                pool,
                origin: placement.origin,
                report,
            });
        }

        tracing::info!(door = %door.position, "no pool fits, walling up door");
        self.synthesizer.fill_door(&door, world, &self.config);
        self.persist()?;
        Ok(ActivationOutcome::FilledSolid)
    }

    fn persist(&mut self) -> DungeonResult<()> {
        let bytes = SynthesizerSnapshot::capture(&self.synthesizer).encode()?;
        self.store.save(&bytes)
    }
}
