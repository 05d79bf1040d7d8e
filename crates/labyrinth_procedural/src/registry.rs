//! # Content Registry
//!
//! Room templates, weighted room pools and special-pool unlock rules.
//!
//! ## Lifecycle
//!
//! 1. **Load phase**: one thread registers rooms, pools and unlock rules.
//! 2. **Generation**: any number of synthesizers read concurrently.
//!
//! ## Concurrency
//!
//! The tables live behind `RwLock<Arc<RegistryTables>>`. Writers copy on
//! write (`Arc::make_mut`) under the write lock. Readers hold the read lock
//! only long enough to clone the `Arc`, then iterate a frozen snapshot with
//! no lock held. A reader never observes a half-registered room.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use rand::Rng;

use crate::progression::ProgressionGate;
use crate::template::{PoolId, RoomId, RoomTemplate};

/// One weighted entry of a room pool.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolEntry {
    /// Room drawn when this entry wins.
    pub room: RoomId,
    /// Relative weight (at least 1).
    pub weight: u32,
}

/// A weighted list of rooms.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RoomPool {
    /// Pool identifier.
    pub id: PoolId,
    /// Entries in registration order.
    pub entries: Vec<PoolEntry>,
    /// Sum of all entry weights (pre-calculated).
    pub total_weight: u64,
}

impl RoomPool {
    /// Creates an empty pool.
    #[must_use]
    pub fn new(id: impl Into<PoolId>) -> Self {
        Self {
            id: id.into(),
            entries: Vec::new(),
            total_weight: 0,
        }
    }

    /// Appends an entry. Zero weights are raised to one.
    pub fn push(&mut self, room: impl Into<RoomId>, weight: u32) {
        let weight = weight.max(1);
        self.entries.push(PoolEntry {
            room: room.into(),
            weight,
        });
        self.total_weight += u64::from(weight);
    }

    /// Draws an entry by weight. `None` if the pool is empty.
    ///
    /// Draws `r` uniformly from `[0, total_weight)` and returns the first
    /// entry whose cumulative weight exceeds it.
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&RoomId> {
        weighted_pick(
            self.entries.iter().map(|e| (&e.room, e.weight)),
            self.total_weight,
            rng,
        )
    }
}

/// Standard cumulative-weight selection; ties go to the earlier entry.
fn weighted_pick<'a, T, I, R>(entries: I, total_weight: u64, rng: &mut R) -> Option<&'a T>
where
    T: 'a,
    I: IntoIterator<Item = (&'a T, u32)>,
    R: Rng + ?Sized,
{
    if total_weight == 0 {
        return None;
    }
    let mut roll = rng.gen_range(0..total_weight);
    for (item, weight) in entries {
        let weight = u64::from(weight);
        if roll < weight {
            return Some(item);
        }
        roll -= weight;
    }
    None
}

/// A frozen view of the registry. Cheap to clone (shares the templates).
#[derive(Clone, Debug, Default)]
pub struct RegistryTables {
    /// Flat room set in registration order.
    rooms: Vec<Arc<RoomTemplate>>,
    /// Room ID -> index into `rooms`.
    room_index: HashMap<RoomId, usize>,
    /// Running total of flat-set weights.
    total_weight: u64,
    /// Pools by ID.
    pools: HashMap<PoolId, RoomPool>,
    /// Special-pool unlock rules.
    progression: ProgressionGate,
}

impl RegistryTables {
    /// Looks up a room.
    #[must_use]
    pub fn room(&self, id: &str) -> Option<&Arc<RoomTemplate>> {
        self.room_index.get(id).map(|&i| &self.rooms[i])
    }

    /// Looks up a pool.
    #[must_use]
    pub fn pool(&self, id: &str) -> Option<&RoomPool> {
        self.pools.get(id)
    }

    /// The special-pool unlock rules.
    #[must_use]
    pub fn progression(&self) -> &ProgressionGate {
        &self.progression
    }

    /// Number of registered rooms.
    #[must_use]
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Number of registered pools.
    #[must_use]
    pub fn pool_count(&self) -> usize {
        self.pools.len()
    }

    /// Sum of flat-set weights.
    #[must_use]
    pub fn total_weight(&self) -> u64 {
        self.total_weight
    }

    /// Draws a room from a pool by weight.
    ///
    /// Returns `None` (and logs) for an unknown or empty pool, or when the
    /// drawn entry names a room that was never registered.
    pub fn random_room<R: Rng + ?Sized>(
        &self,
        pool_id: &str,
        rng: &mut R,
    ) -> Option<Arc<RoomTemplate>> {
        let Some(pool) = self.pools.get(pool_id) else {
            tracing::warn!(pool = %pool_id, "unknown room pool");
            return None;
        };
        let Some(room_id) = pool.pick(rng) else {
            tracing::debug!(pool = %pool_id, "room pool is empty");
            return None;
        };
        let room = self.room(room_id).cloned();
        if room.is_none() {
            tracing::warn!(pool = %pool_id, room = %room_id, "pool names an unregistered room");
        }
        room
    }

    /// Draws a room from the flat room set by template weight.
    pub fn random_room_global<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Arc<RoomTemplate>> {
        weighted_pick(
            self.rooms.iter().map(|room| (room, room.weight)),
            self.total_weight,
            rng,
        )
        .cloned()
    }

    /// Draws from `pool_id`, or from the flat set when no pool is given.
    pub fn draw<R: Rng + ?Sized>(
        &self,
        pool_id: Option<&str>,
        rng: &mut R,
    ) -> Option<Arc<RoomTemplate>> {
        match pool_id {
            Some(id) => self.random_room(id, rng),
            None => self.random_room_global(rng),
        }
    }
}

/// Shared, load-once content registry.
///
/// Wrap in an `Arc` and hand a reference to every synthesizer.
#[derive(Debug, Default)]
pub struct ContentRegistry {
    tables: RwLock<Arc<RegistryTables>>,
}

impl ContentRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current frozen tables.
    ///
    /// Hold on to the snapshot for a whole generation step to avoid
    /// re-reading the lock per lookup.
    #[must_use]
    pub fn tables(&self) -> Arc<RegistryTables> {
        Arc::clone(&self.tables.read())
    }

    /// Registers (or replaces) a room in the flat set.
    ///
    /// The template's ID and weight are overwritten by the arguments.
    pub fn register_room(&self, id: impl Into<RoomId>, mut template: RoomTemplate, weight: u32) {
        let id = id.into();
        template.id.clone_from(&id);
        template.weight = weight.max(1);
        let added = u64::from(template.weight);

        let mut guard = self.tables.write();
        let tables = Arc::make_mut(&mut guard);
        if let Some(&index) = tables.room_index.get(&id) {
            let old = u64::from(tables.rooms[index].weight);
            tables.total_weight = tables.total_weight - old + added;
            tables.rooms[index] = Arc::new(template);
            tracing::debug!(room = %id, "replaced room template");
        } else {
            tables.room_index.insert(id, tables.rooms.len());
            tables.rooms.push(Arc::new(template));
            tables.total_weight += added;
        }
    }

    /// Adds weighted entries to a pool, creating it if needed.
    pub fn register_pool<I, S>(&self, pool_id: impl Into<PoolId>, entries: I)
    where
        I: IntoIterator<Item = (S, u32)>,
        S: Into<RoomId>,
    {
        let pool_id = pool_id.into();
        let mut guard = self.tables.write();
        let pool = Arc::make_mut(&mut guard)
            .pools
            .entry(pool_id.clone())
            .or_insert_with(|| RoomPool::new(pool_id));
        for (room, weight) in entries {
            pool.push(room, weight);
        }
    }

    /// Gates a special pool behind rooms placed and depth.
    pub fn register_special_pool(&self, pool_id: impl Into<PoolId>, min_rooms: u32, min_depth: u32) {
        let mut guard = self.tables.write();
        Arc::make_mut(&mut guard)
            .progression
            .register(pool_id, min_rooms, min_depth);
    }

    /// See [`RegistryTables::random_room`].
    pub fn random_room<R: Rng + ?Sized>(
        &self,
        pool_id: &str,
        rng: &mut R,
    ) -> Option<Arc<RoomTemplate>> {
        self.tables().random_room(pool_id, rng)
    }

    /// See [`RegistryTables::random_room_global`].
    pub fn random_room_global<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Arc<RoomTemplate>> {
        self.tables().random_room_global(rng)
    }
}
