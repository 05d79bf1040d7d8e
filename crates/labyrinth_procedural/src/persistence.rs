//! # Synthesizer Persistence
//!
//! A snapshot of one synthesizer is taken after every state-changing
//! operation and written through a [`StateStore`].
//!
//! ## Format
//!
//! JSON, LZ4-compressed with the uncompressed size prepended:
//!
//! ```text
//! {
//!   "version": 1,
//!   "controller_pos": {"x": 0, "y": 64, "z": 0},
//!   "rooms_placed": 12,
//!   "open_doors": [{"door_type": "corridor", "facing": "north", "position": {..}}, ..],
//!   "collision_regions": [{"shape": "cuboid", "min": {..}, "max": {..}}, ..],
//!   "special_pool_buffer": ["labyrinth:vaults"],
//!   "cooldown_since_placed": {"labyrinth:bosses": 3}
//! }
//! ```
//!
//! ## Corruption
//!
//! The blob must decompress and parse, and the header (`controller_pos`,
//! `rooms_placed`) must be intact. Past that, every list entry is parsed on
//! its own and a bad entry is dropped with a warning, so one mangled region
//! costs one region, not the dungeon.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use labyrinth_shared::{Area, BlockPos, Direction};
use lz4_flex::{compress_prepend_size, decompress_size_prepended};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{DungeonError, DungeonResult};
use crate::synthesizer::DungeonSynthesizer;
use crate::template::{DoorType, PoolId};

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// One frontier door, flattened for storage.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenDoorEntry {
    /// Door type tag.
    pub door_type: DoorType,
    /// World facing.
    pub facing: Direction,
    /// World position.
    pub position: BlockPos,
}

/// Point-in-time copy of a synthesizer's state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthesizerSnapshot {
    /// Format version.
    pub version: u32,
    /// Owning controller.
    pub controller_pos: BlockPos,
    /// Rooms grown so far.
    pub rooms_placed: u32,
    /// Growth frontier.
    pub open_doors: Vec<OpenDoorEntry>,
    /// Committed regions.
    pub collision_regions: Vec<Area>,
    /// Unlocked special pools.
    pub special_pool_buffer: Vec<PoolId>,
    /// Resting special pools.
    pub cooldown_since_placed: BTreeMap<PoolId, u32>,
}

impl SynthesizerSnapshot {
    /// Copies the state of a synthesizer.
    #[must_use]
    pub fn capture(synth: &DungeonSynthesizer) -> Self {
        let open_doors = synth
            .open_doors
            .iter()
            .flat_map(|(door_type, by_facing)| {
                by_facing.iter().flat_map(move |(facing, positions)| {
                    positions.iter().map(move |position| OpenDoorEntry {
                        door_type: door_type.clone(),
                        facing: *facing,
                        position: *position,
                    })
                })
            })
            .collect();

        Self {
            version: SNAPSHOT_VERSION,
            controller_pos: synth.controller_pos,
            rooms_placed: synth.rooms_placed,
            open_doors,
            collision_regions: synth.collision_regions.clone(),
            special_pool_buffer: synth.special_pool_buffer.clone(),
            cooldown_since_placed: synth.cooldown_since_placed.clone(),
        }
    }

    /// Rebuilds a synthesizer from this snapshot.
    #[must_use]
    pub fn restore(self) -> DungeonSynthesizer {
        let mut synth = DungeonSynthesizer::new(self.controller_pos);
        synth.rooms_placed = self.rooms_placed;
        for entry in self.open_doors {
            synth
                .open_doors
                .entry(entry.door_type)
                .or_default()
                .entry(entry.facing)
                .or_default()
                .push(entry.position);
        }
        synth.collision_regions = self.collision_regions;
        synth.special_pool_buffer = self.special_pool_buffer;
        synth.cooldown_since_placed = self.cooldown_since_placed;
        synth
    }

    /// Serializes and compresses.
    ///
    /// # Errors
    ///
    /// Returns `Encode` if serialization fails.
    pub fn encode(&self) -> DungeonResult<Vec<u8>> {
        let json = serde_json::to_vec(self)?;
        Ok(compress_prepend_size(&json))
    }

    /// Decompresses and parses, dropping unparseable entries.
    ///
    /// # Errors
    ///
    /// Returns `CorruptSnapshot` if the blob does not decompress, is not a
    /// JSON object, or has a damaged header.
    pub fn decode(bytes: &[u8]) -> DungeonResult<Self> {
        let json = decompress_size_prepended(bytes)
            .map_err(|e| DungeonError::CorruptSnapshot(e.to_string()))?;
        let value: Value = serde_json::from_slice(&json)
            .map_err(|e| DungeonError::CorruptSnapshot(e.to_string()))?;
        let Value::Object(root) = value else {
            return Err(DungeonError::CorruptSnapshot("root is not an object".into()));
        };

        let version = root
            .get("version")
            .and_then(Value::as_u64)
            .and_then(|v| u32::try_from(v).ok())
            .unwrap_or(SNAPSHOT_VERSION);
        if version > SNAPSHOT_VERSION {
            tracing::warn!(version, "snapshot is newer than this build, reading best-effort");
        }

        let controller_pos = root
            .get("controller_pos")
            .cloned()
            .and_then(|v| serde_json::from_value(v).ok())
            .ok_or_else(|| DungeonError::CorruptSnapshot("bad controller_pos".into()))?;
        let rooms_placed = root
            .get("rooms_placed")
            .and_then(Value::as_u64)
            .and_then(|v| u32::try_from(v).ok())
            .ok_or_else(|| DungeonError::CorruptSnapshot("bad rooms_placed".into()))?;

        Ok(Self {
            version,
            controller_pos,
            rooms_placed,
            open_doors: parse_list(root.get("open_doors"), "open_doors"),
            collision_regions: parse_list(root.get("collision_regions"), "collision_regions"),
            special_pool_buffer: parse_list(root.get("special_pool_buffer"), "special_pool_buffer"),
            cooldown_since_placed: parse_cooldowns(root.get("cooldown_since_placed")),
        })
    }
}

/// Parses each element of a JSON array on its own, dropping failures.
fn parse_list<T: DeserializeOwned>(value: Option<&Value>, field: &str) -> Vec<T> {
    let Some(value) = value else {
        tracing::warn!(field, "snapshot field missing");
        return Vec::new();
    };
    let Some(items) = value.as_array() else {
        tracing::warn!(field, "snapshot field is not a list, dropped");
        return Vec::new();
    };
    items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value(item.clone()) {
            Ok(parsed) => Some(parsed),
            Err(error) => {
                tracing::warn!(field, index, %error, "dropped corrupt snapshot entry");
                None
            }
        })
        .collect()
}

fn parse_cooldowns(value: Option<&Value>) -> BTreeMap<PoolId, u32> {
    let Some(map) = value.and_then(Value::as_object) else {
        tracing::warn!(field = "cooldown_since_placed", "snapshot field missing or not a map");
        return BTreeMap::new();
    };
    map.iter()
        .filter_map(|(pool, ticks)| {
            let ticks = ticks.as_u64().and_then(|t| u32::try_from(t).ok());
            if ticks.is_none() {
                tracing::warn!(pool = %pool, "dropped corrupt cooldown entry");
            }
            ticks.map(|t| (pool.clone(), t))
        })
        .collect()
}

/// Durable storage for one synthesizer's snapshots.
pub trait StateStore {
    /// Replaces the stored snapshot.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the write fails.
    fn save(&mut self, bytes: &[u8]) -> DungeonResult<()>;

    /// Reads the stored snapshot, `None` if nothing was saved yet.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the read fails.
    fn load(&self) -> DungeonResult<Option<Vec<u8>>>;
}

/// Stores snapshots in a single file, replaced atomically.
#[derive(Clone, Debug)]
pub struct FileStateStore {
    path: PathBuf,
}

impl FileStateStore {
    /// Creates a store backed by `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Snapshot file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StateStore for FileStateStore {
    fn save(&mut self, bytes: &[u8]) -> DungeonResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        // Write beside the target, then rename over it.
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, bytes)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn load(&self) -> DungeonResult<Option<Vec<u8>>> {
        match std::fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Keeps the last snapshot in memory.
#[derive(Clone, Debug, Default)]
pub struct MemoryStateStore {
    bytes: Option<Vec<u8>>,
    saves: usize,
}

impl MemoryStateStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store already holding `bytes`.
    #[must_use]
    pub fn with_bytes(bytes: Vec<u8>) -> Self {
        Self {
            bytes: Some(bytes),
            saves: 0,
        }
    }

    /// Number of saves so far.
    #[must_use]
    pub fn save_count(&self) -> usize {
        self.saves
    }
}

impl StateStore for MemoryStateStore {
    fn save(&mut self, bytes: &[u8]) -> DungeonResult<()> {
        self.bytes = Some(bytes.to_vec());
        self.saves += 1;
        Ok(())
    }

    fn load(&self) -> DungeonResult<Option<Vec<u8>>> {
        Ok(self.bytes.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> DungeonSynthesizer {
        let mut synth = DungeonSynthesizer::new(BlockPos::new(0, 64, 0));
        synth.rooms_placed = 3;
        synth
            .open_doors
            .entry("corridor".into())
            .or_default()
            .entry(Direction::North)
            .or_default()
            .push(BlockPos::new(0, 65, -3));
        synth
            .collision_regions
            .push(Area::cuboid(BlockPos::new(-2, 64, -2), BlockPos::new(2, 68, 2)));
        synth.special_pool_buffer.push("test:vault".into());
        synth.cooldown_since_placed.insert("test:boss".into(), 2);
        synth
    }

    fn compress(value: &Value) -> Vec<u8> {
        compress_prepend_size(&serde_json::to_vec(value).unwrap())
    }

    #[test]
    fn test_snapshot_restores_state() {
        let synth = sample();
        let bytes = SynthesizerSnapshot::capture(&synth).encode().unwrap();
        let restored = SynthesizerSnapshot::decode(&bytes).unwrap().restore();
        assert_eq!(restored, synth);
    }

    #[test]
    fn test_corrupt_entries_are_dropped() {
        let bytes = compress(&json!({
            "version": 1,
            "controller_pos": {"x": 0, "y": 64, "z": 0},
            "rooms_placed": 7,
            "open_doors": [
                {"door_type": "corridor", "facing": "north", "position": {"x": 0, "y": 65, "z": -3}},
                {"door_type": "corridor", "facing": "sideways", "position": {"x": 1, "y": 1, "z": 1}}
            ],
            "collision_regions": [
                {"shape": "cuboid", "min": {"x": 0, "y": 0, "z": 0}, "max": {"x": 1, "y": 1, "z": 1}},
                {"shape": "blob"},
                42
            ],
            "special_pool_buffer": ["test:vault", 5],
            "cooldown_since_placed": {"test:boss": 2, "test:bad": "x"}
        }));

        let snapshot = SynthesizerSnapshot::decode(&bytes).unwrap();
        assert_eq!(snapshot.rooms_placed, 7);
        assert_eq!(snapshot.open_doors.len(), 1);
        assert_eq!(snapshot.collision_regions.len(), 1);
        assert_eq!(snapshot.special_pool_buffer, vec!["test:vault"]);
        assert_eq!(snapshot.cooldown_since_placed.len(), 1);
    }

    #[test]
    fn test_missing_lists_are_empty() {
        let bytes = compress(&json!({
            "controller_pos": {"x": 1, "y": 2, "z": 3},
            "rooms_placed": 0,
            "collision_regions": "nope"
        }));
        let snapshot = SynthesizerSnapshot::decode(&bytes).unwrap();
        assert_eq!(snapshot.controller_pos, BlockPos::new(1, 2, 3));
        assert!(snapshot.open_doors.is_empty());
        assert!(snapshot.collision_regions.is_empty());
    }

    #[test]
    fn test_unreadable_blobs_are_errors() {
        assert!(matches!(
            SynthesizerSnapshot::decode(&[5, 0, 0, 0, 0xFF, 0xFF]),
            Err(DungeonError::CorruptSnapshot(_))
        ));
        assert!(matches!(
            SynthesizerSnapshot::decode(&compress(&json!([1, 2, 3]))),
            Err(DungeonError::CorruptSnapshot(_))
        ));
        assert!(matches!(
            SynthesizerSnapshot::decode(&compress(&json!({"rooms_placed": 1}))),
            Err(DungeonError::CorruptSnapshot(_))
        ));
    }

    #[test]
    fn test_file_store() {
        let dir = std::env::temp_dir().join(format!("labyrinth-store-{}", std::process::id()));
        let mut store = FileStateStore::new(dir.join("dungeon.snap"));
        assert_eq!(store.load().unwrap(), None);
        store.save(b"first").unwrap();
        store.save(b"second").unwrap();
        assert_eq!(store.load().unwrap(), Some(b"second".to_vec()));
        assert!(!store.path().with_extension("tmp").exists());
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_memory_store() {
        let mut store = MemoryStateStore::new();
        assert_eq!(store.load().unwrap(), None);
        store.save(b"abc").unwrap();
        assert_eq!(store.save_count(), 1);
        assert_eq!(store.load().unwrap(), Some(b"abc".to_vec()));
    }
}
