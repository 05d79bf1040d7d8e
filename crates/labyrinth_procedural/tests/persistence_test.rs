//! # Persistence Integration Test
//!
//! A controller survives a reload through its state store, and a damaged
//! snapshot costs only the damaged entries.

mod common;

use labyrinth_procedural::{
    dungeon_rng, AttunedKeyFilter, DungeonController, FileStateStore,
    MemoryStateStore, StateStore, SynthesizerSnapshot,
};
use labyrinth_shared::BlockPos;

/// Test: grow, drop the controller, restore it from disk, keep growing.
#[test]
fn test_controller_survives_reload() {
    let dir = std::env::temp_dir().join(format!("labyrinth-reload-{}", std::process::id()));
    let path = dir.join("dungeon.snap");
    let anchor = BlockPos::new(0, 64, 0);
    let registry = common::registry();
    let mut world = common::world();
    let mut rng = dungeon_rng(404);

    let before = {
        let mut controller = DungeonController::new(anchor, common::config(), FileStateStore::new(&path));
        controller.initialize(&registry, &mut rng, &mut world).unwrap();
        for _ in 0..6 {
            let door_pos = world.seals()[0].door_pos;
            let seal = world.take_seal(door_pos).unwrap();
            controller
                .activate_seal(&registry, &seal, None, &AttunedKeyFilter, &mut rng, &mut world)
                .unwrap();
        }
        controller.synthesizer().clone()
    };
    assert!(before.rooms_placed() > 0);

    let mut restored =
        DungeonController::restore(FileStateStore::new(&path), common::config(), anchor).unwrap();
    assert_eq!(restored.synthesizer(), &before);

    // The restored frontier matches the seals still in the world.
    assert_eq!(restored.synthesizer().open_door_count(), world.seals().len());
    let door_pos = world.seals()[0].door_pos;
    let seal = world.take_seal(door_pos).unwrap();
    restored
        .activate_seal(&registry, &seal, None, &AttunedKeyFilter, &mut rng, &mut world)
        .unwrap();
    assert!(!restored
        .synthesizer()
        .is_open(&seal.door_type, seal.door_facing, seal.door_pos));
    assert!(common::pairwise_disjoint(restored.synthesizer().collision_regions()));

    std::fs::remove_dir_all(&dir).unwrap();
}

/// Test: one mangled region in a stored snapshot drops just that region.
#[test]
fn test_damaged_snapshot_restores_best_effort() {
    let registry = common::registry();
    let mut world = common::world();
    let anchor = BlockPos::new(0, 64, 0);
    let mut controller = DungeonController::new(anchor, common::config(), MemoryStateStore::new());
    controller
        .initialize(&registry, &mut dungeon_rng(1), &mut world)
        .unwrap();

    let bytes = controller.store().load().unwrap().unwrap();
    let snapshot = SynthesizerSnapshot::decode(&bytes).unwrap();
    let mut value = serde_json::to_value(&snapshot).unwrap();
    value["collision_regions"]
        .as_array_mut()
        .unwrap()
        .push(serde_json::json!({"shape": "torus"}));
    value["open_doors"][0]["facing"] = serde_json::json!("upside_down");
    let damaged = lz4_flex::compress_prepend_size(&serde_json::to_vec(&value).unwrap());

    let restored =
        DungeonController::restore(MemoryStateStore::with_bytes(damaged), common::config(), anchor).unwrap();
    let synth = restored.synthesizer();
    assert_eq!(synth.collision_regions(), controller.synthesizer().collision_regions());
    assert_eq!(synth.open_door_count(), controller.synthesizer().open_door_count() - 1);
}

/// Test: an empty store starts a fresh dungeon.
#[test]
fn test_empty_store_starts_fresh() {
    let restored = DungeonController::restore(
        MemoryStateStore::new(),
        common::config(),
        BlockPos::new(1, 2, 3),
    )
    .unwrap();
    assert_eq!(restored.synthesizer().open_door_count(), 0);
    assert_eq!(restored.synthesizer().controller_pos(), BlockPos::new(1, 2, 3));
}
