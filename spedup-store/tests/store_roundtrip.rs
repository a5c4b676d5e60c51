//! End-to-end behaviour of the furnace store on the embedded engine

use spedup_store::{
    BlockLocation, Facing, FurnaceRecord, FurnaceStore, Material, SchemaStatus, StorageConfig,
    WriteOutcome,
};
use tempfile::TempDir;

async fn open_store() -> (FurnaceStore, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let store = FurnaceStore::open(&StorageConfig::default(), dir.path())
        .await
        .unwrap();
    (store, dir)
}

fn spawn_location() -> BlockLocation {
    BlockLocation::new("world", 1, 64, 1)
}

#[tokio::test]
async fn add_then_get_all_round_trips() {
    let (store, _dir) = open_store().await;
    assert_eq!(store.schema_status(), &SchemaStatus::Verified);

    let records = [
        FurnaceRecord::new(Material::Furnace, 0, BlockLocation::new("world", -30, 12, 8), Facing::North),
        FurnaceRecord::new(Material::BlastFurnace, 7, BlockLocation::new("world_nether", 4, 90, -2), Facing::East),
        FurnaceRecord::new(Material::Smoker, 3, BlockLocation::new("world", i32::MAX, -64, i32::MIN), Facing::West),
    ];
    for record in &records {
        store.add(record).await.unwrap();
    }

    let hydration = store.get_all().await.unwrap();
    assert!(hydration.skipped.is_empty());
    assert_eq!(hydration.furnaces.len(), records.len());
    for record in &records {
        assert_eq!(&hydration.furnaces[&record.location].record(), record);
    }
    store.close().await;
}

#[tokio::test]
async fn south_facing_furnace_scenario() {
    let (store, _dir) = open_store().await;

    store
        .add(&FurnaceRecord::new(Material::Furnace, 2, spawn_location(), Facing::South))
        .await
        .unwrap();

    let hydration = store.get_all().await.unwrap();
    assert_eq!(hydration.furnaces.len(), 1);

    let furnace = &hydration.furnaces[&spawn_location()];
    assert_eq!(furnace.level, 2);
    assert_eq!(furnace.label.yaw, 0.0);
    assert!((furnace.label.position.x - 1.5).abs() < 1e-9);
    assert!((furnace.label.position.y - 64.3).abs() < 1e-9);
    assert!((furnace.label.position.z - 2.0).abs() < 1e-9);

    assert_eq!(
        store.remove(&spawn_location()).await.unwrap(),
        WriteOutcome::Applied { rows: 1 }
    );
    assert!(store.get_all().await.unwrap().furnaces.is_empty());
    store.close().await;
}

#[tokio::test]
async fn update_without_match_is_not_found() {
    let (store, _dir) = open_store().await;
    let existing = FurnaceRecord::new(Material::Smoker, 1, BlockLocation::new("world", 9, 9, 9), Facing::East);
    store.add(&existing).await.unwrap();

    let outcome = store
        .update(&FurnaceRecord::new(Material::Furnace, 5, spawn_location(), Facing::South))
        .await
        .unwrap();
    assert_eq!(outcome, WriteOutcome::NotFound);

    let hydration = store.get_all().await.unwrap();
    assert_eq!(hydration.furnaces.len(), 1);
    assert_eq!(hydration.furnaces[&existing.location].record(), existing);
    store.close().await;
}

#[tokio::test]
async fn update_changes_level_and_label() {
    let (store, _dir) = open_store().await;
    let mut record = FurnaceRecord::new(Material::Furnace, 1, spawn_location(), Facing::North);
    store.add(&record).await.unwrap();

    record.level = 5;
    assert!(store.update(&record).await.unwrap().is_applied());

    let hydration = store.get_all().await.unwrap();
    let furnace = &hydration.furnaces[&spawn_location()];
    assert_eq!(furnace.level, 5);
    assert_eq!(furnace.label.text, "Level 5");
    store.close().await;
}

#[tokio::test]
async fn remove_missing_location_is_not_found() {
    let (store, _dir) = open_store().await;
    assert_eq!(store.remove(&spawn_location()).await.unwrap(), WriteOutcome::NotFound);
    store.close().await;
}

#[tokio::test]
async fn reopening_keeps_rows_and_verifies() {
    let dir = tempfile::tempdir().unwrap();
    let config = StorageConfig::default();

    let store = FurnaceStore::open(&config, dir.path()).await.unwrap();
    store
        .add(&FurnaceRecord::new(Material::Furnace, 4, spawn_location(), Facing::West))
        .await
        .unwrap();
    store.close().await;

    let store = FurnaceStore::open(&config, dir.path()).await.unwrap();
    assert_eq!(store.schema_status(), &SchemaStatus::Verified);
    assert_eq!(store.get_all().await.unwrap().furnaces.len(), 1);
    store.close().await;
}

#[tokio::test]
async fn concurrent_adds_from_many_tasks() {
    let (store, _dir) = open_store().await;

    let handles: Vec<_> = (0..25)
        .map(|x| {
            let store = store.clone();
            tokio::spawn(async move {
                let record = FurnaceRecord::new(
                    Material::Furnace,
                    1,
                    BlockLocation::new("world", x, 64, 0),
                    Facing::South,
                );
                store.add(&record).await
            })
        })
        .collect();

    for handle in handles {
        handle.await.expect("task panicked").expect("add failed");
    }

    assert_eq!(store.get_all().await.unwrap().furnaces.len(), 25);
    store.close().await;
}
