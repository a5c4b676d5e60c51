//! Furnace repository
//!
//! Handles furnace CRUD with these patterns:
//! - add: single INSERT .. SELECT .. WHERE NOT EXISTS (no check-then-insert)
//! - update/remove: keyed on (x, y, z, world); zero matches is `NotFound`
//! - get_all: full scan, corrupt rows skipped and reported

use std::collections::HashMap;

use sqlx::any::AnyRow;
use sqlx::{AnyPool, Row};
use tracing::{debug, error, warn};

use crate::db::pool::Dialect;
use crate::db::schema::FURNACE_TABLE;
use crate::error::{Result, StoreError};
use crate::geometry;
use crate::model::{BlockLocation, CustomFurnace, Facing, FurnaceRecord, Material};
use crate::world::WorldLookup;

/// Facing given to legacy rows stored before `loc_facing` existed
pub const LEGACY_FACING: Facing = Facing::South;

/// Result of a write that may match no row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Applied { rows: u64 },
    NotFound,
}

impl WriteOutcome {
    fn from_rows(rows: u64) -> Self {
        if rows == 0 {
            WriteOutcome::NotFound
        } else {
            WriteOutcome::Applied { rows }
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, WriteOutcome::Applied { .. })
    }
}

/// A stored row that could not be hydrated
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SkippedRow {
    pub id: i64,
    pub reason: String,
}

/// Everything `get_all` could read back
#[derive(Debug, Clone, Default)]
pub struct Hydration {
    pub furnaces: HashMap<BlockLocation, CustomFurnace>,
    pub skipped: Vec<SkippedRow>,
}

/// Select-list entry for a text column.
///
/// MySQL reports `TEXT` columns as blobs, which the `Any` driver will not
/// decode into `String`, so they are cast to `CHAR` there.
fn text_column(dialect: Dialect, name: &str) -> String {
    match dialect {
        Dialect::Sqlite => name.to_string(),
        Dialect::MySql => format!("CAST({name} AS CHAR) AS {name}"),
    }
}

/// Furnace repository
pub struct FurnaceRepo<'a> {
    pool: &'a AnyPool,
    dialect: Dialect,
    worlds: &'a dyn WorldLookup,
}

impl<'a> FurnaceRepo<'a> {
    pub fn new(pool: &'a AnyPool, dialect: Dialect, worlds: &'a dyn WorldLookup) -> Self {
        Self { pool, dialect, worlds }
    }

    /// Store a new furnace.
    ///
    /// Fails with [`StoreError::Occupied`] when a furnace is already stored at
    /// the same block, whatever its facing.
    pub async fn add(&self, furnace: &FurnaceRecord) -> Result<()> {
        let location = &furnace.location;
        let result = sqlx::query(&format!(
            r#"
            INSERT INTO {FURNACE_TABLE} (type, level, loc_x, loc_y, loc_z, loc_facing, loc_world)
            SELECT ?, ?, ?, ?, ?, ?, ?
            FROM (SELECT 1 AS probe) AS candidate
            WHERE NOT EXISTS (
                SELECT 1 FROM {FURNACE_TABLE}
                WHERE loc_x = ? AND loc_y = ? AND loc_z = ? AND loc_world = ?
            )
            "#
        ))
        .bind(furnace.material.as_str())
        .bind(i64::from(furnace.level))
        .bind(location.x)
        .bind(location.y)
        .bind(location.z)
        .bind(furnace.facing.as_str())
        .bind(location.world.as_str())
        .bind(location.x)
        .bind(location.y)
        .bind(location.z)
        .bind(location.world.as_str())
        .execute(self.pool)
        .await
        .inspect_err(|err| error!(%location, error = %err, "could not store furnace"))?;

        if result.rows_affected() == 0 {
            warn!(%location, "furnace already stored at location");
            return Err(StoreError::Occupied {
                location: location.clone(),
            });
        }

        debug!(%location, level = furnace.level, "stored furnace");
        Ok(())
    }

    /// Set the stored level of the furnace at `furnace.location`.
    pub async fn update(&self, furnace: &FurnaceRecord) -> Result<WriteOutcome> {
        let location = &furnace.location;
        let result = sqlx::query(&format!(
            "UPDATE {FURNACE_TABLE} SET level = ? \
             WHERE loc_x = ? AND loc_y = ? AND loc_z = ? AND loc_world = ?"
        ))
        .bind(i64::from(furnace.level))
        .bind(location.x)
        .bind(location.y)
        .bind(location.z)
        .bind(location.world.as_str())
        .execute(self.pool)
        .await
        .inspect_err(|err| error!(%location, error = %err, "could not update furnace"))?;

        let outcome = WriteOutcome::from_rows(result.rows_affected());
        debug!(%location, level = furnace.level, ?outcome, "updated furnace");
        Ok(outcome)
    }

    /// Delete the furnace stored at `location`.
    pub async fn remove(&self, location: &BlockLocation) -> Result<WriteOutcome> {
        let result = sqlx::query(&format!(
            "DELETE FROM {FURNACE_TABLE} \
             WHERE loc_x = ? AND loc_y = ? AND loc_z = ? AND loc_world = ?"
        ))
        .bind(location.x)
        .bind(location.y)
        .bind(location.z)
        .bind(location.world.as_str())
        .execute(self.pool)
        .await
        .inspect_err(|err| error!(%location, error = %err, "could not remove furnace"))?;

        let outcome = WriteOutcome::from_rows(result.rows_affected());
        debug!(%location, ?outcome, "removed furnace");
        Ok(outcome)
    }

    /// Delete every stored furnace. Returns the number of rows removed.
    pub async fn clear_all(&self) -> Result<u64> {
        let result = sqlx::query(&format!("DELETE FROM {FURNACE_TABLE}"))
            .execute(self.pool)
            .await
            .inspect_err(|err| error!(error = %err, "could not clear furnaces"))?;

        debug!(rows = result.rows_affected(), "cleared furnaces");
        Ok(result.rows_affected())
    }

    /// Read and hydrate every stored furnace.
    ///
    /// Rows that cannot be decoded are logged and listed in
    /// [`Hydration::skipped`]; the rest of the scan continues.
    pub async fn get_all(&self) -> Result<Hydration> {
        let rows = sqlx::query(&format!(
            "SELECT id, {}, level, loc_x, loc_y, loc_z, {}, {} FROM {FURNACE_TABLE} ORDER BY id",
            text_column(self.dialect, "type"),
            text_column(self.dialect, "loc_facing"),
            text_column(self.dialect, "loc_world"),
        ))
        .fetch_all(self.pool)
        .await
        .inspect_err(|err| error!(error = %err, "could not load furnaces"))?;

        let mut hydration = Hydration::default();
        for row in &rows {
            let id: i64 = row.try_get("id")?;
            match self.hydrate(id, row) {
                Ok(furnace) => {
                    hydration.furnaces.insert(furnace.location.clone(), furnace);
                }
                Err(err) => {
                    warn!(row = id, error = %err, "skipping unreadable furnace row");
                    hydration.skipped.push(SkippedRow {
                        id,
                        reason: err.to_string(),
                    });
                }
            }
        }

        debug!(
            loaded = hydration.furnaces.len(),
            skipped = hydration.skipped.len(),
            "loaded furnaces"
        );
        Ok(hydration)
    }

    fn hydrate(&self, id: i64, row: &AnyRow) -> Result<CustomFurnace> {
        let column = |name: &str, err: sqlx::Error| StoreError::decode(id, format!("{name}: {err}"));

        let world: Option<String> = row.try_get("loc_world").map_err(|e| column("loc_world", e))?;
        let world = world.ok_or_else(|| StoreError::decode(id, "loc_world is NULL"))?;

        let coordinate = |name: &str| -> Result<i32> {
            let value: i64 = row.try_get(name).map_err(|e| column(name, e))?;
            i32::try_from(value).map_err(|_| StoreError::decode(id, format!("{name} out of range: {value}")))
        };
        let location = BlockLocation::new(world, coordinate("loc_x")?, coordinate("loc_y")?, coordinate("loc_z")?);

        let level: i64 = row.try_get("level").map_err(|e| column("level", e))?;
        let level = u32::try_from(level)
            .map_err(|_| StoreError::decode(id, format!("level out of range: {level}")))?;

        let material: Option<String> = row.try_get("type").map_err(|e| column("type", e))?;
        let material = material.ok_or_else(|| StoreError::decode(id, "type is NULL"))?;
        let material = Material::from_stored(&material).map_err(|e| StoreError::decode(id, e.to_string()))?;

        let facing: Option<String> = row.try_get("loc_facing").map_err(|e| column("loc_facing", e))?;
        let facing = match facing {
            Some(text) => text
                .parse::<Facing>()
                .map_err(|e| StoreError::decode(id, e.to_string()))?,
            None => {
                debug!(row = id, "legacy row without facing");
                LEGACY_FACING
            }
        };

        let mut furnace = geometry::resolve(location, level, material, facing);
        furnace.world_loaded = self.worlds.is_loaded(&furnace.location.world);
        if !furnace.world_loaded {
            debug!(row = id, world = %furnace.location.world, "furnace in unknown world");
        }

        Ok(furnace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageConfig;
    use crate::db::pool::{create_pool, Dialect};
    use crate::db::schema::ensure_schema;
    use crate::world::{AnyWorld, KnownWorlds};

    async fn setup(dir: &tempfile::TempDir) -> AnyPool {
        let pool = create_pool(&StorageConfig::default(), dir.path()).await.unwrap();
        assert!(ensure_schema(&pool, Dialect::Sqlite).await.is_healthy());
        pool
    }

    fn furnace(level: u32, facing: Facing) -> FurnaceRecord {
        FurnaceRecord::new(Material::Furnace, level, BlockLocation::new("world", 1, 64, 1), facing)
    }

    #[tokio::test]
    async fn add_rejects_occupied_location() {
        let dir = tempfile::tempdir().unwrap();
        let pool = setup(&dir).await;
        let repo = FurnaceRepo::new(&pool, Dialect::Sqlite, &AnyWorld);

        repo.add(&furnace(1, Facing::North)).await.unwrap();
        let err = repo.add(&furnace(3, Facing::East)).await.unwrap_err();
        assert!(matches!(err, StoreError::Occupied { .. }));

        let hydration = repo.get_all().await.unwrap();
        assert_eq!(hydration.furnaces.len(), 1);
        pool.close().await;
    }

    #[tokio::test]
    async fn update_ignores_facing() {
        let dir = tempfile::tempdir().unwrap();
        let pool = setup(&dir).await;
        let repo = FurnaceRepo::new(&pool, Dialect::Sqlite, &AnyWorld);

        repo.add(&furnace(1, Facing::North)).await.unwrap();
        let outcome = repo.update(&furnace(4, Facing::West)).await.unwrap();
        assert_eq!(outcome, WriteOutcome::Applied { rows: 1 });

        let hydration = repo.get_all().await.unwrap();
        let stored = &hydration.furnaces[&BlockLocation::new("world", 1, 64, 1)];
        assert_eq!(stored.level, 4);
        assert_eq!(stored.facing, Facing::North);
        pool.close().await;
    }

    #[tokio::test]
    async fn corrupt_rows_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let pool = setup(&dir).await;
        let repo = FurnaceRepo::new(&pool, Dialect::Sqlite, &AnyWorld);

        repo.add(&furnace(2, Facing::South)).await.unwrap();
        sqlx::query(
            "INSERT INTO furnace_data (type, level, loc_x, loc_y, loc_z, loc_facing, loc_world) \
             VALUES ('FURNACE', 1, 5, 5, 5, 'north', 'world'), \
                    ('blast furnace', 1, 6, 6, 6, 'EAST', 'world'), \
                    ('SMOKER', -3, 7, 7, 7, 'EAST', 'world')",
        )
        .execute(&pool)
        .await
        .unwrap();

        let hydration = repo.get_all().await.unwrap();
        assert_eq!(hydration.furnaces.len(), 1);
        assert_eq!(hydration.skipped.len(), 3);
        assert!(hydration.skipped[0].reason.contains("Unknown facing 'north'"));
        assert!(hydration.skipped[1].reason.contains("Unknown material 'BLAST FURNACE'"));
        assert!(hydration.skipped[2].reason.contains("level out of range"));
        pool.close().await;
    }

    #[tokio::test]
    async fn lowercase_material_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let pool = setup(&dir).await;
        let repo = FurnaceRepo::new(&pool, Dialect::Sqlite, &AnyWorld);

        sqlx::query(
            "INSERT INTO furnace_data (type, level, loc_x, loc_y, loc_z, loc_facing, loc_world) \
             VALUES ('blast_furnace', 0, 0, 70, 0, 'WEST', 'world')",
        )
        .execute(&pool)
        .await
        .unwrap();

        let hydration = repo.get_all().await.unwrap();
        let stored = &hydration.furnaces[&BlockLocation::new("world", 0, 70, 0)];
        assert_eq!(stored.material, Material::BlastFurnace);
        pool.close().await;
    }

    #[tokio::test]
    async fn unnamed_material_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let pool = setup(&dir).await;
        let repo = FurnaceRepo::new(&pool, Dialect::Sqlite, &AnyWorld);

        sqlx::query(
            "INSERT INTO furnace_data (type, level, loc_x, loc_y, loc_z, loc_facing, loc_world) \
             VALUES ('CAMPFIRE', 1, 0, 0, 0, 'NORTH', 'world')",
        )
        .execute(&pool)
        .await
        .unwrap();

        let hydration = repo.get_all().await.unwrap();
        assert!(hydration.skipped.is_empty());
        let stored = &hydration.furnaces[&BlockLocation::new("world", 0, 0, 0)];
        assert_eq!(stored.material, Material::Other("CAMPFIRE".to_string()));

        repo.clear_all().await.unwrap();
        repo.add(&stored.record()).await.unwrap();
        let hydration = repo.get_all().await.unwrap();
        assert_eq!(hydration.furnaces[&stored.location].record(), stored.record());
        pool.close().await;
    }

    #[test]
    fn text_columns_are_cast_on_mysql() {
        assert_eq!(text_column(Dialect::Sqlite, "loc_world"), "loc_world");
        assert_eq!(
            text_column(Dialect::MySql, "loc_world"),
            "CAST(loc_world AS CHAR) AS loc_world"
        );
    }

    #[tokio::test]
    async fn unknown_world_is_flagged() {
        let dir = tempfile::tempdir().unwrap();
        let pool = setup(&dir).await;
        let worlds = KnownWorlds::new(["world"]);
        let repo = FurnaceRepo::new(&pool, Dialect::Sqlite, &worlds);

        repo.add(&furnace(1, Facing::South)).await.unwrap();
        let mut elsewhere = furnace(1, Facing::South);
        elsewhere.location.world = "world_the_end".to_string();
        repo.add(&elsewhere).await.unwrap();

        let hydration = repo.get_all().await.unwrap();
        assert!(hydration.furnaces[&BlockLocation::new("world", 1, 64, 1)].world_loaded);
        assert!(!hydration.furnaces[&elsewhere.location].world_loaded);
        pool.close().await;
    }

    #[tokio::test]
    async fn clear_all_reports_rows() {
        let dir = tempfile::tempdir().unwrap();
        let pool = setup(&dir).await;
        let repo = FurnaceRepo::new(&pool, Dialect::Sqlite, &AnyWorld);

        for x in 0..3 {
            let mut record = furnace(1, Facing::East);
            record.location.x = x;
            repo.add(&record).await.unwrap();
        }

        assert_eq!(repo.clear_all().await.unwrap(), 3);
        assert_eq!(repo.clear_all().await.unwrap(), 0);
        assert!(repo.get_all().await.unwrap().furnaces.is_empty());
        pool.close().await;
    }

    #[tokio::test]
    async fn missing_table_is_a_database_error() {
        let dir = tempfile::tempdir().unwrap();
        let pool = create_pool(&StorageConfig::default(), dir.path()).await.unwrap();
        let repo = FurnaceRepo::new(&pool, Dialect::Sqlite, &AnyWorld);

        let err = repo.get_all().await.unwrap_err();
        assert!(matches!(err, StoreError::Database { .. }));
        pool.close().await;
    }
}
