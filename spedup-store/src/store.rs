//! Storage handle shared by the host
//!
//! `FurnaceStore` owns the pool, the dialect, the schema status and the world
//! lookup. It is only handed out once the schema check has finished, so CRUD
//! calls never overlap a migration.

use std::path::Path;
use std::sync::Arc;

use sqlx::AnyPool;
use tracing::{info, warn};

use crate::config::StorageConfig;
use crate::db::{create_pool, ensure_schema, Dialect, FurnaceRepo, Hydration, SchemaStatus, WriteOutcome};
use crate::error::Result;
use crate::model::{BlockLocation, FurnaceRecord};
use crate::world::{AnyWorld, WorldLookup};

#[derive(Clone)]
pub struct FurnaceStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    pool: AnyPool,
    dialect: Dialect,
    schema: SchemaStatus,
    worlds: Box<dyn WorldLookup>,
}

impl FurnaceStore {
    /// Open the store, treating every world as loaded.
    pub async fn open(config: &StorageConfig, data_dir: &Path) -> Result<Self> {
        Self::open_with(config, data_dir, AnyWorld).await
    }

    /// Open the pool and run the schema check.
    ///
    /// Pool errors are returned (fatal to startup). Schema errors are not: they
    /// are logged and visible through [`FurnaceStore::schema_status`].
    pub async fn open_with(
        config: &StorageConfig,
        data_dir: &Path,
        worlds: impl WorldLookup + 'static,
    ) -> Result<Self> {
        let dialect = config.dialect();
        let pool = create_pool(config, data_dir).await?;
        let schema = ensure_schema(&pool, dialect).await;

        if schema.is_healthy() {
            info!(dialect = dialect.name(), ?schema, "furnace store ready");
        } else {
            warn!(dialect = dialect.name(), ?schema, "furnace store opened with unhealthy schema");
        }

        Ok(Self {
            inner: Arc::new(StoreInner {
                pool,
                dialect,
                schema,
                worlds: Box::new(worlds),
            }),
        })
    }

    pub fn dialect(&self) -> Dialect {
        self.inner.dialect
    }

    /// Outcome of the startup schema check
    pub fn schema_status(&self) -> &SchemaStatus {
        &self.inner.schema
    }

    pub fn pool(&self) -> &AnyPool {
        &self.inner.pool
    }

    pub fn furnaces(&self) -> FurnaceRepo<'_> {
        FurnaceRepo::new(&self.inner.pool, self.inner.dialect, self.inner.worlds.as_ref())
    }

    pub async fn add(&self, furnace: &FurnaceRecord) -> Result<()> {
        self.furnaces().add(furnace).await
    }

    pub async fn update(&self, furnace: &FurnaceRecord) -> Result<WriteOutcome> {
        self.furnaces().update(furnace).await
    }

    pub async fn remove(&self, location: &BlockLocation) -> Result<WriteOutcome> {
        self.furnaces().remove(location).await
    }

    pub async fn clear_all(&self) -> Result<u64> {
        self.furnaces().clear_all().await
    }

    pub async fn get_all(&self) -> Result<Hydration> {
        self.furnaces().get_all().await
    }

    /// Close the pool, waiting for checked-out connections to come back.
    pub async fn close(&self) {
        self.inner.pool.close().await;
        info!("furnace store closed");
    }
}
