//! Schema manager for the furnace table.
//!
//! `ensure_schema` creates the table when absent and rebuilds it when an older
//! layout is missing columns. Failures are logged and reported through
//! [`SchemaStatus`]; they never abort the host.

use std::collections::BTreeSet;

use serde::Serialize;
use sqlx::{Any, AnyPool, Executor, Row};
use tracing::{error, info};

use crate::db::pool::Dialect;
use crate::error::Result;

/// Table holding one row per furnace
pub const FURNACE_TABLE: &str = "furnace_data";

/// Columns the live table must have, in declaration order
pub const REQUIRED_COLUMNS: [&str; 8] = [
    "id",
    "type",
    "level",
    "loc_x",
    "loc_y",
    "loc_z",
    "loc_facing",
    "loc_world",
];

/// Outcome of the startup schema check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SchemaStatus {
    /// Table already had every required column
    Verified,
    /// Table was rebuilt; `added` lists the columns that were missing
    Migrated { added: Vec<String> },
    /// Schema setup failed; CRUD calls are likely to fail too
    Failed { reason: String },
}

impl SchemaStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, SchemaStatus::Verified | SchemaStatus::Migrated { .. })
    }
}

/// `CREATE TABLE` statement for the full column shape
fn table_sql(dialect: Dialect, table: &str, if_not_exists: bool) -> String {
    format!(
        "CREATE TABLE {}{} (\
            id INTEGER PRIMARY KEY {}, \
            type TEXT, \
            level INT, \
            loc_x INT, \
            loc_y INT, \
            loc_z INT, \
            loc_facing TEXT DEFAULT NULL, \
            loc_world TEXT\
        )",
        if if_not_exists { "IF NOT EXISTS " } else { "" },
        table,
        dialect.auto_increment()
    )
}

/// Ensure the furnace table exists and has every required column.
///
/// Idempotent. Errors are logged and folded into [`SchemaStatus::Failed`].
pub async fn ensure_schema(pool: &AnyPool, dialect: Dialect) -> SchemaStatus {
    match try_ensure_schema(pool, dialect).await {
        Ok(status) => status,
        Err(err) => {
            error!(table = FURNACE_TABLE, error = %err, "could not create or update tables");
            SchemaStatus::Failed {
                reason: err.to_string(),
            }
        }
    }
}

async fn try_ensure_schema(pool: &AnyPool, dialect: Dialect) -> Result<SchemaStatus> {
    sqlx::query(&table_sql(dialect, FURNACE_TABLE, true))
        .execute(pool)
        .await?;

    let live = live_columns(pool, dialect).await?;
    let missing = missing_columns(&live);

    if missing.is_empty() {
        info!(table = FURNACE_TABLE, "verified data table");
        return Ok(SchemaStatus::Verified);
    }

    migrate(pool, dialect, &live).await?;
    info!(table = FURNACE_TABLE, added = ?missing, "created new data table");

    Ok(SchemaStatus::Migrated { added: missing })
}

/// Column names of the furnace table, lower-cased
pub async fn live_columns<'e, E>(executor: E, dialect: Dialect) -> Result<BTreeSet<String>>
where
    E: Executor<'e, Database = Any>,
{
    let sql = match dialect {
        Dialect::Sqlite => format!("SELECT name FROM pragma_table_info('{FURNACE_TABLE}')"),
        Dialect::MySql => format!(
            "SELECT CAST(COLUMN_NAME AS CHAR) AS name \
             FROM information_schema.COLUMNS \
             WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = '{FURNACE_TABLE}'"
        ),
    };

    let rows = sqlx::query(&sql).fetch_all(executor).await?;
    rows.iter()
        .map(|row| {
            let name: String = row.try_get("name")?;
            Ok(name.to_lowercase())
        })
        .collect()
}

/// Required columns absent from `live`, in declaration order
fn missing_columns(live: &BTreeSet<String>) -> Vec<String> {
    REQUIRED_COLUMNS
        .iter()
        .filter(|column| !live.contains(**column))
        .map(|column| column.to_string())
        .collect()
}

/// Rebuild the table in the full shape, keeping every row.
///
/// Only columns present in both layouts are copied, by name. Runs in one
/// transaction: either the new table replaces the old one with all rows, or
/// nothing changes. MySQL commits DDL implicitly, so there the guarantee only
/// covers SQLite.
async fn migrate(pool: &AnyPool, dialect: Dialect, live: &BTreeSet<String>) -> Result<()> {
    let shadow = format!("{FURNACE_TABLE}_new");
    let shared: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|column| live.contains(*column))
        .collect();

    let mut tx = pool.begin().await?;

    // Left behind by an interrupted run on an engine without transactional DDL
    sqlx::query(&format!("DROP TABLE IF EXISTS {shadow}"))
        .execute(&mut *tx)
        .await?;

    sqlx::query(&table_sql(dialect, &shadow, false))
        .execute(&mut *tx)
        .await?;

    if !shared.is_empty() {
        let columns = shared.join(", ");
        let copied = sqlx::query(&format!(
            "INSERT INTO {shadow} ({columns}) SELECT {columns} FROM {FURNACE_TABLE}"
        ))
        .execute(&mut *tx)
        .await?;
        info!(rows = copied.rows_affected(), "copied furnace rows into new table");
    }

    sqlx::query(&format!("DROP TABLE {FURNACE_TABLE}"))
        .execute(&mut *tx)
        .await?;

    sqlx::query(&format!("ALTER TABLE {shadow} RENAME TO {FURNACE_TABLE}"))
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}
