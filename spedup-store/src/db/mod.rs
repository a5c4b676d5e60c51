//! Database layer - connection pool, schema manager and furnace repository
//!
//! # Design Principles
//!
//! - One pool per store, no Arc<Mutex<Connection>>
//! - Same statement shape for SQLite and MySQL; only DDL and metadata differ
//! - Schema migration runs in a single transaction

pub mod pool;
pub mod repo;
pub mod schema;

pub use pool::{create_pool, Dialect};
pub use repo::{FurnaceRepo, Hydration, SkippedRow, WriteOutcome};
pub use schema::{ensure_schema, SchemaStatus, FURNACE_TABLE, REQUIRED_COLUMNS};
