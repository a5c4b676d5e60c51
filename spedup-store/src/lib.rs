//! spedup-store: persistence for upgradeable furnaces
//!
//! Keeps one row per furnace block in `furnace_data`, on an embedded SQLite
//! file or a MySQL server, and rebuilds hydrated furnaces (with their level
//! label placement) on load.

pub mod config;
pub mod db;
pub mod error;
pub mod geometry;
pub mod model;
pub mod store;
pub mod world;

pub use config::StorageConfig;
pub use db::{Dialect, Hydration, SchemaStatus, SkippedRow, WriteOutcome};
pub use error::{Result, StoreError};
pub use geometry::{resolve, Billboard, LabelDisplay, Vec3};
pub use model::{BlockLocation, CustomFurnace, Facing, FurnaceRecord, Material};
pub use store::FurnaceStore;
pub use world::{AnyWorld, KnownWorlds, WorldLookup};
