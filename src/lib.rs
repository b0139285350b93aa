//! Songplay Warehouse
//!
//! Provisions a star-schema warehouse and loads it from event-log and
//! song-metadata bulk sources. The library is shared by the `create-tables`
//! and `etl` binaries and by the end-to-end tests.

pub mod config;
pub mod error;
pub mod loader;
pub mod pipeline;
pub mod schema;
pub mod warehouse;

pub use config::{Backend, CommitMode, WarehouseConfig};
pub use error::EtlError;
pub use loader::Loader;
pub use pipeline::{run_full, RunState, RunTracker, StageReport, StatementRunner};
pub use schema::SchemaManager;
pub use warehouse::{connect, Dialect, Warehouse};
