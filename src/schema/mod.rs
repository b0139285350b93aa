//! Star-schema declarations and the manager that (re)creates them.

pub mod catalog;
mod manager;
pub mod table;

pub use manager::SchemaManager;
pub use table::{Column, SqlType, Table, TableRole};
