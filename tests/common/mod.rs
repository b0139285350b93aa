//! Common test infrastructure
//!
//! End-to-end tests build their bulk sources in a temporary directory and
//! load them into a SQLite warehouse. Tests should only import from this
//! module, not from internal submodules.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::{fresh_warehouse, next_song, SourceFixture, ARTIST_1_NAME, TS_1};
//!
//! #[tokio::test]
//! async fn test_load() {
//!     let fixture = SourceFixture::new();
//!     fixture.add_events("events.json", &[next_song(8, ARTIST_1_NAME, "Title", TS_1)]);
//!     let mut warehouse = fresh_warehouse().await;
//!     // ...
//! }
//! ```

#![allow(dead_code)]

mod constants;
mod fixtures;

// Public API - this is what tests import
pub use constants::*;
#[allow(unused_imports)]
pub use fixtures::*;
