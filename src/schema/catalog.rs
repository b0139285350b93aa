//! Table declarations for the songplay star schema.
//!
//! Two staging tables mirror the raw JSON sources field by field. The fact
//! table and the four dimensions are populated from staging by the loader's
//! transform statements. References from the fact table to the dimensions
//! are not enforced.

use super::table::{Column, SqlType, Table, TableRole};
use crate::warehouse_column;

// =============================================================================
// Staging Tables
// =============================================================================

/// Raw event-log records, one row per log line.
pub const STAGING_EVENTS: Table = Table {
    name: "staging_events",
    role: TableRole::Staging,
    columns: &[
        warehouse_column!("artist", SqlType::Varchar),
        warehouse_column!("auth", SqlType::Varchar),
        warehouse_column!("firstName", SqlType::Varchar),
        warehouse_column!("gender", SqlType::Varchar),
        warehouse_column!("itemInSession", SqlType::Int),
        warehouse_column!("lastName", SqlType::Varchar),
        warehouse_column!("length", SqlType::Varchar),
        warehouse_column!("level", SqlType::Varchar),
        warehouse_column!("location", SqlType::Varchar),
        warehouse_column!("method", SqlType::Varchar),
        warehouse_column!("page", SqlType::Varchar),
        warehouse_column!("registration", SqlType::Varchar),
        warehouse_column!("sessionId", SqlType::Int),
        warehouse_column!("song", SqlType::Varchar),
        warehouse_column!("status", SqlType::Int),
        warehouse_column!("ts", SqlType::BigInt), // epoch milliseconds
        warehouse_column!("userAgent", SqlType::Varchar),
        warehouse_column!("userId", SqlType::Int),
    ],
};

/// Raw song-metadata records, one row per song file entry.
pub const STAGING_SONGS: Table = Table {
    name: "staging_songs",
    role: TableRole::Staging,
    columns: &[
        warehouse_column!("num_songs", SqlType::Int),
        warehouse_column!("artist_id", SqlType::Varchar),
        warehouse_column!("artist_latitude", SqlType::DoublePrecision),
        warehouse_column!("artist_longitude", SqlType::DoublePrecision),
        warehouse_column!("artist_location", SqlType::Varchar),
        warehouse_column!("artist_name", SqlType::Varchar),
        warehouse_column!("song_id", SqlType::Varchar),
        warehouse_column!("title", SqlType::Varchar),
        warehouse_column!("duration", SqlType::DoublePrecision),
        warehouse_column!("year", SqlType::Int),
    ],
};

// =============================================================================
// Fact Table
// =============================================================================

pub const SONGPLAYS_FACT: Table = Table {
    name: "songplays_fact",
    role: TableRole::Fact,
    columns: &[
        warehouse_column!(
            "songplay_id",
            SqlType::Int,
            is_primary_key = true,
            is_identity = true
        ),
        warehouse_column!("ts", SqlType::BigInt, non_null = true),
        warehouse_column!("user_id", SqlType::Int, non_null = true),
        warehouse_column!("level", SqlType::Varchar),
        warehouse_column!("song_id", SqlType::Varchar),
        warehouse_column!("artist_id", SqlType::Varchar),
        warehouse_column!("session_id", SqlType::Int),
        warehouse_column!("location", SqlType::Varchar),
        warehouse_column!("user_agent", SqlType::Varchar),
    ],
};

// =============================================================================
// Dimension Tables
// =============================================================================

pub const USERS_DIM: Table = Table {
    name: "users_dim",
    role: TableRole::Dimension,
    columns: &[
        warehouse_column!("user_id", SqlType::Int, is_primary_key = true),
        warehouse_column!("first_name", SqlType::Varchar),
        warehouse_column!("last_name", SqlType::Varchar),
        warehouse_column!("gender", SqlType::Char),
        warehouse_column!("level", SqlType::Varchar),
    ],
};

pub const SONGS_DIM: Table = Table {
    name: "songs_dim",
    role: TableRole::Dimension,
    columns: &[
        warehouse_column!("song_id", SqlType::Varchar, is_primary_key = true, non_null = true),
        warehouse_column!("title", SqlType::Varchar, non_null = true),
        warehouse_column!("artist_id", SqlType::Varchar),
        warehouse_column!("year", SqlType::Int),
        warehouse_column!("duration", SqlType::DoublePrecision, non_null = true),
    ],
};

pub const ARTISTS_DIM: Table = Table {
    name: "artists_dim",
    role: TableRole::Dimension,
    columns: &[
        warehouse_column!("artist_id", SqlType::Varchar, is_primary_key = true, non_null = true),
        warehouse_column!("name", SqlType::Varchar, non_null = true),
        warehouse_column!("location", SqlType::Varchar),
        warehouse_column!("latitude", SqlType::DoublePrecision),
        warehouse_column!("longitude", SqlType::DoublePrecision),
    ],
};

pub const TIMESTAMPS_DIM: Table = Table {
    name: "timestamps_dim",
    role: TableRole::Dimension,
    columns: &[
        warehouse_column!("ts", SqlType::BigInt, is_primary_key = true, non_null = true),
        warehouse_column!("start_time", SqlType::Timestamp),
        warehouse_column!("hour", SqlType::Int),
        warehouse_column!("day", SqlType::Int),
        warehouse_column!("week", SqlType::Int),
        warehouse_column!("month", SqlType::Int),
        warehouse_column!("year", SqlType::Int),
        warehouse_column!("weekday", SqlType::Int),
    ],
};

/// Order in which tables are created.
pub const CREATE_ORDER: &[&Table] = &[
    &STAGING_EVENTS,
    &STAGING_SONGS,
    &SONGPLAYS_FACT,
    &USERS_DIM,
    &SONGS_DIM,
    &ARTISTS_DIM,
    &TIMESTAMPS_DIM,
];

/// Order in which tables are dropped. Every drop is guarded with IF EXISTS.
pub const DROP_ORDER: &[&Table] = &[
    &SONGPLAYS_FACT,
    &USERS_DIM,
    &SONGS_DIM,
    &ARTISTS_DIM,
    &TIMESTAMPS_DIM,
    &STAGING_EVENTS,
    &STAGING_SONGS,
];
