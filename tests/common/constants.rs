//! Shared constants for end-to-end tests
//!
//! Sample records are shaped like the real event-log and song-metadata
//! dumps. When test data changes, update only this file.

// ============================================================================
// Songs
// ============================================================================

pub const SONG_1_ID: &str = "SOUPIRU12A6D4FA1E1";
pub const SONG_1_TITLE: &str = "Der Kleine Dompfaff";
pub const SONG_2_ID: &str = "SOZCTXZ12AB0182364";
pub const SONG_2_TITLE: &str = "Setanta matins";

pub const ARTIST_1_ID: &str = "ARJIE2Y1187B994AB7";
pub const ARTIST_1_NAME: &str = "Line Renaud";
pub const ARTIST_2_ID: &str = "AR5KOSW1187FB35FF4";
pub const ARTIST_2_NAME: &str = "Elena";

// ============================================================================
// Events
// ============================================================================

pub const USER_1_ID: i64 = 8;
pub const USER_2_ID: i64 = 17;

/// 2018-11-02 01:25:34.796 UTC, a Friday
pub const TS_1: i64 = 1541121934796;
/// 2018-11-15 00:30:26.796 UTC, a Thursday
pub const TS_2: i64 = 1542241826796;

pub const USER_AGENT: &str =
    "\"Mozilla/5.0 (Windows NT 6.1; WOW64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/35.0.1916.153 Safari/537.36\"";

/// JSONPaths document equivalent to the one published next to the event logs.
pub const LOG_JSON_PATHS: &str = r#"{
    "jsonpaths": [
        "$['artist']",
        "$['auth']",
        "$['firstName']",
        "$['gender']",
        "$['itemInSession']",
        "$['lastName']",
        "$['length']",
        "$['level']",
        "$['location']",
        "$['method']",
        "$['page']",
        "$['registration']",
        "$['sessionId']",
        "$['song']",
        "$['status']",
        "$['ts']",
        "$['userAgent']",
        "$['userId']"
    ]
}"#;
