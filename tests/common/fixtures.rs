//! Bulk-source fixtures and an in-memory warehouse wired to them.

use super::constants::*;
use rusqlite::Connection;
use serde_json::{json, Value};
use songplay_warehouse::config::{Backend, BulkSources, CommitMode, WarehouseConfig};
use songplay_warehouse::warehouse::SqliteWarehouse;
use songplay_warehouse::{RunTracker, SchemaManager, StatementRunner};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A log event with every field the real dumps carry.
pub fn event(user_id: i64, page: &str, artist: Option<&str>, song: Option<&str>, ts: i64) -> Value {
    let playing = page == "NextSong";
    let length = if playing { json!(152.92036) } else { Value::Null };
    let method = if playing { "PUT" } else { "GET" };
    json!({
        "artist": artist,
        "auth": "Logged In",
        "firstName": "Kaylee",
        "gender": "F",
        "itemInSession": 0,
        "lastName": "Summers",
        "length": length,
        "level": "free",
        "location": "Phoenix-Mesa-Scottsdale, AZ",
        "method": method,
        "page": page,
        "registration": 1540344794796.0,
        "sessionId": 139,
        "song": song,
        "status": 200,
        "ts": ts,
        "userAgent": USER_AGENT,
        // The dumps store user ids as strings
        "userId": user_id.to_string(),
    })
}

pub fn next_song(user_id: i64, artist: &str, song: &str, ts: i64) -> Value {
    event(user_id, "NextSong", Some(artist), Some(song), ts)
}

pub fn song(song_id: &str, title: &str, artist_id: &str, artist_name: &str) -> Value {
    json!({
        "num_songs": 1,
        "artist_id": artist_id,
        "artist_latitude": null,
        "artist_longitude": null,
        "artist_location": "",
        "artist_name": artist_name,
        "song_id": song_id,
        "title": title,
        "duration": 152.92036,
        "year": 0,
    })
}

/// Scratch directory holding `log_data/` and `song_data/` trees laid out like
/// the published dumps.
pub struct SourceFixture {
    pub dir: TempDir,
    pub log_jsonpath: Option<PathBuf>,
    pub commit_mode: CommitMode,
}

impl SourceFixture {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("log_data")).unwrap();
        fs::create_dir_all(dir.path().join("song_data")).unwrap();
        Self {
            dir,
            log_jsonpath: None,
            commit_mode: CommitMode::PerStatement,
        }
    }

    pub fn per_stage(mut self) -> Self {
        self.commit_mode = CommitMode::PerStage;
        self
    }

    pub fn with_log_jsonpaths(mut self) -> Self {
        let path = self.dir.path().join("log_json_path.json");
        fs::write(&path, LOG_JSON_PATHS).unwrap();
        self.log_jsonpath = Some(path);
        self
    }

    pub fn log_dir(&self) -> PathBuf {
        self.dir.path().join("log_data")
    }

    pub fn song_dir(&self) -> PathBuf {
        self.dir.path().join("song_data")
    }

    /// Writes events as one newline-delimited file under
    /// `log_data/2018/11/`.
    pub fn add_events(&self, file_name: &str, events: &[Value]) {
        let dir = self.log_dir().join("2018").join("11");
        fs::create_dir_all(&dir).unwrap();
        let body = events
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("\n");
        fs::write(dir.join(file_name), body).unwrap();
    }

    /// Writes one song file under `song_data/A/<letters of the id>/`. Songs
    /// with a missing or short id land in `song_data/A/X/X/`.
    pub fn add_song(&self, file_name: &str, record: &Value) {
        let song_id = record["song_id"].as_str().unwrap_or("");
        let dir = self
            .song_dir()
            .join("A")
            .join(song_id.get(2..3).unwrap_or("X"))
            .join(song_id.get(3..4).unwrap_or("X"));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(file_name), record.to_string()).unwrap();
    }

    pub fn config(&self) -> WarehouseConfig {
        WarehouseConfig {
            backend: Backend::Sqlite {
                path: self.dir.path().join("warehouse.db"),
            },
            commit_mode: self.commit_mode,
            sources: BulkSources {
                log_data: path_string(&self.log_dir()),
                log_jsonpath: self.log_jsonpath.as_deref().map(path_string),
                song_data: path_string(&self.song_dir()),
                region: "us-west-2".to_string(),
            },
            credential: None,
        }
    }
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

/// Opens an in-memory warehouse and creates the schema in it.
pub async fn fresh_warehouse() -> SqliteWarehouse {
    let mut warehouse = SqliteWarehouse::open_in_memory().unwrap();
    {
        let mut runner = StatementRunner::new(&mut warehouse, CommitMode::PerStatement);
        let mut tracker = RunTracker::new();
        SchemaManager::new()
            .reset_schema(&mut runner, &mut tracker)
            .await
            .unwrap();
    }
    warehouse
}

pub fn count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| r.get(0))
        .unwrap()
}
