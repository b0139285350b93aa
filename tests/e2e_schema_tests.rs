//! End-to-end tests for dropping and recreating the warehouse schema

mod common;

use common::{count, fresh_warehouse};
use songplay_warehouse::config::CommitMode;
use songplay_warehouse::warehouse::SqliteWarehouse;
use songplay_warehouse::{EtlError, RunState, RunTracker, SchemaManager, StatementRunner};

const ALL_TABLES: [&str; 7] = [
    "staging_events",
    "staging_songs",
    "songplays_fact",
    "users_dim",
    "songs_dim",
    "artists_dim",
    "timestamps_dim",
];

#[tokio::test]
async fn test_reset_creates_seven_empty_tables() {
    let mut warehouse = fresh_warehouse().await;

    for table in ALL_TABLES {
        assert_eq!(count(warehouse.connection(), table), 0, "{}", table);
    }
    SchemaManager::new()
        .verify_schema(&mut warehouse)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_reset_twice_leaves_identical_empty_schema() {
    let mut warehouse = fresh_warehouse().await;
    warehouse
        .connection()
        .execute(
            "INSERT INTO users_dim (user_id, first_name, last_name, gender, level) \
             VALUES (8, 'Kaylee', 'Summers', 'F', 'free')",
            [],
        )
        .unwrap();
    assert_eq!(count(warehouse.connection(), "users_dim"), 1);

    let manager = SchemaManager::new();
    let mut tracker = RunTracker::starting_at(RunState::Transformed);
    {
        let mut runner = StatementRunner::new(&mut warehouse, CommitMode::PerStatement);
        let report = manager.reset_schema(&mut runner, &mut tracker).await.unwrap();
        assert_eq!(report.steps.len(), 14);
    }
    assert_eq!(tracker.state(), RunState::SchemaCreated);

    for table in ALL_TABLES {
        assert_eq!(count(warehouse.connection(), table), 0, "{}", table);
    }
    manager.verify_schema(&mut warehouse).await.unwrap();
}

#[tokio::test]
async fn test_reset_in_one_transaction() {
    let mut warehouse = SqliteWarehouse::open_in_memory().unwrap();
    let manager = SchemaManager::new();
    let mut tracker = RunTracker::new();
    {
        let mut runner = StatementRunner::new(&mut warehouse, CommitMode::PerStage);
        manager.reset_schema(&mut runner, &mut tracker).await.unwrap();
    }

    manager.verify_schema(&mut warehouse).await.unwrap();
    let counts = manager.table_counts(&mut warehouse).await.unwrap();
    assert_eq!(counts.len(), 7);
    assert!(counts.iter().all(|(_, rows)| *rows == 0));
}

#[tokio::test]
async fn test_verify_fails_on_missing_tables() {
    let mut warehouse = SqliteWarehouse::open_in_memory().unwrap();

    let result = SchemaManager::new().verify_schema(&mut warehouse).await;
    match result {
        Err(EtlError::SchemaMismatch { table, message }) => {
            assert_eq!(table, "staging_events");
            assert!(message.contains("does not exist"));
        }
        other => panic!("expected a schema mismatch, got {:?}", other),
    }
}

#[tokio::test]
async fn test_verify_fails_on_drifted_columns() {
    let mut warehouse = fresh_warehouse().await;
    warehouse
        .connection()
        .execute_batch("DROP TABLE artists_dim; CREATE TABLE artists_dim (artist_id TEXT)")
        .unwrap();

    let result = SchemaManager::new().verify_schema(&mut warehouse).await;
    assert!(matches!(
        result,
        Err(EtlError::SchemaMismatch { ref table, .. }) if table == "artists_dim"
    ));
}

#[tokio::test]
async fn test_fact_identity_starts_at_one_and_increments() {
    let warehouse = fresh_warehouse().await;
    let conn = warehouse.connection();
    for ts in [1_i64, 2] {
        conn.execute(
            "INSERT INTO songplays_fact (ts, user_id) VALUES (?1, 8)",
            [ts],
        )
        .unwrap();
    }

    let ids: Vec<i64> = conn
        .prepare("SELECT songplay_id FROM songplays_fact ORDER BY songplay_id")
        .unwrap()
        .query_map([], |r| r.get(0))
        .unwrap()
        .map(|r| r.unwrap())
        .collect();
    assert_eq!(ids.len(), 2);
    assert_eq!(ids[1], ids[0] + 1);
}

#[tokio::test]
async fn test_dimension_primary_keys_are_enforced() {
    let warehouse = fresh_warehouse().await;
    let conn = warehouse.connection();
    let insert = "INSERT INTO timestamps_dim (ts) VALUES (1541121934796)";
    conn.execute(insert, []).unwrap();

    assert!(conn.execute(insert, []).is_err());
}
