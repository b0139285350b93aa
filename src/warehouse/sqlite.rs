//! SQLite warehouse, used for local runs and tests.

use super::{json_ingest, CopyDirective, Dialect, Warehouse};
use crate::error::{EtlError, EtlResult};
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::path::Path;

pub struct SqliteWarehouse {
    conn: Connection,
}

impl SqliteWarehouse {
    pub fn open<P: AsRef<Path>>(path: P) -> EtlResult<Self> {
        let conn = Connection::open(path).map_err(|e| EtlError::Connect(Box::new(e)))?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> EtlResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| EtlError::Connect(Box::new(e)))?;
        Ok(Self { conn })
    }

    /// Direct access to the underlying connection, for inspection queries.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

#[async_trait]
impl Warehouse for SqliteWarehouse {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    async fn execute(&mut self, name: &str, sql: &str) -> EtlResult<u64> {
        let affected = self
            .conn
            .execute(sql, params![])
            .map_err(|e| EtlError::statement(name, e))?;
        Ok(affected as u64)
    }

    async fn bulk_copy(&mut self, directive: &CopyDirective) -> EtlResult<u64> {
        json_ingest::ingest(&mut self.conn, directive)
    }

    async fn begin(&mut self) -> EtlResult<()> {
        self.conn
            .execute_batch("BEGIN")
            .map_err(|e| EtlError::statement("begin", e))
    }

    async fn commit(&mut self) -> EtlResult<()> {
        self.conn
            .execute_batch("COMMIT")
            .map_err(|e| EtlError::statement("commit", e))
    }

    async fn rollback(&mut self) -> EtlResult<()> {
        self.conn
            .execute_batch("ROLLBACK")
            .map_err(|e| EtlError::statement("rollback", e))
    }

    async fn table_columns(&mut self, table: &str) -> EtlResult<Option<Vec<String>>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM pragma_table_info(?1) ORDER BY cid")
            .map_err(|e| EtlError::statement("describe table", e))?;
        let columns = stmt
            .query_map(params![table], |row| row.get::<_, String>(0))
            .and_then(|rows| rows.collect::<Result<Vec<_>, _>>())
            .map_err(|e| EtlError::statement("describe table", e))?;
        if columns.is_empty() {
            Ok(None)
        } else {
            Ok(Some(columns))
        }
    }

    async fn count_rows(&mut self, table: &str) -> EtlResult<i64> {
        self.conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| r.get(0))
            .map_err(|e| EtlError::statement("count rows", e))
    }

    async fn close(self: Box<Self>) -> EtlResult<()> {
        self.conn
            .close()
            .map_err(|(_, e)| EtlError::statement("close", e))
    }
}
