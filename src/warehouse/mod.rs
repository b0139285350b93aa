//! Warehouse backends.
//!
//! The loader and the schema manager only talk to a `Warehouse`: an open
//! connection that accepts SQL text, performs bulk copies and reports
//! catalog information. Redshift is reached over the Postgres wire protocol;
//! SQLite is a local stand-in that emulates the JSON bulk copy.

mod json_ingest;
mod redshift;
mod sqlite;

pub use redshift::RedshiftWarehouse;
pub use sqlite::SqliteWarehouse;

use crate::config::{Backend, RoleCredential, WarehouseConfig};
use crate::error::EtlResult;
use crate::schema::table::Table;
use async_trait::async_trait;
use tracing::info;

/// SQL flavour spoken by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Redshift,
    Sqlite,
}

/// How JSON keys are mapped onto staging columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JsonMapping {
    /// Keys match column names, ignoring case.
    Auto,
    /// Location of a JSONPaths document; the i-th path feeds the i-th column.
    Paths(String),
}

impl JsonMapping {
    pub fn as_copy_option(&self) -> &str {
        match self {
            JsonMapping::Auto => "auto",
            JsonMapping::Paths(location) => location,
        }
    }
}

/// One bulk-copy directive: load every JSON record found at `source` into
/// `table`.
#[derive(Debug, Clone)]
pub struct CopyDirective {
    pub table: &'static Table,
    pub source: String,
    pub mapping: JsonMapping,
    pub credential: Option<RoleCredential>,
    pub region: String,
}

impl CopyDirective {
    /// Statement text as it is logged before execution. For Redshift this is
    /// the exact COPY sent to the engine.
    pub fn describe(&self, dialect: Dialect) -> String {
        match dialect {
            Dialect::Redshift => redshift::render_copy(self),
            Dialect::Sqlite => format!(
                "COPY {} FROM '{}'\njson '{}'",
                self.table.name,
                self.source,
                self.mapping.as_copy_option()
            ),
        }
    }
}

/// An open warehouse connection.
///
/// Statements run one at a time. Outside an explicit `begin`/`commit` pair
/// every statement commits on its own.
#[async_trait]
pub trait Warehouse: Send {
    fn dialect(&self) -> Dialect;

    /// Execute one statement. Returns the number of affected rows when the
    /// engine reports it, 0 otherwise.
    async fn execute(&mut self, name: &str, sql: &str) -> EtlResult<u64>;

    /// Ingest the records referenced by `directive` as a single operation.
    async fn bulk_copy(&mut self, directive: &CopyDirective) -> EtlResult<u64>;

    async fn begin(&mut self) -> EtlResult<()>;

    async fn commit(&mut self) -> EtlResult<()>;

    async fn rollback(&mut self) -> EtlResult<()>;

    /// Column names of `table` in declaration order, or `None` if the table
    /// does not exist.
    async fn table_columns(&mut self, table: &str) -> EtlResult<Option<Vec<String>>>;

    async fn count_rows(&mut self, table: &str) -> EtlResult<i64>;

    async fn close(self: Box<Self>) -> EtlResult<()>;
}

/// Open the warehouse described by `config`.
pub async fn connect(config: &WarehouseConfig) -> EtlResult<Box<dyn Warehouse>> {
    match &config.backend {
        Backend::Redshift(cluster) => {
            info!(
                "Connecting to Redshift cluster {}:{}/{} as {}...",
                cluster.host, cluster.port, cluster.dbname, cluster.user
            );
            Ok(Box::new(RedshiftWarehouse::connect(cluster).await?))
        }
        Backend::Sqlite { path } => {
            info!("Opening SQLite warehouse at {:?}...", path);
            Ok(Box::new(SqliteWarehouse::open(path)?))
        }
    }
}
