use super::catalog::{CREATE_ORDER, DROP_ORDER};
use super::table::Table;
use crate::error::{EtlError, EtlResult};
use crate::pipeline::{RunState, RunTracker, StageReport, StatementRunner, Step};
use crate::warehouse::{Dialect, Warehouse};
use tracing::info;

/// Drops and recreates the warehouse tables.
pub struct SchemaManager {
    create_order: &'static [&'static Table],
    drop_order: &'static [&'static Table],
}

impl SchemaManager {
    pub fn new() -> Self {
        Self {
            create_order: CREATE_ORDER,
            drop_order: DROP_ORDER,
        }
    }

    pub fn drop_steps(&self) -> Vec<Step> {
        self.drop_order
            .iter()
            .map(|t| Step::sql(format!("drop {}", t.name), t.drop_sql()))
            .collect()
    }

    pub fn create_steps(&self, dialect: Dialect) -> Vec<Step> {
        self.create_order
            .iter()
            .map(|t| Step::sql(format!("create {}", t.name), t.create_sql(dialect)))
            .collect()
    }

    /// Destroys all prior data and creates empty tables.
    pub async fn reset_schema(
        &self,
        runner: &mut StatementRunner<'_>,
        tracker: &mut RunTracker,
    ) -> EtlResult<StageReport> {
        tracker.check(RunState::SchemaDropped)?;
        info!(
            "Attempting to drop existing tables, then creating {} tables",
            self.create_order.len()
        );

        let dialect = runner.warehouse().dialect();
        let mut steps = self.drop_steps();
        steps.extend(self.create_steps(dialect));
        let report = runner.run_stage("schema reset", &steps).await?;

        tracker.advance(RunState::SchemaDropped)?;
        tracker.advance(RunState::SchemaCreated)?;
        Ok(report)
    }

    /// Checks that every declared table exists with the declared columns.
    pub async fn verify_schema(&self, warehouse: &mut dyn Warehouse) -> EtlResult<()> {
        for table in self.create_order {
            let actual = warehouse
                .table_columns(table.name)
                .await?
                .ok_or_else(|| EtlError::SchemaMismatch {
                    table: table.name.to_string(),
                    message: "table does not exist".to_string(),
                })?;
            table
                .check_columns(&actual)
                .map_err(|message| EtlError::SchemaMismatch {
                    table: table.name.to_string(),
                    message,
                })?;
        }
        info!("Schema verified: {} tables", self.create_order.len());
        Ok(())
    }

    /// Logs and returns the row count of each table.
    pub async fn table_counts(&self, warehouse: &mut dyn Warehouse) -> EtlResult<Vec<(&'static str, i64)>> {
        let mut counts = Vec::with_capacity(self.create_order.len());
        for table in self.create_order {
            let count = warehouse.count_rows(table.name).await?;
            info!("  {}: {} rows", table.name, count);
            counts.push((table.name, count));
        }
        Ok(counts)
    }
}

impl Default for SchemaManager {
    fn default() -> Self {
        Self::new()
    }
}
