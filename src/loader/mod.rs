//! Loads staging from the bulk sources and transforms it into the star
//! schema.

pub mod copy;
pub mod transform;

use crate::config::{BulkSources, RoleCredential, WarehouseConfig};
use crate::error::EtlResult;
use crate::pipeline::{RunState, RunTracker, StageReport, StatementRunner, Step};
use crate::schema::catalog::{
    ARTISTS_DIM, SONGPLAYS_FACT, SONGS_DIM, STAGING_EVENTS, STAGING_SONGS, TIMESTAMPS_DIM,
    USERS_DIM,
};
use crate::schema::Table;
use crate::warehouse::Warehouse;
use tracing::info;

pub struct Loader {
    sources: BulkSources,
    credential: Option<RoleCredential>,
}

impl Loader {
    pub fn new(config: &WarehouseConfig) -> Self {
        Self {
            sources: config.sources.clone(),
            credential: config.credential.clone(),
        }
    }

    pub fn staging_steps(&self) -> Vec<Step> {
        copy::staging_copies(&self.sources, self.credential.as_ref())
            .into_iter()
            .map(Step::Copy)
            .collect()
    }

    /// Bulk-copies the event logs and song metadata into the staging tables.
    pub async fn load_staging(
        &self,
        runner: &mut StatementRunner<'_>,
        tracker: &mut RunTracker,
    ) -> EtlResult<StageReport> {
        tracker.check(RunState::StagingLoaded)?;
        info!("Loading staging tables from bulk sources");
        let report = runner.run_stage("staging load", &self.staging_steps()).await?;
        tracker.advance(RunState::StagingLoaded)?;

        report_counts(runner.warehouse(), &[&STAGING_EVENTS, &STAGING_SONGS]).await?;
        Ok(report)
    }

    /// Populates the fact and dimension tables from staging.
    pub async fn transform(
        &self,
        runner: &mut StatementRunner<'_>,
        tracker: &mut RunTracker,
    ) -> EtlResult<StageReport> {
        tracker.check(RunState::Transformed)?;
        info!("Transforming staging rows into the star schema");
        let dialect = runner.warehouse().dialect();
        let report = runner
            .run_stage("transform", &transform::transform_steps(dialect))
            .await?;
        tracker.advance(RunState::Transformed)?;

        report_counts(
            runner.warehouse(),
            &[
                &SONGPLAYS_FACT,
                &USERS_DIM,
                &SONGS_DIM,
                &ARTISTS_DIM,
                &TIMESTAMPS_DIM,
            ],
        )
        .await?;
        Ok(report)
    }
}

async fn report_counts(warehouse: &mut dyn Warehouse, tables: &[&Table]) -> EtlResult<()> {
    for table in tables {
        let count = warehouse.count_rows(table.name).await?;
        info!("  {}: {} rows", table.name, count);
    }
    Ok(())
}
