//! Sequential statement runner and run-state tracking.
//!
//! Every stage of a run is an ordered list of `Step`s executed one at a time
//! against a single warehouse connection. The commit mode decides whether
//! each step commits on its own or the stage commits as a whole.

use crate::config::{CommitMode, WarehouseConfig};
use crate::error::{EtlError, EtlResult};
use crate::loader::Loader;
use crate::schema::SchemaManager;
use crate::warehouse::{CopyDirective, Warehouse};
use std::time::Instant;
use tracing::{error, info, warn};

/// Progress of a run through its stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Empty,
    SchemaDropped,
    SchemaCreated,
    StagingLoaded,
    Transformed,
}

impl RunState {
    fn may_advance_to(self, next: RunState) -> bool {
        use RunState::*;
        matches!(
            (self, next),
            // A reset may restart from anywhere, drops are guarded
            (_, SchemaDropped)
                | (SchemaDropped, SchemaCreated)
                | (SchemaCreated, StagingLoaded)
                | (StagingLoaded, Transformed)
        )
    }
}

#[derive(Debug)]
pub struct RunTracker {
    state: RunState,
}

impl RunTracker {
    pub fn new() -> Self {
        Self::starting_at(RunState::Empty)
    }

    /// A tracker for a process that assumes earlier stages were run by
    /// someone else, e.g. the `etl` binary assumes the schema exists.
    pub fn starting_at(state: RunState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn check(&self, next: RunState) -> EtlResult<()> {
        if self.state.may_advance_to(next) {
            Ok(())
        } else {
            Err(EtlError::InvalidTransition {
                from: self.state,
                to: next,
            })
        }
    }

    pub fn advance(&mut self, next: RunState) -> EtlResult<()> {
        self.check(next)?;
        info!("Run state: {:?} -> {:?}", self.state, next);
        self.state = next;
        Ok(())
    }
}

impl Default for RunTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// One unit of work inside a stage.
#[derive(Debug, Clone)]
pub enum Step {
    Sql { name: String, sql: String },
    Copy(CopyDirective),
}

impl Step {
    pub fn sql(name: impl Into<String>, sql: impl Into<String>) -> Self {
        Step::Sql {
            name: name.into(),
            sql: sql.into(),
        }
    }

    pub fn name(&self) -> String {
        match self {
            Step::Sql { name, .. } => name.clone(),
            Step::Copy(directive) => format!("copy {}", directive.table.name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    pub name: String,
    pub rows: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageReport {
    pub stage: String,
    pub steps: Vec<StepOutcome>,
}

impl StageReport {
    pub fn rows_for(&self, name: &str) -> Option<u64> {
        self.steps.iter().find(|s| s.name == name).map(|s| s.rows)
    }
}

pub struct StatementRunner<'w> {
    warehouse: &'w mut dyn Warehouse,
    commit_mode: CommitMode,
}

impl<'w> StatementRunner<'w> {
    pub fn new(warehouse: &'w mut dyn Warehouse, commit_mode: CommitMode) -> Self {
        Self {
            warehouse,
            commit_mode,
        }
    }

    pub fn warehouse(&mut self) -> &mut dyn Warehouse {
        &mut *self.warehouse
    }

    /// Runs `steps` in order. The first failure aborts the stage; in
    /// per-stage mode everything the stage did is rolled back.
    pub async fn run_stage(&mut self, stage: &str, steps: &[Step]) -> EtlResult<StageReport> {
        info!(
            "Stage '{}': {} statements ({:?})",
            stage,
            steps.len(),
            self.commit_mode
        );
        if self.commit_mode == CommitMode::PerStage {
            self.warehouse.begin().await?;
        }

        let mut report = StageReport {
            stage: stage.to_string(),
            steps: Vec::with_capacity(steps.len()),
        };
        for step in steps {
            match self.run_step(step).await {
                Ok(rows) => report.steps.push(StepOutcome {
                    name: step.name(),
                    rows,
                }),
                Err(e) => {
                    error!("Stage '{}' aborted at '{}': {}", stage, step.name(), e);
                    if self.commit_mode == CommitMode::PerStage {
                        if let Err(rollback_err) = self.warehouse.rollback().await {
                            warn!("Rollback of stage '{}' failed: {}", stage, rollback_err);
                        }
                    }
                    return Err(e);
                }
            }
        }

        if self.commit_mode == CommitMode::PerStage {
            self.warehouse.commit().await?;
        }
        Ok(report)
    }

    async fn run_step(&mut self, step: &Step) -> EtlResult<u64> {
        let started = Instant::now();
        let rows = match step {
            Step::Sql { name, sql } => {
                info!("Executing the following query:\n{}", sql);
                self.warehouse.execute(name, sql).await?
            }
            Step::Copy(directive) => {
                info!(
                    "Executing the following query:\n{}",
                    directive.describe(self.warehouse.dialect())
                );
                self.warehouse.bulk_copy(directive).await?
            }
        };
        info!(
            "'{}' done in {:?} ({} rows)",
            step.name(),
            started.elapsed(),
            rows
        );
        Ok(rows)
    }
}

/// Drop, create, verify, bulk-load and transform in one go.
pub async fn run_full(
    config: &WarehouseConfig,
    warehouse: &mut dyn Warehouse,
) -> EtlResult<RunTracker> {
    let mut tracker = RunTracker::new();
    let mut runner = StatementRunner::new(warehouse, config.commit_mode);

    let schema_manager = SchemaManager::new();
    schema_manager.reset_schema(&mut runner, &mut tracker).await?;
    schema_manager.verify_schema(runner.warehouse()).await?;

    let loader = Loader::new(config);
    loader.load_staging(&mut runner, &mut tracker).await?;
    loader.transform(&mut runner, &mut tracker).await?;

    Ok(tracker)
}
