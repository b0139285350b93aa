use anyhow::{Context, Result};
use clap::Parser;
use songplay_warehouse::config::{CliConfig, FileConfig, DEFAULT_CONFIG_FILE};
use songplay_warehouse::{
    connect, Loader, RunState, RunTracker, StatementRunner, WarehouseConfig,
};
use std::path::PathBuf;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Loads the staging tables from the bulk sources and transforms them into
/// the star schema. Run `create-tables` first.
#[derive(Parser, Debug)]
#[command(name = "etl")]
struct CliArgs {
    /// Path to the TOML warehouse configuration.
    #[clap(long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Run each stage in one transaction, rolled back on failure.
    #[clap(long)]
    pub per_stage: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    let file_config = FileConfig::load(&cli_args.config)?;
    let config = WarehouseConfig::resolve(
        &CliConfig {
            per_stage: cli_args.per_stage,
        },
        file_config,
    )?;

    let mut warehouse = connect(&config).await?;
    let loader = Loader::new(&config);
    // The schema is assumed to be in place
    let mut tracker = RunTracker::starting_at(RunState::SchemaCreated);
    {
        let mut runner = StatementRunner::new(warehouse.as_mut(), config.commit_mode);
        loader
            .load_staging(&mut runner, &mut tracker)
            .await
            .context("Staging load failed")?;
        loader
            .transform(&mut runner, &mut tracker)
            .await
            .context("Transform failed")?;
    }

    warehouse.close().await?;
    info!("ETL completed successfully!");
    Ok(())
}
