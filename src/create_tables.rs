use anyhow::{Context, Result};
use clap::Parser;
use songplay_warehouse::config::{CliConfig, FileConfig, DEFAULT_CONFIG_FILE};
use songplay_warehouse::{connect, RunTracker, SchemaManager, StatementRunner, WarehouseConfig};
use std::path::PathBuf;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Drops and recreates the staging, fact and dimension tables.
#[derive(Parser, Debug)]
#[command(name = "create-tables")]
struct CliArgs {
    /// Path to the TOML warehouse configuration.
    #[clap(long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Run the whole reset in one transaction, rolled back on failure.
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
    let schema_manager = SchemaManager::new();
    let mut tracker = RunTracker::new();
    {
        let mut runner = StatementRunner::new(warehouse.as_mut(), config.commit_mode);
        schema_manager
            .reset_schema(&mut runner, &mut tracker)
            .await
            .context("Schema reset failed")?;
    }
    schema_manager.verify_schema(warehouse.as_mut()).await?;
    schema_manager.table_counts(warehouse.as_mut()).await?;

    warehouse.close().await?;
    info!("Tables created (2x staging and 5x star schema)");
    Ok(())
}
