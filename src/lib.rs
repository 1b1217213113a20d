pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

use crate::cli::run::RunSummary;
use crate::core::EtlError;
use crate::core::config::AppConfig;
use crate::providers::EcbRateSource;
use crate::store::Warehouse;
use anyhow::Context;
use chrono::NaiveDate;
use tracing::{debug, info};

pub enum AppCommand {
    Run,
}

pub fn load_config(config_path: Option<&str>) -> Result<AppConfig, EtlError> {
    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path),
        None => AppConfig::load(),
    };
    config.map_err(EtlError::Setup)
}

/// Runs one pipeline pass with `config` as of today's local date.
pub async fn run_with_config(config: &AppConfig) -> Result<RunSummary, EtlError> {
    run_as_of(config, chrono::Local::now().date_naive()).await
}

/// Runs one pipeline pass against the configured warehouse and ECB endpoint,
/// treating `today` as the current date.
pub async fn run_as_of(config: &AppConfig, today: NaiveDate) -> Result<RunSummary, EtlError> {
    let db_path = config.database_path().map_err(EtlError::Setup)?;
    let mut warehouse = Warehouse::open(&db_path).map_err(EtlError::Setup)?;
    let source = EcbRateSource::new(&config.providers.ecb)
        .context("Failed to create ECB client")
        .map_err(EtlError::Setup)?;

    cli::run::execute(config, &mut warehouse, &source, today).await
}

pub async fn run_command(
    command: AppCommand,
    config_path: Option<&str>,
) -> Result<RunSummary, EtlError> {
    info!("FX warehouse ETL starting...");

    let config = load_config(config_path)?;
    debug!("Loaded config: {config:#?}");

    match command {
        AppCommand::Run => run_with_config(&config).await,
    }
}
