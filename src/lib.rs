pub mod cli;
pub mod core;
pub mod engine;
pub mod pacing;
pub mod portfolio;
pub mod providers;
pub mod scheduler;
pub mod server;
pub mod store;

use crate::core::config::AppConfig;
use crate::engine::Estimator;
use crate::pacing::Pacing;
use crate::portfolio::Portfolio;
use crate::providers::caching::CachingHoldingsProvider;
use crate::providers::eastmoney::EastmoneyArchiveProvider;
use crate::providers::sina::SinaQuoteProvider;
use crate::scheduler::RefreshScheduler;
use crate::server::ServerState;
use crate::store::DiskFundStore;
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub enum AppCommand {
    Add { code: String, amount: f64 },
    Remove { code: String },
    Show { holdings: bool },
    Watch { holdings: bool },
    Serve,
}

fn build_estimator(config: &AppConfig) -> Result<Estimator> {
    let archive = &config.providers.archive;
    let holdings_provider = CachingHoldingsProvider::new(EastmoneyArchiveProvider::new(
        &archive.base_url,
        Duration::from_secs(archive.timeout_secs),
    )?);

    let quote = &config.providers.quote;
    let quote_provider = SinaQuoteProvider::new(
        &quote.base_url,
        &quote.referer,
        Duration::from_secs(quote.timeout_secs),
    )?;

    Ok(Estimator::new(
        Arc::new(holdings_provider),
        Arc::new(quote_provider),
        Pacing::new(config.refresh.pacing()),
    ))
}

async fn open_portfolio(
    config: &AppConfig,
    estimator: Estimator,
) -> Result<(RefreshScheduler, Portfolio)> {
    let store = Arc::new(DiskFundStore::open(&config.default_data_path()?)?);
    let portfolio = Portfolio::load(store.as_ref()).await?;
    let scheduler = RefreshScheduler::new(estimator, store, config.refresh.interval());
    Ok((scheduler, portfolio))
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Fund estimator starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let estimator = build_estimator(&config)?;

    match command {
        AppCommand::Serve => {
            let state = Arc::new(ServerState { estimator });
            server::serve(state, config.server.port).await
        }
        AppCommand::Add { code, amount } => {
            let (scheduler, mut portfolio) = open_portfolio(&config, estimator).await?;
            cli::funds::add(&scheduler, &mut portfolio, &code, amount).await
        }
        AppCommand::Remove { code } => {
            let (scheduler, mut portfolio) = open_portfolio(&config, estimator).await?;
            cli::funds::remove(&scheduler, &mut portfolio, &code).await
        }
        AppCommand::Show { holdings } => {
            let (scheduler, mut portfolio) = open_portfolio(&config, estimator).await?;
            cli::show::run(&scheduler, &mut portfolio, holdings).await
        }
        AppCommand::Watch { holdings } => {
            let (scheduler, mut portfolio) = open_portfolio(&config, estimator).await?;
            cli::watch::run(&scheduler, &mut portfolio, holdings).await
        }
    }
}
