//! Rutero Worker - fleet replanning pipeline
//!
//! Replays recorded trips through a pickup and delivery solver one day
//! at a time, keeping the fleet state and the route log up to date.

mod cli;
mod config;
mod db;
mod defaults;
mod error;
mod services;
mod types;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use tracing::info;
use tracing_appender::non_blocking;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::config::Config;
use crate::services::engine::pragmatic::PragmaticEngine;
use crate::services::fleet_state::FleetStateStore;
use crate::services::geodistance::{sync_distances, OsrmClient, OsrmConfig};
use crate::services::route_log::RouteLog;
use crate::services::scheduler::{DailyScheduler, PartitionStatus};
use crate::services::store::PgTripStore;
use crate::types::window::PlanningWindow;

#[tokio::main]
async fn main() -> Result<()> {
    let logs_dir = std::env::var("LOGS_DIR").unwrap_or_else(|_| "./logs".to_string());
    std::fs::create_dir_all(&logs_dir).ok();

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &logs_dir, "worker.log");
    let (file_writer, _guard) = non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,rutero_worker=debug".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::fmt::layer().with_writer(file_writer).with_ansi(false))
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command {
        Command::Plan { from, to, state_dir, route_log } => {
            run_plan(&config, from, to, state_dir, route_log).await
        }
        Command::SyncDistances { workers } => run_sync(&config, workers).await,
        Command::Deviation { file } => run_deviation(&file),
    }
}

async fn run_plan(
    config: &Config,
    from: NaiveDate,
    to: NaiveDate,
    state_dir: Option<String>,
    route_log: Option<String>,
) -> Result<()> {
    let window = PlanningWindow::from_dates(from, to)?;

    let pool = db::create_pool(&config.database_url).await?;
    let store = Arc::new(PgTripStore::new(pool));
    let engine = Arc::new(PragmaticEngine::new(window));
    let fleet =
        Arc::new(FleetStateStore::new(state_dir.unwrap_or_else(|| config.state_dir.clone())));
    let log =
        Arc::new(RouteLog::new(route_log.unwrap_or_else(|| config.route_log_path.clone())));

    let scheduler = DailyScheduler::new(store, engine, fleet, log)
        .with_solve_budget(Duration::from_secs(config.solve_budget_seconds));

    let reports = scheduler.run(&window).await;

    let failed_days = reports.iter().filter(|r| r.error.is_some()).count();
    let solved = reports
        .iter()
        .flat_map(|r| r.partitions.iter())
        .filter(|p| matches!(p.status, PartitionStatus::Solved { .. }))
        .count();
    info!("Planning finished: {} partitions solved, {} days failed", solved, failed_days);

    if failed_days > 0 {
        anyhow::bail!("{failed_days} days could not be planned");
    }
    Ok(())
}

async fn run_sync(config: &Config, workers: Option<usize>) -> Result<()> {
    let pool = db::create_pool(&config.database_url).await?;
    let client = OsrmClient::new(OsrmConfig {
        base_url: config.osrm_url.clone(),
        ..OsrmConfig::default()
    })?;
    let workers = workers.unwrap_or(config.sync_workers);

    let summary = sync_distances(&pool, &client, workers).await?;
    info!(
        "Synced {} of {} missing pairs ({} skipped)",
        summary.inserted, summary.candidate_pairs, summary.skipped
    );
    Ok(())
}

fn run_deviation(file: &str) -> Result<()> {
    let legs = RouteLog::new(file).read_all().context("reading the route log")?;
    let report = services::deviation::analyze(&legs);
    println!("{report}");
    Ok(())
}
