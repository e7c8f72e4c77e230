//! Configuration management

use anyhow::{Context, Result};

use crate::defaults::{DEFAULT_SOLVE_BUDGET_SECS, DEFAULT_SYNC_WORKERS};

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub osrm_url: String,
    pub state_dir: String,
    pub route_log_path: String,
    pub solve_budget_seconds: u64,
    pub sync_workers: usize,
}

impl Config {
    /// Load configuration from environment variables, reading a `.env`
    /// file first if one exists.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let osrm_url =
            std::env::var("OSRM_URL").unwrap_or_else(|_| "http://localhost:5000".to_string());
        let state_dir =
            std::env::var("FLEET_STATE_DIR").unwrap_or_else(|_| "./fleet_state".to_string());
        let route_log_path =
            std::env::var("ROUTE_LOG_PATH").unwrap_or_else(|_| "./routes.csv".to_string());

        let solve_budget_seconds = match std::env::var("SOLVE_BUDGET_SECONDS") {
            Ok(value) => value.parse().context("SOLVE_BUDGET_SECONDS must be a number")?,
            Err(_) => DEFAULT_SOLVE_BUDGET_SECS,
        };
        let sync_workers = match std::env::var("SYNC_WORKERS") {
            Ok(value) => value.parse().context("SYNC_WORKERS must be a number")?,
            Err(_) => DEFAULT_SYNC_WORKERS,
        };

        Ok(Self {
            database_url,
            osrm_url,
            state_dir,
            route_log_path,
            solve_budget_seconds,
            sync_workers,
        })
    }
}
