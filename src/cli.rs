//! Command line interface

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "rutero-worker", about = "Fleet replanning worker", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Plan every day in a date range and append the resulting routes.
    Plan {
        /// First day to plan (inclusive).
        #[arg(long)]
        from: NaiveDate,
        /// Day after the last planned day.
        #[arg(long)]
        to: NaiveDate,
        /// Override the fleet state directory.
        #[arg(long)]
        state_dir: Option<String>,
        /// Override the route log file.
        #[arg(long)]
        route_log: Option<String>,
    },
    /// Measure and store every missing location pair via OSRM.
    SyncDistances {
        /// Concurrent OSRM table calls.
        #[arg(long)]
        workers: Option<usize>,
    },
    /// Summarize observed vs modeled travel times from a route log.
    Deviation {
        /// Route log file to analyze.
        #[arg(long)]
        file: String,
    },
}
