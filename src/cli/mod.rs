//! Command-line parsing for the dimension-relationship fitter.
//!
//! Argument parsing and command dispatch stay separate from the fitting code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::fit::FitterSettings;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "dimfit", version, about = "Fit relationship models between dimensions of algorithm run data")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace). `RUST_LOG` applies otherwise.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit one dimension against another from a run CSV.
    Fit(FitArgs),
    /// Generate synthetic logistic runs and fit objective over time.
    Demo(DemoArgs),
}

#[derive(Debug, Parser, Clone)]
pub struct FitArgs {
    /// Run CSV: a `run` column plus one numeric column per dimension.
    #[arg(long)]
    pub csv: PathBuf,

    /// Columns holding time measures (repeat or comma-separate); others are objectives.
    #[arg(long = "time", value_delimiter = ',')]
    pub time_columns: Vec<String>,

    /// Column used as the independent variable.
    #[arg(long)]
    pub x: String,

    /// Column modelled as a function of `--x`.
    #[arg(long)]
    pub y: String,

    /// Write the permanently cached fits to JSON.
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Rows of the fitted-value table.
    #[arg(long, default_value_t = 8)]
    pub grid: usize,

    #[command(flatten)]
    pub fitter: FitterArgs,
}

#[derive(Debug, Parser, Clone)]
pub struct DemoArgs {
    /// Number of synthetic runs.
    #[arg(long, default_value_t = 5)]
    pub runs: usize,

    /// Points per run.
    #[arg(long, default_value_t = 40)]
    pub points: usize,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Standard deviation of the multiplicative log-normal noise.
    #[arg(long, default_value_t = 0.05)]
    pub noise: f64,

    /// Rows of the fitted-value table.
    #[arg(long, default_value_t = 8)]
    pub grid: usize,

    #[command(flatten)]
    pub fitter: FitterArgs,
}

/// Options shared by the iterative fitters.
#[derive(Debug, Args, Clone)]
pub struct FitterArgs {
    /// Iteration cap per start.
    #[arg(long, default_value_t = FitterSettings::default().max_iterations)]
    pub max_iterations: usize,

    /// Relative convergence tolerance.
    #[arg(long, default_value_t = FitterSettings::default().tolerance)]
    pub tolerance: f64,

    /// Starting points per (fitter, model) combination.
    #[arg(long, default_value_t = FitterSettings::default().restarts)]
    pub restarts: usize,
}

impl FitterArgs {
    pub fn settings(&self) -> FitterSettings {
        FitterSettings {
            max_iterations: self.max_iterations,
            tolerance: self.tolerance,
            restarts: self.restarts,
        }
    }
}
