//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and installs the log subscriber
//! - parses CLI arguments
//! - runs the fit pipeline
//! - prints reports and writes optional exports

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, DemoArgs, FitArgs};
use crate::domain::{DemoConfig, FitConfig};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `dimfit` binary.
pub fn run() -> Result<(), AppError> {
    // A missing `.env` is fine.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Fit(args) => handle_fit(args),
        Command::Demo(args) => handle_demo(args),
    }
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    // Ignore a second initialization (e.g. when embedded).
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn handle_fit(args: FitArgs) -> Result<(), AppError> {
    let config = fit_config_from_args(&args);
    let out = pipeline::run_fit(&config)?;

    println!(
        "Instance '{}': {} runs, {} rows used of {} read",
        out.ingest.runs.id(),
        out.ingest.runs.runs().len(),
        out.ingest.rows_used,
        out.ingest.rows_read
    );
    for err in out.ingest.row_errors.iter().take(5) {
        println!("  skipped line {}: {}", err.line, err.message);
    }
    if out.ingest.row_errors.len() > 5 {
        println!("  ... and {} more", out.ingest.row_errors.len() - 5);
    }
    println!();
    println!(
        "{}",
        crate::report::format_relationship(
            &out.dim_x,
            &out.dim_y,
            &out.relationship.fitting,
            &out.relationship.quality,
            config.grid_points,
        )
    );

    if let (Some(path), Some(count)) = (&config.export_path, out.exported) {
        println!("Exported {count} cached fit(s) to {}", path.display());
    }
    Ok(())
}

fn handle_demo(args: DemoArgs) -> Result<(), AppError> {
    let config = demo_config_from_args(&args);
    let out = pipeline::run_demo(&config)?;
    let [time, objective] = &out.sample.dimensions;

    println!(
        "Synthetic instance '{}': {} runs x {} points, truth {:?}",
        out.sample.runs.id(),
        config.runs,
        config.points_per_run,
        crate::data::SAMPLE_TRUTH
    );
    println!();
    println!(
        "{}",
        crate::report::format_relationship(
            time,
            objective,
            &out.relationship.fitting,
            &out.relationship.quality,
            config.grid_points,
        )
    );
    Ok(())
}

pub fn fit_config_from_args(args: &FitArgs) -> FitConfig {
    FitConfig {
        csv_path: args.csv.clone(),
        time_columns: args.time_columns.clone(),
        x_column: args.x.clone(),
        y_column: args.y.clone(),
        export_path: args.export.clone(),
        settings: args.fitter.settings(),
        grid_points: args.grid,
    }
}

pub fn demo_config_from_args(args: &DemoArgs) -> DemoConfig {
    DemoConfig {
        runs: args.runs,
        points_per_run: args.points,
        seed: args.seed,
        noise: args.noise,
        settings: args.fitter.settings(),
        grid_points: args.grid,
    }
}
