//! Shared "fit pipeline" logic behind the CLI commands.
//!
//! Both commands follow the same path:
//! run data -> dimension lookup -> cached relationship fit -> optional export
//!
//! The CLI layer only handles presentation.

use std::sync::Arc;

use crate::data::{SampleData, generate_logistic_runs};
use crate::domain::{DemoConfig, Dimension, FitConfig, InstanceRuns};
use crate::error::Result;
use crate::fit::{FitterSettings, FittingEngine};
use crate::io::{IngestedRuns, load_instance_runs, write_permanent_json};
use crate::relation::{FittingWithQuality, RelationshipModelWithQuality};

/// Outputs of `dimfit fit`.
#[derive(Debug)]
pub struct FitOutput {
    pub ingest: IngestedRuns,
    pub dim_x: Dimension,
    pub dim_y: Dimension,
    pub relationship: FittingWithQuality,
    /// Records written by `--export`.
    pub exported: Option<usize>,
}

/// Outputs of `dimfit demo`.
#[derive(Debug)]
pub struct DemoOutput {
    pub sample: SampleData,
    pub relationship: FittingWithQuality,
}

pub fn run_fit(config: &FitConfig) -> Result<FitOutput> {
    let engine = engine_for(config.settings)?;
    let ingest = load_instance_runs(&config.csv_path, &config.time_columns)?;
    let dim_x = ingest.dimension(&config.x_column)?.clone();
    let dim_y = ingest.dimension(&config.y_column)?.clone();

    let relationship = relate(&ingest.runs, &dim_x, &dim_y, engine)?;

    let exported = match &config.export_path {
        Some(path) => Some(write_permanent_json(path, &ingest.runs)?),
        None => None,
    };

    Ok(FitOutput {
        ingest,
        dim_x,
        dim_y,
        relationship,
        exported,
    })
}

pub fn run_demo(config: &DemoConfig) -> Result<DemoOutput> {
    let engine = engine_for(config.settings)?;
    let sample = generate_logistic_runs(config)?;
    let [time, objective] = &sample.dimensions;
    let relationship = relate(&sample.runs, time, objective, engine)?;
    Ok(DemoOutput { sample, relationship })
}

fn engine_for(settings: FitterSettings) -> Result<Arc<FittingEngine>> {
    if settings == FitterSettings::default() {
        return Ok(FittingEngine::standard());
    }
    Ok(Arc::new(FittingEngine::with_settings(settings)?))
}

fn relate(runs: &InstanceRuns, dim_x: &Dimension, dim_y: &Dimension, engine: Arc<FittingEngine>) -> Result<FittingWithQuality> {
    RelationshipModelWithQuality::with_engine(dim_x, dim_y, engine).get(runs)
}
