//! JSON snapshot of an owner's permanently cached relationship models.
//!
//! Only `Permanent` entries are written. Restoring publishes each record back
//! into a cache without recomputing, so a later [`RelationshipModel::get`] is a
//! cache hit.
//!
//! [`RelationshipModel::get`]: crate::relation::RelationshipModel::get

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cache::{AttributeIdentity, CacheOwner, Durability};
use crate::domain::{InstanceRuns, RunData};
use crate::error::{FitError, Result};
use crate::fit::FittingResult;
use crate::models::ModelCatalog;
use crate::relation::RELATIONSHIP_MODEL_CLASS;

/// One persisted relationship fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermanentRecord {
    pub identity: AttributeIdentity,
    pub model: String,
    pub parameters: Vec<f64>,
    pub quality: f64,
}

/// Schema of the exported JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermanentFile {
    pub tool: String,
    pub instance: String,
    pub generated: DateTime<Utc>,
    pub entries: Vec<PermanentRecord>,
}

/// Snapshot every permanent fit of `owner`, ordered by identity.
pub fn to_permanent_file(owner: &InstanceRuns) -> PermanentFile {
    let entries = owner
        .attribute_cache()
        .permanent_entries::<FittingResult>()
        .into_iter()
        .map(|(identity, fit)| PermanentRecord {
            identity,
            model: fit.model().name().to_string(),
            parameters: fit.fitted_parameters().to_vec(),
            quality: fit.quality(),
        })
        .collect();

    PermanentFile {
        tool: "dimfit".to_string(),
        instance: owner.id().to_string(),
        generated: Utc::now(),
        entries,
    }
}

/// Write the permanent-entry snapshot of `owner`; returns the number of records.
pub fn write_permanent_json(path: &Path, owner: &InstanceRuns) -> Result<usize> {
    let snapshot = to_permanent_file(owner);
    let file = File::create(path)
        .map_err(|e| FitError::Input(format!("Failed to create export JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, &snapshot)
        .map_err(|e| FitError::Input(format!("Failed to write export JSON: {e}")))?;
    Ok(snapshot.entries.len())
}

pub fn read_permanent_json(path: &Path) -> Result<PermanentFile> {
    let file = File::open(path)
        .map_err(|e| FitError::Input(format!("Failed to open export JSON '{}': {e}", path.display())))?;
    serde_json::from_reader(file).map_err(|e| FitError::Input(format!("Invalid export JSON: {e}")))
}

/// Publish the records of `file` into `owner`'s cache.
///
/// Every record is checked before anything is stored:
/// - the file must belong to `owner` (same instance id)
/// - the identity must be a relationship-model key over dimensions `owner` has
/// - its dimension pairing must be fittable (objective → time is a
///   configuration error) and the model must be a candidate for that pairing
/// - parameters and quality must be finite
///
/// Entries already present are left untouched. Returns how many records were
/// newly stored.
pub fn restore_permanent_entries(owner: &InstanceRuns, file: &PermanentFile, catalog: &ModelCatalog) -> Result<usize> {
    if file.instance != owner.id() {
        return Err(FitError::Input(format!(
            "Export belongs to instance '{}', not '{}'.",
            file.instance,
            owner.id()
        )));
    }

    let fits = file
        .entries
        .iter()
        .map(|record| Ok((record.identity, Arc::new(validated_fit(owner, record, catalog)?))))
        .collect::<Result<Vec<_>>>()?;

    let cache = owner.attribute_cache();
    let mut stored = 0;
    for (identity, local) in fits {
        let kept = cache.publish_if_absent(identity, Durability::Permanent, local.clone())?;
        if Arc::ptr_eq(&kept, &local) {
            stored += 1;
        }
    }
    tracing::debug!(instance = owner.id(), stored, records = file.entries.len(), "restored permanent fits");
    Ok(stored)
}

fn validated_fit(owner: &InstanceRuns, record: &PermanentRecord, catalog: &ModelCatalog) -> Result<FittingResult> {
    let id = record.identity;
    if id.class_id() != RELATIONSHIP_MODEL_CLASS {
        return Err(FitError::Input(format!("Record {id} is not a relationship model.")));
    }
    if let Some(run) = owner
        .runs()
        .iter()
        .find(|run| id.dim_x() >= run.dimension_count() || id.dim_y() >= run.dimension_count())
    {
        return Err(FitError::Input(format!(
            "Record {id} refers to a dimension beyond the {} recorded per run.",
            run.dimension_count()
        )));
    }

    if catalog.find(&record.model).is_none() {
        return Err(FitError::Input(format!("Unknown model '{}' in export.", record.model)));
    }
    let candidates = catalog.select_models(id.is_x_time(), id.is_y_time())?;
    let model = candidates
        .iter()
        .find(|m| m.name() == record.model)
        .cloned()
        .ok_or_else(|| FitError::Input(format!("Model '{}' is not a candidate for record {id}.", record.model)))?;

    if record.parameters.len() != model.parameter_count() {
        return Err(FitError::Input(format!(
            "Record {id} has {} parameters; {} expects {}.",
            record.parameters.len(),
            record.model,
            model.parameter_count()
        )));
    }
    if !record.quality.is_finite() || record.parameters.iter().any(|p| !p.is_finite()) {
        return Err(FitError::Input(format!("Record {id} has non-finite values.")));
    }
    Ok(FittingResult::new(record.quality, record.parameters.clone(), model))
}
