//! Cached relationship models between two dimensions of an instance's runs.
//!
//! Two attributes share one fitted model:
//!
//! - [`RelationshipModel`] stores the winning fit permanently in the owner's cache
//! - [`RelationshipModelWithQuality`] is never stored itself; it reuses (or
//!   publishes) the same fit and pairs it with a freshly built quality measure

use std::sync::Arc;

use crate::cache::{Attribute, AttributeIdentity, CacheOwner, Computed, Durability};
use crate::domain::{Dimension, InstanceRuns};
use crate::error::Result;
use crate::fit::{FittingEngine, FittingResult, QualityMeasure};
use crate::relation::build_data_matrix;

/// Class id of the stored relationship fit.
pub const RELATIONSHIP_MODEL_CLASS: u16 = 1;
/// Class id of the fit-plus-measure view.
pub const RELATIONSHIP_WITH_QUALITY_CLASS: u16 = 2;

/// Best fitted model of `dim_y` as a function of `dim_x`.
#[derive(Debug, Clone)]
pub struct RelationshipModel {
    dim_x: Dimension,
    dim_y: Dimension,
    engine: Arc<FittingEngine>,
}

impl RelationshipModel {
    /// Relationship fitted by the shared standard engine.
    pub fn new(dim_x: &Dimension, dim_y: &Dimension) -> Self {
        Self::with_engine(dim_x, dim_y, FittingEngine::standard())
    }

    pub fn with_engine(dim_x: &Dimension, dim_y: &Dimension, engine: Arc<FittingEngine>) -> Self {
        Self {
            dim_x: dim_x.clone(),
            dim_y: dim_y.clone(),
            engine,
        }
    }

    /// Cache key under which the fit for `(dim_x, dim_y)` is stored.
    pub fn identity_for(dim_x: &Dimension, dim_y: &Dimension) -> AttributeIdentity {
        AttributeIdentity::new(dim_x.index, dim_y.index, dim_x.is_time(), dim_y.is_time(), RELATIONSHIP_MODEL_CLASS)
    }

    /// Cached fit, computed on first use.
    pub fn get(&self, owner: &InstanceRuns) -> Result<Arc<FittingResult>> {
        owner.attribute_cache().get(owner, self)
    }
}

impl Attribute<InstanceRuns> for RelationshipModel {
    type Value = FittingResult;

    fn identity(&self) -> AttributeIdentity {
        Self::identity_for(&self.dim_x, &self.dim_y)
    }

    fn durability(&self) -> Durability {
        Durability::Permanent
    }

    fn compute(&self, owner: &InstanceRuns) -> Result<Computed<FittingResult>> {
        let (result, _) = compute_relationship(owner, &self.engine, &self.dim_x, &self.dim_y)?;
        Ok(Computed::Present(result))
    }
}

/// A fitted relationship together with the measure it is scored by.
#[derive(Debug, Clone)]
pub struct FittingWithQuality {
    pub fitting: Arc<FittingResult>,
    pub quality: QualityMeasure,
}

/// Fit plus quality measure for `(dim_x, dim_y)`.
///
/// The fit is shared with [`RelationshipModel`]; the measure is rebuilt on
/// every query.
#[derive(Debug, Clone)]
pub struct RelationshipModelWithQuality {
    dim_x: Dimension,
    dim_y: Dimension,
    engine: Arc<FittingEngine>,
}

impl RelationshipModelWithQuality {
    pub fn new(dim_x: &Dimension, dim_y: &Dimension) -> Self {
        Self::with_engine(dim_x, dim_y, FittingEngine::standard())
    }

    pub fn with_engine(dim_x: &Dimension, dim_y: &Dimension, engine: Arc<FittingEngine>) -> Self {
        Self {
            dim_x: dim_x.clone(),
            dim_y: dim_y.clone(),
            engine,
        }
    }

    pub fn get(&self, owner: &InstanceRuns) -> Result<FittingWithQuality> {
        let value = owner.attribute_cache().get(owner, self)?;
        Ok(Arc::try_unwrap(value).unwrap_or_else(|shared| (*shared).clone()))
    }
}

impl Attribute<InstanceRuns> for RelationshipModelWithQuality {
    type Value = FittingWithQuality;

    fn identity(&self) -> AttributeIdentity {
        AttributeIdentity::new(
            self.dim_x.index,
            self.dim_y.index,
            self.dim_x.is_time(),
            self.dim_y.is_time(),
            RELATIONSHIP_WITH_QUALITY_CLASS,
        )
    }

    fn durability(&self) -> Durability {
        Durability::Never
    }

    fn compute(&self, owner: &InstanceRuns) -> Result<Computed<FittingWithQuality>> {
        let shared = RelationshipModel::identity_for(&self.dim_x, &self.dim_y);
        let cache = owner.attribute_cache();

        if let Some(fitting) = cache.peek::<FittingResult>(shared)? {
            tracing::trace!(identity = %shared, "reusing cached relationship model");
            let data = build_data_matrix(owner, self.dim_x.index, self.dim_y.index)?;
            let quality = QualityMeasure::new(Arc::new(data));
            return Ok(Computed::Present(FittingWithQuality { fitting, quality }));
        }

        let (result, quality) = compute_relationship(owner, &self.engine, &self.dim_x, &self.dim_y)?;
        let local = Arc::new(result);
        let fitting = cache.publish_if_absent(shared, Durability::Permanent, local.clone())?;
        if !Arc::ptr_eq(&fitting, &local) {
            tracing::debug!(identity = %shared, "relationship model was stored concurrently; discarding local fit");
        }
        Ok(Computed::Present(FittingWithQuality { fitting, quality }))
    }
}

/// Select candidate models, assemble the data matrix and fit.
///
/// Model selection runs first so an invalid pairing fails before any data is
/// touched.
pub fn compute_relationship(
    owner: &InstanceRuns,
    engine: &FittingEngine,
    dim_x: &Dimension,
    dim_y: &Dimension,
) -> Result<(FittingResult, QualityMeasure)> {
    let models = engine.models_for(dim_x.is_time(), dim_y.is_time())?;
    let data = build_data_matrix(owner, dim_x.index, dim_y.index)?;
    tracing::debug!(
        instance = owner.id(),
        x = %dim_x.name,
        y = %dim_y.name,
        points = data.len(),
        "fitting relationship"
    );
    engine.fit(models, Arc::new(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DimensionKind, Run};
    use crate::error::FitError;
    use crate::fit::{Fitter, FitterSettings, MultiFitter};
    use crate::models::{ModelCatalog, ParametricModel, Quadratic};

    fn dims() -> (Dimension, Dimension) {
        (
            Dimension::new(0, DimensionKind::Time, "t"),
            Dimension::new(1, DimensionKind::Time, "u"),
        )
    }

    fn linear_owner() -> InstanceRuns {
        let rows: Vec<Vec<f64>> = (1..=12).map(|i| vec![i as f64, 4.0 + 2.0 * i as f64]).collect();
        InstanceRuns::new("linear", vec![Run::from_rows(&rows).unwrap()])
    }

    #[test]
    fn relationship_is_cached_permanently() {
        let owner = linear_owner();
        let (x, y) = dims();
        let attr = RelationshipModel::new(&x, &y);
        let first = attr.get(&owner).unwrap();
        let second = attr.get(&owner).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(owner.attribute_cache().contains(RelationshipModel::identity_for(&x, &y)));
        assert_eq!(first.model().name(), "quadratic");
    }

    #[test]
    fn with_quality_publishes_the_shared_fit() {
        let owner = linear_owner();
        let (x, y) = dims();
        let with_quality = RelationshipModelWithQuality::new(&x, &y).get(&owner).unwrap();
        assert_eq!(owner.attribute_cache().len(), 1);
        let plain = RelationshipModel::new(&x, &y).get(&owner).unwrap();
        assert!(Arc::ptr_eq(&plain, &with_quality.fitting));
        assert_eq!(with_quality.quality.data().len(), 12);
    }

    #[test]
    fn with_quality_reuses_an_existing_fit() {
        let owner = linear_owner();
        let (x, y) = dims();
        let plain = RelationshipModel::new(&x, &y).get(&owner).unwrap();
        let a = RelationshipModelWithQuality::new(&x, &y).get(&owner).unwrap();
        let b = RelationshipModelWithQuality::new(&x, &y).get(&owner).unwrap();
        assert!(Arc::ptr_eq(&plain, &a.fitting));
        assert!(Arc::ptr_eq(&a.fitting, &b.fitting));
        let q = a.quality.evaluate(plain.model().as_ref(), plain.fitted_parameters()).unwrap();
        assert!((q - plain.quality()).abs() < 1e-12, "{q} vs {}", plain.quality());
    }

    #[test]
    fn objective_to_time_is_rejected_without_caching() {
        let owner = linear_owner();
        let x = Dimension::new(0, DimensionKind::Objective, "f");
        let y = Dimension::new(1, DimensionKind::Time, "t");
        let err = RelationshipModel::new(&x, &y).get(&owner).unwrap_err();
        assert!(matches!(err, FitError::Configuration(_)), "{err}");
        let err = RelationshipModelWithQuality::new(&x, &y).get(&owner).unwrap_err();
        assert!(matches!(err, FitError::Configuration(_)), "{err}");
        assert!(owner.attribute_cache().is_empty());
    }

    /// Stores `canonical` under the shared identity while "fitting", as a
    /// concurrent `RelationshipModel::get` finishing first would.
    #[derive(Debug)]
    struct Overtaken {
        owner: Arc<InstanceRuns>,
        identity: AttributeIdentity,
        canonical: Arc<FittingResult>,
    }

    impl Fitter for Overtaken {
        fn name(&self) -> &'static str {
            "overtaken"
        }

        fn fit(&self, model: &Arc<dyn ParametricModel>, _measure: &QualityMeasure) -> Result<FittingResult> {
            self.owner
                .attribute_cache()
                .publish_if_absent(self.identity, Durability::Permanent, self.canonical.clone())?;
            Ok(FittingResult::new(0.5, vec![1.0, 1.0, 1.0], model.clone()))
        }
    }

    #[test]
    fn losing_a_publish_race_returns_the_stored_fit() {
        let owner = Arc::new(linear_owner());
        let (x, y) = dims();
        let canonical = Arc::new(FittingResult::new(0.0, vec![4.0, 2.0, 0.0], Arc::new(Quadratic)));
        let fitter: Arc<dyn Fitter> = Arc::new(Overtaken {
            owner: owner.clone(),
            identity: RelationshipModel::identity_for(&x, &y),
            canonical: canonical.clone(),
        });
        let quadratic: Arc<dyn ParametricModel> = Arc::new(Quadratic);
        let catalog = Arc::new(ModelCatalog::new(vec![quadratic], Vec::new()));
        let engine = Arc::new(FittingEngine::new(catalog, MultiFitter::new(vec![fitter])));

        let got = RelationshipModelWithQuality::with_engine(&x, &y, engine).get(&owner).unwrap();
        assert!(Arc::ptr_eq(&got.fitting, &canonical));
        assert_eq!(got.fitting.quality(), 0.0, "local fit must be discarded");
        assert_eq!(owner.attribute_cache().len(), 1);
        let plain = RelationshipModel::new(&x, &y).get(&owner).unwrap();
        assert!(Arc::ptr_eq(&plain, &canonical));
    }

    #[test]
    fn invalid_fitter_settings_fail_without_caching() {
        let owner = linear_owner();
        let (x, y) = dims();
        let settings = FitterSettings {
            restarts: 0,
            ..FitterSettings::default()
        };
        let engine = Arc::new(FittingEngine::new(ModelCatalog::standard(), MultiFitter::standard(settings)));
        for _ in 0..2 {
            let err = RelationshipModel::with_engine(&x, &y, engine.clone()).get(&owner).unwrap_err();
            assert!(matches!(err, FitError::Configuration(_)), "{err}");
        }
        assert!(owner.attribute_cache().is_empty());
    }
}
