//! Read-through cache for the estimation catalogs
//!
//! Parameters, parameter types, element types and complexity factors are
//! reference data consumed by every estimation pass. Instead of each caller
//! fetching them independently, a `CatalogCache` loads one immutable
//! snapshot per session and hands out shared references; admin edits
//! invalidate the snapshot explicitly.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use thiserror::Error;
use uuid::Uuid;

use crate::db::StoreBackend;
use crate::models::{
    AffectedElementType, ElementComplexityFactor, EstimationParameter, EstimationStore,
    ParameterType, COMPLEXITY_TYPE_NAME,
};

/// Failure surfaced when catalog data cannot be fetched.
///
/// Dependent computation degrades the affected aggregate to zero instead of
/// propagating a panic; the condition is reported to the caller and never
/// retried automatically.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("estimation catalog unavailable: {0}")]
    DataUnavailable(String),
}

/// Immutable snapshot of the estimation catalogs
#[derive(Debug, Clone)]
pub struct Catalog {
    pub element_types: Vec<AffectedElementType>,
    pub parameter_types: Vec<ParameterType>,
    pub parameters: Vec<EstimationParameter>,
    pub complexity_factors: Vec<ElementComplexityFactor>,
}

impl Catalog {
    /// Builds a snapshot from the catalog sections of a store
    pub fn from_store(store: &EstimationStore) -> Self {
        Self {
            element_types: store.element_types.clone(),
            parameter_types: store.parameter_types.clone(),
            parameters: store.parameters.clone(),
            complexity_factors: store.complexity_factors.clone(),
        }
    }

    pub fn parameter(&self, id: &Uuid) -> Option<&EstimationParameter> {
        self.parameters.iter().find(|p| p.id == *id)
    }

    pub fn parameter_type(&self, id: &Uuid) -> Option<&ParameterType> {
        self.parameter_types.iter().find(|t| t.id == *id)
    }

    pub fn element_type(&self, id: u32) -> Option<&AffectedElementType> {
        self.element_types.iter().find(|e| e.id == id)
    }

    /// The parameter type named "Complexity", matched case-insensitively
    pub fn complexity_type_id(&self) -> Option<Uuid> {
        self.parameter_types
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(COMPLEXITY_TYPE_NAME))
            .map(|t| t.id)
    }

    /// Parameters whose type participates multiplicatively, excluding the
    /// Complexity type itself (complexity enters through the per-element
    /// factors, not as a term of its own)
    pub fn multiplicative_parameters(&self) -> Vec<&EstimationParameter> {
        let complexity = self.complexity_type_id();
        self.parameters
            .iter()
            .filter(|p| {
                if Some(p.parameter_type_id) == complexity {
                    return false;
                }
                self.parameter_type(&p.parameter_type_id)
                    .map(|t| t.has_affected_elements)
                    .unwrap_or(false)
            })
            .collect()
    }

    /// Parameters whose type contributes a flat additive term
    pub fn additive_parameters(&self) -> Vec<&EstimationParameter> {
        self.parameters
            .iter()
            .filter(|p| {
                self.parameter_type(&p.parameter_type_id)
                    .map(|t| !t.has_affected_elements)
                    .unwrap_or(false)
            })
            .collect()
    }

    /// The complexity factor rows for one complexity parameter, keyed by
    /// element type. This is the batched lookup the factor resolver prefers.
    pub fn factor_rows_for(&self, parameter_id: &Uuid) -> HashMap<u32, &ElementComplexityFactor> {
        self.complexity_factors
            .iter()
            .filter(|f| f.parameter_id == *parameter_id)
            .map(|f| (f.element_type_id, f))
            .collect()
    }
}

/// Session-scoped read-through cache over the catalog sections of a store.
///
/// The first `get` loads a snapshot through the backend; later calls return
/// the shared `Arc` until `invalidate` is called after an admin edit.
pub struct CatalogCache {
    inner: RwLock<Option<Arc<Catalog>>>,
}

impl CatalogCache {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(None),
        }
    }

    /// Returns the cached snapshot, loading it on first use.
    ///
    /// A failed load surfaces `CatalogError::DataUnavailable`; it is the
    /// caller's decision to degrade and report, not this cache's to retry.
    pub fn get(&self, backend: &dyn StoreBackend) -> Result<Arc<Catalog>, CatalogError> {
        if let Some(snapshot) = self.inner.read().expect("catalog lock poisoned").as_ref() {
            return Ok(Arc::clone(snapshot));
        }

        let store = backend
            .load()
            .map_err(|e| CatalogError::DataUnavailable(format!("{:#}", e)))?;
        let snapshot = Arc::new(Catalog::from_store(&store));

        let mut guard = self.inner.write().expect("catalog lock poisoned");
        // Another thread may have loaded between the read and write lock;
        // the snapshots are equivalent either way.
        if guard.is_none() {
            *guard = Some(Arc::clone(&snapshot));
        }
        Ok(snapshot)
    }

    /// Drops the snapshot so the next `get` reloads. Call after any catalog
    /// edit.
    pub fn invalidate(&self) {
        *self.inner.write().expect("catalog lock poisoned") = None;
    }
}

impl Default for CatalogCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EstimationParameter;

    fn catalog_with_params() -> Catalog {
        let mut store = EstimationStore::new();
        let complexity_type = store.complexity_type_id().unwrap();
        let dev_type = store
            .parameter_types
            .iter()
            .find(|t| t.name == "Development type")
            .unwrap()
            .id;
        let overhead_type = store
            .parameter_types
            .iter()
            .find(|t| !t.has_affected_elements)
            .unwrap()
            .id;

        store
            .parameters
            .push(EstimationParameter::new("Medium".into(), complexity_type));
        store
            .parameters
            .push(EstimationParameter::new("Greenfield".into(), dev_type));
        store
            .parameters
            .push(EstimationParameter::new("Management".into(), overhead_type));

        Catalog::from_store(&store)
    }

    #[test]
    fn test_parameter_partition() {
        let catalog = catalog_with_params();

        let multiplicative: Vec<&str> = catalog
            .multiplicative_parameters()
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        let additive: Vec<&str> = catalog
            .additive_parameters()
            .iter()
            .map(|p| p.name.as_str())
            .collect();

        // Complexity parameters are excluded from the multiplicative set
        assert_eq!(multiplicative, vec!["Greenfield"]);
        assert_eq!(additive, vec!["Management"]);
    }

    #[test]
    fn test_factor_rows_keyed_by_element() {
        let mut store = EstimationStore::new();
        let complexity_type = store.complexity_type_id().unwrap();
        let medium = EstimationParameter::new("Medium".into(), complexity_type);
        let medium_id = medium.id;
        store.parameters.push(medium);
        store.complexity_factors.push(ElementComplexityFactor {
            element_type_id: 1,
            parameter_id: medium_id,
            factor: Some(3.0),
            factor_ia: None,
        });
        store.complexity_factors.push(ElementComplexityFactor {
            element_type_id: 4,
            parameter_id: medium_id,
            factor: Some(2.0),
            factor_ia: Some(2.5),
        });

        let catalog = Catalog::from_store(&store);
        let rows = catalog.factor_rows_for(&medium_id);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[&1].effective_factor(), Some(3.0));
        assert_eq!(rows[&4].effective_factor(), Some(2.5));
    }

    #[test]
    fn test_cache_read_through_and_invalidate() {
        use crate::db::{StoreBackend, YamlBackend};
        use tempfile::TempDir;

        let dir = TempDir::new().unwrap();
        let backend = YamlBackend::new(dir.path().join("store.yaml"));
        backend.create_if_not_exists().unwrap();

        let cache = CatalogCache::new();
        let first = cache.get(&backend).unwrap();
        assert!(first.parameters.is_empty());

        // An edit behind the cache's back is invisible until invalidation
        backend
            .update_atomically(|store| {
                let complexity_type = store.complexity_type_id().unwrap();
                store
                    .parameters
                    .push(EstimationParameter::new("High".into(), complexity_type));
                Ok(())
            })
            .unwrap();

        let cached = cache.get(&backend).unwrap();
        assert!(cached.parameters.is_empty());

        cache.invalidate();
        let reloaded = cache.get(&backend).unwrap();
        assert_eq!(reloaded.parameters.len(), 1);
    }

    #[test]
    fn test_complexity_type_case_insensitive() {
        let mut store = EstimationStore::new();
        for t in &mut store.parameter_types {
            if t.name == COMPLEXITY_TYPE_NAME {
                t.name = "COMPLEXITY".into();
            }
        }
        let catalog = Catalog::from_store(&store);
        assert!(catalog.complexity_type_id().is_some());
    }
}
