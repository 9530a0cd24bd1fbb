//! Per-element complexity factor resolution
//!
//! Each affected element type resolves to one multiplier for the selected
//! complexity parameter. The batched catalog rows are the primary source;
//! a per-element live lookup exists only as the tail of the fallback chain.

use std::collections::HashMap;

use uuid::Uuid;

use crate::catalog::Catalog;
use crate::models::ElementComplexityFactor;

/// Fallback seam for factor rows missing from the batched catalog snapshot,
/// e.g. a row added after the snapshot was taken. Implemented by the SQLite
/// backend as a single-row query.
pub trait FactorSource {
    fn element_factor(
        &self,
        element_type_id: u32,
        parameter_id: &Uuid,
    ) -> anyhow::Result<Option<ElementComplexityFactor>>;
}

/// Resolves the complexity multiplier for each requested element type.
///
/// Resolution order per element: `factor_ia` from the batched rows, else
/// `factor` from the batched rows, else one live lookup through `live`,
/// else 1. Without a selected complexity parameter every element resolves
/// to 1.
pub fn resolve_element_factors(
    catalog: &Catalog,
    complexity_parameter_id: Option<Uuid>,
    element_type_ids: &[u32],
    live: Option<&dyn FactorSource>,
) -> HashMap<u32, f64> {
    let mut resolved = HashMap::with_capacity(element_type_ids.len());

    let Some(parameter_id) = complexity_parameter_id else {
        for &element_type_id in element_type_ids {
            resolved.insert(element_type_id, 1.0);
        }
        return resolved;
    };

    // One pass over the snapshot instead of one lookup per element
    let rows = catalog.factor_rows_for(&parameter_id);

    for &element_type_id in element_type_ids {
        let from_batch = rows
            .get(&element_type_id)
            .and_then(|row| row.effective_factor());

        let factor = match from_batch {
            Some(f) => f,
            None => lookup_live(live, element_type_id, &parameter_id).unwrap_or(1.0),
        };

        resolved.insert(element_type_id, factor);
    }

    resolved
}

fn lookup_live(
    live: Option<&dyn FactorSource>,
    element_type_id: u32,
    parameter_id: &Uuid,
) -> Option<f64> {
    let source = live?;
    match source.element_factor(element_type_id, parameter_id) {
        Ok(row) => row.and_then(|r| r.effective_factor()),
        Err(e) => {
            log::warn!(
                "live factor lookup failed for element {} / parameter {}: {:#}",
                element_type_id,
                parameter_id,
                e
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EstimationParameter, EstimationStore};

    struct StubSource {
        rows: Vec<ElementComplexityFactor>,
    }

    impl FactorSource for StubSource {
        fn element_factor(
            &self,
            element_type_id: u32,
            parameter_id: &Uuid,
        ) -> anyhow::Result<Option<ElementComplexityFactor>> {
            Ok(self
                .rows
                .iter()
                .find(|r| r.element_type_id == element_type_id && r.parameter_id == *parameter_id)
                .cloned())
        }
    }

    struct FailingSource;

    impl FactorSource for FailingSource {
        fn element_factor(
            &self,
            _element_type_id: u32,
            _parameter_id: &Uuid,
        ) -> anyhow::Result<Option<ElementComplexityFactor>> {
            anyhow::bail!("backend gone")
        }
    }

    fn catalog_with_factors(parameter_id: Uuid) -> Catalog {
        let mut store = EstimationStore::new();
        let complexity_type = store.complexity_type_id().unwrap();
        let mut param = EstimationParameter::new("High".into(), complexity_type);
        param.id = parameter_id;
        store.parameters.push(param);
        store.complexity_factors.push(ElementComplexityFactor {
            element_type_id: 1,
            parameter_id,
            factor: Some(3.0),
            factor_ia: None,
        });
        store.complexity_factors.push(ElementComplexityFactor {
            element_type_id: 2,
            parameter_id,
            factor: Some(2.0),
            factor_ia: Some(2.5),
        });
        Catalog::from_store(&store)
    }

    #[test]
    fn test_batch_preferred_and_ia_wins() {
        let parameter_id = Uuid::new_v4();
        let catalog = catalog_with_factors(parameter_id);

        let factors = resolve_element_factors(&catalog, Some(parameter_id), &[1, 2], None);
        assert_eq!(factors[&1], 3.0);
        assert_eq!(factors[&2], 2.5);
    }

    #[test]
    fn test_live_fallback_for_missing_row() {
        let parameter_id = Uuid::new_v4();
        let catalog = catalog_with_factors(parameter_id);
        let live = StubSource {
            rows: vec![ElementComplexityFactor {
                element_type_id: 7,
                parameter_id,
                factor: Some(4.0),
                factor_ia: None,
            }],
        };

        let factors =
            resolve_element_factors(&catalog, Some(parameter_id), &[1, 7, 9], Some(&live));
        assert_eq!(factors[&1], 3.0); // batch hit, live not consulted
        assert_eq!(factors[&7], 4.0); // live fallback
        assert_eq!(factors[&9], 1.0); // unit default
    }

    #[test]
    fn test_no_complexity_selected_defaults_to_unit() {
        let catalog = catalog_with_factors(Uuid::new_v4());
        let factors = resolve_element_factors(&catalog, None, &[1, 2, 3], None);
        assert!(factors.values().all(|&f| f == 1.0));
    }

    #[test]
    fn test_live_failure_degrades_to_unit() {
        let parameter_id = Uuid::new_v4();
        let catalog = catalog_with_factors(parameter_id);

        let factors =
            resolve_element_factors(&catalog, Some(parameter_id), &[9], Some(&FailingSource));
        assert_eq!(factors[&9], 1.0);
    }
}
