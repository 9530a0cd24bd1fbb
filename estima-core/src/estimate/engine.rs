//! The per-requirement estimator
//!
//! Combines a requirement's recorded element quantities with the parameter
//! catalog and the resolved complexity factors into a function-point total
//! and an estimated effort in workdays.

use std::collections::HashMap;

use uuid::Uuid;

use crate::catalog::Catalog;
use crate::estimate::factors::{resolve_element_factors, FactorSource};
use crate::models::{EntryKind, EstimationStore, EstimatorSettings, FunctionPointEntry};

/// Fixed conversion between workdays and hours
pub const HOURS_PER_WORKDAY: f64 = 8.0;

/// Estimated effort contributed by one quantity entry
#[derive(Debug, Clone, PartialEq)]
pub struct EntryEffort {
    pub entry_id: Uuid,
    pub element_type_id: u32,
    pub effort_days: f64,
}

/// The estimator output for one requirement
#[derive(Debug, Clone, PartialEq)]
pub struct RequirementEstimate {
    pub requirement_id: Uuid,
    /// Sum of estimated quantities across all element entries
    pub function_point_total: u32,
    /// Estimated effort in workdays
    pub estimated_effort_days: f64,
    /// Per-entry breakdown, used to refresh the cached entry efforts
    pub per_entry: Vec<EntryEffort>,
}

impl RequirementEstimate {
    /// A zero estimate for a requirement without quantity entries
    pub fn empty(requirement_id: Uuid) -> Self {
        Self {
            requirement_id,
            function_point_total: 0,
            estimated_effort_days: 0.0,
            per_entry: Vec::new(),
        }
    }

    /// Estimated effort converted to hours
    pub fn estimated_hours(&self) -> f64 {
        self.estimated_effort_days * HOURS_PER_WORKDAY
    }
}

/// Computes the estimate for one requirement from already-fetched inputs.
///
/// `factors` is the resolved complexity multiplier per element type; an
/// element missing from the map multiplies by 1. A parameter without a
/// recorded factor contributes 0. A requirement with no quantity entries
/// short-circuits to a zero estimate without iterating the catalog; whether
/// additive parameters still contribute in that case is controlled by
/// `settings.additive_on_empty`.
pub fn estimate_requirement(
    requirement_id: Uuid,
    entries: &[&FunctionPointEntry],
    catalog: &Catalog,
    factors: &HashMap<u32, f64>,
    settings: &EstimatorSettings,
) -> RequirementEstimate {
    let quantities: Vec<(Uuid, u32, u32)> = entries
        .iter()
        .filter_map(|entry| match &entry.kind {
            EntryKind::ElementQuantity {
                element_type_id,
                estimated_quantity,
                ..
            } => Some((entry.id, *element_type_id, *estimated_quantity)),
            EntryKind::ParameterSelection { .. } => None,
        })
        .collect();

    if quantities.is_empty() && !settings.additive_on_empty {
        return RequirementEstimate::empty(requirement_id);
    }

    let function_point_total: u32 = quantities.iter().map(|(_, _, qty)| qty).sum();

    let multiplicative = catalog.multiplicative_parameters();
    let parameter_weight: f64 = multiplicative
        .iter()
        .map(|p| p.effective_factor().unwrap_or(0.0))
        .sum();

    let mut per_entry = Vec::with_capacity(quantities.len());
    let mut multiplicative_total = 0.0;
    for (entry_id, element_type_id, quantity) in &quantities {
        let complexity = factors.get(element_type_id).copied().unwrap_or(1.0);
        let effort_days = f64::from(*quantity) * parameter_weight * complexity;
        multiplicative_total += effort_days;
        per_entry.push(EntryEffort {
            entry_id: *entry_id,
            element_type_id: *element_type_id,
            effort_days,
        });
    }

    let additive_total: f64 = catalog
        .additive_parameters()
        .iter()
        .map(|p| p.effective_factor().unwrap_or(0.0))
        .sum();

    RequirementEstimate {
        requirement_id,
        function_point_total,
        estimated_effort_days: multiplicative_total + additive_total,
        per_entry,
    }
}

/// Convenience wrapper: gathers a requirement's entries and selected
/// complexity from the store, resolves the element factors, and runs the
/// estimator with the store's settings.
pub fn estimate_for_requirement(
    store: &EstimationStore,
    catalog: &Catalog,
    requirement_id: &Uuid,
    live: Option<&dyn FactorSource>,
) -> RequirementEstimate {
    let entries = store.entries_of(requirement_id);

    let element_type_ids: Vec<u32> = entries
        .iter()
        .filter_map(|entry| match &entry.kind {
            EntryKind::ElementQuantity {
                element_type_id, ..
            } => Some(*element_type_id),
            EntryKind::ParameterSelection { .. } => None,
        })
        .collect();

    let complexity = store.selected_complexity(requirement_id);
    let factors = resolve_element_factors(catalog, complexity, &element_type_ids, live);

    estimate_requirement(*requirement_id, &entries, catalog, &factors, &store.settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        ElementComplexityFactor, EstimationParameter, Need, Project, Requirement,
    };

    /// Store with one requirement, one multiplicative parameter with
    /// factor_ia = 2, complexity factor 3 for element type 1, no additive
    /// parameters beyond what the test adds.
    fn scenario_store() -> (EstimationStore, Uuid) {
        let mut store = EstimationStore::new();
        let project_id = store.add_project(Project::new("p".into()));
        let need_id = store
            .add_need(Need::new("n".into(), String::new(), project_id))
            .unwrap();
        let req_id = store
            .add_requirement(Requirement::new("r".into(), String::new(), need_id))
            .unwrap();

        let complexity_type = store.complexity_type_id().unwrap();
        let dev_type = store
            .parameter_types
            .iter()
            .find(|t| t.has_affected_elements && t.id != complexity_type)
            .unwrap()
            .id;

        let mut high = EstimationParameter::new("High".into(), complexity_type);
        high.factor = Some(9.0); // must not enter as a term of its own
        let high_id = high.id;
        store.parameters.push(high);

        let mut weight = EstimationParameter::new("Greenfield".into(), dev_type);
        weight.factor_ia = Some(2.0);
        store.parameters.push(weight);

        store.complexity_factors.push(ElementComplexityFactor {
            element_type_id: 1,
            parameter_id: high_id,
            factor: Some(3.0),
            factor_ia: None,
        });

        store
            .add_entry(FunctionPointEntry::element_quantity(req_id, 1, 5))
            .unwrap();
        store
            .add_entry(FunctionPointEntry::parameter_selection(req_id, high_id))
            .unwrap();

        (store, req_id)
    }

    #[test]
    fn test_round_trip_scenario() {
        // qty 5 x factor_ia 2 x complexity 3 = 30 workdays, 240 hours
        let (store, req_id) = scenario_store();
        let catalog = Catalog::from_store(&store);

        let estimate = estimate_for_requirement(&store, &catalog, &req_id, None);
        assert_eq!(estimate.function_point_total, 5);
        assert!((estimate.estimated_effort_days - 30.0).abs() < 1e-9);
        assert!((estimate.estimated_hours() - 240.0).abs() < 1e-9);
        assert_eq!(estimate.per_entry.len(), 1);
        assert!((estimate.per_entry[0].effort_days - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_entries_short_circuits() {
        let (mut store, req_id) = scenario_store();
        store.entries.retain(|e| !matches!(e.kind, EntryKind::ElementQuantity { .. }));

        // An additive parameter with a factor must not leak into the result
        let overhead_type = store
            .parameter_types
            .iter()
            .find(|t| !t.has_affected_elements)
            .unwrap()
            .id;
        let mut overhead = EstimationParameter::new("Management".into(), overhead_type);
        overhead.factor = Some(4.0);
        store.parameters.push(overhead);

        let catalog = Catalog::from_store(&store);
        let estimate = estimate_for_requirement(&store, &catalog, &req_id, None);
        assert_eq!(estimate.function_point_total, 0);
        assert_eq!(estimate.estimated_effort_days, 0.0);
    }

    #[test]
    fn test_additive_on_empty_opt_in() {
        let (mut store, req_id) = scenario_store();
        store.entries.retain(|e| !matches!(e.kind, EntryKind::ElementQuantity { .. }));
        store.settings.additive_on_empty = true;

        let overhead_type = store
            .parameter_types
            .iter()
            .find(|t| !t.has_affected_elements)
            .unwrap()
            .id;
        let mut overhead = EstimationParameter::new("Management".into(), overhead_type);
        overhead.factor = Some(4.0);
        store.parameters.push(overhead);

        let catalog = Catalog::from_store(&store);
        let estimate = estimate_for_requirement(&store, &catalog, &req_id, None);
        assert_eq!(estimate.function_point_total, 0);
        assert!((estimate.estimated_effort_days - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_additive_applies_with_entries() {
        let (mut store, req_id) = scenario_store();

        let overhead_type = store
            .parameter_types
            .iter()
            .find(|t| !t.has_affected_elements)
            .unwrap()
            .id;
        let mut overhead = EstimationParameter::new("Management".into(), overhead_type);
        overhead.factor = Some(4.0);
        store.parameters.push(overhead);

        let catalog = Catalog::from_store(&store);
        let estimate = estimate_for_requirement(&store, &catalog, &req_id, None);
        assert!((estimate.estimated_effort_days - 34.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_quantity_entries_contribute_nothing() {
        let (mut store, req_id) = scenario_store();
        store
            .add_entry(FunctionPointEntry::element_quantity(req_id, 4, 0))
            .unwrap();

        let catalog = Catalog::from_store(&store);
        let estimate = estimate_for_requirement(&store, &catalog, &req_id, None);
        assert_eq!(estimate.function_point_total, 5);
        assert!((estimate.estimated_effort_days - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_parameter_without_factor_counts_as_zero() {
        let (mut store, req_id) = scenario_store();
        let dev_type = store
            .parameters
            .iter()
            .find(|p| p.name == "Greenfield")
            .unwrap()
            .parameter_type_id;
        store
            .parameters
            .push(EstimationParameter::new("Unweighted".into(), dev_type));

        let catalog = Catalog::from_store(&store);
        let estimate = estimate_for_requirement(&store, &catalog, &req_id, None);
        // The factor-less parameter adds 0 to the weight, leaving 30
        assert!((estimate.estimated_effort_days - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_unresolved_complexity_defaults_to_unit() {
        let (mut store, req_id) = scenario_store();
        // Drop the complexity selection: factors resolve to 1
        store
            .entries
            .retain(|e| !matches!(e.kind, EntryKind::ParameterSelection { .. }));

        let catalog = Catalog::from_store(&store);
        let estimate = estimate_for_requirement(&store, &catalog, &req_id, None);
        // 5 x 2 x 1 = 10
        assert!((estimate.estimated_effort_days - 10.0).abs() < 1e-9);
    }
}
