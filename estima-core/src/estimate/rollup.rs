//! Need and project aggregation
//!
//! Rolls per-requirement estimates up to need and project totals, with the
//! completeness flag and the display ordering used by every report surface.

use uuid::Uuid;

use crate::catalog::Catalog;
use crate::estimate::engine::estimate_for_requirement;
use crate::estimate::factors::FactorSource;
use crate::models::EstimationStore;

/// Aggregated totals for one need
#[derive(Debug, Clone, PartialEq)]
pub struct NeedSummary {
    pub need_id: Uuid,
    pub total_function_points: u32,
    pub total_effort_days: f64,
    /// A need is complete iff every one of its requirements has a
    /// function-point total greater than zero. A need without requirements
    /// is vacuously complete.
    pub complete: bool,
}

/// Aggregated totals for one project
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectSummary {
    pub project_id: Uuid,
    /// Per-need summaries in display order
    pub needs: Vec<NeedSummary>,
    pub total_function_points: u32,
    pub total_effort_days: f64,
}

impl ProjectSummary {
    /// The degraded aggregate used when catalog data is unavailable: zero
    /// effort instead of a crash
    pub fn empty(project_id: Uuid) -> Self {
        Self {
            project_id,
            needs: Vec::new(),
            total_function_points: 0,
            total_effort_days: 0.0,
        }
    }
}

/// Sums the requirement estimates under one need
pub fn summarize_need(
    store: &EstimationStore,
    catalog: &Catalog,
    need_id: &Uuid,
    live: Option<&dyn FactorSource>,
) -> NeedSummary {
    let mut total_function_points = 0u32;
    let mut total_effort_days = 0.0;
    let mut complete = true;

    for requirement in store.requirements_of(need_id) {
        let estimate = estimate_for_requirement(store, catalog, &requirement.id, live);
        total_function_points += estimate.function_point_total;
        total_effort_days += estimate.estimated_effort_days;
        if estimate.function_point_total == 0 {
            complete = false;
        }
    }

    NeedSummary {
        need_id: *need_id,
        total_function_points,
        total_effort_days,
        complete,
    }
}

/// Sums the need summaries under one project; the returned need list is in
/// display order
pub fn summarize_project(
    store: &EstimationStore,
    catalog: &Catalog,
    project_id: &Uuid,
    live: Option<&dyn FactorSource>,
) -> ProjectSummary {
    let mut needs: Vec<NeedSummary> = store
        .needs_of(project_id)
        .iter()
        .map(|need| summarize_need(store, catalog, &need.id, live))
        .collect();

    sort_for_display(&mut needs);

    let total_function_points = needs.iter().map(|n| n.total_function_points).sum();
    let total_effort_days = needs.iter().map(|n| n.total_effort_days).sum();

    ProjectSummary {
        project_id: *project_id,
        needs,
        total_function_points,
        total_effort_days,
    }
}

/// Display ordering: complete needs before incomplete ones, descending by
/// total effort within each group. Presentation policy, reproduced for
/// behavioral parity.
pub fn sort_for_display(needs: &mut [NeedSummary]) {
    needs.sort_by(|a, b| {
        b.complete
            .cmp(&a.complete)
            .then_with(|| b.total_effort_days.total_cmp(&a.total_effort_days))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        ElementComplexityFactor, EstimationParameter, FunctionPointEntry, Need, Project,
        Requirement,
    };

    /// One project with a multiplicative weight of 1 so a requirement's
    /// effort equals its quantity.
    fn unit_weight_store() -> (EstimationStore, Uuid) {
        let mut store = EstimationStore::new();
        let project_id = store.add_project(Project::new("p".into()));

        let complexity_type = store.complexity_type_id().unwrap();
        let dev_type = store
            .parameter_types
            .iter()
            .find(|t| t.has_affected_elements && t.id != complexity_type)
            .unwrap()
            .id;
        let mut weight = EstimationParameter::new("Weight".into(), dev_type);
        weight.factor = Some(1.0);
        store.parameters.push(weight);

        (store, project_id)
    }

    fn add_need_with_quantity(
        store: &mut EstimationStore,
        project_id: Uuid,
        name: &str,
        quantity: u32,
    ) -> Uuid {
        let need_id = store
            .add_need(Need::new(name.into(), String::new(), project_id))
            .unwrap();
        let req_id = store
            .add_requirement(Requirement::new(format!("{name}-req"), String::new(), need_id))
            .unwrap();
        store
            .add_entry(FunctionPointEntry::element_quantity(req_id, 1, quantity))
            .unwrap();
        need_id
    }

    #[test]
    fn test_display_sort_complete_first_then_effort() {
        // A (complete, 10), B (incomplete, 50), C (complete, 20) -> [C, A, B]
        let a = NeedSummary {
            need_id: Uuid::new_v4(),
            total_function_points: 10,
            total_effort_days: 10.0,
            complete: true,
        };
        let b = NeedSummary {
            need_id: Uuid::new_v4(),
            total_function_points: 50,
            total_effort_days: 50.0,
            complete: false,
        };
        let c = NeedSummary {
            need_id: Uuid::new_v4(),
            total_function_points: 20,
            total_effort_days: 20.0,
            complete: true,
        };

        let mut needs = vec![a.clone(), b.clone(), c.clone()];
        sort_for_display(&mut needs);
        assert_eq!(needs, vec![c, a, b]);
    }

    #[test]
    fn test_need_completeness() {
        let (mut store, project_id) = unit_weight_store();
        let need_id = add_need_with_quantity(&mut store, project_id, "n", 5);

        let catalog = Catalog::from_store(&store);
        let summary = summarize_need(&store, &catalog, &need_id, None);
        assert!(summary.complete);
        assert_eq!(summary.total_function_points, 5);

        // A requirement without entries makes the need incomplete
        store
            .add_requirement(Requirement::new("empty".into(), String::new(), need_id))
            .unwrap();
        let summary = summarize_need(&store, &catalog, &need_id, None);
        assert!(!summary.complete);
    }

    #[test]
    fn test_empty_need_is_vacuously_complete() {
        let (mut store, project_id) = unit_weight_store();
        let need_id = store
            .add_need(Need::new("empty".into(), String::new(), project_id))
            .unwrap();

        let catalog = Catalog::from_store(&store);
        let summary = summarize_need(&store, &catalog, &need_id, None);
        assert!(summary.complete);
        assert_eq!(summary.total_effort_days, 0.0);
    }

    #[test]
    fn test_project_rollup_sums_and_orders() {
        let (mut store, project_id) = unit_weight_store();
        add_need_with_quantity(&mut store, project_id, "small", 10);
        add_need_with_quantity(&mut store, project_id, "large", 20);
        let incomplete = store
            .add_need(Need::new("incomplete".into(), String::new(), project_id))
            .unwrap();
        store
            .add_requirement(Requirement::new("pending".into(), String::new(), incomplete))
            .unwrap();

        let catalog = Catalog::from_store(&store);
        let summary = summarize_project(&store, &catalog, &project_id, None);

        assert_eq!(summary.total_function_points, 30);
        assert!((summary.total_effort_days - 30.0).abs() < 1e-9);
        assert_eq!(summary.needs.len(), 3);
        assert!((summary.needs[0].total_effort_days - 20.0).abs() < 1e-9);
        assert!((summary.needs[1].total_effort_days - 10.0).abs() < 1e-9);
        assert!(!summary.needs[2].complete);
    }

    #[test]
    fn test_aggregation_is_order_independent() {
        let (mut store, project_id) = unit_weight_store();
        for (i, qty) in [3u32, 7, 11, 13].iter().enumerate() {
            add_need_with_quantity(&mut store, project_id, &format!("n{i}"), *qty);
        }

        let catalog = Catalog::from_store(&store);
        let forward = summarize_project(&store, &catalog, &project_id, None);

        store.needs.reverse();
        store.requirements.reverse();
        store.entries.reverse();
        let reversed = summarize_project(&store, &catalog, &project_id, None);

        assert!((forward.total_effort_days - reversed.total_effort_days).abs() < 1e-9);
        assert_eq!(
            forward.total_function_points,
            reversed.total_function_points
        );
    }
}
