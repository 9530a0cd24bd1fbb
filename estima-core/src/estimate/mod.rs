//! The estimation engine
//!
//! Pure computation from already-fetched records: per-element complexity
//! factor resolution, the per-requirement estimator, need/project rollup,
//! and the estimate-vs-real deviation.

mod deviation;
mod engine;
mod factors;
mod rollup;

pub use deviation::{deviation, Deviation};
pub use engine::{
    estimate_for_requirement, estimate_requirement, EntryEffort, RequirementEstimate,
    HOURS_PER_WORKDAY,
};
pub use factors::{resolve_element_factors, FactorSource};
pub use rollup::{
    sort_for_display, summarize_need, summarize_project, NeedSummary, ProjectSummary,
};
