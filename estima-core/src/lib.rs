pub mod ai;
pub mod catalog;
pub mod db;
pub mod estimate;
pub mod export;
pub mod models;
pub mod registry;

// Re-export commonly used types
pub use ai::{
    extract_requirements, AiClient, AiError, AiMode, ExtractedRequirement, ExtractionConfig,
    ExtractionOutcome,
};
pub use catalog::{Catalog, CatalogCache, CatalogError};
pub use db::{
    create_backend, export_to_json, import_from_json, migrate_sqlite_to_yaml,
    migrate_yaml_to_sqlite, open_or_create, BackendType, SqliteBackend, StoreBackend, StoreStats,
    YamlBackend,
};
pub use estimate::{
    deviation, estimate_for_requirement, estimate_requirement, resolve_element_factors,
    sort_for_display, summarize_need, summarize_project, Deviation, EntryEffort, FactorSource,
    NeedSummary, ProjectSummary, RequirementEstimate, HOURS_PER_WORKDAY,
};
pub use export::{render_project_report, ExportFormat};
pub use models::{
    default_element_types, default_parameter_types, AffectedElementType, ElementComplexityFactor,
    EntryKind, EstimationParameter, EstimationStore, EstimatorSettings, FunctionPointEntry, Need,
    ParameterType, Project, Requirement, COMPLEXITY_TYPE_NAME,
};
pub use registry::{determine_store_path, registry_path, Registry, RegistryEntry};
