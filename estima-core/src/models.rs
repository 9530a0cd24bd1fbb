use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use uuid::Uuid;

/// A project under estimation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    /// Unique identifier for the project (UUID)
    pub id: Uuid,

    /// Human-friendly code (e.g., "PRJ-001")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// Display name of the project
    pub name: String,

    /// Real effort in workdays, recorded after delivery.
    /// Absent or zero means "not yet recorded".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub real_effort_days: Option<f64>,

    /// When the project was created
    pub created_at: DateTime<Utc>,
}

impl Project {
    /// Creates a new project with the given name
    pub fn new(name: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            code: None, // Assigned when added to the store
            name,
            real_effort_days: None,
            created_at: Utc::now(),
        }
    }
}

/// A client requirements document attached to a project, the source of
/// extracted requirements
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Need {
    /// Unique identifier for the need (UUID)
    pub id: Uuid,

    /// Human-friendly code (e.g., "NEED-001")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// Short name describing the need
    pub name: String,

    /// Free-text body, often imported from an uploaded document
    pub body: String,

    /// Optional reference URL for the source document
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_url: Option<String>,

    /// The project this need belongs to
    pub project_id: Uuid,

    /// When the need was created
    pub created_at: DateTime<Utc>,
}

impl Need {
    /// Creates a new need under the given project
    pub fn new(name: String, body: String, project_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            code: None,
            name,
            body,
            reference_url: None,
            project_id,
            created_at: Utc::now(),
        }
    }
}

/// A discrete unit of scope extracted from or authored under a need
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Requirement {
    /// Unique identifier for the requirement (UUID)
    pub id: Uuid,

    /// Human-friendly code (e.g., "REQ-001")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// Short name describing the requirement
    pub name: String,

    /// Detailed description of the requirement
    pub body: String,

    /// The need this requirement belongs to
    pub need_id: Uuid,

    /// When the requirement was created
    pub created_at: DateTime<Utc>,
}

impl Requirement {
    /// Creates a new requirement under the given need
    pub fn new(name: String, body: String, need_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            code: None,
            name,
            body,
            need_id,
            created_at: Utc::now(),
        }
    }
}

/// A countable unit of implementation work (table, form, report, ...)
/// against which quantities are estimated. Immutable reference data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AffectedElementType {
    /// Stable identifier for the element type
    pub id: u32,
    /// Display label
    pub label: String,
}

impl fmt::Display for AffectedElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label)
    }
}

/// The fixed catalog of affected element types
pub fn default_element_types() -> Vec<AffectedElementType> {
    let labels = [
        "Tables",
        "Triggers / stored procedures",
        "Application interfaces",
        "Forms",
        "Complex subroutines",
        "Database interfaces",
        "Reports",
        "Components",
        "Script logic",
        "Configuration / test components",
        "Mobile deployment",
        "Quality assurance",
        "Direct function points",
    ];

    labels
        .iter()
        .enumerate()
        .map(|(i, label)| AffectedElementType {
            id: (i + 1) as u32,
            label: label.to_string(),
        })
        .collect()
}

/// Classification of estimation parameters.
///
/// Types with `has_affected_elements` participate multiplicatively, scaled
/// by the per-element complexity factor; the others contribute a flat
/// additive term regardless of element quantities.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParameterType {
    /// Unique identifier for the parameter type (UUID)
    pub id: Uuid,
    /// Display name (e.g., "Complexity", "Development type")
    pub name: String,
    /// Whether parameters of this type multiply per-element quantities
    pub has_affected_elements: bool,
}

impl ParameterType {
    pub fn new(name: String, has_affected_elements: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            has_affected_elements,
        }
    }
}

/// Name of the parameter type that selects per-element complexity factors
pub const COMPLEXITY_TYPE_NAME: &str = "Complexity";

/// Seeds the parameter type catalog for a new store
pub fn default_parameter_types() -> Vec<ParameterType> {
    vec![
        ParameterType::new(COMPLEXITY_TYPE_NAME.to_string(), true),
        ParameterType::new("Development type".to_string(), true),
        ParameterType::new("Project overhead".to_string(), false),
    ]
}

/// A weighting parameter of the estimation model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EstimationParameter {
    /// Unique identifier for the parameter (UUID)
    pub id: Uuid,

    /// The parameter type this parameter belongs to
    pub parameter_type_id: Uuid,

    /// Display name (e.g., "Medium", "New development")
    pub name: String,

    /// Manually curated factor
    #[serde(skip_serializing_if = "Option::is_none")]
    pub factor: Option<f64>,

    /// AI-suggested factor, preferred over `factor` when present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub factor_ia: Option<f64>,
}

impl EstimationParameter {
    pub fn new(name: String, parameter_type_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            parameter_type_id,
            name,
            factor: None,
            factor_ia: None,
        }
    }

    /// The factor to use in computations: `factor_ia` when present, else
    /// `factor`. Returns `None` when neither is recorded; the caller picks
    /// the default appropriate to its role (0 for effort terms, 1 for
    /// complexity multipliers).
    pub fn effective_factor(&self) -> Option<f64> {
        self.factor_ia.or(self.factor)
    }
}

/// The complexity multiplier for elements of a given type, keyed by
/// (element type, complexity parameter)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ElementComplexityFactor {
    /// The affected element type this factor applies to
    pub element_type_id: u32,

    /// The "Complexity" parameter this factor is selected by
    pub parameter_id: Uuid,

    /// Manually curated multiplier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub factor: Option<f64>,

    /// AI-suggested multiplier, preferred when present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub factor_ia: Option<f64>,
}

impl ElementComplexityFactor {
    /// The multiplier to use: `factor_ia` when present, else `factor`
    pub fn effective_factor(&self) -> Option<f64> {
        self.factor_ia.or(self.factor)
    }
}

/// What a function point entry records against its requirement.
///
/// The two shapes share one table in legacy data; here the discriminator is
/// explicit and resolved at the data-access boundary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntryKind {
    /// A quantity of a given affected element type.
    ///
    /// Quantities are unsigned: negative input is unrepresentable.
    ElementQuantity {
        element_type_id: u32,
        estimated_quantity: u32,
        #[serde(skip_serializing_if = "Option::is_none")]
        real_quantity: Option<u32>,
        /// Cached estimated effort for this single element, in workdays
        #[serde(skip_serializing_if = "Option::is_none")]
        estimated_effort_days: Option<f64>,
        /// Real effort for this single element, informational only
        #[serde(skip_serializing_if = "Option::is_none")]
        real_effort_days: Option<f64>,
    },
    /// A parameter chosen for the requirement (e.g., its complexity level)
    ParameterSelection { parameter_id: Uuid },
}

/// A function point record owned by exactly one requirement
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionPointEntry {
    /// Unique identifier for the entry (UUID)
    pub id: Uuid,

    /// The requirement this entry belongs to
    pub requirement_id: Uuid,

    /// When the entry was created
    pub created_at: DateTime<Utc>,

    /// What the entry records
    #[serde(flatten)]
    pub kind: EntryKind,
}

impl FunctionPointEntry {
    /// Creates an element-quantity entry
    pub fn element_quantity(
        requirement_id: Uuid,
        element_type_id: u32,
        estimated_quantity: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            requirement_id,
            created_at: Utc::now(),
            kind: EntryKind::ElementQuantity {
                element_type_id,
                estimated_quantity,
                real_quantity: None,
                estimated_effort_days: None,
                real_effort_days: None,
            },
        }
    }

    /// Creates a parameter-selection entry
    pub fn parameter_selection(requirement_id: Uuid, parameter_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            requirement_id,
            created_at: Utc::now(),
            kind: EntryKind::ParameterSelection { parameter_id },
        }
    }
}

/// Behavior switches for the estimation engine, persisted with the store
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EstimatorSettings {
    /// Whether additive parameters contribute when a requirement has no
    /// quantity entries. Default: skip, matching the majority of observed
    /// call sites.
    #[serde(default)]
    pub additive_on_empty: bool,
}

impl Default for EstimatorSettings {
    fn default() -> Self {
        Self {
            additive_on_empty: false,
        }
    }
}

/// Collection of all estimation data: entities plus the parameter catalogs
#[derive(Debug, Serialize, Deserialize)]
pub struct EstimationStore {
    /// Short name of the store
    #[serde(default)]
    pub name: String,

    /// Free-text description
    #[serde(default)]
    pub description: String,

    pub projects: Vec<Project>,
    pub needs: Vec<Need>,
    pub requirements: Vec<Requirement>,
    pub entries: Vec<FunctionPointEntry>,

    /// Immutable reference catalog of affected element types
    #[serde(default = "default_element_types")]
    pub element_types: Vec<AffectedElementType>,

    #[serde(default = "default_parameter_types")]
    pub parameter_types: Vec<ParameterType>,

    #[serde(default)]
    pub parameters: Vec<EstimationParameter>,

    #[serde(default)]
    pub complexity_factors: Vec<ElementComplexityFactor>,

    #[serde(default)]
    pub settings: EstimatorSettings,

    #[serde(default = "default_next_number")]
    pub next_project_number: u32,
    #[serde(default = "default_next_number")]
    pub next_need_number: u32,
    #[serde(default = "default_next_number")]
    pub next_requirement_number: u32,
}

fn default_next_number() -> u32 {
    1
}

impl EstimationStore {
    /// Creates an empty store with the default catalogs
    pub fn new() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            projects: Vec::new(),
            needs: Vec::new(),
            requirements: Vec::new(),
            entries: Vec::new(),
            element_types: default_element_types(),
            parameter_types: default_parameter_types(),
            parameters: Vec::new(),
            complexity_factors: Vec::new(),
            settings: EstimatorSettings::default(),
            next_project_number: 1,
            next_need_number: 1,
            next_requirement_number: 1,
        }
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    pub fn project_by_id(&self, id: &Uuid) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == *id)
    }

    pub fn project_by_id_mut(&mut self, id: &Uuid) -> Option<&mut Project> {
        self.projects.iter_mut().find(|p| p.id == *id)
    }

    pub fn need_by_id(&self, id: &Uuid) -> Option<&Need> {
        self.needs.iter().find(|n| n.id == *id)
    }

    pub fn requirement_by_id(&self, id: &Uuid) -> Option<&Requirement> {
        self.requirements.iter().find(|r| r.id == *id)
    }

    pub fn entry_by_id(&self, id: &Uuid) -> Option<&FunctionPointEntry> {
        self.entries.iter().find(|e| e.id == *id)
    }

    pub fn element_type(&self, id: u32) -> Option<&AffectedElementType> {
        self.element_types.iter().find(|e| e.id == id)
    }

    pub fn parameter_by_id(&self, id: &Uuid) -> Option<&EstimationParameter> {
        self.parameters.iter().find(|p| p.id == *id)
    }

    /// Resolves an entity reference given as a code ("PRJ-001") or a UUID
    pub fn project_by_ref(&self, reference: &str) -> Option<&Project> {
        if let Ok(id) = Uuid::parse_str(reference) {
            return self.project_by_id(&id);
        }
        self.projects
            .iter()
            .find(|p| p.code.as_deref() == Some(reference))
    }

    pub fn need_by_ref(&self, reference: &str) -> Option<&Need> {
        if let Ok(id) = Uuid::parse_str(reference) {
            return self.need_by_id(&id);
        }
        self.needs
            .iter()
            .find(|n| n.code.as_deref() == Some(reference))
    }

    pub fn requirement_by_ref(&self, reference: &str) -> Option<&Requirement> {
        if let Ok(id) = Uuid::parse_str(reference) {
            return self.requirement_by_id(&id);
        }
        self.requirements
            .iter()
            .find(|r| r.code.as_deref() == Some(reference))
    }

    /// All needs belonging to a project, in creation order
    pub fn needs_of(&self, project_id: &Uuid) -> Vec<&Need> {
        self.needs
            .iter()
            .filter(|n| n.project_id == *project_id)
            .collect()
    }

    /// All requirements belonging to a need, in creation order
    pub fn requirements_of(&self, need_id: &Uuid) -> Vec<&Requirement> {
        self.requirements
            .iter()
            .filter(|r| r.need_id == *need_id)
            .collect()
    }

    /// All function point entries belonging to a requirement
    pub fn entries_of(&self, requirement_id: &Uuid) -> Vec<&FunctionPointEntry> {
        self.entries
            .iter()
            .filter(|e| e.requirement_id == *requirement_id)
            .collect()
    }

    /// The parameter type that selects per-element complexity factors,
    /// matched by name case-insensitively
    pub fn complexity_type_id(&self) -> Option<Uuid> {
        self.parameter_types
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(COMPLEXITY_TYPE_NAME))
            .map(|t| t.id)
    }

    /// The complexity parameter selected on a requirement, if any: the first
    /// parameter-selection entry whose parameter belongs to the Complexity
    /// type
    pub fn selected_complexity(&self, requirement_id: &Uuid) -> Option<Uuid> {
        let complexity_type = self.complexity_type_id()?;
        self.entries_of(requirement_id)
            .iter()
            .filter_map(|e| match &e.kind {
                EntryKind::ParameterSelection { parameter_id } => Some(*parameter_id),
                _ => None,
            })
            .find(|pid| {
                self.parameter_by_id(pid)
                    .map(|p| p.parameter_type_id == complexity_type)
                    .unwrap_or(false)
            })
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Adds a project and assigns it a code
    pub fn add_project(&mut self, mut project: Project) -> Uuid {
        if project.code.is_none() {
            project.code = Some(format!("PRJ-{:03}", self.next_project_number));
            self.next_project_number += 1;
        }
        let id = project.id;
        self.projects.push(project);
        id
    }

    /// Adds a need and assigns it a code. Fails if the parent project does
    /// not exist.
    pub fn add_need(&mut self, mut need: Need) -> anyhow::Result<Uuid> {
        if self.project_by_id(&need.project_id).is_none() {
            anyhow::bail!("Project not found: {}", need.project_id);
        }
        if need.code.is_none() {
            need.code = Some(format!("NEED-{:03}", self.next_need_number));
            self.next_need_number += 1;
        }
        let id = need.id;
        self.needs.push(need);
        Ok(id)
    }

    /// Adds a requirement and assigns it a code. Fails if the parent need
    /// does not exist.
    pub fn add_requirement(&mut self, mut requirement: Requirement) -> anyhow::Result<Uuid> {
        if self.need_by_id(&requirement.need_id).is_none() {
            anyhow::bail!("Need not found: {}", requirement.need_id);
        }
        if requirement.code.is_none() {
            requirement.code = Some(format!("REQ-{:03}", self.next_requirement_number));
            self.next_requirement_number += 1;
        }
        let id = requirement.id;
        self.requirements.push(requirement);
        Ok(id)
    }

    /// Adds a function point entry. Fails if the parent requirement does not
    /// exist, or if the entry references an unknown element type or
    /// parameter.
    pub fn add_entry(&mut self, entry: FunctionPointEntry) -> anyhow::Result<Uuid> {
        if self.requirement_by_id(&entry.requirement_id).is_none() {
            anyhow::bail!("Requirement not found: {}", entry.requirement_id);
        }
        match &entry.kind {
            EntryKind::ElementQuantity {
                element_type_id, ..
            } => {
                if self.element_type(*element_type_id).is_none() {
                    anyhow::bail!("Unknown affected element type: {}", element_type_id);
                }
            }
            EntryKind::ParameterSelection { parameter_id } => {
                if self.parameter_by_id(parameter_id).is_none() {
                    anyhow::bail!("Parameter not found: {}", parameter_id);
                }
            }
        }
        let id = entry.id;
        self.entries.push(entry);
        Ok(id)
    }

    /// Records the real effort for a project, in workdays
    pub fn set_real_effort(&mut self, project_id: &Uuid, days: f64) -> anyhow::Result<()> {
        if days < 0.0 {
            anyhow::bail!("Real effort must not be negative");
        }
        let project = self
            .project_by_id_mut(project_id)
            .ok_or_else(|| anyhow::anyhow!("Project not found: {}", project_id))?;
        project.real_effort_days = if days == 0.0 { None } else { Some(days) };
        Ok(())
    }

    /// Writes cached per-entry estimated efforts back onto quantity entries
    pub fn apply_cached_efforts(&mut self, efforts: &[(Uuid, f64)]) {
        for (entry_id, days) in efforts {
            if let Some(entry) = self.entries.iter_mut().find(|e| e.id == *entry_id) {
                if let EntryKind::ElementQuantity {
                    estimated_effort_days,
                    ..
                } = &mut entry.kind
                {
                    *estimated_effort_days = Some(*days);
                }
            }
        }
    }

    // =========================================================================
    // Cascade deletion
    //
    // Children are removed before parents, in reference order:
    // entries -> requirements -> needs -> project.
    // =========================================================================

    /// Removes a function point entry
    pub fn remove_entry(&mut self, id: &Uuid) -> anyhow::Result<()> {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != *id);
        if self.entries.len() == before {
            anyhow::bail!("Entry not found: {}", id);
        }
        Ok(())
    }

    /// Removes a requirement and all of its entries
    pub fn remove_requirement(&mut self, id: &Uuid) -> anyhow::Result<()> {
        if self.requirement_by_id(id).is_none() {
            anyhow::bail!("Requirement not found: {}", id);
        }
        self.entries.retain(|e| e.requirement_id != *id);
        self.requirements.retain(|r| r.id != *id);
        Ok(())
    }

    /// Removes a need, its requirements, and their entries
    pub fn remove_need(&mut self, id: &Uuid) -> anyhow::Result<()> {
        if self.need_by_id(id).is_none() {
            anyhow::bail!("Need not found: {}", id);
        }
        let requirement_ids: Vec<Uuid> = self
            .requirements_of(id)
            .iter()
            .map(|r| r.id)
            .collect();
        for req_id in requirement_ids {
            self.remove_requirement(&req_id)?;
        }
        self.needs.retain(|n| n.id != *id);
        Ok(())
    }

    /// Removes a project and everything it owns
    pub fn remove_project(&mut self, id: &Uuid) -> anyhow::Result<()> {
        if self.project_by_id(id).is_none() {
            anyhow::bail!("Project not found: {}", id);
        }
        let need_ids: Vec<Uuid> = self.needs_of(id).iter().map(|n| n.id).collect();
        for need_id in need_ids {
            self.remove_need(&need_id)?;
        }
        self.projects.retain(|p| p.id != *id);
        Ok(())
    }

    // =========================================================================
    // Code assignment
    // =========================================================================

    /// Assigns codes to entities that don't have them yet
    pub fn assign_codes(&mut self) {
        for project in &mut self.projects {
            if project.code.is_none() {
                project.code = Some(format!("PRJ-{:03}", self.next_project_number));
                self.next_project_number += 1;
            }
        }
        for need in &mut self.needs {
            if need.code.is_none() {
                need.code = Some(format!("NEED-{:03}", self.next_need_number));
                self.next_need_number += 1;
            }
        }
        for requirement in &mut self.requirements {
            if requirement.code.is_none() {
                requirement.code = Some(format!("REQ-{:03}", self.next_requirement_number));
                self.next_requirement_number += 1;
            }
        }
    }

    /// Validates that all assigned codes are unique
    pub fn validate_unique_codes(&self) -> anyhow::Result<()> {
        let mut seen = HashSet::new();
        let codes = self
            .projects
            .iter()
            .filter_map(|p| p.code.as_deref())
            .chain(self.needs.iter().filter_map(|n| n.code.as_deref()))
            .chain(self.requirements.iter().filter_map(|r| r.code.as_deref()));

        for code in codes {
            if !seen.insert(code) {
                anyhow::bail!("Duplicate code found: {}", code);
            }
        }

        Ok(())
    }
}

impl Default for EstimationStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_project() -> (EstimationStore, Uuid) {
        let mut store = EstimationStore::new();
        let id = store.add_project(Project::new("Billing revamp".into()));
        (store, id)
    }

    #[test]
    fn test_code_assignment_on_add() {
        let (mut store, project_id) = store_with_project();
        assert_eq!(store.projects[0].code, Some("PRJ-001".into()));

        let need_id = store
            .add_need(Need::new("Invoicing".into(), "body".into(), project_id))
            .unwrap();
        assert_eq!(store.needs[0].code, Some("NEED-001".into()));

        store
            .add_requirement(Requirement::new("Export".into(), String::new(), need_id))
            .unwrap();
        store
            .add_requirement(Requirement::new("Import".into(), String::new(), need_id))
            .unwrap();
        assert_eq!(store.requirements[0].code, Some("REQ-001".into()));
        assert_eq!(store.requirements[1].code, Some("REQ-002".into()));
        assert_eq!(store.next_requirement_number, 3);
    }

    #[test]
    fn test_add_need_requires_project() {
        let mut store = EstimationStore::new();
        let result = store.add_need(Need::new("n".into(), "b".into(), Uuid::new_v4()));
        assert!(result.is_err());
    }

    #[test]
    fn test_add_entry_validates_references() {
        let (mut store, project_id) = store_with_project();
        let need_id = store
            .add_need(Need::new("n".into(), "b".into(), project_id))
            .unwrap();
        let req_id = store
            .add_requirement(Requirement::new("r".into(), String::new(), need_id))
            .unwrap();

        // Unknown element type rejected
        let bad = FunctionPointEntry::element_quantity(req_id, 99, 1);
        assert!(store.add_entry(bad).is_err());

        // Valid entry accepted
        let good = FunctionPointEntry::element_quantity(req_id, 1, 5);
        assert!(store.add_entry(good).is_ok());

        // Unknown parameter rejected
        let bad_param = FunctionPointEntry::parameter_selection(req_id, Uuid::new_v4());
        assert!(store.add_entry(bad_param).is_err());
    }

    #[test]
    fn test_cascade_delete_leaves_no_orphans() {
        // One project, one need, one requirement, two entries: deleting the
        // project must remove all four owned records.
        let (mut store, project_id) = store_with_project();
        let need_id = store
            .add_need(Need::new("n".into(), "b".into(), project_id))
            .unwrap();
        let req_id = store
            .add_requirement(Requirement::new("r".into(), String::new(), need_id))
            .unwrap();
        store
            .add_entry(FunctionPointEntry::element_quantity(req_id, 1, 5))
            .unwrap();
        store
            .add_entry(FunctionPointEntry::element_quantity(req_id, 4, 2))
            .unwrap();

        store.remove_project(&project_id).unwrap();

        assert!(store.projects.is_empty());
        assert!(store.needs.is_empty());
        assert!(store.requirements.is_empty());
        assert!(store.entries.is_empty());
    }

    #[test]
    fn test_remove_need_keeps_siblings() {
        let (mut store, project_id) = store_with_project();
        let need_a = store
            .add_need(Need::new("a".into(), String::new(), project_id))
            .unwrap();
        let need_b = store
            .add_need(Need::new("b".into(), String::new(), project_id))
            .unwrap();
        let req_a = store
            .add_requirement(Requirement::new("ra".into(), String::new(), need_a))
            .unwrap();
        let req_b = store
            .add_requirement(Requirement::new("rb".into(), String::new(), need_b))
            .unwrap();
        store
            .add_entry(FunctionPointEntry::element_quantity(req_a, 1, 1))
            .unwrap();
        store
            .add_entry(FunctionPointEntry::element_quantity(req_b, 1, 1))
            .unwrap();

        store.remove_need(&need_a).unwrap();

        assert_eq!(store.needs.len(), 1);
        assert_eq!(store.requirements.len(), 1);
        assert_eq!(store.entries.len(), 1);
        assert_eq!(store.entries[0].requirement_id, req_b);
    }

    #[test]
    fn test_effective_factor_prefers_factor_ia() {
        let type_id = Uuid::new_v4();
        let mut param = EstimationParameter::new("Medium".into(), type_id);
        assert_eq!(param.effective_factor(), None);

        param.factor = Some(1.5);
        assert_eq!(param.effective_factor(), Some(1.5));

        param.factor_ia = Some(2.0);
        assert_eq!(param.effective_factor(), Some(2.0));
    }

    #[test]
    fn test_selected_complexity() {
        let (mut store, project_id) = store_with_project();
        let need_id = store
            .add_need(Need::new("n".into(), String::new(), project_id))
            .unwrap();
        let req_id = store
            .add_requirement(Requirement::new("r".into(), String::new(), need_id))
            .unwrap();

        let complexity_type = store.complexity_type_id().unwrap();
        let other_type = store
            .parameter_types
            .iter()
            .find(|t| t.id != complexity_type)
            .unwrap()
            .id;

        let medium = EstimationParameter::new("Medium".into(), complexity_type);
        let medium_id = medium.id;
        let other = EstimationParameter::new("Rewrite".into(), other_type);
        let other_id = other.id;
        store.parameters.push(medium);
        store.parameters.push(other);

        // A non-complexity selection does not count
        store
            .add_entry(FunctionPointEntry::parameter_selection(req_id, other_id))
            .unwrap();
        assert_eq!(store.selected_complexity(&req_id), None);

        store
            .add_entry(FunctionPointEntry::parameter_selection(req_id, medium_id))
            .unwrap();
        assert_eq!(store.selected_complexity(&req_id), Some(medium_id));
    }

    #[test]
    fn test_set_real_effort() {
        let (mut store, project_id) = store_with_project();

        assert!(store.set_real_effort(&project_id, -1.0).is_err());

        store.set_real_effort(&project_id, 36.0).unwrap();
        assert_eq!(
            store.project_by_id(&project_id).unwrap().real_effort_days,
            Some(36.0)
        );

        // Zero means "not recorded"
        store.set_real_effort(&project_id, 0.0).unwrap();
        assert_eq!(store.project_by_id(&project_id).unwrap().real_effort_days, None);
    }

    #[test]
    fn test_validate_unique_codes_duplicate() {
        let (mut store, _) = store_with_project();
        let mut dup = Project::new("Other".into());
        dup.code = Some("PRJ-001".into());
        store.projects.push(dup);

        let result = store.validate_unique_codes();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Duplicate code"));
    }

    #[test]
    fn test_default_element_types_catalog() {
        let types = default_element_types();
        assert_eq!(types.len(), 13);
        assert_eq!(types[0].id, 1);
        assert_eq!(types[0].label, "Tables");
        assert_eq!(types[12].id, 13);
    }
}
