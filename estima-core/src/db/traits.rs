//! Storage abstraction traits
//!
//! This module defines the core trait that all storage backends must
//! implement.

use anyhow::Result;
use std::path::Path;
use uuid::Uuid;

use crate::models::{
    EstimationStore, EstimatorSettings, FunctionPointEntry, Need, Project, Requirement,
};

/// Types of storage backends available
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendType {
    /// YAML file storage (single file)
    Yaml,
    /// SQLite database storage
    Sqlite,
}

impl std::fmt::Display for BackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendType::Yaml => write!(f, "YAML"),
            BackendType::Sqlite => write!(f, "SQLite"),
        }
    }
}

/// Core trait for storage backends
///
/// `load()` and `save()` work with the full `EstimationStore`; the CRUD
/// operations are provided on top of them so backends only have to
/// implement the two primitives. Deletions cascade child records before
/// parents through the store's own removal methods.
pub trait StoreBackend: Send + Sync {
    /// Returns the backend type
    fn backend_type(&self) -> BackendType;

    /// Returns the path to the store file
    fn path(&self) -> &Path;

    /// Loads the entire store
    fn load(&self) -> Result<EstimationStore>;

    /// Saves the entire store
    fn save(&self, store: &EstimationStore) -> Result<()>;

    /// Loads, applies changes, and saves. The closure's error aborts the
    /// save.
    fn update_atomically<F>(&self, update_fn: F) -> Result<EstimationStore>
    where
        F: FnOnce(&mut EstimationStore) -> Result<()>,
        Self: Sized,
    {
        let mut store = self.load()?;
        update_fn(&mut store)?;
        self.save(&store)?;
        Ok(store)
    }

    // =========================================================================
    // Project operations
    // =========================================================================

    fn get_project(&self, id: &Uuid) -> Result<Option<Project>> {
        let store = self.load()?;
        Ok(store.project_by_id(id).cloned())
    }

    fn list_projects(&self) -> Result<Vec<Project>> {
        Ok(self.load()?.projects)
    }

    /// Adds a project; returns it with its assigned code
    fn add_project(&self, project: Project) -> Result<Project> {
        let mut store = self.load()?;
        let id = store.add_project(project);
        self.save(&store)?;
        Ok(store.project_by_id(&id).cloned().expect("just added"))
    }

    /// Deletes a project and everything it owns, children first
    fn delete_project(&self, id: &Uuid) -> Result<()> {
        let mut store = self.load()?;
        store.remove_project(id)?;
        self.save(&store)
    }

    /// Records a project's real effort in workdays
    fn set_real_effort(&self, id: &Uuid, days: f64) -> Result<()> {
        let mut store = self.load()?;
        store.set_real_effort(id, days)?;
        self.save(&store)
    }

    // =========================================================================
    // Need operations
    // =========================================================================

    fn add_need(&self, need: Need) -> Result<Need> {
        let mut store = self.load()?;
        let id = store.add_need(need)?;
        self.save(&store)?;
        Ok(store.need_by_id(&id).cloned().expect("just added"))
    }

    fn delete_need(&self, id: &Uuid) -> Result<()> {
        let mut store = self.load()?;
        store.remove_need(id)?;
        self.save(&store)
    }

    // =========================================================================
    // Requirement operations
    // =========================================================================

    fn add_requirement(&self, requirement: Requirement) -> Result<Requirement> {
        let mut store = self.load()?;
        let id = store.add_requirement(requirement)?;
        self.save(&store)?;
        Ok(store.requirement_by_id(&id).cloned().expect("just added"))
    }

    fn delete_requirement(&self, id: &Uuid) -> Result<()> {
        let mut store = self.load()?;
        store.remove_requirement(id)?;
        self.save(&store)
    }

    // =========================================================================
    // Entry operations
    // =========================================================================

    fn add_entry(&self, entry: FunctionPointEntry) -> Result<Uuid> {
        let mut store = self.load()?;
        let id = store.add_entry(entry)?;
        self.save(&store)?;
        Ok(id)
    }

    fn delete_entry(&self, id: &Uuid) -> Result<()> {
        let mut store = self.load()?;
        store.remove_entry(id)?;
        self.save(&store)
    }

    // =========================================================================
    // Settings
    // =========================================================================

    fn update_settings(&self, settings: EstimatorSettings) -> Result<()> {
        let mut store = self.load()?;
        store.settings = settings;
        self.save(&store)
    }

    // =========================================================================
    // Utility operations
    // =========================================================================

    /// Returns true if the store file exists
    fn exists(&self) -> bool {
        self.path().exists()
    }

    /// Creates the store with default/empty data if it doesn't exist
    fn create_if_not_exists(&self) -> Result<()> {
        if !self.exists() {
            self.save(&EstimationStore::new())?;
        }
        Ok(())
    }

    /// Returns statistics about the store
    fn stats(&self) -> Result<StoreStats> {
        let store = self.load()?;
        Ok(StoreStats {
            project_count: store.projects.len(),
            need_count: store.needs.len(),
            requirement_count: store.requirements.len(),
            entry_count: store.entries.len(),
            parameter_count: store.parameters.len(),
            backend_type: self.backend_type(),
        })
    }
}

/// Statistics about a store
#[derive(Debug, Clone)]
pub struct StoreStats {
    pub project_count: usize,
    pub need_count: usize,
    pub requirement_count: usize,
    pub entry_count: usize,
    pub parameter_count: usize,
    pub backend_type: BackendType,
}
