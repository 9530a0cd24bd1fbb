//! Migration utilities for converting between storage backends
//!
//! Provides functions to migrate data between YAML and SQLite backends, as
//! well as import/export to JSON format for interoperability.

use anyhow::{Context, Result};
use std::path::Path;

use crate::models::EstimationStore;

use super::traits::StoreBackend;
use super::{SqliteBackend, YamlBackend};

/// Migrates data from a YAML file to a SQLite database.
///
/// Returns the number of projects migrated.
pub fn migrate_yaml_to_sqlite<P1: AsRef<Path>, P2: AsRef<Path>>(
    yaml_path: P1,
    sqlite_path: P2,
) -> Result<usize> {
    let yaml_backend = YamlBackend::new(yaml_path);
    let sqlite_backend = SqliteBackend::new(sqlite_path)?;

    let store = yaml_backend.load().context("Failed to load YAML store")?;

    let project_count = store.projects.len();

    sqlite_backend
        .save(&store)
        .context("Failed to save to SQLite database")?;

    Ok(project_count)
}

/// Migrates data from a SQLite database to a YAML file.
///
/// Returns the number of projects migrated.
pub fn migrate_sqlite_to_yaml<P1: AsRef<Path>, P2: AsRef<Path>>(
    sqlite_path: P1,
    yaml_path: P2,
) -> Result<usize> {
    let sqlite_backend = SqliteBackend::new(sqlite_path)?;
    let yaml_backend = YamlBackend::new(yaml_path);

    let store = sqlite_backend
        .load()
        .context("Failed to load SQLite store")?;

    let project_count = store.projects.len();

    yaml_backend
        .save(&store)
        .context("Failed to save to YAML file")?;

    Ok(project_count)
}

/// Exports an EstimationStore to a JSON file.
///
/// JSON format is useful for interoperability with other systems and for
/// backup/restore.
pub fn export_to_json<P: AsRef<Path>>(store: &EstimationStore, json_path: P) -> Result<()> {
    let json = serde_json::to_string_pretty(store).context("Failed to serialize store to JSON")?;
    std::fs::write(&json_path, json)
        .with_context(|| format!("Failed to write JSON to {:?}", json_path.as_ref()))?;
    Ok(())
}

/// Imports an EstimationStore from a JSON file
pub fn import_from_json<P: AsRef<Path>>(json_path: P) -> Result<EstimationStore> {
    let content = std::fs::read_to_string(&json_path)
        .with_context(|| format!("Failed to read JSON from {:?}", json_path.as_ref()))?;
    let mut store: EstimationStore =
        serde_json::from_str(&content).context("Failed to parse JSON store")?;
    store.assign_codes();
    store.validate_unique_codes()?;
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Need, Project, Requirement};
    use tempfile::TempDir;

    fn sample_store() -> EstimationStore {
        let mut store = EstimationStore::new();
        store.name = "Migrated".into();
        let project_id = store.add_project(Project::new("p".into()));
        let need_id = store
            .add_need(Need::new("n".into(), "body".into(), project_id))
            .unwrap();
        store
            .add_requirement(Requirement::new("r".into(), String::new(), need_id))
            .unwrap();
        store
    }

    #[test]
    fn test_yaml_to_sqlite_round_trip() {
        let dir = TempDir::new().unwrap();
        let yaml_path = dir.path().join("store.yaml");
        let sqlite_path = dir.path().join("store.db");

        YamlBackend::new(&yaml_path).save(&sample_store()).unwrap();

        let migrated = migrate_yaml_to_sqlite(&yaml_path, &sqlite_path).unwrap();
        assert_eq!(migrated, 1);

        let loaded = SqliteBackend::new(&sqlite_path).unwrap().load().unwrap();
        assert_eq!(loaded.name, "Migrated");
        assert_eq!(loaded.requirements.len(), 1);
    }

    #[test]
    fn test_json_export_import() {
        let dir = TempDir::new().unwrap();
        let json_path = dir.path().join("store.json");

        let store = sample_store();
        export_to_json(&store, &json_path).unwrap();

        let imported = import_from_json(&json_path).unwrap();
        assert_eq!(imported.name, "Migrated");
        assert_eq!(imported.projects.len(), 1);
        assert_eq!(imported.needs[0].code, Some("NEED-001".into()));
    }
}
