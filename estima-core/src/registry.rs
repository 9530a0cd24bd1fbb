//! Per-user registry of estimation stores
//!
//! Lets the CLI refer to store files by name instead of path. The registry
//! lives under the user config directory as a small YAML file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Default store file name used when nothing else is configured
const DEFAULT_STORE_FILE: &str = "estima.yaml";

/// Environment variable overriding the fallback store path
const STORE_ENV_VAR: &str = "ESTIMA_STORE";

/// A registered store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryEntry {
    /// Path to the store file
    pub path: String,
    /// Description of the store
    pub description: String,
}

/// Registry of all known stores
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Registry {
    pub stores: HashMap<String, RegistryEntry>,
    /// Optional default store name
    pub default_store: Option<String>,
}

impl Registry {
    /// Loads the registry from the provided path
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read registry file: {:?}", path.as_ref()))?;

        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse registry file: {:?}", path.as_ref()))
    }

    /// Loads the registry, or an empty one if the file doesn't exist yet
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Gets a store by name
    pub fn get_store(&self, name: &str) -> Option<&RegistryEntry> {
        self.stores.get(name)
    }

    /// Lists all store names with their descriptions, sorted by name
    pub fn list_stores(&self) -> Vec<(&str, &RegistryEntry)> {
        let mut stores: Vec<(&str, &RegistryEntry)> = self
            .stores
            .iter()
            .map(|(name, entry)| (name.as_str(), entry))
            .collect();
        stores.sort_by_key(|(name, _)| *name);
        stores
    }

    /// Registers a new store or updates an existing one
    pub fn register_store(&mut self, name: String, path: String, description: String) {
        self.stores.insert(name, RegistryEntry { path, description });
    }

    /// Sets a store as the default
    pub fn set_default_store(&mut self, name: &str) -> Result<()> {
        if !self.stores.contains_key(name) {
            anyhow::bail!("Store '{}' not found in registry", name);
        }
        self.default_store = Some(name.to_string());
        Ok(())
    }

    /// Gets the default store if set
    pub fn get_default_store(&self) -> Option<(&str, &RegistryEntry)> {
        let name = self.default_store.as_deref()?;
        self.stores.get(name).map(|entry| (name, entry))
    }

    /// Saves the registry to the specified path
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(&self)?;

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(&path, content)
            .with_context(|| format!("Failed to write registry to {:?}", path.as_ref()))?;

        Ok(())
    }
}

/// Path to the per-user registry file
pub fn registry_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir().context("Could not determine user config directory")?;
    Ok(config_dir.join("estima").join("registry.yaml"))
}

/// Resolves which store file to use.
///
/// Resolution order: explicit file path, named registry store, registry
/// default, `ESTIMA_STORE` environment variable, `./estima.yaml`.
pub fn determine_store_path(file: Option<&str>, store_name: Option<&str>) -> Result<PathBuf> {
    if let Some(file) = file {
        return Ok(PathBuf::from(file));
    }

    let registry = Registry::load_or_default(registry_path()?)?;

    if let Some(name) = store_name {
        let entry = registry
            .get_store(name)
            .with_context(|| format!("Store '{}' not found in registry", name))?;
        return Ok(PathBuf::from(&entry.path));
    }

    if let Some((_, entry)) = registry.get_default_store() {
        return Ok(PathBuf::from(&entry.path));
    }

    if let Ok(path) = std::env::var(STORE_ENV_VAR) {
        if !path.is_empty() {
            return Ok(PathBuf::from(path));
        }
    }

    Ok(PathBuf::from(DEFAULT_STORE_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_register_and_default() {
        let mut registry = Registry::default();
        registry.register_store(
            "billing".into(),
            "/tmp/billing.yaml".into(),
            "Billing estimates".into(),
        );

        assert!(registry.get_store("billing").is_some());
        assert!(registry.set_default_store("missing").is_err());

        registry.set_default_store("billing").unwrap();
        let (name, entry) = registry.get_default_store().unwrap();
        assert_eq!(name, "billing");
        assert_eq!(entry.path, "/tmp/billing.yaml");
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("registry.yaml");

        let mut registry = Registry::default();
        registry.register_store("a".into(), "a.yaml".into(), String::new());
        registry.register_store("b".into(), "b.yaml".into(), String::new());
        registry.save(&path).unwrap();

        let loaded = Registry::load(&path).unwrap();
        assert_eq!(loaded.stores.len(), 2);
        let names: Vec<&str> = loaded.list_stores().iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = TempDir::new().unwrap();
        let registry = Registry::load_or_default(dir.path().join("none.yaml")).unwrap();
        assert!(registry.stores.is_empty());
    }

    #[test]
    fn test_explicit_file_wins() {
        let path = determine_store_path(Some("custom.yaml"), None).unwrap();
        assert_eq!(path, PathBuf::from("custom.yaml"));
    }
}
