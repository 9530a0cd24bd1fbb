//! Storage abstraction layer
//!
//! Provides a trait-based abstraction over storage backends so the system
//! can use a plain YAML file or a SQLite database behind one interface.

mod migration;
mod sqlite_backend;
mod traits;
mod yaml_backend;

pub use migration::{export_to_json, import_from_json, migrate_sqlite_to_yaml, migrate_yaml_to_sqlite};
pub use sqlite_backend::SqliteBackend;
pub use traits::{BackendType, StoreBackend, StoreStats};
pub use yaml_backend::YamlBackend;

use anyhow::Result;
use std::path::Path;

/// Creates a storage backend based on the file extension or explicit type
pub fn create_backend(path: &Path, backend_type: Option<BackendType>) -> Result<Box<dyn StoreBackend>> {
    let bt = backend_type.unwrap_or_else(|| {
        // Infer from file extension
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => BackendType::Yaml,
            Some("db") | Some("sqlite") | Some("sqlite3") => BackendType::Sqlite,
            _ => BackendType::Yaml, // Default to YAML
        }
    });

    match bt {
        BackendType::Yaml => Ok(Box::new(YamlBackend::new(path))),
        BackendType::Sqlite => Ok(Box::new(SqliteBackend::new(path)?)),
    }
}

/// Opens an existing store or creates a new one
pub fn open_or_create(path: &Path, backend_type: Option<BackendType>) -> Result<Box<dyn StoreBackend>> {
    let backend = create_backend(path, backend_type)?;
    backend.create_if_not_exists()?;
    Ok(backend)
}
