//! YAML file storage backend
//!
//! Stores all data in a single YAML file, with advisory file locking for
//! rudimentary multi-user support. Concurrent writers are serialized per
//! whole-file save; nothing reconciles interleaved edits (last write wins).

use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::models::EstimationStore;

use super::traits::{BackendType, StoreBackend};

/// YAML file backend implementation
pub struct YamlBackend {
    file_path: PathBuf,
    lock_file_path: PathBuf,
}

impl YamlBackend {
    /// Creates a new YAML backend for the given file path
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let file_path = path.as_ref().to_path_buf();
        let lock_file_path = file_path.with_extension("yaml.lock");
        Self {
            file_path,
            lock_file_path,
        }
    }

    /// Acquire an exclusive lock on the file for writing.
    /// Returns the lock file handle which must be held during the operation.
    fn acquire_write_lock(&self) -> Result<File> {
        if let Some(parent) = self.lock_file_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let lock_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.lock_file_path)
            .with_context(|| format!("Failed to create lock file: {:?}", self.lock_file_path))?;

        let start = std::time::Instant::now();
        let timeout = Duration::from_secs(5);

        loop {
            match FileExt::try_lock_exclusive(&lock_file) {
                Ok(()) => return Ok(lock_file),
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    if start.elapsed() > timeout {
                        anyhow::bail!(
                            "Timeout waiting for file lock - another user may be editing: {:?}",
                            self.file_path
                        );
                    }
                    std::thread::sleep(Duration::from_millis(100));
                }
                Err(e) => {
                    return Err(e).with_context(|| {
                        format!("Failed to acquire lock on {:?}", self.lock_file_path)
                    })
                }
            }
        }
    }

    /// Acquire a shared lock on the file for reading
    fn acquire_read_lock(&self) -> Result<Option<File>> {
        if !self.lock_file_path.exists() {
            return Ok(None);
        }

        let lock_file = OpenOptions::new()
            .read(true)
            .open(&self.lock_file_path)
            .with_context(|| format!("Failed to open lock file: {:?}", self.lock_file_path))?;

        let start = std::time::Instant::now();
        let timeout = Duration::from_secs(5);

        loop {
            match FileExt::try_lock_shared(&lock_file) {
                Ok(()) => return Ok(Some(lock_file)),
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    if start.elapsed() > timeout {
                        anyhow::bail!(
                            "Timeout waiting for file lock - another user may be editing: {:?}",
                            self.file_path
                        );
                    }
                    std::thread::sleep(Duration::from_millis(100));
                }
                Err(e) => {
                    return Err(e).with_context(|| {
                        format!("Failed to acquire lock on {:?}", self.lock_file_path)
                    })
                }
            }
        }
    }
}

impl StoreBackend for YamlBackend {
    fn backend_type(&self) -> BackendType {
        BackendType::Yaml
    }

    fn path(&self) -> &Path {
        &self.file_path
    }

    fn load(&self) -> Result<EstimationStore> {
        // Create the file if it doesn't exist
        if !self.file_path.exists() {
            let default_store = EstimationStore::new();
            self.save(&default_store)?;
            return Ok(default_store);
        }

        let lock = self.acquire_read_lock()?;

        let file = File::open(&self.file_path)
            .with_context(|| format!("Failed to open file: {:?}", self.file_path))?;
        let reader = BufReader::new(file);

        let mut store: EstimationStore = serde_yaml::from_reader(reader)
            .with_context(|| format!("Failed to parse YAML from {:?}", self.file_path))?;

        // Assign codes to records imported without them
        let had_missing_codes = store.projects.iter().any(|p| p.code.is_none())
            || store.needs.iter().any(|n| n.code.is_none())
            || store.requirements.iter().any(|r| r.code.is_none());
        store.assign_codes();

        // Drop the read lock before acquiring the write lock for the
        // migration save
        drop(lock);

        if had_missing_codes {
            self.save(&store)?;
        }

        store.validate_unique_codes()?;

        Ok(store)
    }

    fn save(&self, store: &EstimationStore) -> Result<()> {
        let _lock = self.acquire_write_lock()?;

        if let Some(parent) = self.file_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let yaml = serde_yaml::to_string(store)
            .context("Failed to serialize estimation store to YAML")?;
        fs::write(&self.file_path, yaml)
            .with_context(|| format!("Failed to write file: {:?}", self.file_path))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FunctionPointEntry, Need, Project, Requirement};
    use tempfile::TempDir;

    #[test]
    fn test_yaml_backend_create_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("test.yaml");
        let backend = YamlBackend::new(&file_path);

        // Should create file with an empty store
        backend.create_if_not_exists().unwrap();

        let store = backend.load().unwrap();
        assert!(store.projects.is_empty());
        assert_eq!(store.element_types.len(), 13);
    }

    #[test]
    fn test_yaml_backend_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let backend = YamlBackend::new(temp_dir.path().join("test.yaml"));

        let mut store = EstimationStore::new();
        store.name = "Test store".to_string();
        let project_id = store.add_project(Project::new("p".into()));
        let need_id = store
            .add_need(Need::new("n".into(), "body".into(), project_id))
            .unwrap();
        let req_id = store
            .add_requirement(Requirement::new("r".into(), String::new(), need_id))
            .unwrap();
        store
            .add_entry(FunctionPointEntry::element_quantity(req_id, 1, 5))
            .unwrap();

        backend.save(&store).unwrap();

        let loaded = backend.load().unwrap();
        assert_eq!(loaded.name, "Test store");
        assert_eq!(loaded.projects.len(), 1);
        assert_eq!(loaded.entries.len(), 1);
        assert_eq!(loaded.entries[0], store.entries[0]);
    }

    #[test]
    fn test_update_atomically() {
        let temp_dir = TempDir::new().unwrap();
        let backend = YamlBackend::new(temp_dir.path().join("test.yaml"));

        backend
            .update_atomically(|store| {
                store.add_project(Project::new("p".into()));
                Ok(())
            })
            .unwrap();

        let loaded = backend.load().unwrap();
        assert_eq!(loaded.projects.len(), 1);
        assert_eq!(loaded.projects[0].code, Some("PRJ-001".into()));
    }
}
