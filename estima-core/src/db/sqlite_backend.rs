//! SQLite storage backend
//!
//! Stores the estimation data in a SQLite database file, providing better
//! concurrent access and query performance than the single YAML file.

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use uuid::Uuid;

use crate::estimate::FactorSource;
use crate::models::{
    AffectedElementType, ElementComplexityFactor, EntryKind, EstimationParameter,
    EstimationStore, EstimatorSettings, FunctionPointEntry, Need, ParameterType, Project,
    Requirement,
};

use super::traits::{BackendType, StoreBackend};

/// Current schema version
const SCHEMA_VERSION: i32 = 1;

/// SQLite backend implementation
pub struct SqliteBackend {
    path: PathBuf,
    conn: Mutex<Connection>,
}

impl SqliteBackend {
    /// Creates a new SQLite backend
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(&path)?;

        // Enable WAL mode for better concurrent access
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;

        let backend = Self {
            path,
            conn: Mutex::new(conn),
        };

        backend.init_schema()?;
        Ok(backend)
    }

    /// Initialize the database schema
    fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();

        let current_version: i32 = conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .unwrap_or(0);

        if current_version == 0 {
            conn.execute_batch(include_str!("schema.sql"))?;
        } else if current_version < SCHEMA_VERSION {
            anyhow::bail!(
                "Database schema version {} is outdated, expected {}",
                current_version,
                SCHEMA_VERSION
            );
        }

        Ok(())
    }

    fn parse_uuid(s: &str) -> Result<Uuid> {
        Uuid::parse_str(s).with_context(|| format!("Invalid UUID in database: {}", s))
    }

    fn parse_timestamp(s: &str) -> chrono::DateTime<chrono::Utc> {
        chrono::DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&chrono::Utc))
            .unwrap_or_else(|_| chrono::Utc::now())
    }

    fn load_projects(&self, conn: &Connection) -> Result<Vec<Project>> {
        let mut stmt = conn.prepare(
            "SELECT id, code, name, real_effort_days, created_at
             FROM projects ORDER BY created_at",
        )?;

        let rows = stmt.query_map([], |row| {
            let id: String = row.get(0)?;
            let code: Option<String> = row.get(1)?;
            let name: String = row.get(2)?;
            let real_effort_days: Option<f64> = row.get(3)?;
            let created_at: String = row.get(4)?;
            Ok((id, code, name, real_effort_days, created_at))
        })?;

        let mut projects = Vec::new();
        for row in rows {
            let (id, code, name, real_effort_days, created_at) = row?;
            projects.push(Project {
                id: Self::parse_uuid(&id)?,
                code,
                name,
                real_effort_days,
                created_at: Self::parse_timestamp(&created_at),
            });
        }
        Ok(projects)
    }

    fn load_needs(&self, conn: &Connection) -> Result<Vec<Need>> {
        let mut stmt = conn.prepare(
            "SELECT id, code, name, body, reference_url, project_id, created_at
             FROM needs ORDER BY created_at",
        )?;

        let rows = stmt.query_map([], |row| {
            let id: String = row.get(0)?;
            let code: Option<String> = row.get(1)?;
            let name: String = row.get(2)?;
            let body: String = row.get(3)?;
            let reference_url: Option<String> = row.get(4)?;
            let project_id: String = row.get(5)?;
            let created_at: String = row.get(6)?;
            Ok((id, code, name, body, reference_url, project_id, created_at))
        })?;

        let mut needs = Vec::new();
        for row in rows {
            let (id, code, name, body, reference_url, project_id, created_at) = row?;
            needs.push(Need {
                id: Self::parse_uuid(&id)?,
                code,
                name,
                body,
                reference_url,
                project_id: Self::parse_uuid(&project_id)?,
                created_at: Self::parse_timestamp(&created_at),
            });
        }
        Ok(needs)
    }

    fn load_requirements(&self, conn: &Connection) -> Result<Vec<Requirement>> {
        let mut stmt = conn.prepare(
            "SELECT id, code, name, body, need_id, created_at
             FROM requirements ORDER BY created_at",
        )?;

        let rows = stmt.query_map([], |row| {
            let id: String = row.get(0)?;
            let code: Option<String> = row.get(1)?;
            let name: String = row.get(2)?;
            let body: String = row.get(3)?;
            let need_id: String = row.get(4)?;
            let created_at: String = row.get(5)?;
            Ok((id, code, name, body, need_id, created_at))
        })?;

        let mut requirements = Vec::new();
        for row in rows {
            let (id, code, name, body, need_id, created_at) = row?;
            requirements.push(Requirement {
                id: Self::parse_uuid(&id)?,
                code,
                name,
                body,
                need_id: Self::parse_uuid(&need_id)?,
                created_at: Self::parse_timestamp(&created_at),
            });
        }
        Ok(requirements)
    }

    /// Loads function point entries, resolving the row shape through the
    /// explicit kind discriminator
    fn load_entries(&self, conn: &Connection) -> Result<Vec<FunctionPointEntry>> {
        let mut stmt = conn.prepare(
            "SELECT id, requirement_id, kind, element_type_id, estimated_quantity,
                    real_quantity, estimated_effort_days, real_effort_days,
                    parameter_id, created_at
             FROM fp_entries ORDER BY created_at",
        )?;

        let rows = stmt.query_map([], |row| {
            let id: String = row.get(0)?;
            let requirement_id: String = row.get(1)?;
            let kind: String = row.get(2)?;
            let element_type_id: Option<u32> = row.get(3)?;
            let estimated_quantity: Option<u32> = row.get(4)?;
            let real_quantity: Option<u32> = row.get(5)?;
            let estimated_effort_days: Option<f64> = row.get(6)?;
            let real_effort_days: Option<f64> = row.get(7)?;
            let parameter_id: Option<String> = row.get(8)?;
            let created_at: String = row.get(9)?;
            Ok((
                id,
                requirement_id,
                kind,
                element_type_id,
                estimated_quantity,
                real_quantity,
                estimated_effort_days,
                real_effort_days,
                parameter_id,
                created_at,
            ))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (
                id,
                requirement_id,
                kind,
                element_type_id,
                estimated_quantity,
                real_quantity,
                estimated_effort_days,
                real_effort_days,
                parameter_id,
                created_at,
            ) = row?;

            let kind = match kind.as_str() {
                "element_quantity" => EntryKind::ElementQuantity {
                    element_type_id: element_type_id
                        .context("element_quantity row without element_type_id")?,
                    estimated_quantity: estimated_quantity.unwrap_or(0),
                    real_quantity,
                    estimated_effort_days,
                    real_effort_days,
                },
                "parameter_selection" => EntryKind::ParameterSelection {
                    parameter_id: Self::parse_uuid(
                        &parameter_id.context("parameter_selection row without parameter_id")?,
                    )?,
                },
                other => anyhow::bail!("Unknown entry kind in database: {}", other),
            };

            entries.push(FunctionPointEntry {
                id: Self::parse_uuid(&id)?,
                requirement_id: Self::parse_uuid(&requirement_id)?,
                created_at: Self::parse_timestamp(&created_at),
                kind,
            });
        }
        Ok(entries)
    }

    fn load_element_types(&self, conn: &Connection) -> Result<Vec<AffectedElementType>> {
        let mut stmt = conn.prepare("SELECT id, label FROM element_types ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok(AffectedElementType {
                id: row.get(0)?,
                label: row.get(1)?,
            })
        })?;

        let mut types = Vec::new();
        for row in rows {
            types.push(row?);
        }
        Ok(types)
    }

    fn load_parameter_types(&self, conn: &Connection) -> Result<Vec<ParameterType>> {
        let mut stmt =
            conn.prepare("SELECT id, name, has_affected_elements FROM parameter_types")?;
        let rows = stmt.query_map([], |row| {
            let id: String = row.get(0)?;
            let name: String = row.get(1)?;
            let has_affected_elements: bool = row.get(2)?;
            Ok((id, name, has_affected_elements))
        })?;

        let mut types = Vec::new();
        for row in rows {
            let (id, name, has_affected_elements) = row?;
            types.push(ParameterType {
                id: Self::parse_uuid(&id)?,
                name,
                has_affected_elements,
            });
        }
        Ok(types)
    }

    fn load_parameters(&self, conn: &Connection) -> Result<Vec<EstimationParameter>> {
        let mut stmt = conn
            .prepare("SELECT id, parameter_type_id, name, factor, factor_ia FROM parameters")?;
        let rows = stmt.query_map([], |row| {
            let id: String = row.get(0)?;
            let parameter_type_id: String = row.get(1)?;
            let name: String = row.get(2)?;
            let factor: Option<f64> = row.get(3)?;
            let factor_ia: Option<f64> = row.get(4)?;
            Ok((id, parameter_type_id, name, factor, factor_ia))
        })?;

        let mut parameters = Vec::new();
        for row in rows {
            let (id, parameter_type_id, name, factor, factor_ia) = row?;
            parameters.push(EstimationParameter {
                id: Self::parse_uuid(&id)?,
                parameter_type_id: Self::parse_uuid(&parameter_type_id)?,
                name,
                factor,
                factor_ia,
            });
        }
        Ok(parameters)
    }

    fn load_element_factors(&self, conn: &Connection) -> Result<Vec<ElementComplexityFactor>> {
        let mut stmt = conn.prepare(
            "SELECT element_type_id, parameter_id, factor, factor_ia FROM element_factors",
        )?;
        let rows = stmt.query_map([], |row| {
            let element_type_id: u32 = row.get(0)?;
            let parameter_id: String = row.get(1)?;
            let factor: Option<f64> = row.get(2)?;
            let factor_ia: Option<f64> = row.get(3)?;
            Ok((element_type_id, parameter_id, factor, factor_ia))
        })?;

        let mut factors = Vec::new();
        for row in rows {
            let (element_type_id, parameter_id, factor, factor_ia) = row?;
            factors.push(ElementComplexityFactor {
                element_type_id,
                parameter_id: Self::parse_uuid(&parameter_id)?,
                factor,
                factor_ia,
            });
        }
        Ok(factors)
    }

    fn load_metadata(
        &self,
        conn: &Connection,
    ) -> Result<(String, String, EstimatorSettings, u32, u32, u32)> {
        let row = conn
            .query_row(
                "SELECT name, description, settings, next_project_number,
                        next_need_number, next_requirement_number
                 FROM metadata WHERE id = 1",
                [],
                |row| {
                    let name: String = row.get(0)?;
                    let description: String = row.get(1)?;
                    let settings: String = row.get(2)?;
                    let next_project_number: u32 = row.get(3)?;
                    let next_need_number: u32 = row.get(4)?;
                    let next_requirement_number: u32 = row.get(5)?;
                    Ok((
                        name,
                        description,
                        settings,
                        next_project_number,
                        next_need_number,
                        next_requirement_number,
                    ))
                },
            )
            .optional()?;

        match row {
            Some((name, description, settings_json, p, n, r)) => {
                let settings: EstimatorSettings =
                    serde_json::from_str(&settings_json).unwrap_or_default();
                Ok((name, description, settings, p, n, r))
            }
            None => Ok((
                String::new(),
                String::new(),
                EstimatorSettings::default(),
                1,
                1,
                1,
            )),
        }
    }
}

impl StoreBackend for SqliteBackend {
    fn backend_type(&self) -> BackendType {
        BackendType::Sqlite
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<EstimationStore> {
        let conn = self.conn.lock().unwrap();

        let (name, description, settings, next_project_number, next_need_number, next_requirement_number) =
            self.load_metadata(&conn)?;

        let element_types = self.load_element_types(&conn)?;
        let parameter_types = self.load_parameter_types(&conn)?;

        let mut store = EstimationStore {
            name,
            description,
            projects: self.load_projects(&conn)?,
            needs: self.load_needs(&conn)?,
            requirements: self.load_requirements(&conn)?,
            entries: self.load_entries(&conn)?,
            // A freshly created database has empty catalogs: seed defaults
            element_types: if element_types.is_empty() {
                crate::models::default_element_types()
            } else {
                element_types
            },
            parameter_types: if parameter_types.is_empty() {
                crate::models::default_parameter_types()
            } else {
                parameter_types
            },
            parameters: self.load_parameters(&conn)?,
            complexity_factors: self.load_element_factors(&conn)?,
            settings,
            next_project_number,
            next_need_number,
            next_requirement_number,
        };

        store.assign_codes();
        store.validate_unique_codes()?;
        Ok(store)
    }

    fn save(&self, store: &EstimationStore) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        // Children before parents, then rewrite everything
        tx.execute("DELETE FROM fp_entries", [])?;
        tx.execute("DELETE FROM requirements", [])?;
        tx.execute("DELETE FROM needs", [])?;
        tx.execute("DELETE FROM projects", [])?;
        tx.execute("DELETE FROM element_factors", [])?;
        tx.execute("DELETE FROM parameters", [])?;
        tx.execute("DELETE FROM parameter_types", [])?;
        tx.execute("DELETE FROM element_types", [])?;
        tx.execute("DELETE FROM metadata", [])?;

        tx.execute(
            "INSERT INTO metadata
             (id, name, description, settings, next_project_number,
              next_need_number, next_requirement_number)
             VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                store.name,
                store.description,
                serde_json::to_string(&store.settings)?,
                store.next_project_number,
                store.next_need_number,
                store.next_requirement_number,
            ],
        )?;

        for et in &store.element_types {
            tx.execute(
                "INSERT INTO element_types (id, label) VALUES (?1, ?2)",
                params![et.id, et.label],
            )?;
        }

        for pt in &store.parameter_types {
            tx.execute(
                "INSERT INTO parameter_types (id, name, has_affected_elements)
                 VALUES (?1, ?2, ?3)",
                params![pt.id.to_string(), pt.name, pt.has_affected_elements],
            )?;
        }

        for p in &store.parameters {
            tx.execute(
                "INSERT INTO parameters (id, parameter_type_id, name, factor, factor_ia)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    p.id.to_string(),
                    p.parameter_type_id.to_string(),
                    p.name,
                    p.factor,
                    p.factor_ia,
                ],
            )?;
        }

        for f in &store.complexity_factors {
            tx.execute(
                "INSERT INTO element_factors (element_type_id, parameter_id, factor, factor_ia)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    f.element_type_id,
                    f.parameter_id.to_string(),
                    f.factor,
                    f.factor_ia,
                ],
            )?;
        }

        for p in &store.projects {
            tx.execute(
                "INSERT INTO projects (id, code, name, real_effort_days, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    p.id.to_string(),
                    p.code,
                    p.name,
                    p.real_effort_days,
                    p.created_at.to_rfc3339(),
                ],
            )?;
        }

        for n in &store.needs {
            tx.execute(
                "INSERT INTO needs (id, code, name, body, reference_url, project_id, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    n.id.to_string(),
                    n.code,
                    n.name,
                    n.body,
                    n.reference_url,
                    n.project_id.to_string(),
                    n.created_at.to_rfc3339(),
                ],
            )?;
        }

        for r in &store.requirements {
            tx.execute(
                "INSERT INTO requirements (id, code, name, body, need_id, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    r.id.to_string(),
                    r.code,
                    r.name,
                    r.body,
                    r.need_id.to_string(),
                    r.created_at.to_rfc3339(),
                ],
            )?;
        }

        for e in &store.entries {
            let (kind, element_type_id, estimated_quantity, real_quantity, estimated_effort_days, real_effort_days, parameter_id) =
                match &e.kind {
                    EntryKind::ElementQuantity {
                        element_type_id,
                        estimated_quantity,
                        real_quantity,
                        estimated_effort_days,
                        real_effort_days,
                    } => (
                        "element_quantity",
                        Some(*element_type_id),
                        Some(*estimated_quantity),
                        *real_quantity,
                        *estimated_effort_days,
                        *real_effort_days,
                        None,
                    ),
                    EntryKind::ParameterSelection { parameter_id } => (
                        "parameter_selection",
                        None,
                        None,
                        None,
                        None,
                        None,
                        Some(parameter_id.to_string()),
                    ),
                };

            tx.execute(
                "INSERT INTO fp_entries
                 (id, requirement_id, kind, element_type_id, estimated_quantity,
                  real_quantity, estimated_effort_days, real_effort_days,
                  parameter_id, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    e.id.to_string(),
                    e.requirement_id.to_string(),
                    kind,
                    element_type_id,
                    estimated_quantity,
                    real_quantity,
                    estimated_effort_days,
                    real_effort_days,
                    parameter_id,
                    e.created_at.to_rfc3339(),
                ],
            )?;
        }

        tx.commit()?;
        Ok(())
    }
}

impl FactorSource for SqliteBackend {
    /// Single-row fallback lookup for a factor missing from the batched
    /// catalog snapshot
    fn element_factor(
        &self,
        element_type_id: u32,
        parameter_id: &Uuid,
    ) -> Result<Option<ElementComplexityFactor>> {
        let conn = self.conn.lock().unwrap();
        let row = conn
            .query_row(
                "SELECT factor, factor_ia FROM element_factors
                 WHERE element_type_id = ?1 AND parameter_id = ?2",
                params![element_type_id, parameter_id.to_string()],
                |row| {
                    let factor: Option<f64> = row.get(0)?;
                    let factor_ia: Option<f64> = row.get(1)?;
                    Ok((factor, factor_ia))
                },
            )
            .optional()?;

        Ok(row.map(|(factor, factor_ia)| ElementComplexityFactor {
            element_type_id,
            parameter_id: *parameter_id,
            factor,
            factor_ia,
        }))
    }
}
