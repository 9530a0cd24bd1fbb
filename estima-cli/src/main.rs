mod cli;
mod prompts;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

use estima_core::{
    determine_store_path, extract_requirements, open_or_create, registry_path, render_project_report,
    AiClient, Catalog, CatalogCache, Deviation, EntryKind, EstimationParameter, EstimationStore,
    ExportFormat, ExtractionConfig, FunctionPointEntry, Need, Project, ProjectSummary, Registry,
    Requirement, StoreBackend, HOURS_PER_WORKDAY,
};

use crate::cli::{
    CatalogCommand, Cli, Command, DbCommand, EntryCommand, EstimateCommand, NeedCommand,
    ProjectCommand, ReqCommand, SettingsCommand,
};

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let store_path = determine_store_path(cli.file.as_deref(), cli.store.as_deref())?;
    let backend = open_or_create(&store_path, None)?;
    let catalog_cache = CatalogCache::new();

    match &cli.command {
        Command::Project(cmd) => handle_project_command(cmd, backend.as_ref())?,
        Command::Need(cmd) => handle_need_command(cmd, backend.as_ref())?,
        Command::Req(cmd) => handle_req_command(cmd, backend.as_ref())?,
        Command::Entry(cmd) => handle_entry_command(cmd, backend.as_ref())?,
        Command::Catalog(cmd) => handle_catalog_command(cmd, backend.as_ref(), &catalog_cache)?,
        Command::Estimate(cmd) => handle_estimate_command(cmd, backend.as_ref(), &catalog_cache)?,
        Command::Deviation { id } => show_deviation(backend.as_ref(), &catalog_cache, id)?,
        Command::Extract { id, workers, apply } => {
            handle_extract(backend.as_ref(), id, *workers, *apply)?
        }
        Command::Export { id, format, output } => {
            handle_export(backend.as_ref(), &catalog_cache, id, format, output.as_deref())?
        }
        Command::Db(cmd) => handle_db_command(cmd, backend.as_ref(), &store_path)?,
        Command::Settings(cmd) => handle_settings_command(cmd, backend.as_ref())?,
    }

    Ok(())
}

// =============================================================================
// Lookup helpers
// =============================================================================

fn resolve_project(store: &EstimationStore, reference: &str) -> Result<Project> {
    store
        .project_by_ref(reference)
        .cloned()
        .with_context(|| format!("Project not found: {}", reference))
}

fn resolve_need(store: &EstimationStore, reference: &str) -> Result<Need> {
    store
        .need_by_ref(reference)
        .cloned()
        .with_context(|| format!("Need not found: {}", reference))
}

fn resolve_requirement(store: &EstimationStore, reference: &str) -> Result<Requirement> {
    store
        .requirement_by_ref(reference)
        .cloned()
        .with_context(|| format!("Requirement not found: {}", reference))
}

/// Resolves a parameter given as a name or a UUID
fn resolve_parameter(store: &EstimationStore, reference: &str) -> Result<EstimationParameter> {
    if let Ok(id) = Uuid::parse_str(reference) {
        if let Some(param) = store.parameter_by_id(&id) {
            return Ok(param.clone());
        }
    }
    store
        .parameters
        .iter()
        .find(|p| p.name.eq_ignore_ascii_case(reference))
        .cloned()
        .with_context(|| format!("Parameter not found: {}", reference))
}

/// Blocks the save when required fields are missing, listing them
fn require_fields(missing: &[&str]) -> Result<()> {
    if missing.is_empty() {
        return Ok(());
    }
    eprintln!("{}", "Missing required fields:".red());
    for field in missing {
        eprintln!("  - {}", field.red());
    }
    anyhow::bail!("Missing required fields: {}", missing.join(", "));
}

/// Loads the catalog through the cache; on failure reports the condition and
/// returns None so the caller can degrade the aggregate to zero
fn load_catalog_or_warn(cache: &CatalogCache, backend: &dyn StoreBackend) -> Option<Arc<Catalog>> {
    match cache.get(backend) {
        Ok(catalog) => Some(catalog),
        Err(e) => {
            log::warn!("{}", e);
            eprintln!(
                "{}",
                format!("{} - showing zero effort", e).red()
            );
            None
        }
    }
}

fn fmt_days(days: f64) -> String {
    format!("{:.2}", days)
}

// =============================================================================
// Project commands
// =============================================================================

fn handle_project_command(cmd: &ProjectCommand, backend: &dyn StoreBackend) -> Result<()> {
    match cmd {
        ProjectCommand::Add { name } => {
            let project = match name {
                Some(name) => Project::new(name.clone()),
                None => prompts::prompt_new_project()?,
            };
            let added = backend.add_project(project)?;

            println!("{}", "Project added successfully!".green());
            println!("ID: {}", added.code.as_deref().unwrap_or("?").green());
            println!("UUID: {}", added.id);
        }
        ProjectCommand::List => {
            let store = backend.load()?;
            if store.projects.is_empty() {
                println!("No projects");
                return Ok(());
            }
            for project in &store.projects {
                let needs = store.needs_of(&project.id).len();
                println!(
                    "{} {} ({} needs)",
                    project.code.as_deref().unwrap_or("?").bold(),
                    project.name,
                    needs
                );
            }
        }
        ProjectCommand::Show { id } => {
            let store = backend.load()?;
            let project = resolve_project(&store, id)?;

            println!("{} {}", project.code.as_deref().unwrap_or("?").bold(), project.name);
            println!("UUID: {}", project.id);
            println!("Created: {}", project.created_at.format("%Y-%m-%d %H:%M"));
            match project.real_effort_days {
                Some(days) => println!("Real effort: {} workdays", fmt_days(days)),
                None => println!("Real effort: not recorded"),
            }
            for need in store.needs_of(&project.id) {
                println!(
                    "  {} {} ({} requirements)",
                    need.code.as_deref().unwrap_or("?"),
                    need.name,
                    store.requirements_of(&need.id).len()
                );
            }
        }
        ProjectCommand::Del { id, yes } => {
            let store = backend.load()?;
            let project = resolve_project(&store, id)?;

            if !*yes && !prompts::confirm_delete(&project.name)? {
                println!("Aborted");
                return Ok(());
            }

            backend.delete_project(&project.id)?;
            println!("{}", format!("Deleted project {}", project.name).green());
        }
        ProjectCommand::Real { id, days } => {
            let store = backend.load()?;
            let project = resolve_project(&store, id)?;

            backend.set_real_effort(&project.id, *days)?;
            if *days == 0.0 {
                println!("Cleared real effort for {}", project.name);
            } else {
                println!(
                    "Recorded {} workdays of real effort for {}",
                    fmt_days(*days).green(),
                    project.name
                );
            }
        }
    }
    Ok(())
}

// =============================================================================
// Need commands
// =============================================================================

fn handle_need_command(cmd: &NeedCommand, backend: &dyn StoreBackend) -> Result<()> {
    match cmd {
        NeedCommand::Add {
            project,
            name,
            body,
            from_file,
            url,
        } => {
            let store = backend.load()?;

            // Interactive when nothing was given on the command line
            let need = if project.is_none() && name.is_none() && body.is_none() && from_file.is_none()
            {
                prompts::prompt_new_need(&store)?
            } else {
                let mut missing = Vec::new();
                if project.is_none() {
                    missing.push("--project");
                }
                if name.is_none() {
                    missing.push("--name");
                }
                require_fields(&missing)?;

                let parent = resolve_project(&store, project.as_deref().unwrap())?;
                let body_text = match (body, from_file) {
                    (Some(body), _) => body.clone(),
                    (None, Some(path)) => std::fs::read_to_string(path)
                        .with_context(|| format!("Failed to read document: {:?}", path))?,
                    (None, None) => String::new(),
                };

                let mut need = Need::new(name.clone().unwrap(), body_text, parent.id);
                need.reference_url = url.clone();
                need
            };

            let added = backend.add_need(need)?;
            println!("{}", "Need added successfully!".green());
            println!("ID: {}", added.code.as_deref().unwrap_or("?").green());
        }
        NeedCommand::List { project } => {
            let store = backend.load()?;
            let needs: Vec<&Need> = match project {
                Some(reference) => {
                    let parent = resolve_project(&store, reference)?;
                    store.needs_of(&parent.id)
                }
                None => store.needs.iter().collect(),
            };

            if needs.is_empty() {
                println!("No needs");
                return Ok(());
            }
            for need in needs {
                println!(
                    "{} {} ({} requirements)",
                    need.code.as_deref().unwrap_or("?").bold(),
                    need.name,
                    store.requirements_of(&need.id).len()
                );
            }
        }
        NeedCommand::Show { id } => {
            let store = backend.load()?;
            let need = resolve_need(&store, id)?;

            println!("{} {}", need.code.as_deref().unwrap_or("?").bold(), need.name);
            if let Some(url) = &need.reference_url {
                println!("Reference: {}", url);
            }
            println!("Created: {}", need.created_at.format("%Y-%m-%d %H:%M"));
            if !need.body.is_empty() {
                println!("\n{}", need.body);
            }
            let requirements = store.requirements_of(&need.id);
            if !requirements.is_empty() {
                println!();
                for req in requirements {
                    println!("  {} {}", req.code.as_deref().unwrap_or("?"), req.name);
                }
            }
        }
        NeedCommand::Del { id, yes } => {
            let store = backend.load()?;
            let need = resolve_need(&store, id)?;

            if !*yes && !prompts::confirm_delete(&need.name)? {
                println!("Aborted");
                return Ok(());
            }

            backend.delete_need(&need.id)?;
            println!("{}", format!("Deleted need {}", need.name).green());
        }
    }
    Ok(())
}

// =============================================================================
// Requirement commands
// =============================================================================

fn handle_req_command(cmd: &ReqCommand, backend: &dyn StoreBackend) -> Result<()> {
    match cmd {
        ReqCommand::Add { need, name, body } => {
            let store = backend.load()?;

            let requirement = if need.is_none() && name.is_none() && body.is_none() {
                prompts::prompt_new_requirement(&store)?
            } else {
                let mut missing = Vec::new();
                if need.is_none() {
                    missing.push("--need");
                }
                if name.is_none() {
                    missing.push("--name");
                }
                require_fields(&missing)?;

                let parent = resolve_need(&store, need.as_deref().unwrap())?;
                Requirement::new(
                    name.clone().unwrap(),
                    body.clone().unwrap_or_default(),
                    parent.id,
                )
            };

            let added = backend.add_requirement(requirement)?;
            println!("{}", "Requirement added successfully!".green());
            println!("ID: {}", added.code.as_deref().unwrap_or("?").green());
        }
        ReqCommand::List { need } => {
            let store = backend.load()?;
            let requirements: Vec<&Requirement> = match need {
                Some(reference) => {
                    let parent = resolve_need(&store, reference)?;
                    store.requirements_of(&parent.id)
                }
                None => store.requirements.iter().collect(),
            };

            if requirements.is_empty() {
                println!("No requirements");
                return Ok(());
            }
            for req in requirements {
                println!(
                    "{} {} ({} entries)",
                    req.code.as_deref().unwrap_or("?").bold(),
                    req.name,
                    store.entries_of(&req.id).len()
                );
            }
        }
        ReqCommand::Show { id } => {
            let store = backend.load()?;
            let req = resolve_requirement(&store, id)?;

            println!("{} {}", req.code.as_deref().unwrap_or("?").bold(), req.name);
            println!("Created: {}", req.created_at.format("%Y-%m-%d %H:%M"));
            if !req.body.is_empty() {
                println!("\n{}", req.body);
            }
        }
        ReqCommand::Edit { id, name, body } => {
            if name.is_none() && body.is_none() {
                anyhow::bail!("Nothing to change - pass --name and/or --body");
            }
            let mut store = backend.load()?;
            let req = resolve_requirement(&store, id)?;

            if let Some(target) = store.requirements.iter_mut().find(|r| r.id == req.id) {
                if let Some(name) = name {
                    target.name = name.clone();
                }
                if let Some(body) = body {
                    target.body = body.clone();
                }
            }
            backend.save(&store)?;
            println!("{}", "Requirement updated".green());
        }
        ReqCommand::Del { id, yes } => {
            let store = backend.load()?;
            let req = resolve_requirement(&store, id)?;

            if !*yes && !prompts::confirm_delete(&req.name)? {
                println!("Aborted");
                return Ok(());
            }

            backend.delete_requirement(&req.id)?;
            println!("{}", format!("Deleted requirement {}", req.name).green());
        }
    }
    Ok(())
}

// =============================================================================
// Entry commands
// =============================================================================

/// Finds the quantity entry for (requirement, element type), if any
fn find_quantity_entry(
    store: &EstimationStore,
    requirement_id: &Uuid,
    element: u32,
) -> Option<Uuid> {
    store.entries_of(requirement_id).iter().find_map(|e| match &e.kind {
        EntryKind::ElementQuantity {
            element_type_id, ..
        } if *element_type_id == element => Some(e.id),
        _ => None,
    })
}

fn handle_entry_command(cmd: &EntryCommand, backend: &dyn StoreBackend) -> Result<()> {
    match cmd {
        EntryCommand::Set {
            req,
            element,
            quantity,
        } => {
            let mut store = backend.load()?;
            let requirement = resolve_requirement(&store, req)?;
            if store.element_type(*element).is_none() {
                anyhow::bail!("Unknown affected element type: {}", element);
            }

            match find_quantity_entry(&store, &requirement.id, *element) {
                Some(entry_id) => {
                    if let Some(entry) = store.entries.iter_mut().find(|e| e.id == entry_id) {
                        if let EntryKind::ElementQuantity {
                            estimated_quantity,
                            estimated_effort_days,
                            ..
                        } = &mut entry.kind
                        {
                            *estimated_quantity = *quantity;
                            // The cached effort is stale until the next refresh
                            *estimated_effort_days = None;
                        }
                    }
                    backend.save(&store)?;
                }
                None => {
                    let entry =
                        FunctionPointEntry::element_quantity(requirement.id, *element, *quantity);
                    store.add_entry(entry)?;
                    backend.save(&store)?;
                }
            }

            let label = store
                .element_type(*element)
                .map(|e| e.label.clone())
                .unwrap_or_default();
            println!(
                "Set {} x {} on {}",
                quantity.to_string().green(),
                label,
                requirement.code.as_deref().unwrap_or("?")
            );
        }
        EntryCommand::Select { req, parameter } => {
            let mut store = backend.load()?;
            let requirement = resolve_requirement(&store, req)?;
            let param = resolve_parameter(&store, parameter)?;

            store.add_entry(FunctionPointEntry::parameter_selection(
                requirement.id,
                param.id,
            ))?;
            backend.save(&store)?;
            println!(
                "Selected {} for {}",
                param.name.green(),
                requirement.code.as_deref().unwrap_or("?")
            );
        }
        EntryCommand::Real {
            req,
            element,
            quantity,
            days,
        } => {
            if quantity.is_none() && days.is_none() {
                anyhow::bail!("Nothing to record - pass --quantity and/or --days");
            }
            let mut store = backend.load()?;
            let requirement = resolve_requirement(&store, req)?;
            let entry_id = find_quantity_entry(&store, &requirement.id, *element)
                .with_context(|| {
                    format!("No quantity entry for element {} on {}", element, req)
                })?;

            if let Some(entry) = store.entries.iter_mut().find(|e| e.id == entry_id) {
                if let EntryKind::ElementQuantity {
                    real_quantity,
                    real_effort_days,
                    ..
                } = &mut entry.kind
                {
                    if quantity.is_some() {
                        *real_quantity = *quantity;
                    }
                    if days.is_some() {
                        *real_effort_days = *days;
                    }
                }
            }
            backend.save(&store)?;
            println!("{}", "Recorded real figures".green());
        }
        EntryCommand::List { req } => {
            let store = backend.load()?;
            let requirement = resolve_requirement(&store, req)?;

            let entries = store.entries_of(&requirement.id);
            if entries.is_empty() {
                println!("No entries");
                return Ok(());
            }
            for entry in entries {
                match &entry.kind {
                    EntryKind::ElementQuantity {
                        element_type_id,
                        estimated_quantity,
                        real_quantity,
                        estimated_effort_days,
                        ..
                    } => {
                        let label = store
                            .element_type(*element_type_id)
                            .map(|e| e.label.as_str())
                            .unwrap_or("?");
                        let mut line =
                            format!("{} x {} (element {})", estimated_quantity, label, element_type_id);
                        if let Some(real) = real_quantity {
                            line.push_str(&format!(", real {}", real));
                        }
                        if let Some(days) = estimated_effort_days {
                            line.push_str(&format!(", cached {} workdays", fmt_days(*days)));
                        }
                        println!("{}", line);
                    }
                    EntryKind::ParameterSelection { parameter_id } => {
                        let name = store
                            .parameter_by_id(parameter_id)
                            .map(|p| p.name.as_str())
                            .unwrap_or("?");
                        println!("parameter: {}", name);
                    }
                }
            }
        }
        EntryCommand::Del { req, element } => {
            let store = backend.load()?;
            let requirement = resolve_requirement(&store, req)?;
            let entry_id = find_quantity_entry(&store, &requirement.id, *element)
                .with_context(|| {
                    format!("No quantity entry for element {} on {}", element, req)
                })?;

            backend.delete_entry(&entry_id)?;
            println!("{}", "Entry deleted".green());
        }
    }
    Ok(())
}

// =============================================================================
// Catalog commands
// =============================================================================

fn handle_catalog_command(
    cmd: &CatalogCommand,
    backend: &dyn StoreBackend,
    cache: &CatalogCache,
) -> Result<()> {
    match cmd {
        CatalogCommand::Elements => {
            let store = backend.load()?;
            for element in &store.element_types {
                println!("{:>3}  {}", element.id, element.label);
            }
        }
        CatalogCommand::Types => {
            let store = backend.load()?;
            for param_type in &store.parameter_types {
                let class = if param_type.has_affected_elements {
                    "multiplicative"
                } else {
                    "additive"
                };
                println!("{} ({})", param_type.name.bold(), class);
            }
        }
        CatalogCommand::Params => {
            let store = backend.load()?;
            if store.parameters.is_empty() {
                println!("No parameters");
                return Ok(());
            }
            for param in &store.parameters {
                let type_name = store
                    .parameter_types
                    .iter()
                    .find(|t| t.id == param.parameter_type_id)
                    .map(|t| t.name.as_str())
                    .unwrap_or("?");
                println!(
                    "{} [{}] factor={:?} factor_ia={:?}",
                    param.name.bold(),
                    type_name,
                    param.factor,
                    param.factor_ia
                );
            }
        }
        CatalogCommand::AddParam {
            name,
            type_name,
            factor,
            factor_ia,
        } => {
            let mut missing = Vec::new();
            if name.is_none() {
                missing.push("--name");
            }
            if type_name.is_none() {
                missing.push("--type");
            }
            require_fields(&missing)?;

            let mut store = backend.load()?;
            let param_type = store
                .parameter_types
                .iter()
                .find(|t| t.name.eq_ignore_ascii_case(type_name.as_deref().unwrap()))
                .with_context(|| format!("Parameter type not found: {}", type_name.as_deref().unwrap()))?
                .id;

            let mut param = EstimationParameter::new(name.clone().unwrap(), param_type);
            param.factor = *factor;
            param.factor_ia = *factor_ia;
            let param_name = param.name.clone();
            store.parameters.push(param);
            backend.save(&store)?;
            cache.invalidate();

            println!("{}", format!("Added parameter {}", param_name).green());
        }
        CatalogCommand::EditParam {
            id,
            factor,
            factor_ia,
        } => {
            if factor.is_none() && factor_ia.is_none() {
                anyhow::bail!("Nothing to change - pass --factor and/or --factor-ia");
            }
            let mut store = backend.load()?;
            let param = resolve_parameter(&store, id)?;

            if let Some(target) = store.parameters.iter_mut().find(|p| p.id == param.id) {
                if factor.is_some() {
                    target.factor = *factor;
                }
                if factor_ia.is_some() {
                    target.factor_ia = *factor_ia;
                }
            }
            backend.save(&store)?;
            cache.invalidate();

            println!("{}", format!("Updated parameter {}", param.name).green());
        }
        CatalogCommand::SetFactor {
            element,
            parameter,
            factor,
            factor_ia,
        } => {
            if factor.is_none() && factor_ia.is_none() {
                anyhow::bail!("Nothing to set - pass --factor and/or --factor-ia");
            }
            let mut store = backend.load()?;
            if store.element_type(*element).is_none() {
                anyhow::bail!("Unknown affected element type: {}", element);
            }
            let param = resolve_parameter(&store, parameter)?;

            match store
                .complexity_factors
                .iter_mut()
                .find(|f| f.element_type_id == *element && f.parameter_id == param.id)
            {
                Some(row) => {
                    if factor.is_some() {
                        row.factor = *factor;
                    }
                    if factor_ia.is_some() {
                        row.factor_ia = *factor_ia;
                    }
                }
                None => {
                    store
                        .complexity_factors
                        .push(estima_core::ElementComplexityFactor {
                            element_type_id: *element,
                            parameter_id: param.id,
                            factor: *factor,
                            factor_ia: *factor_ia,
                        });
                }
            }
            backend.save(&store)?;
            cache.invalidate();

            println!(
                "{}",
                format!("Set factor for element {} under {}", element, param.name).green()
            );
        }
    }
    Ok(())
}

// =============================================================================
// Estimation commands
// =============================================================================

fn handle_estimate_command(
    cmd: &EstimateCommand,
    backend: &dyn StoreBackend,
    cache: &CatalogCache,
) -> Result<()> {
    match cmd {
        EstimateCommand::Req { id, refresh } => {
            let store = backend.load()?;
            let requirement = resolve_requirement(&store, id)?;

            let Some(catalog) = load_catalog_or_warn(cache, backend) else {
                println!("{} 0 FP, 0.00 workdays", requirement.code.as_deref().unwrap_or("?"));
                return Ok(());
            };

            let estimate =
                estima_core::estimate_for_requirement(&store, &catalog, &requirement.id, None);

            println!(
                "{} {}",
                requirement.code.as_deref().unwrap_or("?").bold(),
                requirement.name
            );
            println!("Function points: {}", estimate.function_point_total);
            println!(
                "Estimated effort: {} workdays ({} hours)",
                fmt_days(estimate.estimated_effort_days).green(),
                fmt_days(estimate.estimated_hours())
            );
            for entry_effort in &estimate.per_entry {
                let label = store
                    .element_type(entry_effort.element_type_id)
                    .map(|e| e.label.as_str())
                    .unwrap_or("?");
                println!("  {}: {} workdays", label, fmt_days(entry_effort.effort_days));
            }

            if *refresh {
                let efforts: Vec<(Uuid, f64)> = estimate
                    .per_entry
                    .iter()
                    .map(|e| (e.entry_id, e.effort_days))
                    .collect();
                let mut store = store;
                store.apply_cached_efforts(&efforts);
                backend.save(&store)?;
                println!("{}", "Cached per-element efforts refreshed".green());
            }
        }
        EstimateCommand::Need { id } => {
            let store = backend.load()?;
            let need = resolve_need(&store, id)?;

            let Some(catalog) = load_catalog_or_warn(cache, backend) else {
                println!("{} 0 FP, 0.00 workdays", need.code.as_deref().unwrap_or("?"));
                return Ok(());
            };

            let summary = estima_core::summarize_need(&store, &catalog, &need.id, None);
            let status = if summary.complete {
                "complete".green()
            } else {
                "incomplete".yellow()
            };

            println!(
                "{} {} ({})",
                need.code.as_deref().unwrap_or("?").bold(),
                need.name,
                status
            );
            println!("Function points: {}", summary.total_function_points);
            println!(
                "Estimated effort: {} workdays",
                fmt_days(summary.total_effort_days).green()
            );

            for req in store.requirements_of(&need.id) {
                let estimate =
                    estima_core::estimate_for_requirement(&store, &catalog, &req.id, None);
                println!(
                    "  {} {}: {} FP, {} workdays",
                    req.code.as_deref().unwrap_or("?"),
                    req.name,
                    estimate.function_point_total,
                    fmt_days(estimate.estimated_effort_days)
                );
            }
        }
        EstimateCommand::Project { id } => {
            let store = backend.load()?;
            let project = resolve_project(&store, id)?;

            let summary = match load_catalog_or_warn(cache, backend) {
                Some(catalog) => {
                    estima_core::summarize_project(&store, &catalog, &project.id, None)
                }
                None => ProjectSummary::empty(project.id),
            };

            print_project_summary(&store, &project, &summary);
        }
    }
    Ok(())
}

fn print_project_summary(store: &EstimationStore, project: &Project, summary: &ProjectSummary) {
    println!(
        "{} {}",
        project.code.as_deref().unwrap_or("?").bold(),
        project.name
    );
    println!("Function points: {}", summary.total_function_points);
    println!(
        "Estimated effort: {} workdays ({} hours)",
        fmt_days(summary.total_effort_days).green(),
        fmt_days(summary.total_effort_days * HOURS_PER_WORKDAY)
    );

    // Needs arrive sorted: complete first, then descending effort
    for need_summary in &summary.needs {
        let need_label = store
            .need_by_id(&need_summary.need_id)
            .map(|n| {
                format!(
                    "{} {}",
                    n.code.as_deref().unwrap_or("?"),
                    n.name
                )
            })
            .unwrap_or_else(|| need_summary.need_id.to_string());
        let status = if need_summary.complete {
            "complete".green()
        } else {
            "incomplete".yellow()
        };
        println!(
            "  {} ({}): {} FP, {} workdays",
            need_label,
            status,
            need_summary.total_function_points,
            fmt_days(need_summary.total_effort_days)
        );
    }
}

fn show_deviation(backend: &dyn StoreBackend, cache: &CatalogCache, id: &str) -> Result<()> {
    let store = backend.load()?;
    let project = resolve_project(&store, id)?;

    let summary = match load_catalog_or_warn(cache, backend) {
        Some(catalog) => estima_core::summarize_project(&store, &catalog, &project.id, None),
        None => ProjectSummary::empty(project.id),
    };

    println!(
        "{} {}",
        project.code.as_deref().unwrap_or("?").bold(),
        project.name
    );
    println!(
        "Estimated effort: {} workdays",
        fmt_days(summary.total_effort_days)
    );

    match estima_core::deviation(summary.total_effort_days, project.real_effort_days) {
        Some(deviation) => {
            println!(
                "Real effort: {} workdays",
                fmt_days(project.real_effort_days.unwrap_or_default())
            );
            print_deviation(&deviation);
        }
        None => {
            println!("Real effort: not recorded - no deviation to compute");
        }
    }

    Ok(())
}

fn print_deviation(deviation: &Deviation) {
    let line = format!(
        "Deviation: {:+.2} workdays ({:+.2}%, {:+.2} hours)",
        deviation.workdays, deviation.percent, deviation.hours
    );
    // Positive means the actual work took longer than estimated
    if deviation.workdays > 0.0 {
        println!("{}", line.red());
    } else {
        println!("{}", line.green());
    }
}

// =============================================================================
// AI extraction
// =============================================================================

fn handle_extract(
    backend: &dyn StoreBackend,
    id: &str,
    workers: usize,
    apply: bool,
) -> Result<()> {
    let store = backend.load()?;
    let need = resolve_need(&store, id)?;

    if need.body.trim().is_empty() {
        anyhow::bail!(
            "Need {} has no document body to extract from",
            need.code.as_deref().unwrap_or("?")
        );
    }

    let client = AiClient::new();
    if !client.is_available() {
        anyhow::bail!(
            "AI integration not configured ({}). Install the claude CLI to use extraction.",
            client.mode_description()
        );
    }

    let config = ExtractionConfig {
        workers,
        ..ExtractionConfig::default()
    };

    println!(
        "Extracting requirements from {} with {} workers...",
        need.code.as_deref().unwrap_or("?"),
        workers
    );
    let outcomes = extract_requirements(&client, &need, &config)?;

    if outcomes.is_empty() {
        println!("No requirements found in the document");
        return Ok(());
    }

    let mut extracted = Vec::new();
    let mut failed = 0usize;
    for outcome in &outcomes {
        match outcome.ok() {
            Some(requirement) => {
                println!("{} {}", "+".green(), requirement.title);
                extracted.push(requirement);
            }
            None => {
                failed += 1;
                println!("{} {} (description failed)", "-".red(), outcome.title);
            }
        }
    }

    if failed > 0 {
        println!(
            "{}",
            format!("{} of {} descriptions failed; rerun to retry them", failed, outcomes.len())
                .yellow()
        );
    }

    if apply {
        let mut store = store;
        for requirement in &extracted {
            store.add_requirement(Requirement::new(
                requirement.title.clone(),
                requirement.body.clone(),
                need.id,
            ))?;
        }
        backend.save(&store)?;
        println!(
            "{}",
            format!("Saved {} requirements under {}", extracted.len(), need.name).green()
        );
    } else {
        println!("Run again with --apply to save the extracted requirements");
    }

    Ok(())
}

// =============================================================================
// Export
// =============================================================================

fn handle_export(
    backend: &dyn StoreBackend,
    cache: &CatalogCache,
    id: &str,
    format: &str,
    output: Option<&Path>,
) -> Result<()> {
    let store = backend.load()?;
    let project = resolve_project(&store, id)?;
    let format: ExportFormat = format.parse()?;

    let catalog = cache.get(backend)?;

    let report = render_project_report(&store, &catalog, &project.id, None, format)?;

    match output {
        Some(path) => {
            std::fs::write(path, report)
                .with_context(|| format!("Failed to write report to {:?}", path))?;
            println!("{}", format!("Exported to {}", path.display()).green());
        }
        None => print!("{}", report),
    }

    Ok(())
}

// =============================================================================
// Store maintenance
// =============================================================================

fn handle_db_command(cmd: &DbCommand, backend: &dyn StoreBackend, store_path: &Path) -> Result<()> {
    match cmd {
        DbCommand::Register {
            name,
            path,
            description,
            default,
        } => {
            let registry_file = registry_path()?;
            let mut registry = Registry::load_or_default(&registry_file)?;
            registry.register_store(
                name.clone(),
                path.display().to_string(),
                description.clone(),
            );
            if *default {
                registry.set_default_store(name)?;
            }
            registry.save(&registry_file)?;
            println!("{}", format!("Registered store {}", name).green());
        }
        DbCommand::Registry => {
            let registry = Registry::load_or_default(registry_path()?)?;
            if registry.stores.is_empty() {
                println!("No stores registered");
                return Ok(());
            }
            let default = registry.default_store.clone();
            for (name, entry) in registry.list_stores() {
                let marker = if default.as_deref() == Some(name) {
                    " (default)"
                } else {
                    ""
                };
                println!("{}{}: {}", name.bold(), marker, entry.path);
            }
        }
        DbCommand::Path => {
            println!("{}", store_path.display());
        }
        DbCommand::Stats => {
            let stats = backend.stats()?;
            println!("Backend: {}", stats.backend_type);
            println!("Projects: {}", stats.project_count);
            println!("Needs: {}", stats.need_count);
            println!("Requirements: {}", stats.requirement_count);
            println!("Entries: {}", stats.entry_count);
            println!("Parameters: {}", stats.parameter_count);
        }
        DbCommand::Migrate { to } => {
            let from_yaml = matches!(
                store_path.extension().and_then(|e| e.to_str()),
                Some("yaml") | Some("yml")
            );
            let to_yaml = matches!(
                to.extension().and_then(|e| e.to_str()),
                Some("yaml") | Some("yml")
            );

            let migrated = match (from_yaml, to_yaml) {
                (true, false) => estima_core::migrate_yaml_to_sqlite(store_path, to)?,
                (false, true) => estima_core::migrate_sqlite_to_yaml(store_path, to)?,
                _ => anyhow::bail!(
                    "Migration requires different backend types (got {:?} -> {:?})",
                    store_path,
                    to
                ),
            };
            println!(
                "{}",
                format!("Migrated {} projects to {}", migrated, to.display()).green()
            );
        }
        DbCommand::Backup { output } => {
            let store = backend.load()?;
            estima_core::export_to_json(&store, output)?;
            println!("{}", format!("Backed up to {}", output.display()).green());
        }
        DbCommand::Restore { input, yes } => {
            if !*yes && !prompts::confirm_delete("the current store contents")? {
                println!("Aborted");
                return Ok(());
            }
            let store = estima_core::import_from_json(input)?;
            backend.save(&store)?;
            println!(
                "{}",
                format!("Restored {} projects from {}", store.projects.len(), input.display())
                    .green()
            );
        }
    }
    Ok(())
}

// =============================================================================
// Settings
// =============================================================================

fn handle_settings_command(cmd: &SettingsCommand, backend: &dyn StoreBackend) -> Result<()> {
    match cmd {
        SettingsCommand::Show => {
            let store = backend.load()?;
            println!("additive-on-empty: {}", store.settings.additive_on_empty);
        }
        SettingsCommand::Set { key, value } => {
            let mut store = backend.load()?;
            match key.as_str() {
                "additive-on-empty" => {
                    store.settings.additive_on_empty = value
                        .parse()
                        .with_context(|| format!("Expected true or false, got {}", value))?;
                }
                other => anyhow::bail!("Unknown setting: {}", other),
            }
            backend.save(&store)?;
            println!("{}", format!("Set {} = {}", key, value).green());
        }
    }
    Ok(())
}
