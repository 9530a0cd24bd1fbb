use anyhow::Result;
use inquire::{Confirm, Select, Text};

use estima_core::{EstimationStore, Need, Project, Requirement};

/// Prompts the user for a new project
pub fn prompt_new_project() -> Result<Project> {
    let name = Text::new("Project name:").prompt()?;
    Ok(Project::new(name))
}

/// Prompts the user for a new need, selecting the parent project
pub fn prompt_new_need(store: &EstimationStore) -> Result<Need> {
    let project_id = prompt_select_project(store)?;

    let name = Text::new("Need name:").prompt()?;

    // Use the Editor type for multiline input
    let body = inquire::Editor::new("Document body:").prompt()?;

    let mut need = Need::new(name, body, project_id);

    let url = Text::new("Reference URL (empty for none):").prompt()?;
    if !url.trim().is_empty() {
        need.reference_url = Some(url.trim().to_string());
    }

    Ok(need)
}

/// Prompts the user for a new requirement, selecting the parent need
pub fn prompt_new_requirement(store: &EstimationStore) -> Result<Requirement> {
    let need_id = prompt_select_need(store)?;

    let name = Text::new("Requirement name:").prompt()?;
    let body = inquire::Editor::new("Description:").prompt()?;

    Ok(Requirement::new(name, body, need_id))
}

/// Prompts the user to select a project
pub fn prompt_select_project(store: &EstimationStore) -> Result<uuid::Uuid> {
    if store.projects.is_empty() {
        anyhow::bail!("No projects in the store - add one first");
    }

    let options: Vec<String> = store
        .projects
        .iter()
        .map(|p| format!("{} {}", p.code.as_deref().unwrap_or("?"), p.name))
        .collect();

    let selection = Select::new("Project:", options.clone()).prompt()?;
    let index = options.iter().position(|o| o == &selection).unwrap();
    Ok(store.projects[index].id)
}

/// Prompts the user to select a need
pub fn prompt_select_need(store: &EstimationStore) -> Result<uuid::Uuid> {
    if store.needs.is_empty() {
        anyhow::bail!("No needs in the store - add one first");
    }

    let options: Vec<String> = store
        .needs
        .iter()
        .map(|n| format!("{} {}", n.code.as_deref().unwrap_or("?"), n.name))
        .collect();

    let selection = Select::new("Need:", options.clone()).prompt()?;
    let index = options.iter().position(|o| o == &selection).unwrap();
    Ok(store.needs[index].id)
}

/// Asks for confirmation before a cascading delete
pub fn confirm_delete(what: &str) -> Result<bool> {
    Ok(Confirm::new(&format!(
        "Delete {} and everything it owns?",
        what
    ))
    .with_default(false)
    .prompt()?)
}
