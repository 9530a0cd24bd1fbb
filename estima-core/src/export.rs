//! Estimate report export
//!
//! Renders a project's estimate as JSON, CSV or Markdown. This is the one
//! place in the core where numbers are formatted for display (two decimal
//! places); every numeric contract stays unrounded.

use anyhow::{Context, Result};
use serde::Serialize;
use std::str::FromStr;
use uuid::Uuid;

use crate::catalog::Catalog;
use crate::estimate::{
    deviation, estimate_for_requirement, summarize_project, Deviation, FactorSource,
    HOURS_PER_WORKDAY,
};
use crate::models::EstimationStore;

/// Supported export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
    Markdown,
}

impl FromStr for ExportFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            "markdown" | "md" => Ok(ExportFormat::Markdown),
            other => anyhow::bail!("Unknown export format: {} (expected json, csv or markdown)", other),
        }
    }
}

#[derive(Debug, Serialize)]
struct ReportRequirement {
    code: String,
    name: String,
    function_points: u32,
    effort_days: f64,
    effort_hours: f64,
}

#[derive(Debug, Serialize)]
struct ReportNeed {
    code: String,
    name: String,
    complete: bool,
    total_function_points: u32,
    total_effort_days: f64,
    requirements: Vec<ReportRequirement>,
}

#[derive(Debug, Serialize)]
struct ReportProject {
    code: String,
    name: String,
    total_function_points: u32,
    total_effort_days: f64,
    total_effort_hours: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    real_effort_days: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    deviation: Option<Deviation>,
    needs: Vec<ReportNeed>,
}

fn build_report(
    store: &EstimationStore,
    catalog: &Catalog,
    project_id: &Uuid,
    live: Option<&dyn FactorSource>,
) -> Result<ReportProject> {
    let project = store
        .project_by_id(project_id)
        .with_context(|| format!("Project not found: {}", project_id))?;

    let summary = summarize_project(store, catalog, project_id, live);

    let needs = summary
        .needs
        .iter()
        .map(|need_summary| {
            let need = store
                .need_by_id(&need_summary.need_id)
                .expect("summarized need exists");

            let requirements = store
                .requirements_of(&need.id)
                .iter()
                .map(|req| {
                    let estimate = estimate_for_requirement(store, catalog, &req.id, live);
                    ReportRequirement {
                        code: req.code.clone().unwrap_or_default(),
                        name: req.name.clone(),
                        function_points: estimate.function_point_total,
                        effort_days: estimate.estimated_effort_days,
                        effort_hours: estimate.estimated_hours(),
                    }
                })
                .collect();

            ReportNeed {
                code: need.code.clone().unwrap_or_default(),
                name: need.name.clone(),
                complete: need_summary.complete,
                total_function_points: need_summary.total_function_points,
                total_effort_days: need_summary.total_effort_days,
                requirements,
            }
        })
        .collect();

    Ok(ReportProject {
        code: project.code.clone().unwrap_or_default(),
        name: project.name.clone(),
        total_function_points: summary.total_function_points,
        total_effort_days: summary.total_effort_days,
        total_effort_hours: summary.total_effort_days * HOURS_PER_WORKDAY,
        real_effort_days: project.real_effort_days,
        deviation: deviation(summary.total_effort_days, project.real_effort_days),
        needs,
    })
}

/// Renders a project's estimate report in the requested format
pub fn render_project_report(
    store: &EstimationStore,
    catalog: &Catalog,
    project_id: &Uuid,
    live: Option<&dyn FactorSource>,
    format: ExportFormat,
) -> Result<String> {
    let report = build_report(store, catalog, project_id, live)?;

    match format {
        ExportFormat::Json => {
            serde_json::to_string_pretty(&report).context("Failed to serialize report to JSON")
        }
        ExportFormat::Csv => Ok(render_csv(&report)),
        ExportFormat::Markdown => Ok(render_markdown(&report)),
    }
}

fn csv_escape(field: &str) -> String {
    if field.contains([',', '"', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn render_csv(report: &ReportProject) -> String {
    let mut output = String::from(
        "project,need,requirement,name,function_points,effort_days,effort_hours\n",
    );

    for need in &report.needs {
        for req in &need.requirements {
            output.push_str(&format!(
                "{},{},{},{},{},{:.2},{:.2}\n",
                csv_escape(&report.code),
                csv_escape(&need.code),
                csv_escape(&req.code),
                csv_escape(&req.name),
                req.function_points,
                req.effort_days,
                req.effort_hours,
            ));
        }
    }

    output
}

fn render_markdown(report: &ReportProject) -> String {
    let mut output = String::new();

    output.push_str(&format!("# {} - {}\n\n", report.code, report.name));
    output.push_str(&format!(
        "- Function points: {}\n- Estimated effort: {:.2} workdays ({:.2} hours)\n",
        report.total_function_points, report.total_effort_days, report.total_effort_hours,
    ));

    if let Some(real) = report.real_effort_days {
        output.push_str(&format!("- Real effort: {:.2} workdays\n", real));
    }
    if let Some(dev) = &report.deviation {
        output.push_str(&format!(
            "- Deviation: {:+.2} workdays ({:+.2}%, {:+.2} hours)\n",
            dev.workdays, dev.percent, dev.hours,
        ));
    }
    output.push('\n');

    for need in &report.needs {
        let status = if need.complete { "complete" } else { "incomplete" };
        output.push_str(&format!(
            "## {} - {} ({}, {:.2} workdays)\n\n",
            need.code, need.name, status, need.total_effort_days,
        ));

        for req in &need.requirements {
            output.push_str(&format!(
                "- {} {}: {} FP, {:.2} workdays\n",
                req.code, req.name, req.function_points, req.effort_days,
            ));
        }
        output.push('\n');
    }

    output
}
