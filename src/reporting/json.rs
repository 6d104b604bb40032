//! Machine-readable run report.

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::fs;
use std::path::Path;

use crate::core::config::PipelineConfig;
use crate::core::models::{PipelineRun, StageRecord};

/// The JSON document written by `--json-summary`.
#[derive(Debug, Serialize)]
pub struct RunReport<'a> {
    pub tool_version: &'static str,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
    pub passed: bool,
    pub exit_code: u8,
    pub config: &'a PipelineConfig,
    pub stages: &'a [StageRecord],
    pub outcome: &'a crate::core::models::PipelineOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_path: Option<&'a Path>,
}

impl<'a> RunReport<'a> {
    pub fn new(
        run: &'a PipelineRun,
        config: &'a PipelineConfig,
        started_at: DateTime<Local>,
        finished_at: DateTime<Local>,
    ) -> Self {
        Self {
            tool_version: env!("CARGO_PKG_VERSION"),
            started_at,
            finished_at,
            passed: run.outcome.passed(config.fail_on_empty()),
            exit_code: run.outcome.exit_code(config.fail_on_empty()),
            config,
            stages: &run.stages,
            outcome: &run.outcome,
            log_path: run.log.as_ref().map(|log| log.path.as_path()),
        }
    }
}

pub fn render_json_report(report: &RunReport<'_>) -> Result<String> {
    serde_json::to_string_pretty(report).context("Failed to serialize run report")
}

pub fn write_json_report(report: &RunReport<'_>, output_path: &Path) -> Result<()> {
    let json = render_json_report(report)?;
    fs::write(output_path, json)
        .with_context(|| format!("Failed to write JSON report to {}", output_path.display()))
}
