//! # HTML Reporting Module / HTML 报告模块
//!
//! This module renders a self-contained HTML page for a finished run:
//! headline verdict, pass/fail/total counters, the stage ledger and the
//! captured failure details.
//!
//! 此模块为一次完成的运行生成独立的 HTML 页面：总体结论、通过/失败/总数计数、
//! 阶段记录以及捕获的失败详情。

use anyhow::{Context, Result};
use maud::{DOCTYPE, Markup, PreEscaped, html};
use std::fs;
use std::path::Path;

use crate::core::aggregator::FAILURE_SECTION_MARKER;
use crate::core::models::{PipelineOutcome, StageOutcome};
use crate::infra::t;
use crate::reporting::json::RunReport;

/// Embedded CSS styles for HTML reports / HTML 报告的嵌入式 CSS 样式
const HTML_STYLE: &str = include_str!("assets/report.css");

/// Renders the report page. Text is escaped by `maud`.
pub fn render_html_report(report: &RunReport<'_>) -> Markup {
    let verdict_class = if report.passed { "passed" } else { "failed" };
    let verdict = if report.passed {
        t!("html_report.verdict_passed")
    } else {
        t!("html_report.verdict_failed")
    };

    html! {
        (DOCTYPE)
        html {
            head {
                meta charset="utf-8";
                title { (&*t!("html_report.title")) }
                style { (PreEscaped(HTML_STYLE)) }
            }
            body {
                h1 { (&*t!("html_report.title")) }
                p class="meta" {
                    (report.config.build_type().as_str()) " · "
                    (report.config.build_dir().display().to_string()) " · "
                    (report.finished_at.format("%Y-%m-%d %H:%M:%S").to_string())
                }
                div class={ "verdict " (verdict_class) } { (&*verdict) }
                (outcome_block(report.outcome))
                h2 { (&*t!("html_report.stages")) }
                table {
                    thead {
                        tr {
                            th { (&*t!("html_report.stage")) }
                            th { (&*t!("html_report.status")) }
                            th class="duration-cell" { (&*t!("html_report.duration")) }
                        }
                    }
                    tbody {
                        @for record in report.stages {
                            tr {
                                td { (record.stage.as_str()) }
                                td class={ "status " (status_class(&record.outcome)) } {
                                    (status_label(&record.outcome))
                                }
                                td class="duration-cell" {
                                    (format!("{:.2}s", record.duration.as_secs_f64()))
                                }
                            }
                        }
                    }
                }
                @if let Some(log) = report.log_path {
                    p class="meta" { (&*t!("html_report.log")) ": " code { (log.display().to_string()) } }
                }
            }
        }
    }
}

fn outcome_block(outcome: &PipelineOutcome) -> Markup {
    match outcome {
        PipelineOutcome::ConfigureFailed { exit_code } => html! {
            p class="fatal" { (&*t!("configure.failed", code = exit_code)) }
        },
        PipelineOutcome::BuildFailed { exit_code } => html! {
            p class="fatal" { (&*t!("build.failed", code = exit_code)) }
        },
        PipelineOutcome::TestsCompleted { summary } => html! {
            div class="summary-container" {
                div class="summary-item" {
                    span class="count passed-text" { (summary.pass_count()) }
                    span class="label" { (&*t!("html_report.passed")) }
                }
                div class="summary-item" {
                    span class="count failed-text" { (summary.fail_count()) }
                    span class="label" { (&*t!("html_report.failed")) }
                }
                div class="summary-item" {
                    span class="count" { (summary.total_count()) }
                    span class="label" { (&*t!("html_report.total")) }
                }
            }
            @if !summary.failed_test_details().is_empty() {
                h2 { (&*t!("stage.failed_tests")) }
                pre class="output-content" {
                    (FAILURE_SECTION_MARKER) "\n"
                    @for line in summary.failed_test_details() {
                        (line) "\n"
                    }
                }
            }
        },
    }
}

fn status_class(outcome: &StageOutcome) -> &'static str {
    match outcome {
        StageOutcome::Success => "status-passed",
        StageOutcome::Failure(_) => "status-failed",
        StageOutcome::DeferredFailure(_) => "status-deferred",
    }
}

fn status_label(outcome: &StageOutcome) -> String {
    match outcome {
        StageOutcome::Success => t!("html_report.status_ok").to_string(),
        StageOutcome::Failure(code) => t!("html_report.status_failed", code = code).to_string(),
        StageOutcome::DeferredFailure(code) => {
            t!("html_report.status_deferred", code = code).to_string()
        }
    }
}

/// Writes the rendered page to `output_path`.
pub fn write_html_report(report: &RunReport<'_>, output_path: &Path) -> Result<()> {
    let page = render_html_report(report).into_string();
    fs::write(output_path, page)
        .with_context(|| format!("Failed to write HTML report to {}", output_path.display()))
}
