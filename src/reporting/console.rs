//! # Console Reporting Module / 控制台报告模块
//!
//! This module handles everything printed for the operator: the banner,
//! per-stage section headers, colored status lines and the final summary.
//! Color is only used when stdout is an interactive terminal.
//!
//! 此模块处理所有面向操作者的输出：横幅、阶段标题、彩色状态行和最终摘要。
//! 仅当标准输出是交互式终端时才使用颜色。

use colored::*;
use std::io::IsTerminal;

use crate::core::aggregator::FAILURE_SECTION_MARKER;
use crate::core::models::{PipelineOutcome, PipelineRun, TestSummary};
use crate::infra::command::Invocation;
use crate::infra::t;

/// Turns color off when stdout is not a terminal or `NO_COLOR` is set.
pub fn init_color() {
    let wanted = std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none();
    colored::control::set_override(wanted);
}

pub fn print_banner() {
    let rule = "=".repeat(44);
    println!();
    println!("{}", rule.blue());
    println!("  {}", t!("banner.title").blue().bold());
    println!("  {}", t!("banner.subtitle").cyan());
    println!("{}", rule.blue());
}

/// Prints a `==== Title ====` section header.
pub fn section(title: &str) {
    println!("\n{}", format!("==== {title} ====").blue());
}

pub fn success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

pub fn warning(message: &str) {
    println!("{} {}", "!".yellow(), message);
}

pub fn error(message: &str) {
    println!("{} {}", "✗".red(), message);
}

/// Echoes the command line about to run.
pub fn running(invocation: &Invocation) {
    println!("{}", t!("run.running", command = invocation.display()));
}

/// Prints the summary block for a finished run.
///
/// # Output Format / 输出格式
/// ```text
/// ==== Test Summary ====
/// Passed: 3
/// Failed: 1
/// Total: 4
///
/// ==== Failed Tests ====
/// The following tests FAILED:
///       4 - parser_roundtrip (Failed)
/// ✗ Some tests failed.
/// ```
pub fn print_run(run: &PipelineRun, fail_on_empty: bool) {
    match &run.outcome {
        // The stage already printed its own failure line.
        PipelineOutcome::ConfigureFailed { .. } | PipelineOutcome::BuildFailed { .. } => {}
        PipelineOutcome::TestsCompleted { summary } => print_summary(summary, fail_on_empty),
    }
}

pub fn print_summary(summary: &TestSummary, fail_on_empty: bool) {
    section(&t!("stage.summary"));
    println!("{}", t!("summary.passed", count = summary.pass_count()));
    println!("{}", t!("summary.failed", count = summary.fail_count()));
    println!("{}", t!("summary.total", count = summary.total_count()));

    if summary.fail_count() > 0 {
        section(&t!("stage.failed_tests"));
        println!("{FAILURE_SECTION_MARKER}");
        for line in summary.failed_test_details() {
            println!("{line}");
        }
        error(&t!("summary.some_failed"));
        return;
    }

    if summary.is_empty() {
        warning(&t!("summary.no_tests"));
        if fail_on_empty {
            error(&t!("summary.empty_is_failure"));
            return;
        }
    }
    success(&t!("summary.all_passed"));
}

/// Prints a fatal error that stopped the run.
pub fn print_fatal(err: &anyhow::Error) {
    error(&t!("summary.aborted", reason = format!("{err:#}")));
}
