//! # Data Models Module / 数据模型模块
//!
//! This module defines the values that flow between pipeline stages: the
//! result of one child process, the persisted harness log, the parsed test
//! summary and the terminal outcome of a run.
//!
//! 此模块定义了在流水线各阶段之间流动的值：单个子进程的结果、
//! 持久化的测试日志、解析后的测试摘要以及一次运行的最终结果。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// The captured result of a single child process.
/// 单个子进程的捕获结果。
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CommandResult {
    /// Exit code of the child. Signal-terminated children on Unix report `128 + signal`.
    /// 子进程的退出码。在 Unix 上被信号终止的子进程报告 `128 + signal`。
    pub exit_code: i32,
    /// Captured stdout. Empty when the output went to a file sink.
    pub stdout: String,
    /// Captured stderr. Empty when the output went to a file sink.
    pub stderr: String,
}

impl CommandResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// The combined-output log written by the Execute stage.
/// 由执行阶段写入的合并输出日志。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestLogArtifact {
    pub path: PathBuf,
}

/// Pass/fail counts and failure details parsed out of a harness log.
///
/// Built only through [`TestSummary::new`], so `total_count` and
/// `overall_passed` can never disagree with the counts.
///
/// 从测试日志中解析出的通过/失败计数和失败详情。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestSummary {
    pass_count: usize,
    fail_count: usize,
    total_count: usize,
    failed_test_details: Vec<String>,
    overall_passed: bool,
}

impl TestSummary {
    pub fn new(pass_count: usize, fail_count: usize, failed_test_details: Vec<String>) -> Self {
        Self {
            pass_count,
            fail_count,
            total_count: pass_count + fail_count,
            failed_test_details,
            overall_passed: fail_count == 0,
        }
    }

    pub fn pass_count(&self) -> usize {
        self.pass_count
    }

    pub fn fail_count(&self) -> usize {
        self.fail_count
    }

    pub fn total_count(&self) -> usize {
        self.total_count
    }

    pub fn failed_test_details(&self) -> &[String] {
        &self.failed_test_details
    }

    /// `true` when no test failed. A log with no markers at all also counts
    /// as passed; check [`TestSummary::is_empty`] to tell the two apart.
    pub fn overall_passed(&self) -> bool {
        self.overall_passed
    }

    /// `true` when the log contained no pass or fail markers.
    pub fn is_empty(&self) -> bool {
        self.total_count == 0
    }
}

/// The stages of a run, in execution order.
/// 运行的各个阶段，按执行顺序排列。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Configure,
    Build,
    Execute,
    Aggregate,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Configure => "configure",
            Stage::Build => "build",
            Stage::Execute => "execute",
            Stage::Aggregate => "aggregate",
        }
    }

    /// Only the Execute stage defers its failures to aggregation.
    pub fn defers_failure(&self) -> bool {
        matches!(self, Stage::Execute)
    }

    /// Classifies a child's exit code under this stage's failure policy.
    pub fn classify(&self, exit_code: i32) -> StageOutcome {
        match exit_code {
            0 => StageOutcome::Success,
            code if self.defers_failure() => StageOutcome::DeferredFailure(code),
            code => StageOutcome::Failure(code),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a stage ended.
///
/// `Failure` ends the run: Configure and Build stop the pipeline with it,
/// and Aggregate records a failing verdict with it. `DeferredFailure` is
/// recorded and the pipeline moves on, leaving the verdict to the aggregator.
///
/// 阶段的结束方式。`Failure` 结束本次运行：配置和构建阶段以此终止流水线，
/// 聚合阶段以此记录失败结论；`DeferredFailure` 被记录下来，流水线继续，
/// 由聚合器给出最终结论。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "exit_code", rename_all = "snake_case")]
pub enum StageOutcome {
    Success,
    Failure(i32),
    DeferredFailure(i32),
}

impl StageOutcome {
    /// The Aggregate record for a run that will exit with `exit_code`.
    pub fn verdict(exit_code: u8) -> Self {
        match exit_code {
            0 => StageOutcome::Success,
            code => StageOutcome::Failure(i32::from(code)),
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, StageOutcome::Failure(_))
    }

    pub fn exit_code(&self) -> Option<i32> {
        match self {
            StageOutcome::Success => None,
            StageOutcome::Failure(code) | StageOutcome::DeferredFailure(code) => Some(*code),
        }
    }
}

/// One line of the run ledger: which stage ran, how it ended, how long it took.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageRecord {
    pub stage: Stage,
    pub outcome: StageOutcome,
    pub duration: Duration,
}

/// Terminal value of a completed pipeline run.
/// 一次完整流水线运行的最终值。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PipelineOutcome {
    ConfigureFailed { exit_code: i32 },
    BuildFailed { exit_code: i32 },
    TestsCompleted { summary: TestSummary },
}

impl PipelineOutcome {
    /// The verdict: `true` only when tests ran to completion without failures.
    ///
    /// With `fail_on_empty` set, a log with no markers is a failure too.
    pub fn passed(&self, fail_on_empty: bool) -> bool {
        match self {
            PipelineOutcome::TestsCompleted { summary } => {
                summary.overall_passed() && !(fail_on_empty && summary.is_empty())
            }
            _ => false,
        }
    }

    /// Maps the outcome to the process exit code: 0 on pass, 1 otherwise.
    pub fn exit_code(&self, fail_on_empty: bool) -> u8 {
        if self.passed(fail_on_empty) { 0 } else { 1 }
    }

    pub fn summary(&self) -> Option<&TestSummary> {
        match self {
            PipelineOutcome::TestsCompleted { summary } => Some(summary),
            _ => None,
        }
    }
}

/// Everything a reporter needs about a finished run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineRun {
    pub outcome: PipelineOutcome,
    pub stages: Vec<StageRecord>,
    pub log: Option<TestLogArtifact>,
}
