//! # Result Aggregator Module / 结果聚合模块
//!
//! Turns the harness log into a [`TestSummary`]. Counting is a plain
//! occurrence count of the harness's per-test marker lines, so the summary
//! is a pure function of the log text.
//!
//! 将测试日志转换为 `TestSummary`。计数是对测试工具逐条输出的标记行的
//! 简单出现次数统计，因此摘要是日志文本的纯函数。

use std::fs;
use std::path::Path;

use crate::core::error::AggregationError;
use crate::core::models::TestSummary;

/// Marker emitted by the harness for each passing test.
pub const PASS_MARKER: &str = "Test Passed";

/// Marker emitted by the harness for each failing test.
pub const FAIL_MARKER: &str = "Test Failed";

/// Header of the harness's failure-summary section.
pub const FAILURE_SECTION_MARKER: &str = "The following tests FAILED:";

/// Reads the log at `artifact_path` and summarizes it.
///
/// A missing or unreadable log is an error, never an empty summary. Bytes
/// that are not valid UTF-8 (raw test output) are replaced, not rejected.
///
/// # Arguments
/// * `artifact_path` - Path of the combined harness log
/// * `detail_limit` - Lines scanned after the failure-summary marker
pub fn aggregate(artifact_path: &Path, detail_limit: usize) -> Result<TestSummary, AggregationError> {
    let bytes = fs::read(artifact_path).map_err(|source| AggregationError::Unreadable {
        path: artifact_path.to_path_buf(),
        source,
    })?;
    Ok(summarize(&String::from_utf8_lossy(&bytes), detail_limit))
}

/// Summarizes log text that is already in memory.
///
/// Markers are counted wherever they occur, duplicates included. Failure
/// details are collected only when at least one failure was counted.
pub fn summarize(log: &str, detail_limit: usize) -> TestSummary {
    let pass_count = log.matches(PASS_MARKER).count();
    let fail_count = log.matches(FAIL_MARKER).count();

    let details = if fail_count > 0 {
        extract_failure_details(log, detail_limit)
    } else {
        Vec::new()
    };

    TestSummary::new(pass_count, fail_count, details)
}

/// Returns the non-blank lines among the `window` lines that follow the
/// first failure-summary marker.
///
/// The window counts raw lines, so blank lines inside it shrink the result
/// instead of pulling in lines further down.
///
/// 返回第一个失败摘要标记之后 `window` 行中的非空行。
pub fn extract_failure_details(log: &str, window: usize) -> Vec<String> {
    let mut lines = log.lines();
    if !lines.any(|line| line.contains(FAILURE_SECTION_MARKER)) {
        return Vec::new();
    }

    lines
        .take(window)
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.trim_end().to_string())
        .collect()
}
