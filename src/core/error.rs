//! # Error Types Module / 错误类型模块
//!
//! Typed errors for every layer of the pipeline. Stage failures that are
//! "data" (a non-zero exit code) are not errors; they travel as
//! [`StageOutcome`](crate::core::models::StageOutcome) values instead.
//!
//! 流水线各层的类型化错误。作为"数据"的阶段失败（非零退出码）不是错误，
//! 而是以 `StageOutcome` 值的形式传递。

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Failures of the process runner itself, as opposed to a child that ran and
/// exited non-zero.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The command line had no program to run.
    #[error("refusing to run an empty command")]
    EmptyCommand,

    /// The operating system could not start the program.
    #[error("failed to launch '{program}': {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The output sink could not be opened or written.
    #[error("failed to open output sink '{}': {source}", path.display())]
    Sink {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The child exceeded its deadline and was killed.
    #[error("'{program}' did not finish within {}s and was killed", after.as_secs())]
    TimedOut { program: String, after: Duration },

    /// The run was interrupted (Ctrl-C) while the child was running.
    #[error("'{program}' was interrupted")]
    Cancelled { program: String },
}

/// The harness log could not be turned into a summary.
#[derive(Debug, Error)]
pub enum AggregationError {
    /// The artifact is missing or could not be read.
    #[error("test log '{}' is missing or unreadable: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Problems with the settings file or invocation-time options.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown build type '{0}' (expected Debug, Release, RelWithDebInfo or MinSizeRel)")]
    InvalidBuildType(String),

    #[error("failed to read settings file '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings file '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to expand path '{raw}': {message}")]
    PathExpansion { raw: String, message: String },

    #[error("failure detail limit must be at least 1")]
    ZeroDetailLimit,
}

/// Fatal errors that abort the pipeline before a verdict can be reached.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("could not create build directory '{}': {source}", path.display())]
    BuildDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{stage} stage aborted: {source}")]
    Process {
        stage: &'static str,
        #[source]
        source: ProcessError,
    },

    #[error(transparent)]
    Aggregation(#[from] AggregationError),
}
