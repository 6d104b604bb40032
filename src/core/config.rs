//! # Configuration Module / 配置模块
//!
//! Two layers of configuration live here:
//!
//! - [`RunnerSettings`]: the optional `CiTestRunner.toml` file with tool
//!   locations, the log name, timeouts and environment overrides.
//! - [`PipelineConfig`]: the immutable per-run configuration resolved from
//!   CLI flags and settings. Stages only ever read it.
//!
//! 此处包含两层配置：可选的 `CiTestRunner.toml` 设置文件，
//! 以及由命令行参数和设置解析得到的、每次运行不可变的 `PipelineConfig`。

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::core::error::ConfigError;

/// Default settings file name, looked up in the current directory.
pub const DEFAULT_SETTINGS_FILE: &str = "CiTestRunner.toml";

/// Default number of lines scanned after the failure-summary marker.
pub const DEFAULT_FAILURE_DETAIL_LIMIT: usize = 9;

/// CMake build configurations accepted by the Configure and Build stages.
/// Configure 和 Build 阶段接受的 CMake 构建类型。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
pub enum BuildType {
    #[default]
    #[value(name = "Debug")]
    Debug,
    #[value(name = "Release")]
    Release,
    #[value(name = "RelWithDebInfo")]
    RelWithDebInfo,
    #[value(name = "MinSizeRel")]
    MinSizeRel,
}

impl BuildType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildType::Debug => "Debug",
            BuildType::Release => "Release",
            BuildType::RelWithDebInfo => "RelWithDebInfo",
            BuildType::MinSizeRel => "MinSizeRel",
        }
    }
}

impl fmt::Display for BuildType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Debug" => Ok(BuildType::Debug),
            "Release" => Ok(BuildType::Release),
            "RelWithDebInfo" => Ok(BuildType::RelWithDebInfo),
            "MinSizeRel" => Ok(BuildType::MinSizeRel),
            other => Err(ConfigError::InvalidBuildType(other.to_string())),
        }
    }
}

/// Contents of the optional settings file.
/// 可选设置文件的内容。
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RunnerSettings {
    /// The language for the runner's output messages (e.g., "en", "zh-CN").
    /// 运行器输出消息的语言（例如 "en", "zh-CN"）。
    pub language: String,
    /// Source tree handed to the configure step. Relative paths resolve
    /// against the current directory.
    pub project_root: String,
    /// Build-system executable used for both configuring and building.
    pub configure_program: String,
    /// Test harness executable.
    pub harness_program: String,
    /// Name of the combined-output log inside the build directory.
    pub log_file: String,
    /// Lines scanned after the failure-summary marker.
    pub failure_detail_limit: usize,
    /// Per-process deadline. No deadline when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage_timeout_secs: Option<u64>,
    /// Treat a log with no pass/fail markers as a failed run.
    pub fail_on_empty: bool,
    /// Environment overrides applied to every child process.
    pub env: BTreeMap<String, String>,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            project_root: ".".to_string(),
            configure_program: "cmake".to_string(),
            harness_program: "ctest".to_string(),
            log_file: "test_output.log".to_string(),
            failure_detail_limit: DEFAULT_FAILURE_DETAIL_LIMIT,
            stage_timeout_secs: None,
            fail_on_empty: false,
            env: BTreeMap::new(),
        }
    }
}

impl RunnerSettings {
    /// Loads settings from `path`.
    ///
    /// When `explicit` is false and the file does not exist, defaults are
    /// returned. An explicitly requested file must exist.
    pub fn load(path: &Path, explicit: bool) -> Result<Self, ConfigError> {
        if !explicit && !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content, path)
    }

    pub fn from_toml(content: &str, origin: &Path) -> Result<Self, ConfigError> {
        let settings: Self = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })?;
        if settings.failure_detail_limit == 0 {
            return Err(ConfigError::ZeroDetailLimit);
        }
        Ok(settings)
    }

    pub fn stage_timeout(&self) -> Option<Duration> {
        self.stage_timeout_secs.map(Duration::from_secs)
    }
}

/// Expands `~` and environment variables in a user-supplied path.
pub fn expand_path(raw: &str) -> Result<PathBuf, ConfigError> {
    shellexpand::full(raw)
        .map(|expanded| PathBuf::from(expanded.as_ref()))
        .map_err(|e| ConfigError::PathExpansion {
            raw: raw.to_string(),
            message: e.to_string(),
        })
}

/// The immutable configuration of one pipeline run.
///
/// Built once through [`PipelineConfigBuilder`]; every field is read-only
/// afterwards.
///
/// 一次流水线运行的不可变配置。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineConfig {
    project_root: PathBuf,
    build_dir: PathBuf,
    build_type: BuildType,
    extra_config_options: Vec<String>,
    test_filter: Option<String>,
    parallel: bool,
    verbose: bool,
    junit_output_path: Option<PathBuf>,
    configure_program: String,
    harness_program: String,
    log_file: String,
    failure_detail_limit: usize,
    #[serde(skip)]
    stage_timeout: Option<Duration>,
    fail_on_empty: bool,
    env: BTreeMap<String, String>,
}

impl PipelineConfig {
    pub fn builder(build_dir: impl Into<PathBuf>) -> PipelineConfigBuilder {
        PipelineConfigBuilder::new(build_dir)
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn build_dir(&self) -> &Path {
        &self.build_dir
    }

    pub fn build_type(&self) -> BuildType {
        self.build_type
    }

    pub fn extra_config_options(&self) -> &[String] {
        &self.extra_config_options
    }

    pub fn test_filter(&self) -> Option<&str> {
        self.test_filter.as_deref()
    }

    pub fn parallel(&self) -> bool {
        self.parallel
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    pub fn junit_output_path(&self) -> Option<&Path> {
        self.junit_output_path.as_deref()
    }

    pub fn configure_program(&self) -> &str {
        &self.configure_program
    }

    pub fn harness_program(&self) -> &str {
        &self.harness_program
    }

    /// Fixed location of the harness log inside the build directory.
    pub fn log_path(&self) -> PathBuf {
        self.build_dir.join(&self.log_file)
    }

    pub fn failure_detail_limit(&self) -> usize {
        self.failure_detail_limit
    }

    pub fn stage_timeout(&self) -> Option<Duration> {
        self.stage_timeout
    }

    pub fn fail_on_empty(&self) -> bool {
        self.fail_on_empty
    }

    pub fn env(&self) -> &BTreeMap<String, String> {
        &self.env
    }
}

/// Collects invocation-time parameters into a [`PipelineConfig`].
#[derive(Debug, Clone)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    fn new(build_dir: impl Into<PathBuf>) -> Self {
        let defaults = RunnerSettings::default();
        Self {
            config: PipelineConfig {
                project_root: PathBuf::from(&defaults.project_root),
                build_dir: build_dir.into(),
                build_type: BuildType::default(),
                extra_config_options: Vec::new(),
                test_filter: None,
                parallel: true,
                verbose: false,
                junit_output_path: None,
                configure_program: defaults.configure_program,
                harness_program: defaults.harness_program,
                log_file: defaults.log_file,
                failure_detail_limit: defaults.failure_detail_limit,
                stage_timeout: None,
                fail_on_empty: false,
                env: BTreeMap::new(),
            },
        }
    }

    /// Copies tool locations, limits and environment from a settings file.
    pub fn settings(mut self, settings: &RunnerSettings) -> Self {
        self.config.configure_program = settings.configure_program.clone();
        self.config.harness_program = settings.harness_program.clone();
        self.config.log_file = settings.log_file.clone();
        self.config.failure_detail_limit = settings.failure_detail_limit;
        self.config.stage_timeout = settings.stage_timeout();
        self.config.fail_on_empty = settings.fail_on_empty;
        self.config.env = settings.env.clone();
        self
    }

    pub fn project_root(mut self, project_root: impl Into<PathBuf>) -> Self {
        self.config.project_root = project_root.into();
        self
    }

    pub fn build_type(mut self, build_type: BuildType) -> Self {
        self.config.build_type = build_type;
        self
    }

    /// Extra configure options, kept in the order given.
    pub fn extra_config_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.extra_config_options = options.into_iter().map(Into::into).collect();
        self
    }

    /// An empty filter is the same as no filter.
    pub fn test_filter(mut self, filter: Option<String>) -> Self {
        self.config.test_filter = filter.filter(|f| !f.is_empty());
        self
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.config.parallel = parallel;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.config.verbose = verbose;
        self
    }

    /// An empty path is the same as no structured report.
    pub fn junit_output_path(mut self, path: Option<PathBuf>) -> Self {
        self.config.junit_output_path = path.filter(|p| !p.as_os_str().is_empty());
        self
    }

    pub fn failure_detail_limit(mut self, limit: usize) -> Self {
        self.config.failure_detail_limit = limit;
        self
    }

    pub fn stage_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.stage_timeout = timeout;
        self
    }

    pub fn fail_on_empty(mut self, fail_on_empty: bool) -> Self {
        self.config.fail_on_empty = fail_on_empty;
        self
    }

    pub fn build(self) -> Result<PipelineConfig, ConfigError> {
        if self.config.failure_detail_limit == 0 {
            return Err(ConfigError::ZeroDetailLimit);
        }
        Ok(self.config)
    }
}
