//! # Run Command Module / 运行命令模块
//!
//! This module implements the default command of the CLI: resolve the run
//! configuration, drive the pipeline, print the summary, write the optional
//! reports and map the verdict to an exit code.
//!
//! 此模块实现 CLI 的默认命令：解析运行配置、驱动流水线、打印摘要、
//! 写出可选报告，并将结论映射为退出码。

use anyhow::{Context, Result};
use chrono::Local;
use clap::ArgMatches;
use colored::*;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::{
    core::{
        config::{self, BuildType, DEFAULT_SETTINGS_FILE, PipelineConfig, RunnerSettings},
        pipeline::Pipeline,
    },
    infra::{command::SystemRunner, fs, t},
    reporting::{RunReport, console, write_html_report, write_json_report},
};

/// Parsed flags of the run command.
#[derive(Debug, Clone, Default)]
pub struct RunArgs {
    pub build_dir: String,
    pub build_type: BuildType,
    pub filter: Option<String>,
    pub sequential: bool,
    pub verbose: bool,
    pub cmake_options: Vec<String>,
    pub junit_xml: Option<String>,
    pub project_root: Option<String>,
    pub config: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
    pub failure_detail_lines: Option<usize>,
    pub fail_on_empty: bool,
    pub html: Option<PathBuf>,
    pub json_summary: Option<PathBuf>,
}

impl RunArgs {
    pub fn from_matches(matches: &ArgMatches) -> Self {
        Self {
            build_dir: matches
                .get_one::<String>("build-dir")
                .cloned()
                .unwrap_or_else(|| "build".to_string()),
            build_type: matches
                .get_one::<BuildType>("build-type")
                .copied()
                .unwrap_or_default(),
            filter: matches.get_one::<String>("filter").cloned(),
            sequential: matches.get_flag("sequential"),
            verbose: matches.get_flag("verbose"),
            cmake_options: matches
                .get_many::<String>("cmake-option")
                .map(|values| values.cloned().collect())
                .unwrap_or_default(),
            junit_xml: matches.get_one::<String>("junit-xml").cloned(),
            project_root: matches.get_one::<String>("project-root").cloned(),
            config: matches.get_one::<PathBuf>("config").cloned(),
            timeout_secs: matches.get_one::<u64>("timeout").copied(),
            failure_detail_lines: matches.get_one::<usize>("failure-detail-lines").copied(),
            fail_on_empty: matches.get_flag("fail-on-empty"),
            html: matches.get_one::<PathBuf>("html").cloned(),
            json_summary: matches.get_one::<PathBuf>("json-summary").cloned(),
        }
    }
}

/// Executes the run command with the provided arguments.
///
/// # Arguments
/// * `args` - Parsed command-line flags
/// * `language_fixed` - `true` when `--lang` was given, so the settings file
///   must not override it
///
/// # Returns
/// The process exit code: 0 when every test passed, 1 otherwise
pub async fn execute(args: RunArgs, language_fixed: bool) -> Result<u8> {
    console::init_color();
    console::print_banner();

    let (settings, from_file) = load_settings(args.config.as_deref())?;
    if !language_fixed && from_file {
        crate::set_language(&settings.language);
    }

    let config = resolve_config(&args, &settings)?;
    debug!(?config, "resolved pipeline configuration");

    let cancel = setup_signal_handler();
    let runner = SystemRunner::new(cancel);
    let pipeline = Pipeline::new(&runner, &config);

    let started_at = Local::now();
    let run = match pipeline.run().await {
        Ok(run) => run,
        Err(e) => {
            console::print_fatal(&anyhow::Error::new(e));
            return Ok(1);
        }
    };
    let finished_at = Local::now();

    console::print_run(&run, config.fail_on_empty());

    let report = RunReport::new(&run, &config, started_at, finished_at);
    if let Some(path) = &args.json_summary {
        match write_json_report(&report, path) {
            Ok(()) => console::success(&t!("report.json_written", path = path.display())),
            Err(e) => console::error(&format!("{e:#}")),
        }
    }
    if let Some(path) = &args.html {
        match write_html_report(&report, path) {
            Ok(()) => console::success(&t!("report.html_written", path = path.display())),
            Err(e) => console::error(&format!("{e:#}")),
        }
    }

    Ok(run.outcome.exit_code(config.fail_on_empty()))
}

/// Loads the settings file. The default file is optional; an explicit
/// `--config` must exist.
///
/// # Returns
/// The settings and whether they came from a file rather than defaults
fn load_settings(explicit: Option<&Path>) -> Result<(RunnerSettings, bool)> {
    let (path, is_explicit) = match explicit {
        Some(path) => (path.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_SETTINGS_FILE), false),
    };
    let from_file = is_explicit || path.is_file();
    let settings = RunnerSettings::load(&path, is_explicit)
        .with_context(|| t!("config.load_failed", path = path.display()).to_string())?;
    Ok((settings, from_file))
}

/// Merges CLI flags over the settings file into the immutable run config.
///
/// The project root resolves against the current directory and the build
/// directory against the project root. The JUnit path is forwarded as given,
/// so a relative path lands inside the build directory.
pub fn resolve_config(args: &RunArgs, settings: &RunnerSettings) -> Result<PipelineConfig> {
    let project_root_raw = args
        .project_root
        .as_deref()
        .unwrap_or(&settings.project_root);
    let project_root = fs::absolute_path(&config::expand_path(project_root_raw)?)
        .with_context(|| format!("Failed to resolve project root '{project_root_raw}'"))?;
    let build_dir = fs::absolute_from(&project_root, &config::expand_path(&args.build_dir)?);
    let junit = args
        .junit_xml
        .as_deref()
        .filter(|raw| !raw.is_empty())
        .map(config::expand_path)
        .transpose()?;

    let config = PipelineConfig::builder(build_dir)
        .settings(settings)
        .project_root(project_root)
        .build_type(args.build_type)
        .extra_config_options(args.cmake_options.iter().cloned())
        .test_filter(args.filter.clone())
        .parallel(!args.sequential)
        .verbose(args.verbose)
        .junit_output_path(junit)
        .failure_detail_limit(
            args.failure_detail_lines
                .unwrap_or(settings.failure_detail_limit),
        )
        .stage_timeout(
            args.timeout_secs
                .map(Duration::from_secs)
                .or_else(|| settings.stage_timeout()),
        )
        .fail_on_empty(args.fail_on_empty || settings.fail_on_empty)
        .build()?;
    Ok(config)
}

/// Sets up a signal handler that kills the running child on Ctrl-C.
fn setup_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            println!("\n{}", t!("shutdown_signal").yellow());
            token_clone.cancel();
        }
    });

    token
}
