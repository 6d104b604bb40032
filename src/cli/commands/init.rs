//! # Init Command Module / 初始化命令模块
//!
//! This module implements the `init` command, which writes a
//! `CiTestRunner.toml` settings file, either with defaults or through an
//! interactive wizard.
//!
//! 此模块实现 `init` 命令，用于写出 `CiTestRunner.toml` 设置文件，
//! 可以使用默认值，也可以通过交互式向导生成。

use anyhow::{Context, Result};
use colored::*;
use dialoguer::{Confirm, Input, Select, theme::ColorfulTheme};
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::config::{DEFAULT_FAILURE_DETAIL_LIMIT, RunnerSettings};
use crate::infra::t;

const SETTINGS_HEADER: &str = "# CI test runner settings / CI 测试运行器设置\n\n";

const LANGUAGES: [&str; 2] = ["en", "zh-CN"];

/// Flags of the `init` subcommand.
#[derive(Debug, Clone)]
pub struct InitArgs {
    pub output: PathBuf,
    pub force: bool,
    pub non_interactive: bool,
}

/// Executes the init command with the provided arguments.
///
/// An existing file is only replaced with `--force` or, in interactive mode,
/// after confirmation.
pub fn execute(args: InitArgs, language: &str) -> Result<()> {
    let theme = ColorfulTheme::default();

    if !args.non_interactive {
        println!("\n{}", t!("init.welcome").cyan().bold());
        println!("{}", t!("init.description"));
    }

    if args.output.exists() && !args.force {
        if args.non_interactive {
            anyhow::bail!(t!("init.file_exists", path = args.output.display()).to_string());
        }
        let confirmation = Confirm::with_theme(&theme)
            .with_prompt(t!("init.overwrite_prompt", path = args.output.display()).to_string())
            .default(false)
            .interact()
            .context(t!("init.confirmation_failed").to_string())?;
        if !confirmation {
            println!("{}", t!("init.aborted"));
            return Ok(());
        }
    }

    let settings = if args.non_interactive {
        RunnerSettings::default()
    } else {
        run_wizard(&theme, language)?
    };

    write_settings(&args.output, &settings)
}

fn run_wizard(theme: &ColorfulTheme, language: &str) -> Result<RunnerSettings> {
    let defaults = RunnerSettings::default();
    let wizard_failed = || t!("init.confirmation_failed").to_string();

    let default_language = LANGUAGES
        .iter()
        .position(|code| *code == language)
        .unwrap_or(0);
    let language_index = Select::with_theme(theme)
        .with_prompt(t!("init.language_prompt").to_string())
        .items(&LANGUAGES)
        .default(default_language)
        .interact()
        .with_context(wizard_failed)?;

    let project_root: String = Input::with_theme(theme)
        .with_prompt(t!("init.project_root_prompt").to_string())
        .default(defaults.project_root.clone())
        .interact_text()
        .with_context(wizard_failed)?;

    let configure_program: String = Input::with_theme(theme)
        .with_prompt(t!("init.configure_program_prompt").to_string())
        .default(defaults.configure_program.clone())
        .interact_text()
        .with_context(wizard_failed)?;

    let harness_program: String = Input::with_theme(theme)
        .with_prompt(t!("init.harness_program_prompt").to_string())
        .default(defaults.harness_program.clone())
        .interact_text()
        .with_context(wizard_failed)?;

    let failure_detail_limit: usize = Input::with_theme(theme)
        .with_prompt(t!("init.detail_limit_prompt").to_string())
        .default(DEFAULT_FAILURE_DETAIL_LIMIT)
        .validate_with(|limit: &usize| {
            if *limit > 0 {
                Ok(())
            } else {
                Err(t!("init.detail_limit_invalid").to_string())
            }
        })
        .interact_text()
        .with_context(wizard_failed)?;

    let timeout: u64 = Input::with_theme(theme)
        .with_prompt(t!("init.timeout_prompt").to_string())
        .default(0)
        .interact_text()
        .with_context(wizard_failed)?;

    let fail_on_empty = Confirm::with_theme(theme)
        .with_prompt(t!("init.fail_on_empty_prompt").to_string())
        .default(false)
        .interact()
        .with_context(wizard_failed)?;

    Ok(RunnerSettings {
        language: LANGUAGES[language_index].to_string(),
        project_root,
        configure_program,
        harness_program,
        failure_detail_limit,
        stage_timeout_secs: (timeout > 0).then_some(timeout),
        fail_on_empty,
        ..defaults
    })
}

fn write_settings(path: &Path, settings: &RunnerSettings) -> Result<()> {
    let toml_string =
        toml::to_string_pretty(settings).context(t!("init.serialize_failed").to_string())?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| t!("init.create_parent_dir_failed", path = parent.display()).to_string())?;
    }

    fs::write(path, format!("{SETTINGS_HEADER}{toml_string}"))
        .with_context(|| t!("init.write_failed", path = path.display()).to_string())?;

    println!(
        "\n{} {}",
        "✔".green(),
        t!("init.success", path = path.display()).bold()
    );
    println!("{}", t!("init.usage_hint"));

    Ok(())
}
