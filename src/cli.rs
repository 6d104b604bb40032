// src/cli.rs
use anyhow::Result;
use clap::builder::EnumValueParser;
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::{env, path::PathBuf};

use crate::core::config::{BuildType, DEFAULT_SETTINGS_FILE};
use crate::infra::{logging, t};

pub mod commands;

/// Pre-parses the command line arguments to find the language setting.
/// This allows i18n to be initialized before the full CLI is built.
/// It looks for a `--lang <VALUE>` argument.
fn pre_parse_language() -> Option<String> {
    let args: Vec<String> = env::args().collect();
    args.iter()
        .position(|arg| arg == "--lang")
        .and_then(|pos| args.get(pos + 1).cloned())
}

fn system_language() -> String {
    sys_locale::get_locale().unwrap_or_else(|| "en".to_string())
}

pub fn build_cli() -> Command {
    Command::new("ci-test-runner")
        .version(env!("CARGO_PKG_VERSION"))
        .about(t!("cli.about").to_string())
        .args_conflicts_with_subcommands(true)
        .arg(
            Arg::new("lang")
                .long("lang")
                .help(t!("cli.lang").to_string())
                .value_name("LANGUAGE")
                .global(true)
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("build-dir")
                .long("build-dir")
                .help(t!("cli.build_dir").to_string())
                .value_name("PATH")
                .default_value("build")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("build-type")
                .long("build-type")
                .help(t!("cli.build_type").to_string())
                .value_name("TYPE")
                .default_value("Debug")
                .value_parser(EnumValueParser::<BuildType>::new())
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("filter")
                .long("filter")
                .help(t!("cli.filter").to_string())
                .value_name("REGEX")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("sequential")
                .long("sequential")
                .help(t!("cli.sequential").to_string())
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .help(t!("cli.verbose").to_string())
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("cmake-option")
                .long("cmake-option")
                .help(t!("cli.cmake_option").to_string())
                .value_name("OPTION")
                .allow_hyphen_values(true)
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("junit-xml")
                .long("junit-xml")
                .help(t!("cli.junit_xml").to_string())
                .value_name("PATH")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("project-root")
                .long("project-root")
                .help(t!("cli.project_root").to_string())
                .value_name("PATH")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .help(t!("cli.config").to_string())
                .value_name("CONFIG")
                .value_parser(clap::value_parser!(PathBuf))
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("timeout")
                .long("timeout")
                .help(t!("cli.timeout").to_string())
                .value_name("SECONDS")
                .value_parser(clap::value_parser!(u64).range(1..))
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("failure-detail-lines")
                .long("failure-detail-lines")
                .help(t!("cli.failure_detail_lines").to_string())
                .value_name("LINES")
                .value_parser(clap::value_parser!(usize))
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("fail-on-empty")
                .long("fail-on-empty")
                .help(t!("cli.fail_on_empty").to_string())
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("html")
                .long("html")
                .help(t!("cli.html").to_string())
                .value_name("HTML")
                .value_parser(clap::value_parser!(PathBuf))
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("json-summary")
                .long("json-summary")
                .help(t!("cli.json_summary").to_string())
                .value_name("PATH")
                .value_parser(clap::value_parser!(PathBuf))
                .action(ArgAction::Set),
        )
        .subcommand(
            Command::new("init")
                .about(t!("cli.init_about").to_string())
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .help(t!("cli.init_output").to_string())
                        .value_name("PATH")
                        .default_value(DEFAULT_SETTINGS_FILE)
                        .value_parser(clap::value_parser!(PathBuf))
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("force")
                        .long("force")
                        .help(t!("cli.init_force").to_string())
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("non-interactive")
                        .long("non-interactive")
                        .help(t!("cli.init_non_interactive").to_string())
                        .action(ArgAction::SetTrue),
                ),
        )
}

/// Parses the command line, runs the selected command and returns the
/// process exit code.
pub async fn run() -> Result<u8> {
    // Pre-parse language and initialize i18n first.
    let explicit_language = pre_parse_language();
    let language = explicit_language.clone().unwrap_or_else(system_language);
    crate::set_language(&language);
    logging::init_logging("warn");

    let matches = build_cli().get_matches();

    match matches.subcommand() {
        Some(("init", init_matches)) => {
            commands::init::execute(init_args(init_matches), &language)?;
            Ok(0)
        }
        _ => {
            let args = commands::run::RunArgs::from_matches(&matches);
            commands::run::execute(args, explicit_language.is_some()).await
        }
    }
}

fn init_args(matches: &ArgMatches) -> commands::init::InitArgs {
    commands::init::InitArgs {
        output: matches
            .get_one::<PathBuf>("output")
            .cloned()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SETTINGS_FILE)),
        force: matches.get_flag("force"),
        non_interactive: matches.get_flag("non-interactive"),
    }
}
