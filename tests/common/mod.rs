// Shared test helpers for integration tests
#![allow(dead_code)]

use ci_test_runner::core::error::ProcessError;
use ci_test_runner::infra::command::{Invocation, OutputSink, ProcessRunner};
use ci_test_runner::models::CommandResult;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tempfile::TempDir;

/// A harness log with three passing tests and one failure.
pub const MIXED_LOG: &str = "\
Test project /tmp/build
    Start 1: lexer
1/4 Test Passed lexer
    Start 2: parser
2/4 Test Passed parser
    Start 3: codegen
3/4 Test Failed codegen
    Start 4: linker
4/4 Test Passed linker

75% tests passed, 1 tests failed out of 4

The following tests FAILED:
\t  3 - codegen (Failed)
\t  3 - codegen (Subprocess aborted)
";

/// Deadline reported by scripted timeouts.
pub const SCRIPTED_TIMEOUT: Duration = Duration::from_secs(60);

/// Which kind of call a scripted invocation is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Configure,
    Build,
    Listing,
    Harness,
}

pub fn classify(invocation: &Invocation) -> CallKind {
    if invocation.args.iter().any(|a| a == "--show-only") {
        CallKind::Listing
    } else if invocation.args.first().is_some_and(|a| a == "--build") {
        CallKind::Build
    } else if invocation
        .args
        .first()
        .is_some_and(|a| a.starts_with("-DCMAKE_BUILD_TYPE="))
    {
        CallKind::Configure
    } else {
        CallKind::Harness
    }
}

/// A `ProcessRunner` that records every call and answers from a script
/// instead of spawning anything.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    pub configure_exit: i32,
    pub build_exit: i32,
    pub harness_exit: i32,
    pub listing: Option<String>,
    /// Written to the harness's file sink. `None` leaves no log behind.
    pub harness_log: Option<String>,
    pub fail_harness_launch: bool,
    /// The call of this kind hits its deadline. A harness still leaves its log behind.
    pub timeout_on: Option<CallKind>,
    /// The call of this kind is interrupted as if by Ctrl-C.
    pub cancel_on: Option<CallKind>,
    pub calls: Mutex<Vec<Invocation>>,
}

impl ScriptedRunner {
    pub fn passing(log: &str) -> Self {
        Self {
            harness_log: Some(log.to_string()),
            listing: Some("  Test #1: lexer\n  Test #2: parser\n\nTotal Tests: 2\n".to_string()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, kind: CallKind) -> usize {
        self.calls()
            .iter()
            .filter(|invocation| classify(invocation) == kind)
            .count()
    }
}

impl ProcessRunner for ScriptedRunner {
    async fn run(&self, invocation: &Invocation, sink: OutputSink) -> Result<CommandResult, ProcessError> {
        self.calls.lock().unwrap().push(invocation.clone());

        let result = |exit_code: i32, stdout: &str| CommandResult {
            exit_code,
            stdout: stdout.to_string(),
            stderr: String::new(),
        };

        let kind = classify(invocation);
        if kind == CallKind::Harness {
            if self.fail_harness_launch {
                return Err(ProcessError::Launch {
                    program: invocation.program.clone(),
                    source: std::io::Error::from(std::io::ErrorKind::NotFound),
                });
            }
            if let (OutputSink::File(path), Some(log)) = (&sink, &self.harness_log) {
                fs::write(path, log).unwrap();
            }
        }
        if self.timeout_on == Some(kind) {
            return Err(ProcessError::TimedOut {
                program: invocation.program.clone(),
                after: SCRIPTED_TIMEOUT,
            });
        }
        if self.cancel_on == Some(kind) {
            return Err(ProcessError::Cancelled {
                program: invocation.program.clone(),
            });
        }

        match kind {
            CallKind::Configure => Ok(result(self.configure_exit, "")),
            CallKind::Build => Ok(result(self.build_exit, "")),
            CallKind::Listing => match &self.listing {
                Some(listing) => Ok(result(0, listing)),
                None => Ok(result(8, "")),
            },
            CallKind::Harness => Ok(result(self.harness_exit, "")),
        }
    }
}

/// Writes an executable shell script into `dir`.
#[cfg(unix)]
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("Failed to write script");
    let mut permissions = fs::metadata(&path).unwrap().permissions();
    permissions.set_mode(0o755);
    fs::set_permissions(&path, permissions).unwrap();
    path
}

/// A fake project: a source dir plus fake `cmake`/`ctest` scripts, and a
/// settings file pointing at them.
///
/// The fake `ctest` prints `ctest_output` (and exits with `ctest_exit`)
/// unless it is asked for `--show-only`. Every invocation's arguments are
/// appended to `calls.log` in the temp dir.
#[cfg(unix)]
pub fn setup_fake_project(cmake_exit: i32, ctest_output: &str, ctest_exit: i32) -> TempDir {
    let temp_dir = tempfile::tempdir().expect("Failed to create temporary directory");
    let root = temp_dir.path();
    fs::create_dir_all(root.join("src")).unwrap();
    fs::write(root.join("ctest_output.txt"), ctest_output).unwrap();
    let calls = root.join("calls.log");

    let cmake = write_script(
        root,
        "fake-cmake",
        &format!(
            "echo \"cmake $*\" >> '{calls}'\nexit {cmake_exit}",
            calls = calls.display()
        ),
    );
    let ctest = write_script(
        root,
        "fake-ctest",
        &format!(
            "echo \"ctest $*\" >> '{calls}'\n\
             case \"$*\" in\n\
             *--show-only*) echo '  Test #1: lexer'; exit 0 ;;\n\
             esac\n\
             cat '{output}'\n\
             echo 'harness stderr line' >&2\n\
             exit {ctest_exit}",
            calls = calls.display(),
            output = root.join("ctest_output.txt").display()
        ),
    );

    let settings = format!(
        "project_root = '{root}'\nconfigure_program = '{cmake}'\nharness_program = '{ctest}'\n",
        root = root.join("src").display(),
        cmake = cmake.display(),
        ctest = ctest.display()
    );
    fs::write(root.join("settings.toml"), settings).unwrap();

    temp_dir
}
