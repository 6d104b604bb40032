//! # Pipeline Stages Module / 流水线阶段模块
//!
//! The three process-backed stages: Configure, Build and Execute. Each one
//! builds its command line from the [`PipelineConfig`], runs it through a
//! [`ProcessRunner`] and classifies the exit code with its stage's failure
//! policy.
//!
//! 三个基于进程的阶段：配置、构建和执行。每个阶段根据 `PipelineConfig`
//! 构造命令行，通过 `ProcessRunner` 运行，并按照该阶段的失败策略对退出码分类。

use tracing::{debug, info, warn};

use crate::core::config::PipelineConfig;
use crate::core::error::{PipelineError, ProcessError};
use crate::core::models::{Stage, StageOutcome, TestLogArtifact};
use crate::infra::command::{Invocation, OutputSink, ProcessRunner};
use crate::infra::{fs, t};
use crate::reporting::console;

/// Job count used when the processor count cannot be detected.
pub const FALLBACK_PARALLELISM: usize = 2;

/// Exit code recorded for a harness run that hit its deadline.
pub const HARNESS_TIMEOUT_EXIT_CODE: i32 = 124;

/// Marker of a test entry in the harness's `--show-only` listing.
const LISTING_ENTRY_MARKER: &str = "Test #";

/// Number of logical processors, or `None` if it cannot be determined.
pub fn detect_processor_count() -> Option<usize> {
    Some(num_cpus::get()).filter(|count| *count > 0)
}

/// Job count for the Build and Execute stages.
pub fn parallelism(parallel: bool) -> usize {
    resolve_parallelism(parallel, detect_processor_count)
}

/// Job count with an injectable detector: 1 when sequential, the detected
/// count when parallel, [`FALLBACK_PARALLELISM`] when detection fails.
pub fn resolve_parallelism(parallel: bool, detect: impl FnOnce() -> Option<usize>) -> usize {
    if !parallel {
        return 1;
    }
    detect().unwrap_or(FALLBACK_PARALLELISM)
}

fn base_invocation(cfg: &PipelineConfig, program: &str) -> Invocation {
    Invocation::new(program, cfg.build_dir())
        .envs(cfg.env())
        .timeout(cfg.stage_timeout())
}

/// `cmake -DCMAKE_BUILD_TYPE=<type> <extra options...> <project root>`,
/// run inside the build directory. Extra options keep their given order.
pub fn configure_invocation(cfg: &PipelineConfig) -> Invocation {
    base_invocation(cfg, cfg.configure_program())
        .arg(format!("-DCMAKE_BUILD_TYPE={}", cfg.build_type()))
        .args(cfg.extra_config_options().iter().cloned())
        .arg(cfg.project_root().to_string_lossy())
}

/// `cmake --build . --config <type> --parallel <jobs>`.
pub fn build_invocation(cfg: &PipelineConfig, parallelism: usize) -> Invocation {
    base_invocation(cfg, cfg.configure_program())
        .args(["--build", ".", "--config"])
        .arg(cfg.build_type().as_str())
        .arg("--parallel")
        .arg(parallelism.to_string())
}

/// The harness command line.
///
/// `-j` only when parallel, `-V` or `--output-on-failure`, `-R` only for a
/// non-empty filter, `--output-junit` only when a report path was requested.
pub fn harness_invocation(cfg: &PipelineConfig, parallelism: usize) -> Invocation {
    let mut invocation = base_invocation(cfg, cfg.harness_program());
    if cfg.parallel() {
        invocation = invocation.arg("-j").arg(parallelism.to_string());
    }
    invocation = invocation.arg(if cfg.verbose() { "-V" } else { "--output-on-failure" });
    if let Some(filter) = cfg.test_filter() {
        invocation = invocation.arg("-R").arg(filter);
    }
    if let Some(junit) = cfg.junit_output_path() {
        invocation = invocation.arg("--output-junit").arg(junit.to_string_lossy());
    }
    invocation
}

/// `ctest --show-only`, narrowed by the same filter as the real run.
pub fn listing_invocation(cfg: &PipelineConfig) -> Invocation {
    let invocation = base_invocation(cfg, cfg.harness_program()).arg("--show-only");
    match cfg.test_filter() {
        Some(filter) => invocation.arg("-R").arg(filter),
        None => invocation,
    }
}

/// Picks the test entries out of a `--show-only` listing.
pub fn parse_test_listing(listing: &str) -> Vec<String> {
    listing
        .lines()
        .filter(|line| line.contains(LISTING_ENTRY_MARKER))
        .map(|line| line.trim().to_string())
        .collect()
}

fn process_error(stage: Stage, source: ProcessError) -> PipelineError {
    PipelineError::Process {
        stage: stage.as_str(),
        source,
    }
}

/// Configure stage. Creates the build directory when missing, then runs the
/// build-system generator in it.
///
/// A non-zero exit yields [`StageOutcome::Failure`]; the caller must not run
/// any later stage.
pub async fn configure<R: ProcessRunner>(
    runner: &R,
    cfg: &PipelineConfig,
) -> Result<StageOutcome, PipelineError> {
    console::section(&t!("stage.configure"));

    let created = fs::ensure_dir(cfg.build_dir()).map_err(|source| PipelineError::BuildDir {
        path: cfg.build_dir().to_path_buf(),
        source,
    })?;
    if created {
        console::success(&t!("configure.created_dir", path = cfg.build_dir().display()));
    }

    let invocation = configure_invocation(cfg);
    console::running(&invocation);
    let result = runner
        .run(&invocation, OutputSink::Tee)
        .await
        .map_err(|e| process_error(Stage::Configure, e))?;

    let outcome = Stage::Configure.classify(result.exit_code);
    match outcome {
        StageOutcome::Success => {
            info!(build_type = %cfg.build_type(), "configured");
            console::success(&t!("configure.success", build_type = cfg.build_type()));
        }
        _ => console::error(&t!("configure.failed", code = result.exit_code)),
    }
    Ok(outcome)
}

/// Build stage. Compiles the project with `parallelism` jobs.
pub async fn build<R: ProcessRunner>(
    runner: &R,
    cfg: &PipelineConfig,
    parallelism: usize,
) -> Result<StageOutcome, PipelineError> {
    console::section(&t!("stage.build"));

    let invocation = build_invocation(cfg, parallelism);
    console::running(&invocation);
    let result = runner
        .run(&invocation, OutputSink::Tee)
        .await
        .map_err(|e| process_error(Stage::Build, e))?;

    let outcome = Stage::Build.classify(result.exit_code);
    match outcome {
        StageOutcome::Success => {
            info!(jobs = parallelism, "built");
            console::success(&t!("build.success"));
        }
        _ => console::error(&t!("build.failed", code = result.exit_code)),
    }
    Ok(outcome)
}

/// Best-effort listing of the tests about to run. Any failure is reduced to
/// `None` and a warning.
pub async fn list_tests<R: ProcessRunner>(runner: &R, cfg: &PipelineConfig) -> Option<Vec<String>> {
    match runner.run(&listing_invocation(cfg), OutputSink::Capture).await {
        Ok(result) if result.success() => Some(parse_test_listing(&result.stdout)),
        Ok(result) => {
            warn!(exit_code = result.exit_code, "test listing exited non-zero");
            None
        }
        Err(e) => {
            warn!(error = %e, "test listing could not run");
            None
        }
    }
}

/// Execute stage. Runs the harness with its combined output written to the
/// log artifact.
///
/// The harness exit code is only recorded, never judged: a non-zero exit
/// becomes [`StageOutcome::DeferredFailure`] and the verdict is left to the
/// aggregator. Failing to launch the harness is fatal. A harness that hits
/// its deadline is killed and its partial log is still handed on.
pub async fn execute<R: ProcessRunner>(
    runner: &R,
    cfg: &PipelineConfig,
    parallelism: usize,
) -> Result<(TestLogArtifact, StageOutcome), PipelineError> {
    console::section(&t!("stage.execute"));

    match cfg.test_filter() {
        Some(filter) => console::warning(&t!("execute.filter", filter = filter)),
        None => console::warning(&t!("execute.all")),
    }

    match list_tests(runner, cfg).await {
        Some(tests) => tests.iter().for_each(|test| println!("{test}")),
        None => console::warning(&t!("execute.list_failed")),
    }

    let invocation = harness_invocation(cfg, parallelism);
    let artifact = TestLogArtifact { path: cfg.log_path() };
    println!();
    console::running(&invocation);

    let outcome = match runner
        .run(&invocation, OutputSink::File(artifact.path.clone()))
        .await
    {
        Ok(result) => Stage::Execute.classify(result.exit_code),
        Err(ProcessError::TimedOut { after, .. }) => {
            console::warning(&t!("execute.timed_out", secs = after.as_secs()));
            Stage::Execute.classify(HARNESS_TIMEOUT_EXIT_CODE)
        }
        Err(e) => return Err(process_error(Stage::Execute, e)),
    };

    debug!(?outcome, log = %artifact.path.display(), "harness finished");
    Ok((artifact, outcome))
}
