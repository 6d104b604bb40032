//! # Pipeline Module / 流水线模块
//!
//! Drives Configure → Build → Execute → Aggregate strictly in order. Each
//! stage runs inside its own `stage` span nested under one `pipeline` span,
//! so every diagnostic line carries the run context without global state.
//!
//! 严格按顺序驱动 配置 → 构建 → 执行 → 聚合。每个阶段都在各自的
//! `stage` span 中运行，并嵌套在同一个 `pipeline` span 之下。

use std::time::Instant;
use tracing::{Instrument, info, info_span};

use crate::core::aggregator;
use crate::core::config::PipelineConfig;
use crate::core::error::PipelineError;
use crate::core::models::{PipelineOutcome, PipelineRun, Stage, StageOutcome, StageRecord};
use crate::core::stages;
use crate::infra::command::ProcessRunner;

/// One run of the pipeline over a fixed configuration.
pub struct Pipeline<'a, R> {
    runner: &'a R,
    config: &'a PipelineConfig,
    parallelism: usize,
}

impl<'a, R: ProcessRunner> Pipeline<'a, R> {
    /// Uses the detected processor count when the config asks for parallelism.
    pub fn new(runner: &'a R, config: &'a PipelineConfig) -> Self {
        Self::with_parallelism(runner, config, stages::parallelism(config.parallel()))
    }

    pub fn with_parallelism(runner: &'a R, config: &'a PipelineConfig, parallelism: usize) -> Self {
        Self {
            runner,
            config,
            parallelism,
        }
    }

    pub fn parallelism(&self) -> usize {
        self.parallelism
    }

    /// Runs every stage and returns the terminal outcome.
    ///
    /// `Err` means a fatal error (launch failure, unreadable log, Ctrl-C).
    /// Configure and Build failures are ordinary outcomes and stop the run
    /// before any later stage starts.
    pub async fn run(&self) -> Result<PipelineRun, PipelineError> {
        let span = info_span!(
            "pipeline",
            build_dir = %self.config.build_dir().display(),
            build_type = %self.config.build_type(),
        );
        self.run_stages().instrument(span).await
    }

    async fn run_stages(&self) -> Result<PipelineRun, PipelineError> {
        let cfg = self.config;
        let mut stages = Vec::with_capacity(4);

        let started = Instant::now();
        let outcome = stages::configure(self.runner, cfg)
            .instrument(info_span!("stage", name = %Stage::Configure))
            .await?;
        stages.push(record(Stage::Configure, outcome, started));
        if let StageOutcome::Failure(exit_code) = outcome {
            return Ok(PipelineRun {
                outcome: PipelineOutcome::ConfigureFailed { exit_code },
                stages,
                log: None,
            });
        }

        let started = Instant::now();
        let outcome = stages::build(self.runner, cfg, self.parallelism)
            .instrument(info_span!("stage", name = %Stage::Build))
            .await?;
        stages.push(record(Stage::Build, outcome, started));
        if let StageOutcome::Failure(exit_code) = outcome {
            return Ok(PipelineRun {
                outcome: PipelineOutcome::BuildFailed { exit_code },
                stages,
                log: None,
            });
        }

        let started = Instant::now();
        let (artifact, outcome) = stages::execute(self.runner, cfg, self.parallelism)
            .instrument(info_span!("stage", name = %Stage::Execute))
            .await?;
        stages.push(record(Stage::Execute, outcome, started));

        let started = Instant::now();
        let summary = info_span!("stage", name = %Stage::Aggregate)
            .in_scope(|| aggregator::aggregate(&artifact.path, cfg.failure_detail_limit()))?;
        info!(
            passed = summary.pass_count(),
            failed = summary.fail_count(),
            "aggregated test log"
        );
        let outcome = PipelineOutcome::TestsCompleted { summary };
        let verdict = outcome.exit_code(cfg.fail_on_empty());
        stages.push(record(Stage::Aggregate, StageOutcome::verdict(verdict), started));

        Ok(PipelineRun {
            outcome,
            stages,
            log: Some(artifact),
        })
    }
}

fn record(stage: Stage, outcome: StageOutcome, started: Instant) -> StageRecord {
    StageRecord {
        stage,
        outcome,
        duration: started.elapsed(),
    }
}
