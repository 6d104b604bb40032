//! # Core Module / 核心模块
//!
//! This module contains the core functionality of the runner: configuration,
//! data models, the pipeline stages and the result aggregator.
//!
//! 此模块包含运行器的核心功能：配置、数据模型、流水线各阶段以及结果聚合器。

pub mod aggregator;
pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod stages;

// Re-exports
pub use config::PipelineConfig;
pub use models::{PipelineOutcome, TestSummary};
pub use pipeline::Pipeline;
