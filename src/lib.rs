//! # CI Test Runner Library / CI 测试运行器库
//!
//! This library provides the core functionality for the CI Test Runner tool,
//! which configures and builds a CMake project, runs its CTest suite and
//! turns the harness log into a pass/fail report.
//!
//! 此库为 CI 测试运行器工具提供核心功能：配置并构建 CMake 项目，
//! 运行其 CTest 测试套件，并将测试日志转换为通过/失败报告。
//!
//! ## Modules / 模块
//!
//! - `core` - Configuration, data models, pipeline stages and the result aggregator
//! - `infra` - Process execution, file system helpers and diagnostic logging
//! - `reporting` - Console, JSON and HTML reports
//! - `cli` - Command-line interface and commands
//!
//! - `core` - 配置、数据模型、流水线阶段和结果聚合器
//! - `infra` - 进程执行、文件系统辅助功能和诊断日志
//! - `reporting` - 控制台、JSON 和 HTML 报告
//! - `cli` - 命令行接口和命令

pub mod cli;
pub mod core;
pub mod infra;
pub mod reporting;

// Re-export commonly used items
pub use core::aggregator;
pub use core::config;
pub use core::models;

/// Sets the UI language. It attempts to match the full locale (e.g.,
/// "zh-CN"), then just the language code (e.g., "en"), and finally falls
/// back to English.
pub fn set_language(language: &str) {
    let available_locales = rust_i18n::available_locales!();
    let is_available = |code: &str| available_locales.iter().any(|l| *l == code);

    let lang = if is_available(language) {
        language
    } else {
        language
            .split(['-', '_'])
            .next()
            .filter(|&code| is_available(code))
            .unwrap_or("en")
    };

    rust_i18n::set_locale(lang);
}

// Initialize i18n
rust_i18n::i18n!("locales", fallback = "en");
