//! # Reporting Module / 报告模块
//!
//! This module handles the presentation of a finished run: colored console
//! output, a JSON run report for tooling, and a styled HTML page.
//!
//! 此模块处理运行结果的呈现：彩色控制台输出、供工具使用的 JSON 运行报告，
//! 以及样式化的 HTML 页面。

pub mod console;
pub mod html;
pub mod json;

// Re-export common reporting functions
pub use console::{print_run, print_summary};
pub use html::write_html_report;
pub use json::{RunReport, write_json_report};
