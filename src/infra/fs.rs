//! # File System Operations Module / 文件系统操作模块
//!
//! This module provides the few file system helpers the pipeline needs:
//! preparing the build directory and resolving user paths.
//!
//! 此模块提供流水线所需的少量文件系统辅助功能：
//! 准备构建目录以及解析用户路径。

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Creates `dir` (and its parents) if it does not exist yet.
///
/// # Returns
/// `true` if the directory was created by this call, `false` if it was
/// already there
pub fn ensure_dir(dir: &Path) -> io::Result<bool> {
    if dir.is_dir() {
        return Ok(false);
    }
    fs::create_dir_all(dir)?;
    Ok(true)
}

/// Makes `path` absolute against `base` without touching the file system.
/// Absolute inputs are returned unchanged.
pub fn absolute_from(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Makes `path` absolute against the current directory.
pub fn absolute_path(path: &Path) -> io::Result<PathBuf> {
    std::path::absolute(path)
}
