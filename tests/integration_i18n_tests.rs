//! # Internationalization Integration Tests / 国际化集成测试
//!
//! Checks language selection through `--lang` and the settings file.
//!
//! 检查通过 `--lang` 和设置文件进行的语言选择。

mod common;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

fn runner() -> Command {
    let mut cmd = Command::cargo_bin("ci-test-runner").unwrap();
    cmd.env("NO_COLOR", "1");
    cmd
}

#[test]
fn test_help_in_chinese() {
    runner()
        .args(["--lang", "zh-CN", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("CMake 构建类型"));
}

#[test]
fn test_help_in_english() {
    runner()
        .args(["--lang", "en", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("CMake build type"));
}

#[test]
fn test_unknown_language_falls_back_to_english() {
    runner()
        .args(["--lang", "xx-YY", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("CMake build type"));
}

#[cfg(unix)]
#[test]
fn test_settings_language_applies_without_lang_flag() {
    let project = common::setup_fake_project(0, "Test Passed\n", 0);
    let settings = project.path().join("settings.toml");
    let content = std::fs::read_to_string(&settings).unwrap();
    std::fs::write(&settings, format!("language = 'zh-CN'\n{content}")).unwrap();

    runner()
        .current_dir(project.path())
        .arg("--config")
        .arg(&settings)
        .assert()
        .success()
        .stdout(predicate::str::contains("所有测试均已通过！"));
}

#[cfg(unix)]
#[test]
fn test_lang_flag_overrides_settings_language() {
    let project = common::setup_fake_project(0, "Test Passed\n", 0);
    let settings = project.path().join("settings.toml");
    let content = std::fs::read_to_string(&settings).unwrap();
    std::fs::write(&settings, format!("language = 'zh-CN'\n{content}")).unwrap();

    runner()
        .current_dir(project.path())
        .args(["--lang", "en", "--config"])
        .arg(&settings)
        .assert()
        .success()
        .stdout(predicate::str::contains("All tests passed!"));
}

#[cfg(unix)]
#[test]
fn test_default_settings_file_language_applies() {
    let project = common::setup_fake_project(0, "Test Passed\n", 0);
    let content = std::fs::read_to_string(project.path().join("settings.toml")).unwrap();
    std::fs::write(
        project.path().join("CiTestRunner.toml"),
        format!("language = 'zh-CN'\n{content}"),
    )
    .unwrap();

    runner()
        .current_dir(project.path())
        .env("LANG", "en_US.UTF-8")
        .env("LC_ALL", "en_US.UTF-8")
        .assert()
        .success()
        .stdout(predicate::str::contains("所有测试均已通过！"));
}
