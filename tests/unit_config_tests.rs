//! # Config Module Unit Tests / Config 模块单元测试
//!
//! Tests for build types, the settings file and the run configuration builder.
//!
//! 测试构建类型、设置文件以及运行配置构建器。

use ci_test_runner::config::{
    BuildType, DEFAULT_FAILURE_DETAIL_LIMIT, PipelineConfig, RunnerSettings, expand_path,
};
use ci_test_runner::core::error::ConfigError;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[cfg(test)]
mod build_type_tests {
    use super::*;

    #[test]
    fn test_build_type_parses_the_four_cmake_types() {
        for (raw, expected) in [
            ("Debug", BuildType::Debug),
            ("Release", BuildType::Release),
            ("RelWithDebInfo", BuildType::RelWithDebInfo),
            ("MinSizeRel", BuildType::MinSizeRel),
        ] {
            let parsed: BuildType = raw.parse().unwrap();
            assert_eq!(parsed, expected);
            assert_eq!(parsed.to_string(), raw);
        }
    }

    #[test]
    fn test_build_type_rejects_unknown_values() {
        let err = "Fast".parse::<BuildType>().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBuildType(ref v) if v == "Fast"));

        // Matching is case-sensitive, like CMake's own configuration names.
        assert!("debug".parse::<BuildType>().is_err());
    }

    #[test]
    fn test_build_type_defaults_to_debug() {
        assert_eq!(BuildType::default(), BuildType::Debug);
    }
}

#[cfg(test)]
mod settings_tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = RunnerSettings::default();
        assert_eq!(settings.language, "en");
        assert_eq!(settings.configure_program, "cmake");
        assert_eq!(settings.harness_program, "ctest");
        assert_eq!(settings.log_file, "test_output.log");
        assert_eq!(settings.failure_detail_limit, DEFAULT_FAILURE_DETAIL_LIMIT);
        assert_eq!(settings.failure_detail_limit, 9);
        assert_eq!(settings.stage_timeout(), None);
        assert!(!settings.fail_on_empty);
        assert!(settings.env.is_empty());
    }

    #[test]
    fn test_partial_settings_fill_in_defaults() {
        let content = r#"
language = "zh-CN"
harness_program = "/opt/cmake/bin/ctest"
stage_timeout_secs = 600

[env]
CTEST_OUTPUT_ON_FAILURE = "1"
"#;
        let settings = RunnerSettings::from_toml(content, Path::new("inline.toml")).unwrap();

        assert_eq!(settings.language, "zh-CN");
        assert_eq!(settings.harness_program, "/opt/cmake/bin/ctest");
        assert_eq!(settings.configure_program, "cmake");
        assert_eq!(settings.stage_timeout(), Some(Duration::from_secs(600)));
        assert_eq!(settings.env.get("CTEST_OUTPUT_ON_FAILURE").map(String::as_str), Some("1"));
    }

    #[test]
    fn test_invalid_toml_is_a_parse_error() {
        let err = RunnerSettings::from_toml("language = ", Path::new("broken.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { ref path, .. } if path == Path::new("broken.toml")));
    }

    #[test]
    fn test_zero_detail_limit_is_rejected() {
        let err = RunnerSettings::from_toml("failure_detail_limit = 0", Path::new("x.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::ZeroDetailLimit));
    }

    #[test]
    fn test_missing_default_file_yields_defaults() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("CiTestRunner.toml");

        let settings = RunnerSettings::load(&path, false).unwrap();
        assert_eq!(settings, RunnerSettings::default());
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("custom.toml");

        let err = RunnerSettings::load(&path, true).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_load_reads_existing_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("CiTestRunner.toml");
        fs::write(&path, "fail_on_empty = true\nlog_file = \"ctest.log\"\n").unwrap();

        let settings = RunnerSettings::load(&path, false).unwrap();
        assert!(settings.fail_on_empty);
        assert_eq!(settings.log_file, "ctest.log");
    }

    #[test]
    fn test_settings_survive_serialization() {
        let mut settings = RunnerSettings::default();
        settings.stage_timeout_secs = Some(30);
        settings.env.insert("CC".to_string(), "clang".to_string());

        let text = toml::to_string_pretty(&settings).unwrap();
        let parsed = RunnerSettings::from_toml(&text, Path::new("roundtrip.toml")).unwrap();
        assert_eq!(parsed, settings);
    }

    #[test]
    fn test_expand_path_expands_env_vars() {
        // SAFETY: test-local variable name, not read by other tests.
        unsafe { std::env::set_var("CI_TEST_RUNNER_EXPAND_TEST", "/tmp/expanded") };
        let path = expand_path("$CI_TEST_RUNNER_EXPAND_TEST/build").unwrap();
        assert_eq!(path, PathBuf::from("/tmp/expanded/build"));
    }

    #[test]
    fn test_expand_path_reports_unknown_vars() {
        let err = expand_path("$CI_TEST_RUNNER_DEFINITELY_UNSET_VAR/x").unwrap_err();
        assert!(matches!(err, ConfigError::PathExpansion { .. }));
    }
}

#[cfg(test)]
mod pipeline_config_tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = PipelineConfig::builder("/work/build").build().unwrap();

        assert_eq!(config.build_dir(), Path::new("/work/build"));
        assert_eq!(config.build_type(), BuildType::Debug);
        assert!(config.extra_config_options().is_empty());
        assert_eq!(config.test_filter(), None);
        assert!(config.parallel());
        assert!(!config.verbose());
        assert_eq!(config.junit_output_path(), None);
        assert_eq!(config.log_path(), PathBuf::from("/work/build/test_output.log"));
        assert_eq!(config.failure_detail_limit(), 9);
    }

    #[test]
    fn test_extra_options_keep_their_order() {
        let config = PipelineConfig::builder("/b")
            .extra_config_options(["-DFOO=1", "-DBAR=2", "-DFOO=3"])
            .build()
            .unwrap();

        assert_eq!(config.extra_config_options(), &["-DFOO=1", "-DBAR=2", "-DFOO=3"]);
    }

    #[test]
    fn test_empty_filter_and_junit_path_mean_absent() {
        let config = PipelineConfig::builder("/b")
            .test_filter(Some(String::new()))
            .junit_output_path(Some(PathBuf::new()))
            .build()
            .unwrap();

        assert_eq!(config.test_filter(), None);
        assert_eq!(config.junit_output_path(), None);
    }

    #[test]
    fn test_settings_are_applied() {
        let mut settings = RunnerSettings::default();
        settings.harness_program = "ctest3".to_string();
        settings.log_file = "harness.log".to_string();
        settings.stage_timeout_secs = Some(5);
        settings.fail_on_empty = true;

        let config = PipelineConfig::builder("/b").settings(&settings).build().unwrap();

        assert_eq!(config.harness_program(), "ctest3");
        assert_eq!(config.log_path(), PathBuf::from("/b/harness.log"));
        assert_eq!(config.stage_timeout(), Some(Duration::from_secs(5)));
        assert!(config.fail_on_empty());
    }

    #[test]
    fn test_zero_detail_limit_is_rejected_by_builder() {
        let err = PipelineConfig::builder("/b").failure_detail_limit(0).build().unwrap_err();
        assert!(matches!(err, ConfigError::ZeroDetailLimit));
    }
}
