//! Configuration management for tracekin
//!
//! Handles loading and validation of tracekin.toml configuration files.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::logging::LogConfig;

/// Default config file name looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "tracekin.toml";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Analysis settings
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Logging settings
    #[serde(default)]
    pub log: LogConfig,
}

/// Analysis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Minimum raw step count for a test to enter the comparison
    #[serde(default = "default_min_steps")]
    pub min_steps: usize,

    /// Similarity percentage at which a pair is flagged as a merge candidate
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,

    /// Query parameters ignored when comparing navigation URLs
    #[serde(default = "default_ignored_query_params")]
    pub ignored_query_params: Vec<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            min_steps: default_min_steps(),
            similarity_threshold: default_similarity_threshold(),
            ignored_query_params: default_ignored_query_params(),
        }
    }
}

fn default_min_steps() -> usize {
    5
}

fn default_similarity_threshold() -> f64 {
    70.0
}

fn default_ignored_query_params() -> Vec<String> {
    vec!["state".to_string()]
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Reads `tracekin.toml` from the working directory when present,
    /// otherwise returns the defaults.
    pub fn load() -> crate::Result<Self> {
        let path = Path::new(CONFIG_FILE_NAME);
        if path.exists() {
            Self::load_from(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self =
            toml::from_str(&content).map_err(|source| ConfigError::ParseToml {
                path: path.to_path_buf(),
                source: Box::new(source),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate field ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        let threshold = self.analysis.similarity_threshold;
        if !(0.0..=100.0).contains(&threshold) {
            return Err(ConfigError::InvalidThreshold(threshold));
        }
        if self.analysis.min_steps == 0 {
            return Err(ConfigError::InvalidMinSteps(0));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        assert_eq!(config.analysis.min_steps, 5);
        assert!((config.analysis.similarity_threshold - 70.0).abs() < f64::EPSILON);
        assert_eq!(config.analysis.ignored_query_params, vec!["state"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn load_from_toml_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(
            file,
            r#"
[analysis]
min_steps = 3
similarity_threshold = 80.5
ignored_query_params = ["state", "session"]

[log]
level = "debug"
format = "json"
"#
        )
        .expect("write config");

        let config = Config::load_from(file.path()).expect("load config");
        assert_eq!(config.analysis.min_steps, 3);
        assert!((config.analysis.similarity_threshold - 80.5).abs() < f64::EPSILON);
        assert_eq!(
            config.analysis.ignored_query_params,
            vec!["state", "session"]
        );
        assert_eq!(config.log.level, "debug");
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "[analysis]\nmin_steps = 7").expect("write config");

        let config = Config::load_from(file.path()).expect("load config");
        assert_eq!(config.analysis.min_steps, 7);
        assert!((config.analysis.similarity_threshold - 70.0).abs() < f64::EPSILON);
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn out_of_range_threshold_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "[analysis]\nsimilarity_threshold = 140.0").expect("write config");

        let err = Config::load_from(file.path()).expect_err("must fail");
        assert!(err.to_string().contains("140"));
    }

    #[test]
    fn zero_min_steps_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "[analysis]\nmin_steps = 0").expect("write config");

        assert!(Config::load_from(file.path()).is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = Config::load_from(Path::new("/nonexistent/tracekin.toml"))
            .expect_err("must fail");
        assert!(err.to_string().contains("/nonexistent/tracekin.toml"));
    }
}
