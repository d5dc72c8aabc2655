//! Error types for tracekin-core

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using the library's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for tracekin-core
#[derive(Error, Debug)]
pub enum Error {
    /// Log parsing errors
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors raised while reading a run log
#[derive(Error, Debug)]
pub enum ParseError {
    /// The input file could not be read. Fatal, reported once per run.
    #[error("failed to read log file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    ParseToml {
        path: PathBuf,
        #[source]
        source: Box<toml::de::Error>,
    },

    #[error("invalid similarity threshold {0}: must be between 0 and 100")]
    InvalidThreshold(f64),

    #[error("invalid minimum step count {0}: must be at least 1")]
    InvalidMinSteps(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_carries_path() {
        let err = Error::from(ParseError::ReadFile {
            path: PathBuf::from("/tmp/run.log"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        });
        let rendered = err.to_string();
        assert!(rendered.contains("/tmp/run.log"), "{rendered}");
        assert!(rendered.starts_with("Parse error:"), "{rendered}");
    }

    #[test]
    fn config_error_messages() {
        assert!(
            ConfigError::InvalidThreshold(123.0)
                .to_string()
                .contains("123")
        );
        assert!(ConfigError::InvalidMinSteps(0).to_string().contains("0"));
    }
}
