//! Configuration Error Types

use thiserror::Error;

/// Configuration-related errors with detailed context
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// Configuration file not found at the given path
    #[error("Configuration file not found: {file_path}")]
    FileNotFound { file_path: String },

    /// File could not be read or parsed by its format
    #[error("Parse error for file {file_path}: {reason}")]
    ParseError { file_path: String, reason: String },

    /// A `MEDIATOR_*` environment variable could not be applied
    #[error("Environment override error: {reason}")]
    EnvironmentOverrideError { reason: String },
}

impl ConfigurationError {
    pub fn file_not_found<P: Into<String>>(file_path: P) -> Self {
        Self::FileNotFound {
            file_path: file_path.into(),
        }
    }

    pub fn parse_error<P: Into<String>, E: std::fmt::Display>(file_path: P, error: E) -> Self {
        Self::ParseError {
            file_path: file_path.into(),
            reason: error.to_string(),
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigurationError>;
