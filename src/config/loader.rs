//! Configuration Loader
//!
//! Layers an optional file and `MEDIATOR_*` environment variables over the
//! defaults using the `config` crate.

use super::error::{ConfigResult, ConfigurationError};
use super::MediatorConfig;
use config::{Config, Environment, File};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::debug;

const ENV_PREFIX: &str = "MEDIATOR";
const ENV_SEPARATOR: &str = "__";

#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    file: Option<PathBuf>,
    /// Replaces the process environment; used by tests
    environment: Option<HashMap<String, String>>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read this file before applying environment overrides.
    ///
    /// The format follows the extension (`.toml`, `.yaml`, `.json`, ...).
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Take `MEDIATOR_*` variables from `vars` instead of the process environment.
    pub fn with_environment(mut self, vars: HashMap<String, String>) -> Self {
        self.environment = Some(vars);
        self
    }

    pub fn load(&self) -> ConfigResult<MediatorConfig> {
        let mut builder = Config::builder();

        if let Some(path) = &self.file {
            if !path.is_file() {
                return Err(ConfigurationError::file_not_found(path.display().to_string()));
            }
            debug!(file = %path.display(), "Loading mediator configuration file");
            builder = builder.add_source(File::from(path.clone()).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator(ENV_SEPARATOR)
                .try_parsing(true)
                .source(self.environment.clone()),
        );

        let file_path = self
            .file
            .as_ref()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "<environment>".to_string());

        let config = builder
            .build()
            .map_err(|error| ConfigurationError::parse_error(file_path.clone(), error))?
            .try_deserialize::<MediatorConfig>()
            .map_err(|error| match &self.file {
                Some(_) => ConfigurationError::parse_error(file_path, error),
                None => ConfigurationError::EnvironmentOverrideError {
                    reason: error.to_string(),
                },
            })?;

        debug!(
            "Mediator configuration loaded: {}",
            serde_json::to_string(&config).unwrap_or_else(|_| "[serialization error]".to_string())
        );
        Ok(config)
    }

    /// Defaults plus the process environment.
    pub fn from_env() -> ConfigResult<MediatorConfig> {
        Self::new().load()
    }
}
