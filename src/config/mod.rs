//! # Mediator Configuration
//!
//! Settings that shape how a [`Mediator`](crate::Mediator) is assembled.
//!
//! ## Sources
//!
//! Values are layered, later sources winning:
//! - **Defaults**: every field has one, so no file is required
//! - **Optional file**: TOML, YAML or JSON, chosen by extension
//! - **Environment**: `MEDIATOR_` prefix, `__` between nested keys
//!   (`MEDIATOR_DEFAULT_LIFETIME=singleton`, `MEDIATOR_AUDIT__ENABLED=false`)
//!
//! ## Usage
//!
//! ```rust,no_run
//! use mediator_core::config::ConfigLoader;
//! use mediator_core::MediatorBuilder;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConfigLoader::new().with_file("config/mediator.toml").load()?;
//! let mediator = MediatorBuilder::new().with_config(config).build();
//! # let _ = mediator;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use crate::provider::Lifetime;
use serde::{Deserialize, Serialize};

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigLoader;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct MediatorConfig {
    /// Lifetime applied to factories registered without an explicit one
    pub default_lifetime: Lifetime,

    /// Audit stream settings
    pub audit: AuditConfig,
}

/// Audit stream configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Master switch for both streams
    pub enabled: bool,
    pub record_requests: bool,
    pub record_notifications: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            record_requests: true,
            record_notifications: true,
        }
    }
}
