//! Layered configuration loading.
//!
//! Sources, later ones overriding earlier ones:
//!  1. `/etc/mirror-webhooks/service.yaml`
//!  2. `./config/service.yaml`
//!  3. the file named by `MIRROR_CONFIG_FILE` (required when set)
//!  4. `MIRROR__SECTION__KEY` environment variables,
//!     e.g. `MIRROR__SERVER__PORT=9090` sets `server.port`
//!  5. the legacy deployment variables `SUPABASE_URL`,
//!     `SUPABASE_SERVICE_ROLE_KEY` and `WEBHOOK_SECRET`
//!
//! Every field has a serde default, so missing files are fine. A malformed
//! file or a value of the wrong type is a hard error.
//!
//! The service binary and `mirror-webhooks config check` both load through
//! [`load_service_config`], so a check passes exactly when the service
//! would start with the same file and environment.

use crate::{ConfigError, ServiceConfig};
use std::collections::HashMap;
use std::path::Path;

/// Names the explicit configuration file
pub const CONFIG_FILE_ENV: &str = "MIRROR_CONFIG_FILE";

/// Prefix of structured environment overrides
pub const ENV_PREFIX: &str = "MIRROR";

const DEFAULT_SEARCH_PATHS: [&str; 2] = ["/etc/mirror-webhooks/service", "config/service"];

/// Legacy single-purpose environment variables
#[derive(Default, Clone)]
pub struct LegacyEnv {
    pub database_url: Option<String>,
    pub service_key: Option<String>,
    pub webhook_secret: Option<String>,
}

impl LegacyEnv {
    pub fn from_env() -> Self {
        let read = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        Self {
            database_url: read("SUPABASE_URL"),
            service_key: read("SUPABASE_SERVICE_ROLE_KEY"),
            webhook_secret: read("WEBHOOK_SECRET"),
        }
    }
}

impl std::fmt::Debug for LegacyEnv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LegacyEnv")
            .field("database_url", &self.database_url)
            .field("service_key", &self.service_key.as_ref().map(|_| "<REDACTED>"))
            .field("webhook_secret", &self.webhook_secret.as_ref().map(|_| "<REDACTED>"))
            .finish()
    }
}

/// Where configuration is read from
#[derive(Debug, Clone)]
pub struct ConfigSources {
    /// Optional YAML files, without extension
    pub search_paths: Vec<String>,

    /// Required file named by the operator
    pub explicit_file: Option<String>,

    /// Prefixed variables; `None` reads the process environment
    pub environment: Option<HashMap<String, String>>,

    pub legacy: LegacyEnv,
}

impl ConfigSources {
    /// Sources for a deployed service
    pub fn from_env() -> Self {
        Self {
            search_paths: DEFAULT_SEARCH_PATHS.iter().map(|p| p.to_string()).collect(),
            explicit_file: std::env::var(CONFIG_FILE_ENV).ok().filter(|p| !p.is_empty()),
            environment: None,
            legacy: LegacyEnv::from_env(),
        }
    }

    /// `path` plus the process environment, skipping the default search paths
    pub fn for_file(path: &Path) -> Self {
        Self {
            search_paths: Vec::new(),
            explicit_file: Some(path.to_string_lossy().into_owned()),
            environment: None,
            legacy: LegacyEnv::from_env(),
        }
    }
}

/// Load and validate the service configuration
pub fn load_service_config(sources: &ConfigSources) -> Result<ServiceConfig, ConfigError> {
    let mut builder = ::config::Config::builder();

    for path in &sources.search_paths {
        builder = builder.add_source(
            ::config::File::with_name(path)
                .required(false)
                .format(::config::FileFormat::Yaml),
        );
    }

    if let Some(explicit_path) = &sources.explicit_file {
        builder = builder.add_source(::config::File::with_name(explicit_path).required(true));
    }

    builder = builder.add_source(
        ::config::Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .source(sources.environment.clone()),
    );

    let legacy = &sources.legacy;
    builder = builder
        .set_override_option("database.url", legacy.database_url.clone())
        .and_then(|b| b.set_override_option("database.service_key", legacy.service_key.clone()))
        .and_then(|b| b.set_override_option("webhooks.secret", legacy.webhook_secret.clone()))
        .map_err(load_error)?;

    let service_config: ServiceConfig = builder
        .build()
        .and_then(|c| c.try_deserialize())
        .map_err(load_error)?;

    service_config.validate()?;
    Ok(service_config)
}

fn load_error(error: ::config::ConfigError) -> ConfigError {
    ConfigError::Load {
        message: error.to_string(),
    }
}

#[cfg(test)]
#[path = "settings_tests.rs"]
mod tests;
