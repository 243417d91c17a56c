//! Client configuration, layered with figment.

use std::path::Path;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

use crate::analysis::CompareRoute;
use crate::error::ConfigError;
use crate::input::FileAllowList;

pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:8000";
pub const DEFAULT_CONFIG_FILE: &str = "policyscope.toml";
pub const ENV_PREFIX: &str = "POLICYSCOPE_";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the analysis backend, e.g. `http://127.0.0.1:8000`.
    pub api_base: String,
    pub compare_route: CompareRoute,
    pub file_types: FileAllowList,
    /// Whole-request timeout. `None` waits for the backend indefinitely.
    pub timeout_secs: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            compare_route: CompareRoute::default(),
            file_types: FileAllowList::default(),
            timeout_secs: None,
        }
    }
}

impl ClientConfig {
    /// `api_base` without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.api_base.trim_end_matches('/')
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let base = self.api_base.trim();
        if base.starts_with("http://") || base.starts_with("https://") {
            Ok(())
        } else {
            Err(ConfigError::InvalidBase(self.api_base.clone()))
        }
    }
}

/// Load configuration from layered sources.
///
/// Priority (highest to lowest):
/// 1. Environment variables (`POLICYSCOPE_API_BASE`, `POLICYSCOPE_COMPARE_ROUTE`, ...)
/// 2. The TOML file at `path`, or `./policyscope.toml` when `path` is `None`
/// 3. Built-in defaults
///
/// An explicit `path` must exist; the implicit file is optional.
pub fn load_config(path: Option<&Path>) -> Result<ClientConfig, ConfigError> {
    let mut figment = Figment::from(Serialized::defaults(ClientConfig::default()));

    match path {
        Some(p) => {
            if !p.exists() {
                return Err(ConfigError::NotFound(p.to_path_buf()));
            }
            figment = figment.merge(Toml::file(p));
        }
        None => figment = figment.merge(Toml::file(DEFAULT_CONFIG_FILE)),
    }

    figment = figment.merge(Env::prefixed(ENV_PREFIX));

    let config: ClientConfig = figment.extract().map_err(Box::new)?;
    config.validate()?;
    Ok(config)
}
