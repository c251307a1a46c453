//! CLI configuration -- thin wrapper around `crimson_config`.
//!
//! Adds `GlobalOpts`-aware resolution: `--config` picks the file,
//! `--offline` forces the stock advisor.

use std::path::PathBuf;
use std::sync::Arc;

use crimson_core::{Advisor, AdvisorConfig, Catalog, ControllerConfig, build_advisor};

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use crimson_config::{Config, save_config_to, store_api_key};

/// Effective config file path: `--config` / `CRIMSON_CONFIG`, else the platform default.
pub fn config_path(global: &GlobalOpts) -> PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(crimson_config::config_path)
}

/// Load the layered config for this invocation.
pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    let path = config_path(global);
    tracing::debug!(path = %path.display(), "loading config");
    Ok(crimson_config::load_config_from(&path)?)
}

/// Everything the commands need, resolved once per invocation.
pub struct Resolved {
    pub controller: ControllerConfig,
    pub catalog: Catalog,
    pub advisor: AdvisorConfig,
}

impl Resolved {
    pub fn from_config(cfg: &Config, global: &GlobalOpts) -> Result<Self, CliError> {
        let advisor = if global.offline {
            AdvisorConfig::Offline
        } else {
            cfg.advisor_config()?
        };
        Ok(Self {
            controller: cfg.controller_config()?,
            catalog: cfg.catalog()?,
            advisor,
        })
    }

    pub fn build_advisor(&self) -> Result<Arc<dyn Advisor>, CliError> {
        if self.advisor.is_offline() {
            tracing::info!("advisor offline, using stock guidance");
        }
        Ok(build_advisor(&self.advisor)?)
    }
}
