// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Config Loader
//!
//! Reads [`CouncilConfig`] manifests from disk and applies environment
//! overrides.
//!
//! # Discovery order
//!
//! 1. `COUNCIL_CONFIG_PATH` environment variable
//! 2. `./council-config.yaml` (working directory)
//! 3. `~/.council/config.yaml` (user home)
//!
//! # Environment overrides
//!
//! | Variable | Field | Format |
//! |----------|-------|--------|
//! | `COUNCIL_DEFAULT_BUDGET` | `spec.budget.default_duration` | seconds |
//! | `COUNCIL_MAX_WORKERS` | `spec.execution.max_workers` | integer |
//! | `COUNCIL_BRANCH_TIMEOUT_SECS` | `spec.execution.branch_timeout` | seconds |

use crate::domain::budget::DEFAULT_BUDGET_ENV;
use crate::domain::runtime_config::CouncilConfig;
use anyhow::Context;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_PATH_ENV: &str = "COUNCIL_CONFIG_PATH";
pub const MAX_WORKERS_ENV: &str = "COUNCIL_MAX_WORKERS";
pub const BRANCH_TIMEOUT_ENV: &str = "COUNCIL_BRANCH_TIMEOUT_SECS";

impl CouncilConfig {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        Self::from_yaml_str(&content)
    }

    /// Save configuration to YAML file
    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Parse and validate configuration from YAML string
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
            tracing::warn!("{} points to a missing file: {:?}", CONFIG_PATH_ENV, path);
        }

        let cwd = PathBuf::from("./council-config.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".council").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        None
    }

    /// Load configuration with discovery, fallback to default.
    /// An explicit path must exist and parse.
    pub fn load_or_default(explicit: Option<PathBuf>) -> anyhow::Result<Self> {
        let mut config = if let Some(path) = explicit {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            Self::from_yaml_file(&path)
                .map_err(|e| anyhow::anyhow!("Failed to load config at {:?}: {:#}", path, e))?
        } else if let Some(path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", path);
            Self::from_yaml_file(path)?
        } else {
            tracing::debug!("No configuration file found in standard locations. Using defaults.");
            Self::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Same as [`Self::apply_env_overrides`] with an arbitrary variable source.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup(DEFAULT_BUDGET_ENV) {
            match val.trim().parse::<u64>() {
                Ok(secs) => {
                    tracing::info!("Environment override: {}={}", DEFAULT_BUDGET_ENV, secs);
                    self.spec.budget.default_duration = Duration::from_secs(secs);
                }
                Err(_) => tracing::warn!(
                    "Invalid value for {}: '{}'. Expected seconds. Ignoring.",
                    DEFAULT_BUDGET_ENV,
                    val
                ),
            }
        }

        if let Some(val) = lookup(MAX_WORKERS_ENV) {
            match val.trim().parse::<usize>() {
                Ok(workers) if workers > 0 => {
                    tracing::info!("Environment override: {}={}", MAX_WORKERS_ENV, workers);
                    self.spec.execution.max_workers = workers;
                }
                _ => tracing::warn!(
                    "Invalid value for {}: '{}'. Expected a positive integer. Ignoring.",
                    MAX_WORKERS_ENV,
                    val
                ),
            }
        }

        if let Some(val) = lookup(BRANCH_TIMEOUT_ENV) {
            let timeout = val
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|secs| *secs > 0.0)
                .and_then(|secs| Duration::try_from_secs_f64(secs).ok());
            match timeout {
                Some(timeout) => {
                    tracing::info!("Environment override: {}={:?}", BRANCH_TIMEOUT_ENV, timeout);
                    self.spec.execution.branch_timeout = Some(timeout);
                }
                _ => tracing::warn!(
                    "Invalid value for {}: '{}'. Expected positive seconds. Ignoring.",
                    BRANCH_TIMEOUT_ENV,
                    val
                ),
            }
        }
    }
}
