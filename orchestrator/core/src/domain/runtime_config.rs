// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Runtime Configuration Types
//
// Defines the configuration schema for the execution graph runtime:
// - Kubernetes-style manifest format (apiVersion/kind/metadata/spec)
// - Default budget for chain invocations
// - Worker-pool sizes and per-branch timeouts for Parallel / ParallelFor
// - Safety cap for While / DoWhile loops
//
// Loading, discovery and environment overrides live in
// infrastructure::config_loader.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::domain::budget::{deadline_after, Budget, Consumption, DEFAULT_BUDGET_SECS};

pub const API_VERSION: &str = "council.dev/v1";
pub const KIND: &str = "RuntimeConfig";

/// Top-level runtime configuration manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouncilConfig {
    /// API version (must be "council.dev/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "RuntimeConfig")
    pub kind: String,

    pub metadata: ConfigMetadata,

    #[serde(default)]
    pub spec: RuntimeSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigMetadata {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuntimeSpec {
    #[serde(default)]
    pub budget: BudgetConfig,

    #[serde(default)]
    pub execution: ExecutionConfig,

    #[serde(default)]
    pub loops: LoopConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetConfig {
    /// Wall-clock budget for one chain invocation (e.g. "30s", "2m")
    #[serde(with = "humantime_serde", default = "default_budget_duration")]
    pub default_duration: Duration,

    /// Consumption limits applied to every default budget
    #[serde(default)]
    pub limits: Vec<Consumption>,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            default_duration: default_budget_duration(),
            limits: Vec::new(),
        }
    }
}

impl BudgetConfig {
    /// Fresh budget for one chain invocation.
    pub fn new_budget(&self) -> Budget {
        Budget::with_limits(self.default_duration, self.limits.clone())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Concurrent branches per Parallel node
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// Concurrent iterations per ParallelFor node
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,

    /// Wall-clock limit for one Parallel branch / ParallelFor iteration.
    /// When unset the budget's remaining duration is the only limit.
    #[serde(
        with = "humantime_serde",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub branch_timeout: Option<Duration>,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
            parallelism: default_parallelism(),
            branch_timeout: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoopConfig {
    /// Iteration cap applied to loops built from this config
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_iterations: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for CouncilConfig {
    fn default() -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ConfigMetadata {
                name: "council".to_string(),
                labels: None,
            },
            spec: RuntimeSpec::default(),
        }
    }
}

impl CouncilConfig {
    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version != API_VERSION {
            anyhow::bail!(
                "Invalid apiVersion: '{}'. Must be '{}'",
                self.api_version,
                API_VERSION
            );
        }

        if self.kind != KIND {
            anyhow::bail!("Invalid kind: '{}'. Must be '{}'", self.kind, KIND);
        }

        if self.metadata.name.is_empty() {
            anyhow::bail!("metadata.name cannot be empty");
        }

        if self.spec.execution.max_workers == 0 {
            anyhow::bail!("spec.execution.max_workers must be at least 1");
        }

        if self.spec.execution.parallelism == 0 {
            anyhow::bail!("spec.execution.parallelism must be at least 1");
        }

        if self.spec.execution.branch_timeout == Some(Duration::ZERO) {
            anyhow::bail!("spec.execution.branch_timeout must be greater than zero");
        }

        if deadline_after(self.spec.budget.default_duration).is_none() {
            anyhow::bail!("spec.budget.default_duration is too large");
        }

        if let Some(timeout) = self.spec.execution.branch_timeout {
            if deadline_after(timeout).is_none() {
                anyhow::bail!("spec.execution.branch_timeout is too large");
            }
        }

        if self.spec.loops.max_iterations == Some(0) {
            anyhow::bail!("spec.loops.max_iterations must be at least 1 when set");
        }

        for limit in &self.spec.budget.limits {
            if limit.unit.is_empty() || limit.kind.is_empty() {
                anyhow::bail!("Budget limits need both a unit and a kind");
            }
            if limit.value < 0.0 {
                anyhow::bail!("Budget limit for {}/{} cannot be negative", limit.unit, limit.kind);
            }
        }

        Ok(())
    }
}

fn default_budget_duration() -> Duration {
    Duration::from_secs(DEFAULT_BUDGET_SECS)
}

fn default_max_workers() -> usize {
    10
}

fn default_parallelism() -> usize {
    5
}

fn default_log_level() -> String {
    "info".to_string()
}
