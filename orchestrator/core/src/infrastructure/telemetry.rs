// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Logging setup for binaries and tests embedding the runtime.
//!
//! `RUST_LOG` wins over the configured level. Metrics go through the
//! `metrics` facade; installing an exporter is left to the host process.

use crate::domain::runtime_config::LoggingConfig;
use anyhow::Context;

/// Installs a compact `tracing` subscriber filtered at `level`.
///
/// Fails when a global subscriber is already installed or the level is not a
/// valid filter directive.
pub fn init_logging(level: &str) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_line_number(false)
        .compact()
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {}", e))?;

    Ok(())
}

/// [`init_logging`] at the level of the manifest's `spec.logging` section.
pub fn init_from_config(config: &LoggingConfig) -> anyhow::Result<()> {
    init_logging(&config.level)
}
