// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod config_loader;
pub mod telemetry;

pub use telemetry::init_logging;
