// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod agent;
pub mod controller;
pub mod evaluator;
pub mod filter;

pub use agent::{Agent, AgentError};
pub use controller::{BasicController, Controller};
pub use evaluator::{BasicEvaluator, Evaluator};
pub use filter::{BasicFilter, Filter};
