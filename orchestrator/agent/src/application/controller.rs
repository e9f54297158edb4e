// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Controller
//!
//! Decides, each agent iteration, which chains run and how. An empty plan ends
//! the agent run.

use crate::domain::agent_context::AgentContext;
use crate::domain::execution_unit::ExecutionUnit;
use async_trait::async_trait;
use council_core::Chain;

#[async_trait]
pub trait Controller: Send + Sync {
    /// Chains this controller may schedule.
    fn chains(&self) -> &[Chain];

    async fn execute(&self, context: &AgentContext) -> anyhow::Result<Vec<ExecutionUnit>>;
}

/// Plans every chain, every iteration, on the agent budget.
/// With `parallelism` the units share rank 1 and run concurrently; otherwise
/// they run one by one.
pub struct BasicController {
    chains: Vec<Chain>,
    parallelism: bool,
}

impl BasicController {
    pub fn new(chains: Vec<Chain>) -> Self {
        Self {
            chains,
            parallelism: false,
        }
    }

    pub fn with_parallelism(mut self, parallelism: bool) -> Self {
        self.parallelism = parallelism;
        self
    }

    pub fn default_rank(&self) -> Option<i32> {
        self.parallelism.then_some(1)
    }
}

#[async_trait]
impl Controller for BasicController {
    fn chains(&self) -> &[Chain] {
        &self.chains
    }

    async fn execute(&self, context: &AgentContext) -> anyhow::Result<Vec<ExecutionUnit>> {
        Ok(self
            .chains
            .iter()
            .map(|chain| {
                ExecutionUnit::new(chain.clone(), context.budget().clone()).with_rank(self.default_rank())
            })
            .collect())
    }
}
