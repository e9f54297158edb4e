// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Chain
//!
//! A named, described runner graph: the unit controllers schedule and
//! evaluators score. Built from a list of runners, which run sequentially.
//!
//! [`Chain::execute`] never fails: a runner error is already recorded as an
//! error message, so the chain logs it and returns whatever the invocation
//! produced. Use [`Chain::try_execute`] to observe the error itself.

use crate::application::sequential::Sequential;
use crate::domain::budget::Budget;
use crate::domain::context::ChainContext;
use crate::domain::message::Message;
use crate::domain::runner::{RunnerError, SharedRunner};
use std::fmt;
use tracing::{info, warn};

#[derive(Clone)]
pub struct Chain {
    name: String,
    description: String,
    runner: SharedRunner,
    supports_instructions: bool,
}

impl Chain {
    pub fn new(name: impl Into<String>, description: impl Into<String>, runners: Vec<SharedRunner>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            runner: Sequential::from_list(runners),
            supports_instructions: false,
        }
    }

    /// Marks the chain as able to follow free-form instructions from a controller.
    pub fn with_instructions(mut self) -> Self {
        self.supports_instructions = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn runner(&self) -> &SharedRunner {
        &self.runner
    }

    pub fn supports_instructions(&self) -> bool {
        self.supports_instructions
    }

    pub async fn try_execute(&self, context: &ChainContext, budget: &Budget) -> Result<Vec<Message>, RunnerError> {
        info!(chain = %self.name, "Executing chain");
        let start = context.len();
        self.runner.execute(context, budget).await?;
        Ok(context.messages_since(start))
    }

    pub async fn execute(&self, context: &ChainContext, budget: &Budget) -> Vec<Message> {
        let start = context.len();
        match self.try_execute(context, budget).await {
            Ok(messages) => messages,
            Err(e) => {
                warn!(chain = %self.name, error = %e, "Chain finished with an error");
                context.messages_since(start)
            }
        }
    }
}

impl fmt::Debug for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("runner", &self.runner.name())
            .field("supports_instructions", &self.supports_instructions)
            .finish()
    }
}
