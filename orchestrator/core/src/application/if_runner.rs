// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! If Runner
//!
//! Evaluates its predicate once and runs exactly one branch. The branch not
//! taken produces no messages and consumes no budget. A failing predicate is a
//! hard error for the node: an error message is recorded and
//! [`RunnerError::Predicate`] is returned, no branch runs.

use crate::domain::budget::Budget;
use crate::domain::context::ChainContext;
use crate::domain::message::Message;
use crate::domain::runner::{Runner, RunnerError, RunnerPredicate, SharedRunner};
use async_trait::async_trait;
use tracing::debug;

pub struct If {
    predicate: RunnerPredicate,
    then: SharedRunner,
    otherwise: Option<SharedRunner>,
}

impl If {
    pub fn new(predicate: RunnerPredicate, then: SharedRunner) -> Self {
        Self {
            predicate,
            then,
            otherwise: None,
        }
    }

    pub fn with_else(mut self, otherwise: SharedRunner) -> Self {
        self.otherwise = Some(otherwise);
        self
    }
}

/// Runs `predicate`, recording a predicate failure on behalf of `runner`.
pub(crate) fn check_predicate(
    runner: &str,
    predicate: &RunnerPredicate,
    context: &ChainContext,
) -> Result<bool, RunnerError> {
    predicate(context).map_err(|e| {
        let error = RunnerError::Predicate {
            runner: runner.to_string(),
            reason: format!("{:#}", e),
        };
        context.append(error.to_message());
        error
    })
}

#[async_trait]
impl Runner for If {
    fn name(&self) -> &str {
        "if"
    }

    async fn run(&self, context: &ChainContext, budget: &Budget) -> Result<Vec<Message>, RunnerError> {
        let result = check_predicate(self.name(), &self.predicate, context)?;
        debug!(path = %context.path(), result, "If predicate evaluated");

        if result {
            self.then.execute(&context.with_segment("then"), budget).await
        } else if let Some(otherwise) = &self.otherwise {
            otherwise.execute(&context.with_segment("else"), budget).await
        } else {
            Ok(Vec::new())
        }
    }
}
