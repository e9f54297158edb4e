// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Sequential Runner
//!
//! Runs children one after another against the same context. Each child sees
//! every message appended before it, including those of its predecessors.
//!
//! Stop conditions are re-checked before every child, so once the budget
//! expires the remaining children are never invoked. A failing child stops the
//! sequence and its error is propagated; its error message is already in the
//! context, tagged with the child's identity.

use crate::domain::budget::Budget;
use crate::domain::context::ChainContext;
use crate::domain::message::Message;
use crate::domain::runner::{Runner, RunnerError, SharedRunner};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

pub struct Sequential {
    runners: Vec<SharedRunner>,
}

impl Sequential {
    pub fn new(runners: Vec<SharedRunner>) -> Self {
        Self { runners }
    }

    /// A single runner is returned as is; anything else is wrapped.
    pub fn from_list(mut runners: Vec<SharedRunner>) -> SharedRunner {
        if runners.len() == 1 {
            if let Some(runner) = runners.pop() {
                return runner;
            }
        }
        Arc::new(Self::new(runners))
    }

    pub fn runners(&self) -> &[SharedRunner] {
        &self.runners
    }
}

#[async_trait]
impl Runner for Sequential {
    fn name(&self) -> &str {
        "sequence"
    }

    async fn run(&self, context: &ChainContext, budget: &Budget) -> Result<Vec<Message>, RunnerError> {
        let start = context.len();

        for (index, runner) in self.runners.iter().enumerate() {
            if context.should_stop(budget) {
                debug!(path = %context.path(), completed = index, "Sequence stopped early");
                break;
            }

            let before = context.len();
            let step = context.with_segment(&format!("sequence[{}]", index));
            if let Err(e) = runner.execute(&step, budget).await {
                let recorded = context
                    .messages_since(before)
                    .iter()
                    .any(|m| m.is_error() && m.source() == e.origin());
                if !recorded {
                    context.append(e.to_message());
                }
                return Err(e);
            }
        }

        Ok(context.messages_since(start))
    }
}
