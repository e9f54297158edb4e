// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Runner Contract
//!
//! Every control-flow node (Sequential, Parallel, ParallelFor, If, While,
//! DoWhile) and the skill adapter implement [`Runner`]. Nodes own their
//! children as [`SharedRunner`]s, so graphs nest arbitrarily.
//!
//! Callers use [`Runner::execute`]; implementors provide [`Runner::run`].
//! `execute` applies the checks and bookkeeping common to every node:
//!
//! 1. return no messages if the budget is expired or the invocation cancelled
//! 2. run the node
//! 3. record an [`ExecutionLogEntry`] for it
//!
//! ## Error taxonomy
//!
//! | Error | Recorded as | Contained by |
//! |-------|-------------|--------------|
//! | [`RunnerError::Skill`] | error message from the skill | Parallel, ParallelFor, While, DoWhile |
//! | [`RunnerError::Predicate`] | error message from the If/loop node | never (fatal to the node) |
//! | [`RunnerError::Generator`] | error message from the ParallelFor node | never |
//! | timeout | timeout message from the branch | always (never surfaces as an error) |
//!
//! Budget exhaustion is not an error: nodes simply return early.

use crate::domain::budget::Budget;
use crate::domain::context::ChainContext;
use crate::domain::execution_log::ExecutionLogEntry;
use crate::domain::message::Message;
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("skill '{skill}' failed: {reason}")]
    Skill { skill: String, reason: String },

    #[error("predicate of '{runner}' failed: {reason}")]
    Predicate { runner: String, reason: String },

    #[error("generator of '{runner}' failed: {reason}")]
    Generator { runner: String, reason: String },

    #[error("'{runner}' timed out after {after:?}")]
    Timeout { runner: String, after: Duration },

    #[error("unexpected error in '{runner}': {reason}")]
    Unexpected { runner: String, reason: String },
}

impl RunnerError {
    /// Identity of the node that failed.
    pub fn origin(&self) -> &str {
        match self {
            RunnerError::Skill { skill, .. } => skill,
            RunnerError::Predicate { runner, .. }
            | RunnerError::Generator { runner, .. }
            | RunnerError::Timeout { runner, .. }
            | RunnerError::Unexpected { runner, .. } => runner,
        }
    }

    /// The error message the failing node records in the context.
    pub fn to_message(&self) -> Message {
        match self {
            RunnerError::Timeout { .. } => Message::timeout(self.origin(), self.to_string()),
            _ => Message::error(self.origin(), self.to_string()),
        }
    }
}

pub type SharedRunner = Arc<dyn Runner>;

/// Pure function of the current context. `Err` is fatal to the node using it.
pub type RunnerPredicate = Arc<dyn Fn(&ChainContext) -> anyhow::Result<bool> + Send + Sync>;

/// Lazily produced, non-restartable ParallelFor items.
pub type IterationItems = Box<dyn Iterator<Item = anyhow::Result<serde_json::Value>> + Send>;

pub type RunnerGenerator = Arc<dyn Fn(&ChainContext) -> anyhow::Result<IterationItems> + Send + Sync>;

pub fn predicate<F>(f: F) -> RunnerPredicate
where
    F: Fn(&ChainContext) -> anyhow::Result<bool> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Generator over a plain iterator of values that cannot fail mid-stream.
pub fn generator<F, I>(f: F) -> RunnerGenerator
where
    F: Fn(&ChainContext) -> I + Send + Sync + 'static,
    I: IntoIterator<Item = serde_json::Value>,
    I::IntoIter: Send + 'static,
{
    Arc::new(move |ctx: &ChainContext| -> anyhow::Result<IterationItems> {
        Ok(Box::new(f(ctx).into_iter().map(Ok)))
    })
}

/// Why a While/DoWhile loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopTermination {
    PredicateFalse,
    BudgetExpired,
    Cancelled,
    MaxIterations,
}

#[derive(Debug, Clone)]
pub struct LoopOutcome {
    /// Messages of the final iteration executed.
    pub messages: Vec<Message>,
    pub iterations: usize,
    pub termination: LoopTermination,
}

#[async_trait]
pub trait Runner: Send + Sync {
    /// Identity used to tag error messages and execution-log entries.
    fn name(&self) -> &str;

    /// Node-specific behaviour. Returns the messages this node produced.
    async fn run(&self, context: &ChainContext, budget: &Budget) -> Result<Vec<Message>, RunnerError>;

    async fn execute(&self, context: &ChainContext, budget: &Budget) -> Result<Vec<Message>, RunnerError> {
        if context.should_stop(budget) {
            return Ok(Vec::new());
        }

        let started_at = Utc::now();
        let timer = Instant::now();
        let consumed_before = budget.consumption_count();
        debug!(runner = %self.name(), path = %context.path(), "Runner started");

        let result = self.run(context, budget).await;

        let (message_count, error) = match &result {
            Ok(messages) => (messages.len(), None),
            Err(e) => {
                warn!(runner = %self.name(), path = %context.path(), error = %e, "Runner failed");
                (0, Some(e.to_string()))
            }
        };
        context.execution_log().record(ExecutionLogEntry {
            source: context.path().to_string(),
            started_at,
            duration_ms: timer.elapsed().as_millis() as u64,
            consumptions: budget.consumptions_since(consumed_before),
            message_count,
            iteration: context.iteration().map(|i| i.index),
            error,
        });
        debug!(runner = %self.name(), path = %context.path(), messages = message_count, "Runner finished");

        result
    }
}
