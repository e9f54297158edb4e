// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! ParallelFor Runner
//!
//! Runs one inner runner per item yielded by a generator, at most
//! `parallelism` at a time. Each iteration gets its own forked scope carrying
//! an [`IterationContext`] (`index`, `value`) that skills can read, and every
//! message an iteration produces is stamped with its index.
//!
//! The generator is pulled lazily: the next item is requested only once a
//! worker is free, so an unbounded generator is fine as long as the budget
//! eventually expires. A generator failure (at creation or mid-stream) stops
//! scheduling, waits for the iterations already running, and is returned as
//! [`RunnerError::Generator`].

use crate::application::branch_pool::{BranchOutcome, BranchPool};
use crate::domain::budget::Budget;
use crate::domain::context::{ChainContext, IterationContext};
use crate::domain::message::Message;
use crate::domain::runner::{Runner, RunnerError, RunnerGenerator, SharedRunner};
use crate::domain::runtime_config::ExecutionConfig;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_PARALLELISM: usize = 5;

pub struct ParallelFor {
    generator: RunnerGenerator,
    runner: SharedRunner,
    parallelism: usize,
    timeout: Option<Duration>,
}

impl ParallelFor {
    pub fn new(generator: RunnerGenerator, runner: SharedRunner) -> Self {
        Self {
            generator,
            runner,
            parallelism: DEFAULT_PARALLELISM,
            timeout: None,
        }
    }

    pub fn from_config(generator: RunnerGenerator, runner: SharedRunner, config: &ExecutionConfig) -> Self {
        Self {
            parallelism: config.parallelism.max(1),
            timeout: config.branch_timeout,
            ..Self::new(generator, runner)
        }
    }

    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism.max(1);
        self
    }

    /// Per-iteration wall-clock timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn parallelism(&self) -> usize {
        self.parallelism
    }

    fn generator_error(&self, context: &ChainContext, e: anyhow::Error) -> RunnerError {
        let error = RunnerError::Generator {
            runner: self.name().to_string(),
            reason: format!("{:#}", e),
        };
        context.append(error.to_message());
        error
    }
}

#[async_trait]
impl Runner for ParallelFor {
    fn name(&self) -> &str {
        "parallelFor"
    }

    async fn run(&self, context: &ChainContext, budget: &Budget) -> Result<Vec<Message>, RunnerError> {
        let start = context.len();
        let mut items = (self.generator)(context).map_err(|e| self.generator_error(context, e))?;
        let mut pool = BranchPool::new(self.name(), self.parallelism, self.timeout, budget);
        let mut failure = None;
        let mut index = 0;

        loop {
            let permit = pool.acquire().await?;
            if context.should_stop(budget) {
                debug!(path = %context.path(), scheduled = index, "ParallelFor stopped pulling items");
                break;
            }

            let value = match items.next() {
                None => break,
                Some(Ok(value)) => value,
                Some(Err(e)) => {
                    warn!(path = %context.path(), index, error = %e, "Generator failed");
                    failure = Some(e);
                    break;
                }
            };

            let iteration = context.fork_for_iteration(
                &format!("parallelFor[{}]", index),
                IterationContext::new(index, value),
            );
            pool.spawn(permit, iteration, self.runner.clone(), budget.clone());
            index += 1;
        }

        let reports = pool.join().await;
        let mut timed_out = 0;
        for report in &reports {
            if let BranchOutcome::TimedOut(_) = report.outcome {
                timed_out += 1;
            }
            context.merge(&report.context);
        }
        debug!(path = %context.path(), iterations = index, timed_out, "ParallelFor iterations joined");

        match failure {
            Some(e) => Err(self.generator_error(context, e)),
            None => Ok(context.messages_since(start)),
        }
    }
}
