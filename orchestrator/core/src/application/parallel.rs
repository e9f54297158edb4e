// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Parallel Runner
//!
//! Runs every child concurrently. All branches start from the same snapshot
//! of the context and append into their own forked scope; the scopes are
//! merged back once every branch has completed, failed or timed out.
//!
//! One branch's failure or timeout never cancels its siblings, and the result
//! always carries every branch's outcome (its messages, its error message, or
//! its timeout message).

use crate::application::branch_pool::{BranchOutcome, BranchPool};
use crate::domain::budget::{Budget, BudgetShare};
use crate::domain::context::ChainContext;
use crate::domain::message::Message;
use crate::domain::runner::{Runner, RunnerError, SharedRunner};
use crate::domain::runtime_config::ExecutionConfig;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_MAX_WORKERS: usize = 10;

pub struct Parallel {
    runners: Vec<SharedRunner>,
    max_workers: usize,
    timeout: Option<Duration>,
    branch_budget: Option<BudgetShare>,
}

impl Parallel {
    pub fn new(runners: Vec<SharedRunner>) -> Self {
        Self {
            runners,
            max_workers: DEFAULT_MAX_WORKERS,
            timeout: None,
            branch_budget: None,
        }
    }

    pub fn from_config(runners: Vec<SharedRunner>, config: &ExecutionConfig) -> Self {
        Self {
            max_workers: config.max_workers,
            timeout: config.branch_timeout,
            ..Self::new(runners)
        }
    }

    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers.max(1);
        self
    }

    /// Per-branch wall-clock timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Gives every branch its own child budget instead of the shared one.
    pub fn with_branch_budget(mut self, share: BudgetShare) -> Self {
        self.branch_budget = Some(share);
        self
    }

    pub fn into_shared(self) -> SharedRunner {
        Arc::new(self)
    }
}

#[async_trait]
impl Runner for Parallel {
    fn name(&self) -> &str {
        "parallel"
    }

    async fn run(&self, context: &ChainContext, budget: &Budget) -> Result<Vec<Message>, RunnerError> {
        let start = context.len();
        let mut pool = BranchPool::new(self.name(), self.max_workers, self.timeout, budget);

        for (index, runner) in self.runners.iter().enumerate() {
            let permit = pool.acquire().await?;
            if context.should_stop(budget) {
                debug!(path = %context.path(), scheduled = index, "Parallel stopped scheduling branches");
                break;
            }

            let branch_budget = match &self.branch_budget {
                Some(share) => budget.derive_child(share.clone()),
                None => budget.clone(),
            };
            let branch = context.fork(&format!("parallel[{}]", index));
            pool.spawn(permit, branch, runner.clone(), branch_budget);
        }

        let reports = pool.join().await;
        let (mut failed, mut timed_out) = (0, 0);
        for report in &reports {
            match &report.outcome {
                BranchOutcome::Completed => {}
                BranchOutcome::Failed(_) => failed += 1,
                BranchOutcome::TimedOut(_) => timed_out += 1,
            }
            context.merge(&report.context);
        }
        debug!(
            path = %context.path(),
            branches = reports.len(),
            failed,
            timed_out,
            "Parallel branches joined"
        );

        Ok(context.messages_since(start))
    }
}
