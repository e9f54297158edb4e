// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Bounded worker pool shared by `Parallel` and `ParallelFor`.
//!
//! Each pool belongs to a single node, so nested parallel nodes never wait on
//! permits held by their own ancestors. A unit of work:
//!
//! - holds one semaphore permit for its whole lifetime
//! - runs its child under an individual wall-clock timeout
//! - on timeout, records a timeout message in its own scope and is dropped
//! - on panic, records an error message in its own scope
//!
//! Siblings are never cancelled. [`BranchPool::join`] waits for every unit and
//! hands back the branch contexts so the caller can merge them.

use crate::domain::budget::Budget;
use crate::domain::context::ChainContext;
use crate::domain::message::Message;
use crate::domain::runner::{RunnerError, SharedRunner};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, warn};

#[derive(Debug)]
pub(crate) enum BranchOutcome {
    Completed,
    Failed(RunnerError),
    TimedOut(Duration),
}

pub(crate) struct BranchReport {
    pub context: ChainContext,
    pub outcome: BranchOutcome,
}

pub(crate) struct BranchPool {
    owner: String,
    semaphore: Arc<Semaphore>,
    timeout: Option<Duration>,
    tasks: JoinSet<BranchReport>,
}

impl BranchPool {
    /// `timeout` is the configured per-unit limit; it is further capped by the
    /// budget's remaining duration.
    pub fn new(owner: &str, workers: usize, timeout: Option<Duration>, budget: &Budget) -> Self {
        let timeout = match (timeout, budget.remaining_duration()) {
            (Some(configured), Some(remaining)) => Some(configured.min(remaining)),
            (configured, remaining) => configured.or(remaining),
        };

        Self {
            owner: owner.to_string(),
            semaphore: Arc::new(Semaphore::new(workers.max(1))),
            timeout,
            tasks: JoinSet::new(),
        }
    }

    /// Waits for a free worker.
    pub async fn acquire(&self) -> Result<OwnedSemaphorePermit, RunnerError> {
        self.semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| RunnerError::Unexpected {
                runner: self.owner.clone(),
                reason: e.to_string(),
            })
    }

    pub fn spawn(
        &mut self,
        permit: OwnedSemaphorePermit,
        context: ChainContext,
        runner: SharedRunner,
        budget: Budget,
    ) {
        let timeout = self.timeout;

        self.tasks.spawn(async move {
            let _permit = permit;
            let identity = runner.name().to_string();

            let work = AssertUnwindSafe(async {
                match timeout {
                    Some(limit) => tokio::time::timeout(limit, runner.execute(&context, &budget))
                        .await
                        .map_err(|_| limit),
                    None => Ok(runner.execute(&context, &budget).await),
                }
            })
            .catch_unwind()
            .await;

            let outcome = match work {
                Ok(Ok(Ok(_))) => BranchOutcome::Completed,
                Ok(Ok(Err(e))) => {
                    debug!(branch = %identity, error = %e, "Branch failed");
                    BranchOutcome::Failed(e)
                }
                Ok(Err(limit)) => {
                    warn!(branch = %identity, path = %context.path(), timeout = ?limit, "Branch timed out");
                    metrics::counter!("council_branch_timeouts_total", "branch" => identity.clone())
                        .increment(1);
                    let error = RunnerError::Timeout {
                        runner: identity,
                        after: limit,
                    };
                    context.append(stamp(&context, error.to_message()));
                    BranchOutcome::TimedOut(limit)
                }
                Err(_) => {
                    warn!(branch = %identity, path = %context.path(), "Branch panicked");
                    let error = RunnerError::Unexpected {
                        runner: identity,
                        reason: "branch panicked".to_string(),
                    };
                    context.append(stamp(&context, error.to_message()));
                    BranchOutcome::Failed(error)
                }
            };

            BranchReport { context, outcome }
        });
    }

    /// Waits for every spawned unit, in completion order.
    pub async fn join(mut self) -> Vec<BranchReport> {
        let mut reports = Vec::with_capacity(self.tasks.len());
        while let Some(joined) = self.tasks.join_next().await {
            match joined {
                Ok(report) => reports.push(report),
                Err(e) => warn!(owner = %self.owner, error = %e, "Branch task could not be joined"),
            }
        }
        reports
    }
}

fn stamp(context: &ChainContext, message: Message) -> Message {
    match context.iteration() {
        Some(iteration) => message.with_iteration(iteration.index),
        None => message,
    }
}
