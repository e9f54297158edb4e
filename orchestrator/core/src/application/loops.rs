// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! While / DoWhile Runners
//!
//! Both repeat a body runner against the same context, so every iteration's
//! messages are visible to the predicate and to the next iteration.
//!
//! | Runner | Predicate checked | Minimum iterations |
//! |--------|-------------------|--------------------|
//! | [`While`] | before each iteration | 0 |
//! | [`DoWhile`] | after each iteration | 1 |
//!
//! At every check point the loop stops when the invocation is cancelled, the
//! budget is expired, the optional iteration cap is reached, or the predicate
//! returns `false`. The cap does not depend on the predicate, so it always
//! bounds a runaway loop. [`While::run_loop`] / [`DoWhile::run_loop`] report
//! which of these ended the loop.
//!
//! Body failures are contained (the failing node already recorded its error
//! message) and the loop goes on. Predicate failures are fatal.

use crate::application::if_runner::check_predicate;
use crate::domain::budget::Budget;
use crate::domain::context::ChainContext;
use crate::domain::message::Message;
use crate::domain::runner::{
    LoopOutcome, LoopTermination, Runner, RunnerError, RunnerPredicate, SharedRunner,
};
use crate::domain::runtime_config::LoopConfig;
use async_trait::async_trait;
use tracing::{debug, info};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Check {
    Before,
    After,
}

struct LoopDriver<'a> {
    name: &'a str,
    predicate: &'a RunnerPredicate,
    body: &'a SharedRunner,
    max_iterations: Option<usize>,
    check: Check,
}

impl LoopDriver<'_> {
    fn termination(&self, context: &ChainContext, budget: &Budget, iterations: usize) -> Result<Option<LoopTermination>, RunnerError> {
        if context.cancellation_token().is_cancelled() {
            return Ok(Some(LoopTermination::Cancelled));
        }
        if budget.is_expired() {
            return Ok(Some(LoopTermination::BudgetExpired));
        }
        if self.max_iterations.is_some_and(|cap| iterations >= cap) {
            return Ok(Some(LoopTermination::MaxIterations));
        }
        if !check_predicate(self.name, self.predicate, context)? {
            return Ok(Some(LoopTermination::PredicateFalse));
        }
        Ok(None)
    }

    async fn drive(&self, context: &ChainContext, budget: &Budget) -> Result<LoopOutcome, RunnerError> {
        let mut iterations = 0;
        let mut messages: Vec<Message> = Vec::new();

        let termination = loop {
            if self.check == Check::Before || iterations > 0 {
                if let Some(reason) = self.termination(context, budget, iterations)? {
                    break reason;
                }
            }

            let before = context.len();
            let step = context.with_segment(&format!("{}[{}]", self.name, iterations));
            if let Err(e) = self.body.execute(&step, budget).await {
                debug!(path = %step.path(), error = %e, "Loop body failed, continuing");
            }
            messages = context.messages_since(before);
            iterations += 1;
        };

        info!(
            runner = %self.name,
            path = %context.path(),
            iterations,
            termination = ?termination,
            "Loop terminated"
        );

        Ok(LoopOutcome {
            messages,
            iterations,
            termination,
        })
    }
}

pub struct While {
    predicate: RunnerPredicate,
    body: SharedRunner,
    max_iterations: Option<usize>,
}

impl While {
    pub fn new(predicate: RunnerPredicate, body: SharedRunner) -> Self {
        Self {
            predicate,
            body,
            max_iterations: None,
        }
    }

    pub fn from_config(predicate: RunnerPredicate, body: SharedRunner, config: &LoopConfig) -> Self {
        Self {
            max_iterations: config.max_iterations,
            ..Self::new(predicate, body)
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = Some(max_iterations);
        self
    }

    /// Runs the loop and reports how it ended.
    pub async fn run_loop(&self, context: &ChainContext, budget: &Budget) -> Result<LoopOutcome, RunnerError> {
        LoopDriver {
            name: self.name(),
            predicate: &self.predicate,
            body: &self.body,
            max_iterations: self.max_iterations,
            check: Check::Before,
        }
        .drive(context, budget)
        .await
    }
}

#[async_trait]
impl Runner for While {
    fn name(&self) -> &str {
        "while"
    }

    async fn run(&self, context: &ChainContext, budget: &Budget) -> Result<Vec<Message>, RunnerError> {
        Ok(self.run_loop(context, budget).await?.messages)
    }
}

pub struct DoWhile {
    predicate: RunnerPredicate,
    body: SharedRunner,
    max_iterations: Option<usize>,
}

impl DoWhile {
    pub fn new(predicate: RunnerPredicate, body: SharedRunner) -> Self {
        Self {
            predicate,
            body,
            max_iterations: None,
        }
    }

    pub fn from_config(predicate: RunnerPredicate, body: SharedRunner, config: &LoopConfig) -> Self {
        Self {
            max_iterations: config.max_iterations,
            ..Self::new(predicate, body)
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = Some(max_iterations);
        self
    }

    pub async fn run_loop(&self, context: &ChainContext, budget: &Budget) -> Result<LoopOutcome, RunnerError> {
        LoopDriver {
            name: self.name(),
            predicate: &self.predicate,
            body: &self.body,
            max_iterations: self.max_iterations,
            check: Check::After,
        }
        .drive(context, budget)
        .await
    }
}

#[async_trait]
impl Runner for DoWhile {
    fn name(&self) -> &str {
        "doWhile"
    }

    async fn run(&self, context: &ChainContext, budget: &Budget) -> Result<Vec<Message>, RunnerError> {
        Ok(self.run_loop(context, budget).await?.messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::skill_runner::skill;
    use crate::domain::runner::predicate;
    use crate::domain::skill::{Skill, SkillContext};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    struct Counter {
        calls: Arc<AtomicUsize>,
        fail_on: Option<usize>,
    }

    #[async_trait]
    impl Skill for Counter {
        fn name(&self) -> &str {
            "counter"
        }

        async fn execute(&self, _context: &SkillContext) -> anyhow::Result<Vec<Message>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_on == Some(call) {
                anyhow::bail!("call {} failed", call);
            }
            Ok(vec![Message::skill("counter", call.to_string())])
        }
    }

    fn counter(calls: &Arc<AtomicUsize>) -> SharedRunner {
        skill(Counter {
            calls: calls.clone(),
            fail_on: None,
        })
    }

    fn fewer_than(n: usize) -> RunnerPredicate {
        predicate(move |ctx| Ok(ctx.messages_from("counter").len() < n))
    }

    #[tokio::test]
    async fn test_while_returns_last_iteration_only() {
        let calls = Arc::new(AtomicUsize::new(0));
        let runner = While::new(fewer_than(3), counter(&calls));
        let ctx = ChainContext::new("chain");

        let outcome = runner.run_loop(&ctx, &Budget::infinite()).await.unwrap();

        assert_eq!(outcome.iterations, 3);
        assert_eq!(outcome.termination, LoopTermination::PredicateFalse);
        assert_eq!(outcome.messages.len(), 1);
        assert_eq!(outcome.messages[0].content(), "2");
        assert_eq!(ctx.len(), 3);
    }

    #[tokio::test]
    async fn test_cap_is_enforced_and_reported() {
        let calls = Arc::new(AtomicUsize::new(0));
        let runner = While::new(predicate(|_| Ok(true)), counter(&calls)).with_max_iterations(4);

        let outcome = runner
            .run_loop(&ChainContext::new("chain"), &Budget::infinite())
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(outcome.termination, LoopTermination::MaxIterations);
    }

    #[tokio::test]
    async fn test_do_while_cap_counts_first_iteration() {
        let calls = Arc::new(AtomicUsize::new(0));
        let runner = DoWhile::new(predicate(|_| Ok(true)), counter(&calls)).with_max_iterations(1);

        let outcome = runner
            .run_loop(&ChainContext::new("chain"), &Budget::infinite())
            .await
            .unwrap();

        assert_eq!(outcome.iterations, 1);
        assert_eq!(outcome.termination, LoopTermination::MaxIterations);
    }

    #[tokio::test]
    async fn test_budget_termination_is_reported() {
        let calls = Arc::new(AtomicUsize::new(0));
        let runner = While::new(predicate(|_| Ok(true)), counter(&calls));
        let budget = Budget::with_limits(
            Duration::from_secs(5),
            vec![crate::domain::budget::Consumption::call(2.0)],
        );

        let outcome = runner.run_loop(&ChainContext::new("chain"), &budget).await.unwrap();

        assert_eq!(outcome.termination, LoopTermination::BudgetExpired);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_body_failure_is_contained() {
        let calls = Arc::new(AtomicUsize::new(0));
        let body = skill(Counter {
            calls: calls.clone(),
            fail_on: Some(1),
        });
        let runner = While::new(predicate(|ctx| Ok(ctx.len() < 4)), body);
        let ctx = ChainContext::new("chain");

        let outcome = runner.run_loop(&ctx, &Budget::infinite()).await.unwrap();

        assert_eq!(outcome.iterations, 4);
        let errors = ctx.messages().iter().filter(|m| m.is_error()).count();
        assert_eq!(errors, 1);
    }

    #[tokio::test]
    async fn test_predicate_error_is_fatal() {
        let calls = Arc::new(AtomicUsize::new(0));
        let runner = DoWhile::new(predicate(|_| anyhow::bail!("broken")), counter(&calls));
        let ctx = ChainContext::new("chain");

        let err = runner.execute(&ctx, &Budget::infinite()).await.unwrap_err();

        assert!(matches!(err, RunnerError::Predicate { ref runner, .. } if runner == "doWhile"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(ctx.last_message().unwrap().is_error());
    }
}
