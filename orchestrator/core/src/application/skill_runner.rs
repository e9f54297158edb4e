// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Skill Runner
//!
//! Leaf adapter that lets a [`Skill`] take part in a runner graph.
//!
//! # Behaviour
//!
//! - Budget already expired (or invocation cancelled): the skill is not invoked.
//! - Skill returns messages: they are stamped with the iteration index (inside
//!   a ParallelFor), appended in order, and one `call`/`skill` consumption is
//!   recorded on the budget.
//! - Skill fails or panics: a single error message sourced from the skill is
//!   appended and [`RunnerError::Skill`] is returned. Parent nodes decide
//!   whether that is contained or propagated.

use crate::domain::budget::{Budget, CALL_UNIT, SKILL_KIND};
use crate::domain::context::ChainContext;
use crate::domain::message::Message;
use crate::domain::runner::{Runner, RunnerError, SharedRunner};
use crate::domain::skill::{Skill, SkillContext};
use async_trait::async_trait;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

pub struct SkillRunner {
    skill: Arc<dyn Skill>,
}

impl SkillRunner {
    pub fn new(skill: Arc<dyn Skill>) -> Self {
        Self { skill }
    }

    pub fn skill(&self) -> &Arc<dyn Skill> {
        &self.skill
    }

    fn failure(&self, context: &ChainContext, reason: String) -> RunnerError {
        let mut message = Message::error(
            self.skill.name(),
            format!("skill '{}' raised exception: {}", self.skill.name(), reason),
        );
        if let Some(iteration) = context.iteration() {
            message = message.with_iteration(iteration.index);
        }
        context.append(message);

        metrics::counter!("council_skill_errors_total", "skill" => self.skill.name().to_string())
            .increment(1);

        RunnerError::Skill {
            skill: self.skill.name().to_string(),
            reason,
        }
    }
}

/// Wraps a skill as a shareable runner node.
pub fn skill<S: Skill + 'static>(skill: S) -> SharedRunner {
    Arc::new(SkillRunner::new(Arc::new(skill)))
}

#[async_trait]
impl Runner for SkillRunner {
    fn name(&self) -> &str {
        self.skill.name()
    }

    async fn run(&self, context: &ChainContext, budget: &Budget) -> Result<Vec<Message>, RunnerError> {
        if context.should_stop(budget) {
            return Ok(Vec::new());
        }

        let name = self.skill.name();
        let skill_context = SkillContext::new(context.clone(), budget.clone());
        let timer = Instant::now();
        info!(skill = %name, path = %context.path(), "Skill execution started");
        metrics::counter!("council_skill_executions_total", "skill" => name.to_string()).increment(1);

        let outcome = AssertUnwindSafe(self.skill.execute(&skill_context))
            .catch_unwind()
            .await;

        metrics::histogram!("council_skill_duration_seconds", "skill" => name.to_string())
            .record(timer.elapsed().as_secs_f64());

        let produced = match outcome {
            Ok(Ok(messages)) => messages,
            Ok(Err(e)) => {
                warn!(skill = %name, error = %e, "Skill execution failed");
                return Err(self.failure(context, format!("{:#}", e)));
            }
            Err(panic) => {
                let reason = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "panic".to_string());
                warn!(skill = %name, reason = %reason, "Skill panicked");
                return Err(self.failure(context, reason));
            }
        };

        let iteration = context.iteration().map(|i| i.index);
        let messages: Vec<Message> = produced
            .into_iter()
            .map(|m| match (iteration, m.iteration()) {
                (Some(index), None) => m.with_iteration(index),
                _ => m,
            })
            .collect();

        context.extend(messages.iter().cloned());
        budget.record_consumption(1.0, CALL_UNIT, SKILL_KIND);

        if messages.iter().all(Message::is_ok) {
            info!(skill = %name, messages = messages.len(), "Skill execution ended");
        } else {
            warn!(skill = %name, messages = messages.len(), "Skill execution ended with error messages");
        }

        Ok(messages)
    }
}
