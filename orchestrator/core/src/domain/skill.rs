// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Skill Contract
//!
//! A [`Skill`] is the atomic unit of work: given a read-only [`SkillContext`],
//! it produces zero or more [`Message`]s. It never appends to the context
//! itself; the skill adapter (`SkillRunner`) does that once the skill returns.
//!
//! Skills typically wrap an outbound model-provider call, so `execute` is async
//! and is the only real suspension point of the runtime.

use crate::domain::budget::Budget;
use crate::domain::context::{ChainContext, IterationContext};
use crate::domain::message::Message;
use async_trait::async_trait;
use std::time::Duration;

#[async_trait]
pub trait Skill: Send + Sync {
    /// Identity used as the source of every message the runtime records for it.
    fn name(&self) -> &str;

    async fn execute(&self, context: &SkillContext) -> anyhow::Result<Vec<Message>>;
}

/// Read-only view handed to a skill.
///
/// Exposes the messages visible to the skill, the current iteration (inside a
/// ParallelFor), and the budget for `can_consume` checks and consumption
/// reports. It offers no way to append messages.
#[derive(Debug, Clone)]
pub struct SkillContext {
    chain: ChainContext,
    budget: Budget,
}

impl SkillContext {
    pub fn new(chain: ChainContext, budget: Budget) -> Self {
        Self { chain, budget }
    }

    pub fn chain_name(&self) -> &str {
        self.chain.name()
    }

    pub fn messages(&self) -> Vec<Message> {
        self.chain.messages()
    }

    pub fn last_message(&self) -> Option<Message> {
        self.chain.last_message()
    }

    pub fn last_message_from_skill(&self, skill: &str) -> Option<Message> {
        self.chain.last_message_from_skill(skill)
    }

    pub fn iteration(&self) -> Option<&IterationContext> {
        self.chain.iteration()
    }

    pub fn budget(&self) -> &Budget {
        &self.budget
    }

    pub fn can_consume(&self, value: f64, unit: &str, kind: &str) -> bool {
        self.budget.can_consume(value, unit, kind)
    }

    /// Reports resource usage (tokens, provider calls, ...) to the budget.
    pub fn record_consumption(&self, value: f64, unit: &str, kind: &str) {
        self.budget.record_consumption(value, unit, kind);
    }

    pub fn remaining_duration(&self) -> Option<Duration> {
        self.budget.remaining_duration()
    }

    pub fn is_cancelled(&self) -> bool {
        self.chain.cancellation_token().is_cancelled()
    }
}
