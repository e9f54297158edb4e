// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Evaluator
//!
//! Scores the chain outcomes of the current agent iteration.

use crate::domain::agent_context::AgentContext;
use crate::domain::result::ScoredMessage;
use async_trait::async_trait;
use council_core::{Message, MessageKind, MessageStatus};

#[async_trait]
pub trait Evaluator: Send + Sync {
    async fn execute(&self, context: &AgentContext) -> anyhow::Result<Vec<ScoredMessage>>;
}

/// Turns the last message of each chain into an agent message.
/// Score is 1.0 for a successful skill message, 0.0 otherwise.
#[derive(Debug, Default, Clone, Copy)]
pub struct BasicEvaluator;

impl BasicEvaluator {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Evaluator for BasicEvaluator {
    async fn execute(&self, context: &AgentContext) -> anyhow::Result<Vec<ScoredMessage>> {
        Ok(context
            .chains()
            .iter()
            .filter_map(|outcome| outcome.last_message())
            .map(|last| {
                let score = if last.kind() == MessageKind::Skill && last.is_ok() {
                    1.0
                } else {
                    0.0
                };
                let status = if last.is_error() {
                    MessageStatus::Error
                } else {
                    MessageStatus::Ok
                };
                let mut message = Message::new(MessageKind::Agent, status, last.source(), last.content());
                if let Some(data) = last.data() {
                    message = message.with_data(data.clone());
                }
                ScoredMessage::new(message, score)
            })
            .collect())
    }
}
