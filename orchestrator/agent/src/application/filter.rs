// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Filter
//!
//! Selects the final answers from the evaluator's scores. A non-empty
//! selection ends the agent run.

use crate::domain::agent_context::AgentContext;
use crate::domain::result::ScoredMessage;
use async_trait::async_trait;

#[async_trait]
pub trait Filter: Send + Sync {
    async fn execute(&self, context: &AgentContext) -> anyhow::Result<Vec<ScoredMessage>>;
}

/// Keeps evaluations scoring at least `score_threshold`, then the first
/// `top_k` of them. Both are optional.
#[derive(Debug, Default, Clone)]
pub struct BasicFilter {
    score_threshold: Option<f64>,
    top_k: Option<usize>,
}

impl BasicFilter {
    pub fn new(score_threshold: Option<f64>, top_k: Option<usize>) -> Self {
        Self {
            score_threshold,
            top_k,
        }
    }
}

#[async_trait]
impl Filter for BasicFilter {
    async fn execute(&self, context: &AgentContext) -> anyhow::Result<Vec<ScoredMessage>> {
        let mut selected: Vec<ScoredMessage> = context
            .evaluation()
            .iter()
            .filter(|m| self.score_threshold.map_or(true, |threshold| m.score >= threshold))
            .cloned()
            .collect();

        if let Some(k) = self.top_k.filter(|k| *k > 0) {
            selected.truncate(k);
        }
        Ok(selected)
    }
}
