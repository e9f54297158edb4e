// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Scored messages and the outcome of an agent run.

use council_core::Message;
use serde::{Deserialize, Serialize};

/// A candidate answer with the score an evaluator gave it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredMessage {
    pub message: Message,
    pub score: f64,
}

impl ScoredMessage {
    pub fn new(message: Message, score: f64) -> Self {
        Self { message, score }
    }
}

/// Messages selected by the filter. Empty when the plan ran dry or the budget
/// expired before anything passed the filter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentResult {
    messages: Vec<ScoredMessage>,
}

impl AgentResult {
    pub fn new(messages: Vec<ScoredMessage>) -> Self {
        Self { messages }
    }

    pub fn messages(&self) -> &[ScoredMessage] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Highest-scoring message. Ties go to the earliest.
    pub fn best_message(&self) -> Option<&Message> {
        self.messages
            .iter()
            .fold(None::<&ScoredMessage>, |best, candidate| match best {
                Some(b) if b.score >= candidate.score => Some(b),
                _ => Some(candidate),
            })
            .map(|scored| &scored.message)
    }

    pub fn best_score(&self) -> Option<f64> {
        self.messages.iter().map(|m| m.score).reduce(f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_best_message() {
        let result = AgentResult::new(vec![
            ScoredMessage::new(Message::agent("a", "low"), 0.2),
            ScoredMessage::new(Message::agent("b", "high"), 0.9),
            ScoredMessage::new(Message::agent("c", "also high"), 0.9),
        ]);

        assert_eq!(result.best_message().unwrap().content(), "high");
        assert_eq!(result.best_score(), Some(0.9));
    }

    #[test]
    fn test_empty_result() {
        let result = AgentResult::default();
        assert!(result.is_empty());
        assert!(result.best_message().is_none());
        assert!(result.best_score().is_none());
    }

    #[test]
    fn test_serializes_scores() {
        let result = AgentResult::new(vec![ScoredMessage::new(Message::agent("a", "yes"), 1.0)]);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["messages"][0]["score"], 1.0);
        assert_eq!(json["messages"][0]["message"]["content"], "yes");
    }
}
