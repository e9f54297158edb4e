// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Agent Context
//!
//! State shared by the controller, the chains, the evaluator and the filter
//! during one [`Agent`](crate::application::agent::Agent) run.
//!
//! The context keeps the chat history, the run budget and one
//! [`AgentIteration`] per controller round. Within an iteration the chains
//! report their messages ([`ChainOutcome`]), the evaluator stores its scores,
//! and the filter reads them back.

use crate::domain::result::ScoredMessage;
use council_core::{Budget, ChainContext, ExecutionLog, Message};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Messages one execution unit produced in the current iteration.
#[derive(Debug, Clone)]
pub struct ChainOutcome {
    pub unit: String,
    pub chain: String,
    pub messages: Vec<Message>,
}

impl ChainOutcome {
    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }
}

#[derive(Debug, Clone, Default)]
pub struct AgentIteration {
    pub chains: Vec<ChainOutcome>,
    pub evaluation: Vec<ScoredMessage>,
}

#[derive(Debug)]
pub struct AgentContext {
    history: Vec<Message>,
    budget: Budget,
    iterations: Vec<AgentIteration>,
    execution_log: Arc<ExecutionLog>,
    cancellation: CancellationToken,
}

impl AgentContext {
    pub fn new(history: Vec<Message>, budget: Budget) -> Self {
        Self {
            history,
            budget,
            iterations: Vec::new(),
            execution_log: Arc::new(ExecutionLog::new()),
            cancellation: CancellationToken::new(),
        }
    }

    pub fn empty(budget: Budget) -> Self {
        Self::new(Vec::new(), budget)
    }

    pub fn from_user_message(message: impl Into<String>, budget: Budget) -> Self {
        Self::new(vec![Message::user(message)], budget)
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    pub fn budget(&self) -> &Budget {
        &self.budget
    }

    pub fn execution_log(&self) -> &Arc<ExecutionLog> {
        &self.execution_log
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Stops new work in every chain started from this context.
    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    pub fn iterations(&self) -> &[AgentIteration] {
        &self.iterations
    }

    pub fn iteration_count(&self) -> usize {
        self.iterations.len()
    }

    /// Starts a new controller round and returns its index.
    pub fn new_iteration(&mut self) -> usize {
        self.iterations.push(AgentIteration::default());
        self.iterations.len() - 1
    }

    pub fn current_iteration(&self) -> Option<&AgentIteration> {
        self.iterations.last()
    }

    /// Chain outcomes of the current iteration.
    pub fn chains(&self) -> &[ChainOutcome] {
        self.current_iteration().map(|it| it.chains.as_slice()).unwrap_or(&[])
    }

    /// Evaluator scores of the current iteration.
    pub fn evaluation(&self) -> &[ScoredMessage] {
        self.current_iteration().map(|it| it.evaluation.as_slice()).unwrap_or(&[])
    }

    pub fn record_chain(&mut self, outcome: ChainOutcome) {
        self.current_mut().chains.push(outcome);
    }

    pub fn set_evaluation(&mut self, evaluation: Vec<ScoredMessage>) {
        self.current_mut().evaluation = evaluation;
    }

    /// Fresh chain context seeded with the chat history, wired to this run's
    /// execution log and cancellation token.
    pub fn new_chain_context(&self, name: &str) -> ChainContext {
        ChainContext::from_messages(name, self.history.iter().cloned())
            .with_execution_log(self.execution_log.clone())
            .with_cancellation_token(self.cancellation.clone())
    }

    fn current_mut(&mut self) -> &mut AgentIteration {
        if self.iterations.is_empty() {
            self.iterations.push(AgentIteration::default());
        }
        let last = self.iterations.len() - 1;
        &mut self.iterations[last]
    }
}
