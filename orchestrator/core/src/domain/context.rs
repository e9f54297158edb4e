// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Message Context (shared append-only log)
//!
//! | Type | Role |
//! |------|------|
//! | [`MessageLog`] | Arena of every message appended during one chain invocation |
//! | [`ChainContext`] | Cheap-to-clone view over the log, threaded through the runner tree |
//! | [`IterationContext`] | The item (and its index) a ParallelFor iteration works on |
//!
//! ## Scopes
//!
//! A `ChainContext` exposes the messages of its *scope*: an ordered list of
//! indices into the shared log. Appending pushes the message into the log and
//! its index into the scope, under the scope lock, so a scope never loses or
//! reorders entries even with many concurrent writers.
//!
//! [`ChainContext::fork`] starts a child scope holding the parent's current
//! messages (the read snapshot for a parallel branch). [`ChainContext::merge`]
//! appends whatever the child added since the fork back onto the parent.
//! Nothing is ever removed from a scope or from the log.

use crate::domain::budget::Budget;
use crate::domain::execution_log::ExecutionLog;
use crate::domain::message::Message;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Append-only, index-stable message store.
#[derive(Debug, Default)]
pub struct MessageLog {
    entries: RwLock<Vec<Arc<Message>>>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends and returns the stable index of the new entry.
    pub fn append(&self, message: Message) -> usize {
        let mut entries = self.entries.write();
        entries.push(Arc::new(message));
        entries.len() - 1
    }

    pub fn get(&self, index: usize) -> Option<Arc<Message>> {
        self.entries.read().get(index).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every message in global append order.
    pub fn snapshot(&self) -> Vec<Message> {
        self.entries.read().iter().map(|m| (**m).clone()).collect()
    }

    fn collect(&self, indices: &[usize]) -> Vec<Message> {
        let entries = self.entries.read();
        indices
            .iter()
            .filter_map(|&i| entries.get(i))
            .map(|m| (**m).clone())
            .collect()
    }
}

/// One item drawn from a ParallelFor producer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationContext {
    pub index: usize,
    pub value: serde_json::Value,
}

impl IterationContext {
    pub fn new(index: usize, value: serde_json::Value) -> Self {
        Self { index, value }
    }
}

#[derive(Debug)]
struct Scope {
    visible: RwLock<Vec<usize>>,
    /// Length of `visible` when the scope was forked from its parent.
    forked_at: usize,
}

impl Scope {
    fn new(visible: Vec<usize>) -> Self {
        let forked_at = visible.len();
        Self {
            visible: RwLock::new(visible),
            forked_at,
        }
    }
}

#[derive(Clone)]
pub struct ChainContext {
    name: Arc<str>,
    path: Arc<str>,
    log: Arc<MessageLog>,
    scope: Arc<Scope>,
    iteration: Option<Arc<IterationContext>>,
    cancellation: CancellationToken,
    execution_log: Arc<ExecutionLog>,
}

impl ChainContext {
    /// Empty context for the chain `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self::from_messages(name, Vec::new())
    }

    /// Context whose scope starts with `history` (e.g. the conversation so far).
    pub fn from_messages(name: impl Into<String>, history: impl IntoIterator<Item = Message>) -> Self {
        let name: String = name.into();
        let log = Arc::new(MessageLog::new());
        let visible = history.into_iter().map(|m| log.append(m)).collect();

        Self {
            path: Arc::from(name.as_str()),
            name: Arc::from(name),
            log,
            scope: Arc::new(Scope::new(visible)),
            iteration: None,
            cancellation: CancellationToken::new(),
            execution_log: Arc::new(ExecutionLog::new()),
        }
    }

    pub fn from_user_message(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::from_messages(name, vec![Message::user(message)])
    }

    /// Shares `token` with whoever created it, e.g. an agent running several chains.
    pub fn with_cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn with_execution_log(mut self, execution_log: Arc<ExecutionLog>) -> Self {
        self.execution_log = execution_log;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Position of the current runner in the tree, used for logs.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn iteration(&self) -> Option<&IterationContext> {
        self.iteration.as_deref()
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn execution_log(&self) -> &Arc<ExecutionLog> {
        &self.execution_log
    }

    /// The underlying log shared by every fork of this context.
    pub fn message_log(&self) -> &Arc<MessageLog> {
        &self.log
    }

    pub fn append(&self, message: Message) {
        let mut visible = self.scope.visible.write();
        let index = self.log.append(message);
        visible.push(index);
    }

    pub fn extend(&self, messages: impl IntoIterator<Item = Message>) {
        for message in messages {
            self.append(message);
        }
    }

    /// Number of messages visible in this scope.
    pub fn len(&self) -> usize {
        self.scope.visible.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn messages(&self) -> Vec<Message> {
        self.messages_since(0)
    }

    /// Messages appended to this scope after it held `position` messages.
    pub fn messages_since(&self, position: usize) -> Vec<Message> {
        let visible = self.scope.visible.read();
        let start = position.min(visible.len());
        self.log.collect(&visible[start..])
    }

    pub fn last_message(&self) -> Option<Message> {
        let index = *self.scope.visible.read().last()?;
        self.log.get(index).map(|m| (*m).clone())
    }

    pub fn last_message_from_skill(&self, skill: &str) -> Option<Message> {
        let visible = self.scope.visible.read();
        visible
            .iter()
            .rev()
            .filter_map(|&i| self.log.get(i))
            .find(|m| m.is_from_skill(skill))
            .map(|m| (*m).clone())
    }

    pub fn messages_from(&self, source: &str) -> Vec<Message> {
        self.messages()
            .into_iter()
            .filter(|m| m.source() == source)
            .collect()
    }

    /// Same scope, deeper path. Used when a runner drives a child inline.
    pub fn with_segment(&self, segment: &str) -> Self {
        Self {
            path: Arc::from(format!("{}/{}", self.path, segment)),
            ..self.clone()
        }
    }

    /// Child scope starting from a snapshot of this scope's messages.
    pub fn fork(&self, segment: &str) -> Self {
        let snapshot = self.scope.visible.read().clone();
        Self {
            path: Arc::from(format!("{}/{}", self.path, segment)),
            scope: Arc::new(Scope::new(snapshot)),
            ..self.clone()
        }
    }

    /// Child scope that also exposes `iteration` to skills.
    pub fn fork_for_iteration(&self, segment: &str, iteration: IterationContext) -> Self {
        Self {
            iteration: Some(Arc::new(iteration)),
            ..self.fork(segment)
        }
    }

    /// Appends to this scope every message `child` added since it was forked.
    pub fn merge(&self, child: &ChainContext) {
        if Arc::ptr_eq(&self.scope, &child.scope) {
            return;
        }
        let added: Vec<usize> = {
            let visible = child.scope.visible.read();
            visible[child.scope.forked_at.min(visible.len())..].to_vec()
        };
        self.scope.visible.write().extend(added);
    }

    /// Stop when the budget is spent or the invocation was cancelled.
    pub fn should_stop(&self, budget: &Budget) -> bool {
        if budget.is_expired() {
            debug!(path = %self.path, reason = "budget expired", "Stopping");
            return true;
        }
        if self.cancellation.is_cancelled() {
            debug!(path = %self.path, reason = "cancellation token is set", "Stopping");
            return true;
        }
        false
    }

    pub fn cancel(&self) {
        self.cancellation.cancel();
    }
}

impl fmt::Debug for ChainContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainContext")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("messages", &self.len())
            .field("iteration", &self.iteration)
            .finish()
    }
}
