// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Message Value Objects
//!
//! A [`Message`] is the only thing that flows between skills. It is created by a
//! skill (or by the runtime on behalf of a failing unit of work), appended to a
//! [`MessageLog`](crate::domain::context::MessageLog), and never changed again.
//!
//! Fields are private. The consuming builders (`with_data`, `with_iteration`)
//! are only usable before a message is appended, since the log takes ownership.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a [`Message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub Uuid);

impl MessageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who produced the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    User,
    Agent,
    Chain,
    Skill,
}

/// Outcome tag carried by every message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    Ok,
    Error,
    /// A concurrently scheduled unit of work exceeded its wall-clock timeout.
    Timeout,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    id: MessageId,
    source: String,
    content: String,
    kind: MessageKind,
    status: MessageStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    iteration: Option<usize>,
    created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(
        kind: MessageKind,
        status: MessageStatus,
        source: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: MessageId::new(),
            source: source.into(),
            content: content.into(),
            kind,
            status,
            data: None,
            iteration: None,
            created_at: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageKind::User, MessageStatus::Ok, "user", content)
    }

    pub fn agent(source: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(MessageKind::Agent, MessageStatus::Ok, source, content)
    }

    pub fn chain(source: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(MessageKind::Chain, MessageStatus::Ok, source, content)
    }

    /// Successful skill output.
    pub fn skill(source: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(MessageKind::Skill, MessageStatus::Ok, source, content)
    }

    /// Error recorded on behalf of `source` (a skill or runner identity).
    pub fn error(source: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(MessageKind::Skill, MessageStatus::Error, source, content)
    }

    pub fn timeout(source: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(MessageKind::Skill, MessageStatus::Timeout, source, content)
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Tags the message with a ParallelFor iteration index.
    pub fn with_iteration(mut self, index: usize) -> Self {
        self.iteration = Some(index);
        self
    }

    pub fn id(&self) -> MessageId {
        self.id
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    pub fn status(&self) -> MessageStatus {
        self.status
    }

    pub fn data(&self) -> Option<&serde_json::Value> {
        self.data.as_ref()
    }

    pub fn iteration(&self) -> Option<usize> {
        self.iteration
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_ok(&self) -> bool {
        self.status == MessageStatus::Ok
    }

    /// True for both `Error` and `Timeout`.
    pub fn is_error(&self) -> bool {
        !self.is_ok()
    }

    pub fn is_timeout(&self) -> bool {
        self.status == MessageStatus::Timeout
    }

    pub fn is_from_skill(&self, name: &str) -> bool {
        self.kind == MessageKind::Skill && self.source == name
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}/{:?}] {}: {}", self.kind, self.status, self.source, self.content)
    }
}
