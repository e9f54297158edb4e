// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Execution Log
//!
//! Per-invocation record of every runner that executed: where it sits in the
//! runner tree, when it started, how long it took, what it consumed, how many
//! messages it returned and whether it failed. Shared by all forks of a
//! [`ChainContext`](crate::domain::context::ChainContext).

use crate::domain::budget::Consumption;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionLogEntry {
    /// Slash-separated runner path, e.g. `chain/sequence[1]/parallel[0]/search`.
    pub source: String,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    /// Consumptions recorded on the budget while the runner was active.
    /// Under a shared budget this includes concurrent siblings.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub consumptions: Vec<Consumption>,
    pub message_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iteration: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Default)]
pub struct ExecutionLog {
    entries: Mutex<Vec<ExecutionLogEntry>>,
}

impl ExecutionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, entry: ExecutionLogEntry) {
        self.entries.lock().push(entry);
    }

    pub fn entries(&self) -> Vec<ExecutionLogEntry> {
        self.entries.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        let entries = self.entries();
        serde_json::to_string_pretty(&serde_json::json!({ "entries": entries }))
    }
}
