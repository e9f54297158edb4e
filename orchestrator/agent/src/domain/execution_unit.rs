// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Execution Units
//!
//! An [`ExecutionUnit`] is one entry of a controller's plan: run `chain` under
//! `budget`, optionally seeded with an extra message.
//!
//! ## Rank
//!
//! Units are grouped by rank and groups run in ascending rank order.
//!
//! | Rank | Scheduling |
//! |------|------------|
//! | negative (default) | alone, one after another |
//! | zero or positive | concurrently with every unit of the same rank |

use council_core::{Budget, Chain, Message};

/// Rank given to units that must run on their own.
pub const SEQUENTIAL_RANK: i32 = -1;

#[derive(Debug, Clone)]
pub struct ExecutionUnit {
    chain: Chain,
    budget: Budget,
    initial_state: Option<Message>,
    name: String,
    rank: i32,
}

impl ExecutionUnit {
    /// Unit named after its chain, with [`SEQUENTIAL_RANK`].
    pub fn new(chain: Chain, budget: Budget) -> Self {
        Self {
            name: chain.name().to_string(),
            chain,
            budget,
            initial_state: None,
            rank: SEQUENTIAL_RANK,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// `None` keeps [`SEQUENTIAL_RANK`].
    pub fn with_rank(mut self, rank: Option<i32>) -> Self {
        self.rank = rank.unwrap_or(SEQUENTIAL_RANK);
        self
    }

    /// Message appended to the chain context before the chain runs.
    pub fn with_initial_state(mut self, message: Message) -> Self {
        self.initial_state = Some(message);
        self
    }

    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    pub fn budget(&self) -> &Budget {
        &self.budget
    }

    pub fn initial_state(&self) -> Option<&Message> {
        self.initial_state.as_ref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rank(&self) -> i32 {
        self.rank
    }

    pub fn runs_alone(&self) -> bool {
        self.rank < 0
    }
}

/// Splits a plan into groups in ascending rank order. Each negative-rank unit
/// forms its own group; units sharing a non-negative rank form one group.
/// Plan order is kept within a rank.
pub fn group_by_rank(plan: Vec<ExecutionUnit>) -> Vec<Vec<ExecutionUnit>> {
    let mut ranks: Vec<i32> = plan.iter().map(ExecutionUnit::rank).collect();
    ranks.sort_unstable();
    ranks.dedup();

    let mut remaining = plan;
    let mut groups = Vec::new();
    for rank in ranks {
        let (group, rest): (Vec<_>, Vec<_>) = remaining.into_iter().partition(|u| u.rank() == rank);
        remaining = rest;
        if rank < 0 {
            groups.extend(group.into_iter().map(|unit| vec![unit]));
        } else {
            groups.push(group);
        }
    }
    groups
}
