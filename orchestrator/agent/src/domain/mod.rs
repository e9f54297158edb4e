// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Agent Domain Layer
//!
//! | Module | Key Types |
//! |--------|-----------|
//! | [`execution_unit`] | `ExecutionUnit`, rank grouping |
//! | [`agent_context`] | `AgentContext`, `AgentIteration`, `ChainOutcome` |
//! | [`result`] | `ScoredMessage`, `AgentResult` |

pub mod agent_context;
pub mod execution_unit;
pub mod result;

pub use agent_context::{AgentContext, AgentIteration, ChainOutcome};
pub use execution_unit::{group_by_rank, ExecutionUnit, SEQUENTIAL_RANK};
pub use result::{AgentResult, ScoredMessage};
