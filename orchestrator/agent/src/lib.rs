// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # `council-agent`: Controller / Evaluator / Filter hookpoints
//!
//! Runs [`council_core::Chain`]s on behalf of an agent: a controller plans
//! which chains run, an evaluator scores what they produced and a filter
//! picks the answers.
//!
//! ## Crate Layout
//!
//! | Module | Layer | Contents |
//! |--------|-------|----------|
//! | [`domain`] | Domain | `ExecutionUnit`, `AgentContext`, `ScoredMessage`, `AgentResult` |
//! | [`application`] | Application | `Controller`, `Evaluator`, `Filter` traits and their basic implementations, `Agent` |

pub mod domain;
pub mod application;

pub use application::*;
pub use domain::*;
