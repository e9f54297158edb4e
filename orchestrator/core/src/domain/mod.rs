// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Domain
//!
//! Value types and contracts of the execution graph runtime.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Messages, context, budget, skill and runner contracts

pub mod budget;
pub mod context;
pub mod execution_log;
pub mod message;
pub mod runner;
pub mod runtime_config;
pub mod skill;

pub use budget::{Budget, BudgetShare, Consumption};
pub use context::{ChainContext, IterationContext, MessageLog};
pub use execution_log::{ExecutionLog, ExecutionLogEntry};
pub use message::{Message, MessageId, MessageKind, MessageStatus};
pub use runner::{
    generator, predicate, IterationItems, LoopOutcome, LoopTermination, Runner, RunnerError,
    RunnerGenerator, RunnerPredicate, SharedRunner,
};
pub use runtime_config::{CouncilConfig, ExecutionConfig, LoopConfig};
pub use skill::{Skill, SkillContext};
