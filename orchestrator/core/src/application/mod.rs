// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Application
//!
//! Runner primitives and chains built on the domain contracts.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Control flow over skills

mod branch_pool;
pub mod chain;
pub mod if_runner;
pub mod loops;
pub mod parallel;
pub mod parallel_for;
pub mod sequential;
pub mod skill_runner;

pub use chain::Chain;
pub use if_runner::If;
pub use loops::{DoWhile, While};
pub use parallel::Parallel;
pub use parallel_for::ParallelFor;
pub use sequential::Sequential;
pub use skill_runner::{skill, SkillRunner};
