// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Council Core
//!
//! Execution graph runtime for agent orchestration: composable control-flow
//! runners route a shared message context between skills while enforcing one
//! resource budget per chain invocation.
//!
//! # Architecture
//!
//! - **Domain:** messages, the shared context, budgets, the skill and runner
//!   contracts, runtime configuration
//! - **Application:** the runner primitives (Sequential, Parallel, ParallelFor,
//!   If, While, DoWhile), the skill adapter and [`Chain`]
//! - **Infrastructure:** config discovery and loading, logging setup
//!
//! ```no_run
//! use council_core::{skill, Budget, Chain, ChainContext, Message, Skill, SkillContext};
//!
//! struct Echo;
//!
//! #[async_trait::async_trait]
//! impl Skill for Echo {
//!     fn name(&self) -> &str {
//!         "echo"
//!     }
//!
//!     async fn execute(&self, context: &SkillContext) -> anyhow::Result<Vec<Message>> {
//!         let text = context.last_message().map(|m| m.content().to_string()).unwrap_or_default();
//!         Ok(vec![Message::skill("echo", text)])
//!     }
//! }
//!
//! # async fn demo() {
//! let chain = Chain::new("echo", "repeats the prompt", vec![skill(Echo)]);
//! let context = ChainContext::from_user_message("echo", "hello");
//! let messages = chain.execute(&context, &Budget::default()).await;
//! # }
//! ```

pub mod domain;
pub mod application;
pub mod infrastructure;

pub use application::*;
pub use domain::*;
