// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Agent
//!
//! Drives chains through the controller / evaluator / filter hookpoints.
//!
//! ## Iteration
//!
//! 1. the [`Controller`] returns a plan of [`ExecutionUnit`]s (empty plan: stop)
//! 2. the plan runs group by group in rank order (see
//!    [`group_by_rank`]); units of one group run concurrently, each on a
//!    fresh chain context seeded with the chat history
//! 3. the [`Evaluator`] scores the chain outcomes
//! 4. the [`Filter`] selects answers; a non-empty selection is the result
//!
//! Iterations repeat until a result is selected, the plan is empty, the budget
//! expires, the run is cancelled, or the optional iteration cap is reached.
//! Chain failures never abort the run (they are error messages the evaluator
//! sees); controller, evaluator and filter failures do.

use crate::application::controller::{BasicController, Controller};
use crate::application::evaluator::{BasicEvaluator, Evaluator};
use crate::application::filter::{BasicFilter, Filter};
use crate::domain::agent_context::{AgentContext, ChainOutcome};
use crate::domain::execution_unit::{group_by_rank, ExecutionUnit};
use crate::domain::result::AgentResult;
use council_core::{skill, Budget, Chain, ChainContext, Skill};
use futures::future::join_all;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("controller failed: {0:#}")]
    Controller(anyhow::Error),

    #[error("evaluator failed: {0:#}")]
    Evaluator(anyhow::Error),

    #[error("filter failed: {0:#}")]
    Filter(anyhow::Error),
}

pub struct Agent {
    name: String,
    controller: Arc<dyn Controller>,
    evaluator: Arc<dyn Evaluator>,
    filter: Arc<dyn Filter>,
    max_iterations: Option<usize>,
}

impl Agent {
    pub fn new(
        controller: Arc<dyn Controller>,
        evaluator: Arc<dyn Evaluator>,
        filter: Arc<dyn Filter>,
    ) -> Self {
        Self {
            name: "agent".to_string(),
            controller,
            evaluator,
            filter,
            max_iterations: None,
        }
    }

    /// Single-chain agent with the basic controller, evaluator and filter.
    pub fn from_chain(chain: Chain) -> Self {
        Self::new(
            Arc::new(BasicController::new(vec![chain])),
            Arc::new(BasicEvaluator::new()),
            Arc::new(BasicFilter::default()),
        )
    }

    /// Single-skill agent, wrapped in a chain named `BasicChain`.
    pub fn from_skill<S: Skill + 'static>(skill_impl: S, chain_description: Option<&str>) -> Self {
        let chain = Chain::new(
            "BasicChain",
            chain_description.unwrap_or("basic chain"),
            vec![skill(skill_impl)],
        );
        Self::from_chain(chain)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = Some(max_iterations);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn chains(&self) -> &[Chain] {
        self.controller.chains()
    }

    /// Runs on an infinite budget unless one is given.
    pub async fn execute_from_user_message(
        &self,
        message: impl Into<String>,
        budget: Option<Budget>,
    ) -> Result<AgentResult, AgentError> {
        let mut context = AgentContext::from_user_message(message, budget.unwrap_or_else(Budget::infinite));
        self.execute(&mut context).await
    }

    pub async fn execute(&self, context: &mut AgentContext) -> Result<AgentResult, AgentError> {
        info!(agent = %self.name, "Agent execution started");

        let result = loop {
            if context.budget().is_expired() || context.cancellation_token().is_cancelled() {
                debug!(agent = %self.name, "Agent stopped before a result was selected");
                break AgentResult::default();
            }
            if self.max_iterations.is_some_and(|cap| context.iteration_count() >= cap) {
                debug!(agent = %self.name, "Agent reached its iteration cap");
                break AgentResult::default();
            }

            let iteration = context.new_iteration();
            info!(agent = %self.name, iteration, "Agent iteration started");
            metrics::counter!("council_agent_iterations_total", "agent" => self.name.clone()).increment(1);

            let plan = self
                .controller
                .execute(context)
                .await
                .map_err(AgentError::Controller)?;
            debug!(agent = %self.name, units = plan.len(), "Controller returned execution plan");
            if plan.is_empty() {
                break AgentResult::default();
            }

            self.execute_plan(context, plan).await;

            let evaluation = self
                .evaluator
                .execute(context)
                .await
                .map_err(AgentError::Evaluator)?;
            context.set_evaluation(evaluation);

            let selected = self.filter.execute(context).await.map_err(AgentError::Filter)?;
            debug!(agent = %self.name, selected = selected.len(), "Filter selected responses");
            if !selected.is_empty() {
                break AgentResult::new(selected);
            }
        };

        info!(agent = %self.name, iterations = context.iteration_count(), "Agent execution ended");
        Ok(result)
    }

    async fn execute_plan(&self, context: &mut AgentContext, plan: Vec<ExecutionUnit>) {
        for group in group_by_rank(plan) {
            if context.budget().is_expired() {
                debug!(agent = %self.name, "Budget expired, skipping remaining plan groups");
                break;
            }

            let prepared: Vec<(ExecutionUnit, ChainContext, usize)> = group
                .into_iter()
                .map(|unit| {
                    let chain_context = context.new_chain_context(unit.name());
                    let start = chain_context.len();
                    if let Some(initial) = unit.initial_state() {
                        chain_context.append(initial.clone());
                    }
                    (unit, chain_context, start)
                })
                .collect();

            let runs = join_all(prepared.iter().map(|(unit, chain_context, _)| {
                info!(chain = %unit.chain().name(), execution_unit = %unit.name(), "Chain execution started");
                unit.chain().execute(chain_context, unit.budget())
            }));

            match context.budget().remaining_duration() {
                Some(remaining) => {
                    if tokio::time::timeout(remaining, runs).await.is_err() {
                        warn!(agent = %self.name, "Execution plan group outlived the budget");
                    }
                }
                None => {
                    runs.await;
                }
            }

            for (unit, chain_context, start) in prepared {
                info!(chain = %unit.chain().name(), execution_unit = %unit.name(), "Chain execution ended");
                context.record_chain(ChainOutcome {
                    unit: unit.name().to_string(),
                    chain: unit.chain().name().to_string(),
                    messages: chain_context.messages_since(start),
                });
            }
        }
    }
}
