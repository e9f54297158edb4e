// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Budget Domain Object
//!
//! A [`Budget`] bounds the total work of one chain invocation. It combines a
//! wall-clock deadline with any number of typed [`Consumption`] limits
//! (calls, tokens, ...).
//!
//! ## Invariants
//!
//! - Expiry is a latch: once [`Budget::is_expired`] returns `true` it never
//!   returns `false` again. Budgets are never replenished.
//! - A child budget (see [`Budget::derive_child`]) forwards every consumption
//!   to its parent and can never outlive the parent's deadline.
//! - A limit is exhausted only when its remaining value drops *below* zero;
//!   consuming exactly the limit is allowed.
//!
//! `Budget` is a cheap handle (`Arc` inside); clones share the same ledger so
//! concurrent branches observe a consistent expiry state.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Environment variable holding the default budget duration, in seconds.
pub const DEFAULT_BUDGET_ENV: &str = "COUNCIL_DEFAULT_BUDGET";

/// Default budget duration when neither config nor environment provide one.
pub const DEFAULT_BUDGET_SECS: u64 = 30;

/// Unit and kind recorded by the skill adapter for every skill invocation.
pub const CALL_UNIT: &str = "call";
pub const SKILL_KIND: &str = "skill";

/// An amount of a typed resource: either a limit or a recorded usage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Consumption {
    pub value: f64,
    pub unit: String,
    pub kind: String,
}

impl Consumption {
    pub fn new(value: f64, unit: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            value,
            unit: unit.into(),
            kind: kind.into(),
        }
    }

    pub fn call(value: f64) -> Self {
        Self::new(value, CALL_UNIT, SKILL_KIND)
    }

    fn matches(&self, unit: &str, kind: &str) -> bool {
        self.unit == unit && self.kind == kind
    }
}

impl fmt::Display for Consumption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} consumption: {} {}", self.kind, self.value, self.unit)
    }
}

/// How much of a parent budget a child sub-execution may use.
#[derive(Debug, Clone, PartialEq)]
pub enum BudgetShare {
    /// Fraction in `(0, 1]` of the parent's remaining duration and limits.
    Fraction(f64),
    /// Explicit limits. The duration is capped by the parent's remaining time.
    Limit {
        duration: Option<Duration>,
        limits: Vec<Consumption>,
    },
}

struct BudgetInner {
    duration: Option<Duration>,
    deadline: Option<Instant>,
    remaining: Mutex<Vec<Consumption>>,
    consumed: Mutex<Vec<Consumption>>,
    expired: AtomicBool,
    parent: Option<Budget>,
}

#[derive(Clone)]
pub struct Budget {
    inner: Arc<BudgetInner>,
}

impl Budget {
    pub fn new(duration: Duration) -> Self {
        Self::with_limits(duration, Vec::new())
    }

    pub fn with_limits(duration: Duration, limits: Vec<Consumption>) -> Self {
        Self::build(Some(duration), limits, None)
    }

    /// A budget with no deadline and no limits. It only expires through a parent.
    pub fn infinite() -> Self {
        Self::build(None, Vec::new(), None)
    }

    /// Duration taken from `COUNCIL_DEFAULT_BUDGET` (seconds), else 30 seconds.
    pub fn from_env() -> Self {
        let secs = std::env::var(DEFAULT_BUDGET_ENV)
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_BUDGET_SECS);
        Self::new(Duration::from_secs(secs))
    }

    fn build(duration: Option<Duration>, limits: Vec<Consumption>, parent: Option<Budget>) -> Self {
        let mut deadline = duration.and_then(|d| {
            let deadline = deadline_after(d);
            if deadline.is_none() {
                debug!(duration = ?d, "Budget duration exceeds the clock range, no deadline set");
            }
            deadline
        });
        if let Some(parent_deadline) = parent.as_ref().and_then(|p| p.inner.deadline) {
            deadline = Some(match deadline {
                Some(own) => own.min(parent_deadline),
                None => parent_deadline,
            });
        }

        Self {
            inner: Arc::new(BudgetInner {
                duration,
                deadline,
                remaining: Mutex::new(limits),
                consumed: Mutex::new(Vec::new()),
                expired: AtomicBool::new(false),
                parent,
            }),
        }
    }

    /// The duration this budget was created with, `None` when unbounded.
    pub fn duration(&self) -> Option<Duration> {
        self.inner.duration
    }

    /// Time left before the deadline, `None` when there is no deadline.
    pub fn remaining_duration(&self) -> Option<Duration> {
        self.inner
            .deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    pub fn is_expired(&self) -> bool {
        if self.inner.expired.load(Ordering::Acquire) {
            return true;
        }

        let expired = self.deadline_passed() || self.limit_exhausted() || self.parent_expired();
        if expired {
            self.inner.expired.store(true, Ordering::Release);
            debug!("Budget expired");
        }
        expired
    }

    fn deadline_passed(&self) -> bool {
        self.inner
            .deadline
            .is_some_and(|deadline| deadline <= Instant::now())
    }

    fn limit_exhausted(&self) -> bool {
        self.inner.remaining.lock().iter().any(|limit| limit.value < 0.0)
    }

    fn parent_expired(&self) -> bool {
        self.inner.parent.as_ref().is_some_and(|p| p.is_expired())
    }

    /// Whether consuming `value` would keep the matching limit (here and in every
    /// ancestor) at or above zero. Unknown unit/kind pairs are unlimited.
    pub fn can_consume(&self, value: f64, unit: &str, kind: &str) -> bool {
        let fits_here = self
            .inner
            .remaining
            .lock()
            .iter()
            .filter(|limit| limit.matches(unit, kind))
            .all(|limit| limit.value - value >= 0.0);

        fits_here
            && self
                .inner
                .parent
                .as_ref()
                .map_or(true, |p| p.can_consume(value, unit, kind))
    }

    /// Subtracts `value` from the matching limit and reports it to the parent.
    pub fn record_consumption(&self, value: f64, unit: &str, kind: &str) {
        {
            let mut remaining = self.inner.remaining.lock();
            for limit in remaining.iter_mut().filter(|l| l.matches(unit, kind)) {
                limit.value -= value;
            }
        }
        self.inner
            .consumed
            .lock()
            .push(Consumption::new(value, unit, kind));

        if let Some(parent) = &self.inner.parent {
            parent.record_consumption(value, unit, kind);
        }
    }

    pub fn record(&self, consumption: &Consumption) {
        self.record_consumption(consumption.value, &consumption.unit, &consumption.kind);
    }

    /// Remaining value of each configured limit.
    pub fn remaining_limits(&self) -> Vec<Consumption> {
        self.inner.remaining.lock().clone()
    }

    /// Every consumption recorded directly on, or forwarded up to, this budget.
    pub fn consumptions(&self) -> Vec<Consumption> {
        self.inner.consumed.lock().clone()
    }

    pub fn consumption_count(&self) -> usize {
        self.inner.consumed.lock().len()
    }

    /// Consumptions recorded after the first `position` entries.
    pub fn consumptions_since(&self, position: usize) -> Vec<Consumption> {
        self.inner
            .consumed
            .lock()
            .get(position..)
            .map(<[Consumption]>::to_vec)
            .unwrap_or_default()
    }

    /// Derives a budget for a bounded sub-execution. Consumption in the child
    /// is reflected in `self`.
    pub fn derive_child(&self, share: BudgetShare) -> Budget {
        match share {
            BudgetShare::Fraction(fraction) => {
                let fraction = fraction.clamp(0.0, 1.0);
                let duration = self.remaining_duration().map(|d| d.mul_f64(fraction));
                let limits = self
                    .remaining_limits()
                    .into_iter()
                    .map(|limit| Consumption {
                        value: (limit.value * fraction).max(0.0),
                        ..limit
                    })
                    .collect();
                Self::build(duration, limits, Some(self.clone()))
            }
            BudgetShare::Limit { duration, limits } => {
                Self::build(duration, limits, Some(self.clone()))
            }
        }
    }
}

/// Deadline `duration` from now, or `None` when it cannot be represented.
pub fn deadline_after(duration: Duration) -> Option<Instant> {
    Instant::now().checked_add(duration)
}

impl Default for Budget {
    fn default() -> Self {
        Self::from_env()
    }
}

impl fmt::Debug for Budget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Budget")
            .field("duration", &self.inner.duration)
            .field("remaining", &self.remaining_duration())
            .field("limits", &*self.inner.remaining.lock())
            .field("expired", &self.inner.expired.load(Ordering::Relaxed))
            .field("has_parent", &self.inner.parent.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limited(value: f64) -> Budget {
        Budget::with_limits(
            Duration::from_secs(60),
            vec![Consumption::new(value, "unit", "test")],
        )
    }

    #[test]
    fn test_remaining_consumption() {
        let budget = limited(10.0);
        budget.record_consumption(6.0, "unit", "test");
        budget.record_consumption(50.0, "unit", "test2");

        assert!(!budget.is_expired());
        assert_eq!(budget.remaining_limits()[0].value, 4.0);

        budget.record_consumption(5.0, "unit", "test");
        assert!(budget.is_expired());
    }

    #[test]
    fn test_consuming_exactly_the_limit_does_not_expire() {
        let budget = limited(10.0);
        budget.record_consumption(10.0, "unit", "test");
        assert!(!budget.is_expired());

        budget.record_consumption(1.0, "unit", "test");
        assert!(budget.is_expired());
    }

    #[test]
    fn test_can_consume() {
        let budget = limited(10.0);
        budget.record_consumption(4.0, "unit", "test");

        assert!(budget.can_consume(100.0, "integration", "test"));
        assert!(budget.can_consume(1.0, "unit", "test"));
        assert!(budget.can_consume(6.0, "unit", "test"));
        assert!(!budget.can_consume(7.0, "unit", "test"));
    }

    #[test]
    fn test_duration_expired() {
        let budget = Budget::new(Duration::from_millis(20));
        std::thread::sleep(Duration::from_millis(60));
        assert!(budget.is_expired());
        assert_eq!(budget.remaining_duration(), Some(Duration::ZERO));
    }

    #[test]
    fn test_infinite_budget_never_expires() {
        let budget = Budget::infinite();
        budget.record_consumption(1_000_000.0, CALL_UNIT, SKILL_KIND);
        assert!(!budget.is_expired());
        assert!(budget.remaining_duration().is_none());
    }

    #[test]
    fn test_child_consumption_reaches_parent() {
        let parent = limited(10.0);
        let child = parent.derive_child(BudgetShare::Fraction(0.5));

        assert_eq!(child.remaining_limits()[0].value, 5.0);
        child.record_consumption(3.0, "unit", "test");

        assert_eq!(parent.remaining_limits()[0].value, 7.0);
        assert_eq!(parent.consumptions().len(), 1);
        assert!(!child.is_expired());

        child.record_consumption(3.0, "unit", "test");
        assert!(child.is_expired());
        assert!(!parent.is_expired());
    }

    #[test]
    fn test_consumptions_since() {
        let budget = Budget::infinite();
        budget.record_consumption(1.0, CALL_UNIT, SKILL_KIND);
        let position = budget.consumption_count();
        budget.record_consumption(2.0, "token", "llm");

        assert_eq!(budget.consumption_count(), 2);
        assert_eq!(budget.consumptions_since(position), vec![Consumption::new(2.0, "token", "llm")]);
        assert!(budget.consumptions_since(5).is_empty());
    }

    #[test]
    fn test_child_expires_with_parent() {
        let parent = limited(1.0);
        let child = parent.derive_child(BudgetShare::Limit {
            duration: None,
            limits: vec![],
        });

        assert!(!child.is_expired());
        parent.record_consumption(2.0, "unit", "test");
        assert!(child.is_expired());
    }

    #[test]
    fn test_child_cannot_outlive_parent_deadline() {
        let parent = Budget::new(Duration::from_millis(50));
        let child = parent.derive_child(BudgetShare::Limit {
            duration: Some(Duration::from_secs(3600)),
            limits: vec![],
        });

        let remaining = child.remaining_duration().unwrap();
        assert!(remaining <= Duration::from_millis(50));
    }

    #[test]
    fn test_unrepresentable_duration_has_no_deadline() {
        let budget = Budget::new(Duration::from_secs(u64::MAX));

        assert!(budget.remaining_duration().is_none());
        assert!(!budget.is_expired());

        let child = budget.derive_child(BudgetShare::Fraction(0.5));
        assert!(!child.is_expired());
    }

    #[test]
    fn test_from_env_with_huge_duration() {
        std::env::set_var(DEFAULT_BUDGET_ENV, u64::MAX.to_string());
        let budget = Budget::from_env();
        std::env::remove_var(DEFAULT_BUDGET_ENV);

        assert!(!budget.is_expired());
    }

    #[test]
    fn test_expiry_is_sticky() {
        let budget = Budget::new(Duration::ZERO);
        assert!(budget.is_expired());
        assert!(budget.is_expired());
    }
}
