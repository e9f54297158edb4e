// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Integration tests for the runner primitives composed into graphs.
//!
//! Covers ordering, fan-out counts, iteration indexing, branch selection,
//! loop bounds, budget exhaustion, branch and iteration timeouts, and
//! concurrent appends from skills on a multi-threaded runtime.

use async_trait::async_trait;
use council_core::{
    generator, predicate, skill, Budget, ChainContext, Consumption, DoWhile, ExecutionConfig, If,
    Message, Parallel, ParallelFor, Runner, Sequential, SharedRunner, Skill, SkillContext, While,
};
use serde_json::json;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Records every invocation in a shared journal.
struct Journaled {
    name: String,
    delay: Duration,
    journal: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl Skill for Journaled {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, context: &SkillContext) -> anyhow::Result<Vec<Message>> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.journal.lock().await.push(self.name.clone());
        let seen = context.messages().len();
        Ok(vec![Message::skill(&self.name, format!("{} saw {}", self.name, seen))])
    }
}

fn journaled(name: &str, delay_ms: u64, journal: &Arc<Mutex<Vec<String>>>) -> SharedRunner {
    skill(Journaled {
        name: name.to_string(),
        delay: Duration::from_millis(delay_ms),
        journal: journal.clone(),
    })
}

struct Counted {
    name: &'static str,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl Skill for Counted {
    fn name(&self) -> &str {
        self.name
    }

    async fn execute(&self, _context: &SkillContext) -> anyhow::Result<Vec<Message>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![Message::skill(self.name, "done")])
    }
}

fn counted(name: &'static str, calls: &Arc<AtomicUsize>) -> SharedRunner {
    skill(Counted {
        name,
        calls: calls.clone(),
    })
}

struct Failing;

#[async_trait]
impl Skill for Failing {
    fn name(&self) -> &str {
        "failing"
    }

    async fn execute(&self, _context: &SkillContext) -> anyhow::Result<Vec<Message>> {
        anyhow::bail!("provider returned 503")
    }
}

#[tokio::test]
async fn test_sequential_runs_in_order_and_sees_predecessors() {
    let journal = Arc::new(Mutex::new(Vec::new()));
    let runner = Sequential::new(vec![
        journaled("a", 0, &journal),
        journaled("b", 0, &journal),
        journaled("c", 0, &journal),
    ]);
    let ctx = ChainContext::from_user_message("chain", "start");

    let messages = runner.execute(&ctx, &Budget::infinite()).await.unwrap();

    assert_eq!(*journal.lock().await, vec!["a", "b", "c"]);
    let contents: Vec<&str> = messages.iter().map(|m| m.content()).collect();
    assert_eq!(contents, vec!["a saw 1", "b saw 2", "c saw 3"]);
}

#[tokio::test]
async fn test_sequential_failure_stops_and_propagates() {
    let calls = Arc::new(AtomicUsize::new(0));
    let runner = Sequential::new(vec![
        counted("first", &calls),
        skill(Failing),
        counted("last", &calls),
    ]);
    let ctx = ChainContext::new("chain");

    let err = runner.execute(&ctx, &Budget::infinite()).await.unwrap_err();

    assert_eq!(err.origin(), "failing");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    let errors: Vec<Message> = ctx.messages().into_iter().filter(|m| m.is_error()).collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].source(), "failing");
}

#[tokio::test]
async fn test_parallel_yields_one_outcome_per_branch() {
    let journal = Arc::new(Mutex::new(Vec::new()));
    let runner = Parallel::new(vec![
        journaled("a", 20, &journal),
        skill(Failing),
        journaled("c", 5, &journal),
        journaled("d", 0, &journal),
    ]);
    let ctx = ChainContext::from_user_message("chain", "start");

    let messages = runner.execute(&ctx, &Budget::infinite()).await.unwrap();

    assert_eq!(messages.len(), 4);
    assert_eq!(messages.iter().filter(|m| m.is_error()).count(), 1);
    let sources: HashSet<&str> = messages.iter().map(|m| m.source()).collect();
    assert_eq!(sources, HashSet::from(["a", "failing", "c", "d"]));
    // every branch started from the same snapshot
    assert!(messages.iter().filter(|m| m.is_ok()).all(|m| m.content().ends_with("saw 1")));
}

#[tokio::test]
async fn test_parallel_for_indexes_every_item_with_bounded_workers() {
    struct Tracked {
        running: Arc<AtomicUsize>,
        peak: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Skill for Tracked {
        fn name(&self) -> &str {
            "tracked"
        }

        async fn execute(&self, context: &SkillContext) -> anyhow::Result<Vec<Message>> {
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            self.running.fetch_sub(1, Ordering::SeqCst);
            let value = context.iteration().map(|it| it.value.clone()).unwrap_or_default();
            Ok(vec![Message::skill("tracked", value.to_string())])
        }
    }

    let running = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let items = 12;
    let runner = ParallelFor::new(
        generator(move |_| (0..items).map(|i| json!(format!("item-{}", i)))),
        skill(Tracked {
            running: running.clone(),
            peak: peak.clone(),
        }),
    )
    .with_parallelism(4);
    let ctx = ChainContext::new("chain");

    let messages = runner.execute(&ctx, &Budget::infinite()).await.unwrap();

    assert_eq!(messages.len(), items);
    let mut indices: Vec<usize> = messages.iter().filter_map(|m| m.iteration()).collect();
    indices.sort_unstable();
    assert_eq!(indices, (0..items).collect::<Vec<_>>());
    for message in &messages {
        let index = message.iteration().unwrap();
        assert_eq!(message.content(), format!("\"item-{}\"", index));
    }
    assert!(peak.load(Ordering::SeqCst) <= 4);
}

#[tokio::test]
async fn test_if_never_touches_the_other_branch() {
    let then_calls = Arc::new(AtomicUsize::new(0));
    let else_calls = Arc::new(AtomicUsize::new(0));
    let runner = If::new(predicate(|_| Ok(true)), counted("then", &then_calls))
        .with_else(counted("else", &else_calls));
    let budget = Budget::infinite();

    runner.execute(&ChainContext::new("chain"), &budget).await.unwrap();

    assert_eq!(then_calls.load(Ordering::SeqCst), 1);
    assert_eq!(else_calls.load(Ordering::SeqCst), 0);
    assert_eq!(budget.consumptions().len(), 1);
}

#[tokio::test]
async fn test_loops_with_false_predicate() {
    let while_calls = Arc::new(AtomicUsize::new(0));
    let do_while_calls = Arc::new(AtomicUsize::new(0));
    let while_runner = While::new(predicate(|_| Ok(false)), counted("body", &while_calls));
    let do_while_runner = DoWhile::new(predicate(|_| Ok(false)), counted("body", &do_while_calls));

    let while_messages = while_runner
        .execute(&ChainContext::new("chain"), &Budget::infinite())
        .await
        .unwrap();
    let do_while_messages = do_while_runner
        .execute(&ChainContext::new("chain"), &Budget::infinite())
        .await
        .unwrap();

    assert!(while_messages.is_empty());
    assert_eq!(while_calls.load(Ordering::SeqCst), 0);
    assert_eq!(do_while_messages.len(), 1);
    assert_eq!(do_while_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_budget_exhaustion_stops_sequence() {
    let calls = Arc::new(AtomicUsize::new(0));
    let steps = (0..6).map(|_| counted("step", &calls)).collect();
    let runner = Sequential::new(steps);
    // expires once the third call drives the remaining value below zero
    let budget = Budget::with_limits(Duration::from_secs(30), vec![Consumption::call(2.0)]);
    let ctx = ChainContext::new("chain");

    let messages = runner.execute(&ctx, &budget).await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(messages.len(), 3);
    assert!(budget.is_expired());
}

#[tokio::test]
async fn test_deadline_stops_sequence() {
    let journal = Arc::new(Mutex::new(Vec::new()));
    let steps = (0..10).map(|i| journaled(&format!("s{}", i), 40, &journal)).collect();
    let runner = Sequential::new(steps);
    let budget = Budget::new(Duration::from_millis(100));

    runner.execute(&ChainContext::new("chain"), &budget).await.unwrap();

    let ran = journal.lock().await.len();
    assert!(ran >= 1 && ran < 10, "ran {} steps", ran);
}

#[tokio::test]
async fn test_timed_out_branch_does_not_block_siblings() {
    let journal = Arc::new(Mutex::new(Vec::new()));
    let runner = Parallel::new(vec![
        journaled("slow", 10_000, &journal),
        journaled("fast", 10, &journal),
    ])
    .with_timeout(Duration::from_secs(1));
    let ctx = ChainContext::new("chain");
    let started = tokio::time::Instant::now();

    let messages = runner.execute(&ctx, &Budget::infinite()).await.unwrap();

    assert!(started.elapsed() < Duration::from_secs(3));
    assert_eq!(messages.len(), 2);
    let timeout = messages.iter().find(|m| m.is_timeout()).unwrap();
    assert_eq!(timeout.source(), "slow");
    assert!(messages.iter().any(|m| m.source() == "fast" && m.is_ok()));
    assert_eq!(*journal.lock().await, vec!["fast"]);
}

#[tokio::test]
async fn test_budget_deadline_caps_branch_timeout() {
    let journal = Arc::new(Mutex::new(Vec::new()));
    let runner = Parallel::new(vec![journaled("slow", 10_000, &journal)]);
    let started = tokio::time::Instant::now();

    let messages = runner
        .execute(&ChainContext::new("chain"), &Budget::new(Duration::from_millis(300)))
        .await
        .unwrap();

    assert!(started.elapsed() < Duration::from_secs(3));
    assert!(messages[0].is_timeout());
}

struct Writer(usize);

#[async_trait]
impl Skill for Writer {
    fn name(&self) -> &str {
        "writer"
    }

    async fn execute(&self, _context: &SkillContext) -> anyhow::Result<Vec<Message>> {
        tokio::task::yield_now().await;
        Ok(vec![Message::skill(format!("writer-{}", self.0), self.0.to_string())])
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_appenders() {
    let ctx = ChainContext::new("chain");
    let runner = Parallel::new((0..50).map(|i| skill(Writer(i))).collect()).with_max_workers(50);

    let returned = runner.execute(&ctx, &Budget::infinite()).await.unwrap();

    assert_eq!(returned.len(), 50);
    assert_eq!(ctx.len(), 50);
    assert_eq!(ctx.message_log().len(), 50);
    let messages = ctx.messages();
    let ids: HashSet<_> = messages.iter().map(|m| m.id()).collect();
    assert_eq!(ids.len(), 50);
    for message in &messages {
        assert_eq!(message.source(), format!("writer-{}", message.content()));
    }
}

/// Stalls on iteration 1, answers quickly otherwise.
struct StallsOnSecond;

#[async_trait]
impl Skill for StallsOnSecond {
    fn name(&self) -> &str {
        "stalls"
    }

    async fn execute(&self, context: &SkillContext) -> anyhow::Result<Vec<Message>> {
        let index = context.iteration().map(|i| i.index).unwrap_or_default();
        let delay = if index == 1 { 10_000 } else { 20 };
        tokio::time::sleep(Duration::from_millis(delay)).await;
        Ok(vec![Message::skill("stalls", index.to_string())])
    }
}

#[tokio::test]
async fn test_parallel_for_unbounded_items_stop_at_budget_expiry() {
    let config = ExecutionConfig {
        parallelism: 4,
        branch_timeout: Some(Duration::from_millis(300)),
        ..ExecutionConfig::default()
    };
    let runner = ParallelFor::from_config(
        generator(|_| (0u64..).map(|i| json!(i))),
        skill(StallsOnSecond),
        &config,
    );
    let ctx = ChainContext::new("chain");
    let started = tokio::time::Instant::now();

    let messages = tokio::time::timeout(
        Duration::from_secs(5),
        runner.execute(&ctx, &Budget::new(Duration::from_millis(800))),
    )
    .await
    .expect("an unbounded generator must stop once the budget expires")
    .unwrap();

    assert!(started.elapsed() < Duration::from_secs(3));
    let stalled: Vec<_> = messages.iter().filter(|m| m.iteration() == Some(1)).collect();
    assert_eq!(stalled.len(), 1);
    assert!(stalled[0].is_timeout());
    let completed: HashSet<_> = messages
        .iter()
        .filter(|m| m.is_ok())
        .filter_map(|m| m.iteration())
        .collect();
    assert!(completed.contains(&0));
    assert!(completed.contains(&2));
    assert!(completed.len() > 4);
}

#[tokio::test]
async fn test_nested_parallel_does_not_deadlock() {
    let journal = Arc::new(Mutex::new(Vec::new()));
    let inner = |prefix: &str| -> SharedRunner {
        Parallel::new((0..3).map(|i| journaled(&format!("{}{}", prefix, i), 5, &journal)).collect())
            .with_max_workers(1)
            .into_shared()
    };
    let runner = Parallel::new(vec![inner("x"), inner("y"), inner("z")]).with_max_workers(1);

    let messages = tokio::time::timeout(
        Duration::from_secs(5),
        runner.execute(&ChainContext::new("chain"), &Budget::infinite()),
    )
    .await
    .unwrap()
    .unwrap();

    assert_eq!(messages.len(), 9);
}

#[tokio::test]
async fn test_cancellation_stops_new_work() {
    let calls = Arc::new(AtomicUsize::new(0));
    let runner = Sequential::new(vec![counted("a", &calls), counted("b", &calls)]);
    let ctx = ChainContext::new("chain");
    ctx.cancel();

    let messages = runner.execute(&ctx, &Budget::infinite()).await.unwrap();

    assert!(messages.is_empty());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}
