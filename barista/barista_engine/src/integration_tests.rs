//! Behavioural tests of the scheduler, driven through the inline sandbox.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use barista_core::{RetryConfig, RunConfig, SandboxError, TestError, TestResult};
use futures::future::{ready, Ready};
use parking_lot::Mutex;
use serde_json::{json, Value};

use crate::engine::{expect, InlineSandbox, RunSummary, Scope, SpecScheduler};
use crate::model::{NodeKind, NodeState, ReportNode};
use crate::patterns::{Condition, LifecycleEvent, Values};

type Log = Arc<Mutex<Vec<String>>>;

fn log() -> Log {
    Arc::new(Mutex::new(Vec::new()))
}

fn entries(log: &Log) -> Vec<String> {
    log.lock().clone()
}

/// A body that records `label` and passes.
fn step(log: &Log, label: &str) -> impl Fn() -> Ready<TestResult> + Send + Sync + 'static {
    let log = log.clone();
    let label = label.to_string();
    move || {
        log.lock().push(label.clone());
        ready(Ok(()))
    }
}

/// A body that records `label` and fails.
fn failing(log: &Log, label: &str) -> impl Fn() -> Ready<TestResult> + Send + Sync + 'static {
    let log = log.clone();
    let label = label.to_string();
    move || {
        log.lock().push(label.clone());
        ready(Err(TestError::assertion(format!("{} failed", label))))
    }
}

fn config() -> RunConfig {
    RunConfig {
        retries: RetryConfig {
            delay: 10,
            ..Default::default()
        },
        ..Default::default()
    }
}

async fn run_one<F>(config: RunConfig, spec: F) -> RunSummary
where
    F: Fn(Scope) -> Result<(), SandboxError> + Send + Sync + 'static,
{
    let sandbox = InlineSandbox::new().with_spec("spec.test", spec);
    let scheduler = SpecScheduler::new(config, Arc::new(sandbox)).unwrap();
    scheduler.run(vec![PathBuf::from("spec.test")]).await
}

fn spec_of(summary: &RunSummary) -> &ReportNode {
    &summary.report.items[0]
}

fn node<'a>(summary: &'a RunSummary, name: &str) -> &'a ReportNode {
    summary
        .report
        .find(name)
        .unwrap_or_else(|| panic!("no node named {}", name))
}

fn assert_counts_match_children(report: &ReportNode) {
    report.walk(&mut |node, _| {
        if node.kind.is_container() {
            let terminal = node
                .items
                .iter()
                .filter(|item| item.state.is_terminal())
                .count() as u32;
            assert_eq!(
                node.counts().total(),
                terminal,
                "counters of {} do not match its children",
                node.name
            );
        }
    });
}

#[tokio::test]
async fn test_depth_first_serial_order_and_counts() {
    let seen = log();
    let order = seen.clone();
    let summary = run_one(config(), move |api| {
        let log = order.clone();
        api.describe("outer", move |s| async move {
            s.it("a", step(&log, "a"));
            let inner = log.clone();
            s.describe("inner", move |s| async move {
                s.it("b", step(&inner, "b"));
                Ok(())
            });
            s.it("c", step(&log, "c"));
            Ok(())
        });
        api.it("d", step(&order, "d"));
        Ok(())
    })
    .await;

    assert_eq!(entries(&seen), vec!["a", "b", "c", "d"]);
    assert_eq!(summary.state, NodeState::Passed);
    assert_eq!(summary.exit_code(), 0);

    let outer = node(&summary, "outer");
    let names: Vec<&str> = outer.items.iter().map(|n| n.name.as_str()).collect();
    assert_eq!(names, vec!["a", "inner", "c"]);
    assert_eq!(outer.counts().passed, 3);
    assert_eq!(spec_of(&summary).counts().passed, 2);
    assert_counts_match_children(&summary.report);
}

#[tokio::test]
async fn test_skipped_parent_never_invokes_children() {
    let seen = log();
    let calls = seen.clone();
    let summary = run_one(config(), move |api| {
        let log = calls.clone();
        api.xdescribe("disabled", move |s| async move {
            s.it("never", step(&log, "never"));
            let deep = log.clone();
            s.describe("nested", move |s| async move {
                s.it("deep", step(&deep, "deep"));
                Ok(())
            });
            Ok(())
        });
        Ok(())
    })
    .await;

    assert!(entries(&seen).is_empty());
    let disabled = node(&summary, "disabled");
    assert_eq!(disabled.state, NodeState::Skipped);

    let never = node(&summary, "never");
    assert_eq!(never.state, NodeState::Skipped);
    assert_eq!(never.start, never.stop);
    assert_eq!(node(&summary, "nested").state, NodeState::Skipped);
    assert!(summary.report.find("deep").is_none());
    assert_eq!(summary.state, NodeState::Skipped);
    assert_counts_match_children(&summary.report);
}

#[tokio::test]
async fn test_fast_fail_skips_later_siblings() {
    let seen = log();
    let calls = seen.clone();
    let summary = run_one(config(), move |api| {
        let log = calls.clone();
        api.describe("suite", move |s| async move {
            s.it("breaks", failing(&log, "breaks"));
            s.it("next", step(&log, "next"));
            let nested = log.clone();
            s.describe("later", move |s| async move {
                s.it("deep", step(&nested, "deep"));
                Ok(())
            });
            Ok(())
        });
        Ok(())
    })
    .await;

    assert_eq!(entries(&seen), vec!["breaks"]);
    assert_eq!(node(&summary, "next").state, NodeState::Skipped);
    assert_eq!(node(&summary, "later").state, NodeState::Skipped);
    assert!(node(&summary, "later").items.is_empty());

    let suite = node(&summary, "suite");
    assert_eq!(suite.state, NodeState::Failed);
    assert_eq!((suite.counts().failed, suite.counts().skipped), (1, 2));
    assert_eq!(summary.exit_code(), 1);
}

#[tokio::test]
async fn test_without_fast_fail_siblings_still_run() {
    let seen = log();
    let calls = seen.clone();
    let config = RunConfig {
        fast_fail: false,
        ..config()
    };
    let summary = run_one(config, move |api| {
        api.it("breaks", failing(&calls, "breaks"));
        api.it("next", step(&calls, "next"));
        Ok(())
    })
    .await;

    assert_eq!(entries(&seen), vec!["breaks", "next"]);
    assert_eq!(node(&summary, "next").state, NodeState::Passed);
    assert_eq!(spec_of(&summary).state, NodeState::Failed);
}

#[tokio::test(start_paused = true)]
async fn test_timeout_zero_is_unbounded_and_fifty_fails() {
    let summary = run_one(config(), |api| {
        api.it("unbounded", || async {
            tokio::time::sleep(Duration::from_millis(500)).await;
            Ok(())
        })
        .timeout(Duration::ZERO);
        api.it("bounded", || async {
            tokio::time::sleep(Duration::from_millis(500)).await;
            Ok(())
        })
        .timeout(Duration::from_millis(50));
        Ok(())
    })
    .await;

    assert_eq!(node(&summary, "unbounded").state, NodeState::Passed);

    let bounded = node(&summary, "bounded");
    assert_eq!(bounded.state, NodeState::Failed);
    assert_eq!(
        bounded.error.as_deref(),
        Some("TimeoutError: Async callback not called within timeout of 50ms")
    );
}

#[tokio::test(start_paused = true)]
async fn test_timeout_is_inherited_from_suite() {
    let summary = run_one(config(), |api| {
        api.describe("slow suite", |s| async move {
            s.it("slow", || async {
                tokio::time::sleep(Duration::from_millis(200)).await;
                Ok(())
            });
            Ok(())
        })
        .timeout(Duration::from_millis(20));
        Ok(())
    })
    .await;

    let slow = node(&summary, "slow");
    assert_eq!(slow.state, NodeState::Failed);
    assert!(slow.error.as_deref().unwrap_or_default().contains("20ms"));
}

fn flaky(succeed_on: u32) -> impl Fn() -> Ready<TestResult> + Send + Sync + 'static {
    let calls = Arc::new(AtomicU32::new(0));
    move || {
        let attempt = calls.fetch_add(1, Ordering::SeqCst) + 1;
        if attempt >= succeed_on {
            ready(Ok(()))
        } else {
            ready(Err(TestError::runtime(format!("attempt {}", attempt))))
        }
    }
}

fn with_maximum(maximum: u32) -> RunConfig {
    let mut config = config();
    config.retries.maximum = maximum;
    config
}

#[tokio::test(start_paused = true)]
async fn test_rit_passes_on_tenth_attempt() {
    let summary = run_one(with_maximum(10), |api| {
        api.rit("eventually", flaky(10));
        Ok(())
    })
    .await;

    let test = node(&summary, "eventually");
    assert_eq!(test.state, NodeState::Passed);
    assert_eq!(test.attempts, Some(10));
}

#[tokio::test(start_paused = true)]
async fn test_rit_fails_when_maximum_is_too_low() {
    let summary = run_one(with_maximum(5), |api| {
        api.rit("eventually", flaky(10));
        Ok(())
    })
    .await;

    let test = node(&summary, "eventually");
    assert_eq!(test.state, NodeState::Failed);
    assert_eq!(test.attempts, Some(5));
    assert_eq!(test.error.as_deref(), Some("RuntimeError: attempt 5"));
}

#[tokio::test(start_paused = true)]
async fn test_rit_does_not_retry_non_retryable_category() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    let summary = run_one(with_maximum(10), move |api| {
        let counter = counter.clone();
        api.rit("misuse", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            ready(Err(TestError::type_error("undefined is not a function")))
        });
        Ok(())
    })
    .await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    let test = node(&summary, "misuse");
    assert_eq!(test.state, NodeState::Failed);
    assert_eq!(test.attempts, Some(1));
}

#[tokio::test]
async fn test_mit_expands_in_order_with_values_and_indices() {
    let seen: Arc<Mutex<Vec<(Value, usize)>>> = Arc::new(Mutex::new(Vec::new()));
    let record = seen.clone();
    let summary = run_one(config(), move |api| {
        let record = record.clone();
        api.mit("square", vec![json!(1), json!(2), json!(3)], move |value, index| {
            record.lock().push((value, index));
            ready(Ok(()))
        });
        api.it("after", || ready(Ok(())));
        Ok(())
    })
    .await;

    assert_eq!(
        *seen.lock(),
        vec![(json!(1), 0), (json!(2), 1), (json!(3), 2)]
    );

    let names: Vec<&str> = spec_of(&summary)
        .items
        .iter()
        .map(|n| n.name.as_str())
        .collect();
    assert_eq!(
        names,
        vec!["square", "square - 1", "square - 2", "square - 3", "after"]
    );

    let generator = node(&summary, "square");
    assert_eq!(generator.kind, NodeKind::Generator);
    assert_eq!(generator.kind_label.as_deref(), Some("mit"));
    assert_counts_match_children(&summary.report);
}

#[tokio::test]
async fn test_report_lists_children_in_execution_order() {
    let seen = log();
    let calls = seen.clone();
    let summary = run_one(config(), move |api| {
        let log = calls.clone();
        api.describe("suite", move |s| async move {
            s.before("setup", step(&log, "setup"));
            let each = log.clone();
            s.mit("gen", vec![json!(1), json!(2)], move |value, _| {
                each.lock().push(format!("gen {}", value));
                ready(Ok(()))
            });
            s.it("tail", step(&log, "tail"));
            Ok(())
        });
        Ok(())
    })
    .await;

    assert_eq!(entries(&seen), vec!["setup", "gen 1", "gen 2", "tail"]);
    let names: Vec<&str> = node(&summary, "suite")
        .items
        .iter()
        .map(|n| n.name.as_str())
        .collect();
    assert_eq!(names, vec!["setup", "gen", "gen - 1", "gen - 2", "tail"]);
    assert_counts_match_children(&summary.report);
}

#[tokio::test]
async fn test_generator_instances_finish_before_later_siblings() {
    let seen = log();
    let calls = seen.clone();
    run_one(config(), move |api| {
        let log = calls.clone();
        api.mit("each", vec![json!("x"), json!("y")], move |value, _| {
            log.lock().push(value.as_str().unwrap_or_default().to_string());
            ready(Ok(()))
        });
        api.it("tail", step(&calls, "tail"));
        Ok(())
    })
    .await;

    assert_eq!(entries(&seen), vec!["x", "y", "tail"]);
}

#[tokio::test]
async fn test_mdescribe_passes_value_to_suite_body() {
    let seen = log();
    let calls = seen.clone();
    let summary = run_one(config(), move |api| {
        let log = calls.clone();
        api.mdescribe("group", vec![json!(1), json!(2), json!(3)], move |s, value, index| {
            let log = log.clone();
            async move {
                let label = format!("{}@{}", value, index);
                s.it("inside", step(&log, &label));
                Ok(())
            }
        });
        Ok(())
    })
    .await;

    assert_eq!(entries(&seen), vec!["1@0", "2@1", "3@2"]);
    let second = node(&summary, "group - 2");
    assert_eq!(second.kind, NodeKind::Suite);
    assert_eq!(second.items[0].name, "inside");
    assert_eq!(second.state, NodeState::Passed);
}

#[tokio::test]
async fn test_failed_producer_spawns_nothing() {
    let summary = run_one(config(), |api| {
        api.mit(
            "broken",
            Values::producer(|| async { Err(TestError::runtime("no data")) }),
            |_, _| ready(Ok(())),
        );
        Ok(())
    })
    .await;

    let spec = spec_of(&summary);
    assert_eq!(spec.items.len(), 1);
    assert_eq!(spec.items[0].state, NodeState::Failed);
    assert_eq!(
        spec.items[0].error.as_deref(),
        Some("RuntimeError: no data")
    );
}

#[tokio::test]
async fn test_produced_values_expand() {
    let summary = run_one(config(), |api| {
        api.mit(
            "produced",
            Values::producer(|| async { Ok(vec![json!("a"), json!("b")]) }),
            |value, _| ready(expect(value.is_string()).to_be_true()),
        );
        Ok(())
    })
    .await;

    assert_eq!(node(&summary, "produced - 2").state, NodeState::Passed);
    assert_eq!(spec_of(&summary).counts().passed, 3);
}

#[tokio::test]
async fn test_report_round_trips_through_json() {
    let summary = run_one(config(), |api| {
        api.describe("suite", |s| async move {
            s.it("ok", || ready(Ok(())));
            s.xit("off");
            s.it("bad", || ready(Err(TestError::assertion("nope"))));
            Ok(())
        });
        Ok(())
    })
    .await;

    let text = serde_json::to_string(&summary.report).unwrap();
    assert!(!text.contains("parent"));
    let parsed: ReportNode = serde_json::from_str(&text).unwrap();
    assert_eq!(parsed, summary.report);

    let mut before = Vec::new();
    summary
        .report
        .walk(&mut |n, depth| before.push((depth, n.name.clone(), n.state)));
    let mut after = Vec::new();
    parsed.walk(&mut |n, depth| after.push((depth, n.name.clone(), n.state)));
    assert_eq!(before, after);
    assert_eq!(before.len(), 6);
}

#[tokio::test]
async fn test_hook_order_and_once_per_container() {
    let seen = log();
    let calls = seen.clone();
    let summary = run_one(config(), move |api| {
        let log = calls.clone();
        api.describe("suite", move |s| async move {
            s.before("setup", step(&log, "before"));
            s.before_each("prepare", step(&log, "beforeEach"));
            s.after_each("clean", step(&log, "afterEach"));
            s.after("teardown", step(&log, "after"));
            s.it("a", step(&log, "a"));
            s.it("b", step(&log, "b"));
            Ok(())
        });
        Ok(())
    })
    .await;

    assert_eq!(
        entries(&seen),
        vec![
            "before",
            "beforeEach",
            "a",
            "afterEach",
            "beforeEach",
            "b",
            "afterEach",
            "after"
        ]
    );

    let suite = node(&summary, "suite");
    let hooks: Vec<Option<&str>> = suite
        .items
        .iter()
        .filter(|n| n.kind == NodeKind::Hook)
        .map(|n| n.kind_label.as_deref())
        .collect();
    assert_eq!(hooks.len(), 6);
    assert_eq!(hooks[0], Some("before"));
    assert_eq!(hooks[5], Some("after"));

    let names: Vec<&str> = suite.items.iter().map(|n| n.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["setup", "a", "prepare", "clean", "b", "prepare", "clean", "teardown"]
    );
    assert_counts_match_children(&summary.report);
}

#[tokio::test]
async fn test_failing_before_each_fails_test_but_runs_after_each() {
    let seen = log();
    let calls = seen.clone();
    let config = RunConfig {
        fast_fail: false,
        ..config()
    };
    let summary = run_one(config, move |api| {
        api.before_each("prepare", failing(&calls, "beforeEach"));
        api.after_each("clean", step(&calls, "afterEach"));
        api.it("body", step(&calls, "body"));
        Ok(())
    })
    .await;

    assert_eq!(entries(&seen), vec!["beforeEach", "afterEach"]);
    let body = node(&summary, "body");
    assert_eq!(body.state, NodeState::Failed);
    assert_eq!(
        body.error.as_deref(),
        Some("RuntimeError: beforeEach hook failed")
    );
}

#[tokio::test]
async fn test_suite_body_failure_still_runs_declared_children_and_after_hooks() {
    let seen = log();
    let calls = seen.clone();
    let summary = run_one(config(), move |api| {
        let log = calls.clone();
        api.describe("broken", move |s| async move {
            s.after("teardown", step(&log, "after"));
            s.it("declared", step(&log, "declared"));
            Err(TestError::reference("helper is not defined"))
        });
        Ok(())
    })
    .await;

    assert_eq!(entries(&seen), vec!["declared", "after"]);
    let broken = node(&summary, "broken");
    assert_eq!(broken.state, NodeState::Failed);
    assert_eq!(
        broken.error.as_deref(),
        Some("ReferenceError: helper is not defined")
    );
    assert_eq!(node(&summary, "declared").state, NodeState::Passed);
    assert_counts_match_children(&summary.report);
}

#[tokio::test]
async fn test_conditional_tests() {
    let seen = log();
    let calls = seen.clone();
    let summary = run_one(config(), move |api| {
        api.cit("enabled", true, step(&calls, "enabled"));
        api.cit("disabled", false, step(&calls, "disabled"));
        api.cit(
            "deferred",
            Condition::deferred(|| async { false }),
            step(&calls, "deferred"),
        );
        Ok(())
    })
    .await;

    assert_eq!(entries(&seen), vec!["enabled"]);
    assert_eq!(node(&summary, "disabled").state, NodeState::Skipped);
    assert_eq!(node(&summary, "deferred").state, NodeState::Skipped);
    assert_eq!(spec_of(&summary).state, NodeState::Passed);
}

#[tokio::test]
async fn test_placeholder_and_excluded_tests() {
    let summary = run_one(config(), |api| {
        api.fit("todo");
        api.xit("off");
        api.xmit("also off");
        Ok(())
    })
    .await;

    let todo = node(&summary, "todo");
    assert_eq!(todo.state, NodeState::Passed);
    assert_eq!(todo.start, todo.stop);
    assert_eq!(node(&summary, "off").state, NodeState::Skipped);
    assert_eq!(spec_of(&summary).counts().skipped, 2);
}

#[tokio::test(start_paused = true)]
async fn test_events_fire_in_order_and_act_as_barriers() {
    let sandbox = InlineSandbox::new().with_spec("events.test", |api| {
        api.it("only", || ready(Ok(())));
        Ok(())
    });
    let scheduler = SpecScheduler::new(config(), Arc::new(sandbox)).unwrap();
    let seen = log();

    for event in [
        LifecycleEvent::Before,
        LifecycleEvent::BeforeSpec,
        LifecycleEvent::BeforeTest,
        LifecycleEvent::AfterTest,
        LifecycleEvent::AfterSpec,
        LifecycleEvent::After,
    ] {
        let seen = seen.clone();
        scheduler.events().on(event, move |payload| {
            let seen = seen.clone();
            async move {
                // A slow observer must hold the run until it finishes
                tokio::time::sleep(Duration::from_millis(100)).await;
                let name = payload
                    .tree
                    .with_node(payload.node, |n| n.name.clone())
                    .unwrap_or_default();
                seen.lock().push(format!("{}:{}", payload.event, name));
            }
        });
    }

    let summary = scheduler.run(vec![PathBuf::from("events.test")]).await;
    assert_eq!(summary.state, NodeState::Passed);
    assert_eq!(
        entries(&seen),
        vec![
            "before:root",
            "before-spec:events.test",
            "before-test:only",
            "after-test:only",
            "after-spec:events.test",
            "after:root"
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_concurrency_one_runs_specs_sequentially() {
    let seen = log();
    let sandbox = ["a.test", "b.test"]
        .into_iter()
        .fold(InlineSandbox::new(), |sandbox, file| {
            let log = seen.clone();
            sandbox.with_spec(file, move |api| {
                let log = log.clone();
                let label = api.tree().with_node(api.spec(), |n| n.name.clone());
                let label = label.unwrap_or_default();
                let pause = if label.starts_with('a') { 50 } else { 80 };
                api.it("work", move || {
                    let log = log.clone();
                    let label = label.clone();
                    async move {
                        log.lock().push(format!("{} start", label));
                        tokio::time::sleep(Duration::from_millis(pause)).await;
                        log.lock().push(format!("{} end", label));
                        Ok(())
                    }
                });
                Ok(())
            })
        });
    let files = sandbox.paths();

    let sequential = RunConfig {
        concurrency: 1,
        ..config()
    };
    let scheduler = SpecScheduler::new(sequential, Arc::new(sandbox.clone())).unwrap();
    let summary = scheduler.run(files.clone()).await;
    assert_eq!(
        entries(&seen),
        vec!["a.test start", "a.test end", "b.test start", "b.test end"]
    );
    assert_eq!(summary.counts.passed, 2);
    assert_eq!(summary.counts.total(), 2);

    seen.lock().clear();
    let scheduler = SpecScheduler::new(config(), Arc::new(sandbox)).unwrap();
    scheduler.run(files).await;
    assert_eq!(
        entries(&seen),
        vec!["a.test start", "b.test start", "a.test end", "b.test end"]
    );
}

#[tokio::test]
async fn test_evaluation_failure_fails_spec_and_skips_declarations() {
    let seen = log();
    let calls = seen.clone();
    let summary = run_one(config(), move |api| {
        api.it("declared", step(&calls, "declared"));
        Err(SandboxError::Evaluation("unexpected token".to_string()))
    })
    .await;

    assert!(entries(&seen).is_empty());
    let spec = spec_of(&summary);
    assert_eq!(spec.state, NodeState::Failed);
    assert_eq!(
        spec.error.as_deref(),
        Some("RuntimeError: Evaluation failed: unexpected token")
    );
    assert_eq!(node(&summary, "declared").state, NodeState::Skipped);
    assert_eq!(summary.exit_code(), 1);
}

#[tokio::test]
async fn test_missing_spec_file_is_a_resolution_failure() {
    let sandbox = InlineSandbox::new();
    let scheduler = SpecScheduler::new(config(), Arc::new(sandbox)).unwrap();
    let summary = scheduler.run(vec![PathBuf::from("missing.test")]).await;

    let spec = spec_of(&summary);
    assert_eq!(spec.name, "missing.test");
    assert_eq!(spec.file, Some(PathBuf::from("missing.test")));
    assert!(spec
        .error
        .as_deref()
        .unwrap_or_default()
        .starts_with("ResolutionError"));
    assert_eq!(summary.state, NodeState::Failed);
}

#[tokio::test]
async fn test_preload_is_evaluated_into_every_spec() {
    let seen = log();
    let calls = seen.clone();
    let sandbox = InlineSandbox::new()
        .with_spec("preload", move |api| {
            api.before("shared setup", step(&calls, "preload"));
            Ok(())
        })
        .with_spec("one.test", |api| {
            api.it("t", || ready(Ok(())));
            Ok(())
        })
        .with_spec("two.test", |api| {
            api.it("t", || ready(Ok(())));
            Ok(())
        });
    let config = RunConfig {
        preload: Some(PathBuf::from("preload")),
        ..config()
    };
    let scheduler = SpecScheduler::new(config, Arc::new(sandbox)).unwrap();
    let summary = scheduler
        .run(vec![PathBuf::from("one.test"), PathBuf::from("two.test")])
        .await;

    assert_eq!(entries(&seen), vec!["preload", "preload"]);
    assert_eq!(summary.state, NodeState::Passed);
}

#[test]
fn test_invalid_config_is_rejected() {
    let config = RunConfig {
        concurrency: 0,
        ..Default::default()
    };
    assert!(SpecScheduler::new(config, Arc::new(InlineSandbox::new())).is_err());
}
