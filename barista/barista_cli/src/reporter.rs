//! Terminal reporter.
//!
//! Subscribes to the scheduler's event bus: one line per finished spec, the
//! failures beneath it, and a summary once the run is over.

use barista_engine::{EventBus, EventPayload, LifecycleEvent, NodeKind, NodeState, ReportNode};

/// Register the terminal reporter on `events`.
pub fn attach(events: &EventBus) {
    events.on(LifecycleEvent::AfterSpec, |payload: EventPayload| async move {
        if let Some(spec) = payload.tree.report_from(payload.node) {
            print!("{}", spec_lines(&spec));
        }
    });

    events.on(LifecycleEvent::After, |payload: EventPayload| async move {
        if let Some(root) = payload.tree.report_from(payload.node) {
            print!("{}", summary_lines(&root));
        }
    });
}

fn marker(state: NodeState) -> &'static str {
    match state {
        NodeState::Passed => "PASS",
        NodeState::Failed => "FAIL",
        NodeState::Skipped => "SKIP",
        _ => "....",
    }
}

/// The spec line, followed by every failed leaf with its error.
pub fn spec_lines(spec: &ReportNode) -> String {
    let mut out = format!("{} {}\n", marker(spec.state), spec.name);
    if let (NodeState::Failed, Some(error)) = (spec.state, &spec.error) {
        out.push_str(&format!("    {}\n", error));
    }

    let mut trail: Vec<String> = Vec::new();
    spec.walk(&mut |node, depth| {
        trail.truncate(depth.saturating_sub(1));
        if depth > 0 {
            trail.push(node.name.clone());
        }
        if node.state == NodeState::Failed && node.items.is_empty() && depth > 0 {
            out.push_str(&format!("  x {}\n", trail.join(" > ")));
            if let Some(error) = &node.error {
                out.push_str(&format!("    {}\n", error));
            }
        }
    });
    out
}

/// Totals for specs and tests, and the elapsed time.
pub fn summary_lines(root: &ReportNode) -> String {
    let specs = root.tally(NodeKind::Spec);
    let tests = root.tally(NodeKind::Test);
    format!(
        "\nSpecs: {} passed, {} failed, {} skipped\nTests: {} passed, {} failed, {} skipped\nTime:  {}ms\n",
        specs.passed,
        specs.failed,
        specs.skipped,
        tests.passed,
        tests.failed,
        tests.skipped,
        root.stop - root.start,
    )
}
