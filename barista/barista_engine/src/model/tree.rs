//! The result tree.
//!
//! Nodes are stored in an arena owned by `ResultTree` and addressed by
//! `NodeId`. A declared node is only linked upward at first; it joins its
//! parent's child list when it starts or is resolved, and never moves
//! afterwards, so child order is execution order.
//! Rollup counters are updated in the same critical section that finishes a
//! child, which keeps every container's counts equal to the terminal
//! contributions of its direct children.

use std::path::PathBuf;
use std::sync::Arc;

use barista_core::{timestamp, NodeId};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::trace;

use super::node::{Counts, Node, NodeKind, NodeState};

/// Shared handle to the nodes of one run.
#[derive(Clone)]
pub struct ResultTree {
    inner: Arc<Mutex<Vec<Node>>>,
}

impl ResultTree {
    /// Create a tree holding only the root node.
    pub fn new() -> Self {
        let root = Node::new(NodeId::ROOT, NodeKind::Root, "root".to_string(), None);
        ResultTree {
            inner: Arc::new(Mutex::new(vec![root])),
        }
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        // The root is always present
        false
    }

    /// Create a node under `parent`. It is listed among the parent's
    /// children once it starts.
    pub(crate) fn add(&self, parent: NodeId, kind: NodeKind, name: impl Into<String>) -> NodeId {
        let mut nodes = self.inner.lock();
        let id = NodeId::from_index(nodes.len());
        nodes.push(Node::new(id, kind, name.into(), Some(parent)));
        trace!(%id, %parent, ?kind, "node created");
        id
    }

    /// A snapshot of one node.
    pub fn get(&self, id: NodeId) -> Option<Node> {
        self.inner.lock().get(id.index()).cloned()
    }

    /// Read a node without cloning it.
    pub fn with_node<R>(&self, id: NodeId, f: impl FnOnce(&Node) -> R) -> Option<R> {
        self.inner.lock().get(id.index()).map(f)
    }

    pub(crate) fn update<R>(&self, id: NodeId, f: impl FnOnce(&mut Node) -> R) -> Option<R> {
        self.inner.lock().get_mut(id.index()).map(f)
    }

    pub fn state(&self, id: NodeId) -> Option<NodeState> {
        self.with_node(id, |node| node.state)
    }

    pub fn counts(&self, id: NodeId) -> Counts {
        self.with_node(id, |node| node.counts).unwrap_or_default()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.with_node(id, |node| node.parent).flatten()
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.with_node(id, |node| node.children.clone())
            .unwrap_or_default()
    }

    /// Ancestors of `id`, nearest first, root last.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let nodes = self.inner.lock();
        let mut chain = Vec::new();
        let mut cursor = nodes.get(id.index()).and_then(|node| node.parent);
        while let Some(current) = cursor {
            chain.push(current);
            cursor = nodes.get(current.index()).and_then(|node| node.parent);
        }
        chain
    }

    /// Mark a node as started and list it under its parent.
    pub(crate) fn begin(&self, id: NodeId, state: NodeState) {
        let mut nodes = self.inner.lock();
        if let Some(node) = nodes.get_mut(id.index()) {
            node.state = state;
            node.start = timestamp();
        }
        attach(&mut nodes, id);
    }

    /// Move a node to a terminal state and record it in its parent's counters.
    ///
    /// Finishing is idempotent: a node that already has a stop time keeps
    /// its first outcome and is not counted twice.
    pub(crate) fn finish(&self, id: NodeId, state: NodeState, error: Option<String>) {
        let mut nodes = self.inner.lock();
        let parent = match nodes.get_mut(id.index()) {
            Some(node) if !node.is_finished() => {
                node.state = state;
                node.stop = timestamp();
                if error.is_some() {
                    node.error = error;
                }
                node.parent
            }
            _ => return,
        };

        attach(&mut nodes, id);
        if let Some(owner) = parent.and_then(|parent| nodes.get_mut(parent.index())) {
            owner.counts.record(state);
        }
    }

    /// Record a node as skipped without running it: `start == stop`.
    pub(crate) fn skip(&self, id: NodeId) {
        self.resolve_now(id, NodeState::Skipped);
    }

    /// Start and finish a node at the same instant.
    pub(crate) fn resolve_now(&self, id: NodeId, state: NodeState) {
        let now = timestamp();
        let mut nodes = self.inner.lock();
        let parent = match nodes.get_mut(id.index()) {
            Some(node) if !node.is_finished() => {
                node.state = state;
                node.start = now;
                node.stop = now;
                node.parent
            }
            _ => return,
        };
        attach(&mut nodes, id);
        if let Some(owner) = parent.and_then(|parent| nodes.get_mut(parent.index())) {
            owner.counts.record(state);
        }
    }

    /// Finish a container from its own error and its children's counts.
    ///
    /// Returns the resolved state.
    pub(crate) fn finish_container(&self, id: NodeId, error: Option<String>) -> NodeState {
        let state = match self.with_node(id, |node| (node.counts, node.error.is_some())) {
            Some((counts, had_error)) => {
                if error.is_some() || had_error {
                    NodeState::Failed
                } else {
                    counts.rollup_state()
                }
            }
            None => return NodeState::Skipped,
        };
        self.finish(id, state, error);
        state
    }

    /// Skip every direct child of `id` that has not finished yet, including
    /// declared children that never started, in declaration order.
    pub(crate) fn skip_pending_children(&self, id: NodeId) {
        let pending: Vec<NodeId> = self
            .inner
            .lock()
            .iter()
            .filter(|node| node.parent == Some(id) && !node.is_finished())
            .map(|node| node.id)
            .collect();
        for child in pending {
            self.skip(child);
        }
    }

    /// The serializable report of the whole run.
    pub fn report(&self) -> ReportNode {
        let nodes = self.inner.lock();
        build_report(&nodes, NodeId::ROOT)
    }

    /// The serializable report of one subtree.
    pub fn report_from(&self, id: NodeId) -> Option<ReportNode> {
        let nodes = self.inner.lock();
        if id.index() >= nodes.len() {
            return None;
        }
        Some(build_report(&nodes, id))
    }
}

/// List `id` under its parent the first time it starts or resolves.
fn attach(nodes: &mut [Node], id: NodeId) {
    let parent = match nodes.get_mut(id.index()) {
        Some(node) if !node.attached => {
            node.attached = true;
            node.parent
        }
        _ => return,
    };
    if let Some(owner) = parent.and_then(|parent| nodes.get_mut(parent.index())) {
        owner.children.push(id);
    }
}

impl Default for ResultTree {
    fn default() -> Self {
        Self::new()
    }
}

fn build_report(nodes: &[Node], id: NodeId) -> ReportNode {
    let node = &nodes[id.index()];
    let is_container = node.kind.is_container();
    let kind_label = node
        .hook
        .map(|hook| hook.as_str())
        .or_else(|| node.generator.map(|generator| generator.as_str()))
        .map(str::to_string);

    ReportNode {
        kind: node.kind,
        name: node.name.clone(),
        kind_label,
        state: node.state,
        start: node.start,
        stop: node.stop,
        passed: is_container.then_some(node.counts.passed),
        failed: is_container.then_some(node.counts.failed),
        skipped: is_container.then_some(node.counts.skipped),
        error: node.error.clone(),
        attempts: node.attempts,
        file: node.file.clone(),
        items: node
            .children
            .iter()
            .map(|child| build_report(nodes, *child))
            .collect(),
    }
}

/// A completed node as reporters and the JSON output see it.
///
/// Parent links and scheduling state are not part of the report; the
/// hierarchy is carried by `items` alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportNode {
    pub kind: NodeKind,
    pub name: String,

    /// Hook type of a scaffold, or declaration type of a generator
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind_label: Option<String>,

    pub state: NodeState,
    pub start: i64,
    pub stop: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passed: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skipped: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempts: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<ReportNode>,
}

impl ReportNode {
    /// Visit this node and its descendants depth-first, with their depth.
    pub fn walk<F>(&self, f: &mut F)
    where
        F: FnMut(&ReportNode, usize),
    {
        self.walk_at(0, f);
    }

    fn walk_at<F>(&self, depth: usize, f: &mut F)
    where
        F: FnMut(&ReportNode, usize),
    {
        f(self, depth);
        for item in &self.items {
            item.walk_at(depth + 1, f);
        }
    }

    /// First node with the given name, depth-first.
    pub fn find(&self, name: &str) -> Option<&ReportNode> {
        if self.name == name {
            return Some(self);
        }
        self.items.iter().find_map(|item| item.find(name))
    }

    /// Count the nodes of one kind in this subtree by terminal state.
    pub fn tally(&self, kind: NodeKind) -> Counts {
        let mut counts = Counts::default();
        self.walk(&mut |node, _| {
            if node.kind == kind {
                counts.record(node.state);
            }
        });
        counts
    }

    /// Counters of a container; zero for leaves.
    pub fn counts(&self) -> Counts {
        Counts {
            passed: self.passed.unwrap_or(0),
            failed: self.failed.unwrap_or(0),
            skipped: self.skipped.unwrap_or(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_children_listed_in_start_order() {
        let tree = ResultTree::new();
        let spec = tree.add(NodeId::ROOT, NodeKind::Spec, "a.test.toml");
        let first = tree.add(spec, NodeKind::Test, "first");
        let second = tree.add(spec, NodeKind::Test, "second");
        let hook = tree.add(spec, NodeKind::Hook, "setup");

        assert!(tree.children(spec).is_empty());
        assert_eq!(tree.parent(second), Some(spec));
        assert_eq!(tree.ancestors(second), vec![spec, NodeId::ROOT]);

        tree.begin(hook, NodeState::Running);
        tree.finish(hook, NodeState::Passed, None);
        tree.skip(second);
        tree.begin(first, NodeState::Running);
        tree.finish(first, NodeState::Passed, None);

        assert_eq!(tree.children(spec), vec![hook, second, first]);
    }

    #[test]
    fn test_pending_children_include_unstarted() {
        let tree = ResultTree::new();
        let spec = tree.add(NodeId::ROOT, NodeKind::Spec, "spec");
        let ran = tree.add(spec, NodeKind::Test, "ran");
        let waiting = tree.add(spec, NodeKind::Test, "waiting");
        tree.finish(ran, NodeState::Passed, None);

        tree.skip_pending_children(spec);

        assert_eq!(tree.state(waiting), Some(NodeState::Skipped));
        assert_eq!(tree.children(spec), vec![ran, waiting]);
        assert_eq!(tree.counts(spec).total(), 2);
    }

    #[test]
    fn test_finish_rolls_into_parent_once() {
        let tree = ResultTree::new();
        let spec = tree.add(NodeId::ROOT, NodeKind::Spec, "spec");
        let test = tree.add(spec, NodeKind::Test, "test");

        tree.begin(test, NodeState::Running);
        tree.finish(test, NodeState::Failed, Some("boom".to_string()));
        tree.finish(test, NodeState::Passed, None);

        let node = tree.get(test).unwrap();
        assert_eq!(node.state, NodeState::Failed);
        assert_eq!(node.error.as_deref(), Some("boom"));
        assert_eq!(tree.counts(spec).failed, 1);
        assert_eq!(tree.counts(spec).total(), 1);
    }

    #[test]
    fn test_skip_records_zero_duration() {
        let tree = ResultTree::new();
        let spec = tree.add(NodeId::ROOT, NodeKind::Spec, "spec");
        let test = tree.add(spec, NodeKind::Test, "test");

        tree.skip(test);

        let node = tree.get(test).unwrap();
        assert_eq!(node.state, NodeState::Skipped);
        assert_eq!(node.start, node.stop);
        assert_eq!(tree.counts(spec).skipped, 1);
    }

    #[test]
    fn test_container_state_derivation() {
        let tree = ResultTree::new();
        let empty = tree.add(NodeId::ROOT, NodeKind::Spec, "empty");
        assert_eq!(tree.finish_container(empty, None), NodeState::Skipped);

        let broken = tree.add(NodeId::ROOT, NodeKind::Spec, "broken");
        let ok = tree.add(broken, NodeKind::Test, "ok");
        tree.finish(ok, NodeState::Passed, None);
        assert_eq!(
            tree.finish_container(broken, Some("TypeError: bad".to_string())),
            NodeState::Failed
        );

        assert_eq!(tree.counts(NodeId::ROOT).skipped, 1);
        assert_eq!(tree.counts(NodeId::ROOT).failed, 1);
    }

    #[test]
    fn test_report_omits_parent_and_leaf_counters() {
        let tree = ResultTree::new();
        let spec = tree.add(NodeId::ROOT, NodeKind::Spec, "spec");
        let test = tree.add(spec, NodeKind::Test, "adds numbers");
        tree.finish(test, NodeState::Passed, None);
        tree.finish_container(spec, None);

        let json = serde_json::to_value(tree.report()).unwrap();
        let leaf = &json["items"][0]["items"][0];
        assert_eq!(leaf["name"], "adds numbers");
        assert_eq!(leaf["state"], "passed");
        assert!(leaf.get("parent").is_none());
        assert!(leaf.get("passed").is_none());
        assert_eq!(json["items"][0]["passed"], 1);
    }

    #[test]
    fn test_tally_counts_by_kind() {
        let tree = ResultTree::new();
        let spec = tree.add(NodeId::ROOT, NodeKind::Spec, "spec");
        let a = tree.add(spec, NodeKind::Test, "a");
        let b = tree.add(spec, NodeKind::Test, "b");
        tree.finish(a, NodeState::Passed, None);
        tree.skip(b);
        tree.finish_container(spec, None);

        let report = tree.report();
        let tests = report.tally(NodeKind::Test);
        assert_eq!((tests.passed, tests.skipped), (1, 1));
        assert_eq!(report.tally(NodeKind::Spec).passed, 1);
        assert!(report.find("b").is_some());
    }
}
