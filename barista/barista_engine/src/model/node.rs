use barista_core::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Kind of a result-tree node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// The single node owning every spec of a run
    Root,
    /// One spec file
    Spec,
    /// A `describe` grouping
    Suite,
    /// A single test
    Test,
    /// One execution of a registered hook
    Hook,
    /// A data-driven declaration (`mit`/`mdescribe`)
    Generator,
}

impl NodeKind {
    /// Containers own children, hook registries and rollup counters.
    pub fn is_container(&self) -> bool {
        matches!(self, NodeKind::Root | NodeKind::Spec | NodeKind::Suite)
    }
}

/// Execution state of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NodeState {
    #[default]
    /// Declared, not started
    Ready,
    /// Currently executing
    Running,
    /// Finished successfully
    Passed,
    /// Finished with a failure
    Failed,
    /// Not executed
    Skipped,
}

impl NodeState {
    /// Passed, failed and skipped are terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            NodeState::Passed | NodeState::Failed | NodeState::Skipped
        )
    }
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeState::Ready => write!(f, "ready"),
            NodeState::Running => write!(f, "running"),
            NodeState::Passed => write!(f, "passed"),
            NodeState::Failed => write!(f, "failed"),
            NodeState::Skipped => write!(f, "skipped"),
        }
    }
}

/// Hook registry a scaffold node was created from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HookKind {
    Before,
    After,
    BeforeEach,
    AfterEach,
}

impl HookKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            HookKind::Before => "before",
            HookKind::After => "after",
            HookKind::BeforeEach => "beforeEach",
            HookKind::AfterEach => "afterEach",
        }
    }
}

/// Declaration a generator node came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeneratorKind {
    Mit,
    Mdescribe,
}

impl GeneratorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GeneratorKind::Mit => "mit",
            GeneratorKind::Mdescribe => "mdescribe",
        }
    }
}

/// Rollup counters of a container
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counts {
    pub passed: u32,
    pub failed: u32,
    pub skipped: u32,
}

impl Counts {
    /// Record one child that reached `state`. Non-terminal states are ignored.
    pub fn record(&mut self, state: NodeState) {
        match state {
            NodeState::Passed => self.passed += 1,
            NodeState::Failed => self.failed += 1,
            NodeState::Skipped => self.skipped += 1,
            NodeState::Ready | NodeState::Running => {}
        }
    }

    pub fn total(&self) -> u32 {
        self.passed + self.failed + self.skipped
    }

    /// Terminal state implied by the counters alone.
    pub fn rollup_state(&self) -> NodeState {
        if self.failed > 0 {
            NodeState::Failed
        } else if self.passed > 0 {
            NodeState::Passed
        } else {
            NodeState::Skipped
        }
    }
}

/// The reportable record of one node.
///
/// Scheduling state (chains, hook registries, timeouts) is kept elsewhere,
/// keyed by `id`, so this record holds only what a report shows plus the
/// parent link used for navigation.
#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    pub name: String,
    pub state: NodeState,

    /// Milliseconds since the epoch
    pub start: i64,

    /// Milliseconds since the epoch, `-1` while unfinished
    pub stop: i64,

    pub(crate) parent: Option<NodeId>,

    /// Whether the node has been listed among its parent's children
    pub(crate) attached: bool,

    /// Children in the order they started
    pub children: Vec<NodeId>,
    pub counts: Counts,
    pub error: Option<String>,
    pub hook: Option<HookKind>,
    pub generator: Option<GeneratorKind>,

    /// Attempts made by a retry-capable test
    pub attempts: Option<u32>,

    /// Source file of a spec node
    pub file: Option<PathBuf>,
}

impl Node {
    pub(crate) fn new(id: NodeId, kind: NodeKind, name: String, parent: Option<NodeId>) -> Self {
        Node {
            id,
            kind,
            name,
            state: NodeState::Ready,
            start: barista_core::timestamp(),
            stop: -1,
            parent,
            attached: parent.is_none(),
            children: Vec::new(),
            counts: Counts::default(),
            error: None,
            hook: None,
            generator: None,
            attempts: None,
            file: None,
        }
    }

    /// The owning parent; `None` only for the root.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn is_finished(&self) -> bool {
        self.stop != -1
    }
}
