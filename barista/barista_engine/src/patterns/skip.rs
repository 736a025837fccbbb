//! Skip propagation.
//!
//! Decided when a node would start, never while it runs: a node is skipped
//! when its parent is already skipped or, with fast-fail on, when its parent
//! has recorded a failed child. Work already in flight is not affected.

use std::fmt;
use std::future::Future;

use barista_core::NodeId;
use futures::future::{BoxFuture, FutureExt};

use crate::model::{NodeState, ResultTree};

/// Why a node was not executed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The parent is skipped
    ParentSkipped,
    /// A sibling already failed and fast-fail is on
    FastFail,
    /// A conditional test's condition was false
    Condition,
    /// Excluded at declaration (`xit`, `xdescribe`)
    Excluded,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::ParentSkipped => write!(f, "parent skipped"),
            SkipReason::FastFail => write!(f, "fast-fail"),
            SkipReason::Condition => write!(f, "condition false"),
            SkipReason::Excluded => write!(f, "excluded"),
        }
    }
}

/// Decide whether a node about to start under `parent` must be skipped.
pub fn check(tree: &ResultTree, parent: NodeId, fast_fail: bool) -> Option<SkipReason> {
    let (state, failed) = tree.with_node(parent, |node| (node.state, node.counts.failed))?;

    if state == NodeState::Skipped {
        Some(SkipReason::ParentSkipped)
    } else if fast_fail && failed > 0 {
        Some(SkipReason::FastFail)
    } else {
        None
    }
}

/// Gate of a conditional test.
pub enum Condition {
    Value(bool),
    Deferred(Box<dyn FnOnce() -> BoxFuture<'static, bool> + Send>),
}

impl Condition {
    /// A condition computed when the test is about to start.
    pub fn deferred<F, Fut>(f: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        Condition::Deferred(Box::new(move || f().boxed()))
    }

    /// Resolve the condition. No deadline applies.
    pub async fn resolve(self) -> bool {
        match self {
            Condition::Value(value) => value,
            Condition::Deferred(f) => f().await,
        }
    }
}

impl From<bool> for Condition {
    fn from(value: bool) -> Self {
        Condition::Value(value)
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Condition::Deferred(_) => f.write_str("Deferred"),
        }
    }
}
