use std::fmt;
use std::str::FromStr;

use barista_core::NodeId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ResultTree;

/// Error types for the lifecycle event bus
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EventError {
    #[error("Unknown lifecycle event: {0}")]
    UnknownEvent(String),
}

/// Named extension points of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LifecycleEvent {
    Before,
    BeforeSpec,
    BeforeSuite,
    BeforeTest,
    AfterTest,
    AfterSuite,
    AfterSpec,
    After,

    // Terminal-state notifications, not emitted by the scheduler yet
    Passed,
    Failed,
    Skipped,
}

impl LifecycleEvent {
    pub const ALL: [LifecycleEvent; 11] = [
        LifecycleEvent::Before,
        LifecycleEvent::BeforeSpec,
        LifecycleEvent::BeforeSuite,
        LifecycleEvent::BeforeTest,
        LifecycleEvent::AfterTest,
        LifecycleEvent::AfterSuite,
        LifecycleEvent::AfterSpec,
        LifecycleEvent::After,
        LifecycleEvent::Passed,
        LifecycleEvent::Failed,
        LifecycleEvent::Skipped,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleEvent::Before => "before",
            LifecycleEvent::BeforeSpec => "before-spec",
            LifecycleEvent::BeforeSuite => "before-suite",
            LifecycleEvent::BeforeTest => "before-test",
            LifecycleEvent::AfterTest => "after-test",
            LifecycleEvent::AfterSuite => "after-suite",
            LifecycleEvent::AfterSpec => "after-spec",
            LifecycleEvent::After => "after",
            LifecycleEvent::Passed => "passed",
            LifecycleEvent::Failed => "failed",
            LifecycleEvent::Skipped => "skipped",
        }
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LifecycleEvent {
    type Err = EventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LifecycleEvent::ALL
            .iter()
            .copied()
            .find(|event| event.as_str() == s)
            .ok_or_else(|| EventError::UnknownEvent(s.to_string()))
    }
}

/// What an observer receives: the event, the node it concerns, and a live
/// handle to the tree. Nodes may still change until the matching `after-*`
/// event has been emitted.
#[derive(Clone)]
pub struct EventPayload {
    pub event: LifecycleEvent,
    pub node: NodeId,
    pub tree: ResultTree,
}

impl fmt::Debug for EventPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventPayload")
            .field("event", &self.event)
            .field("node", &self.node)
            .finish()
    }
}
