//! Lifecycle event bus.

pub mod bus;
pub mod types;

pub use bus::{EventBus, Observer};
pub use types::{EventError, EventPayload, LifecycleEvent};
