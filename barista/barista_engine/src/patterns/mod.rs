//! Execution policies around the chain engine: skip propagation, generator
//! data sources and the lifecycle event bus.

pub mod event;
pub mod generator;
pub mod skip;

pub use event::{EventBus, EventPayload, LifecycleEvent};
pub use generator::Values;
pub use skip::{Condition, SkipReason};
