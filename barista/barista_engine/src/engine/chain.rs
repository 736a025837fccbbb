//! Ordered queues of deferred work.
//!
//! A `Chain` is a FIFO of continuations. Registration pushes onto it without
//! running anything; `settle` later drains it one continuation at a time,
//! awaiting each before starting the next. A continuation may itself push
//! onto the chain it runs from, and such work is drained in the same call.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use parking_lot::Mutex;

/// One deferred unit of work.
pub type Continuation = Box<dyn FnOnce() -> BoxFuture<'static, ()> + Send>;

/// Identifies one of the chains owned by a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChainKind {
    Main,
    Before,
    After,
    BeforeEach,
    AfterEach,
}

/// A shared ordered queue of continuations.
#[derive(Clone, Default)]
pub struct Chain {
    queue: Arc<Mutex<VecDeque<Continuation>>>,
}

impl Chain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a continuation and return the extended chain.
    pub fn then<F, Fut>(&self, work: F) -> &Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        self.queue
            .lock()
            .push_back(Box::new(move || Box::pin(work()) as BoxFuture<'static, ()>));
        self
    }

    /// Number of continuations not yet started.
    pub fn pending(&self) -> usize {
        self.queue.lock().len()
    }

    /// Drop every continuation not yet started. Returns how many were dropped.
    pub fn clear(&self) -> usize {
        let mut queue = self.queue.lock();
        let dropped = queue.len();
        queue.clear();
        dropped
    }

    /// Run continuations in order until the queue is empty.
    pub async fn settle(&self) {
        while let Some(next) = self.pop() {
            next().await;
        }
    }

    // Kept separate so the guard is released before the continuation runs.
    fn pop(&self) -> Option<Continuation> {
        self.queue.lock().pop_front()
    }
}

impl fmt::Debug for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain")
            .field("pending", &self.pending())
            .finish()
    }
}
