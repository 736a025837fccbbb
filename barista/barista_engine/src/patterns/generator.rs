//! Data sources of `mit` / `mdescribe`.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use barista_core::TestError;
use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;

use crate::engine::envelope::within;

/// Asynchronous producer of generator values
pub type Producer = Box<dyn FnOnce() -> BoxFuture<'static, Result<Vec<Value>, TestError>> + Send>;

/// Values a generator expands over.
pub enum Values {
    /// A literal ordered sequence
    Literal(Vec<Value>),
    /// Computed when the generator starts, under the timeout envelope
    Producer(Producer),
}

impl Values {
    pub fn producer<F, Fut>(f: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<Vec<Value>, TestError>> + Send + 'static,
    {
        Values::Producer(Box::new(move || f().boxed()))
    }

    /// Obtain the sequence, racing a producer against `limit`.
    pub async fn resolve(self, limit: Duration) -> Result<Vec<Value>, TestError> {
        match self {
            Values::Literal(values) => Ok(values),
            Values::Producer(produce) => within(limit, produce()).await,
        }
    }
}

impl From<Vec<Value>> for Values {
    fn from(values: Vec<Value>) -> Self {
        Values::Literal(values)
    }
}

impl fmt::Debug for Values {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Values::Literal(values) => f.debug_tuple("Literal").field(values).finish(),
            Values::Producer(_) => f.write_str("Producer"),
        }
    }
}

/// Name of the instance created for the value at `index`.
pub fn instance_name(name: &str, index: usize) -> String {
    format!("{} - {}", name, index + 1)
}
