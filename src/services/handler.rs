//! Handler abstraction.

use serde_json::Value;

use crate::binding::Arguments;
use crate::dispatch::Fault;

/// Result of invoking a handler: an optional document to serialize.
pub type HandlerResult = Result<Option<Value>, Fault>;

/// An invocable operation target.
///
/// Invocation is synchronous; handlers that need async I/O own that
/// concern themselves.
pub trait Handler: Send + Sync {
    fn call(&self, args: Arguments) -> HandlerResult;
}

impl<F> Handler for F
where
    F: Fn(Arguments) -> HandlerResult + Send + Sync,
{
    fn call(&self, args: Arguments) -> HandlerResult {
        self(args)
    }
}
