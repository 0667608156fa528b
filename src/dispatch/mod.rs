//! Dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! ApiRequest
//!     → dispatcher.rs (route table lookup)
//!         no match → NoRoute, response untouched
//!     → binding (arguments by declared location and type)
//!     → handler invocation
//!     → negotiator.rs (Accept vs produces)
//!     → codec encode → ApiResponse
//!
//! Any fault after the match:
//!     → error_mapper.rs (status, declared response, error type)
//!     → negotiator.rs + codec encode
//!     → on a second fault: plain-text 500 with the first message
//! ```
//!
//! # Design Decisions
//! - Faults are values; handlers return them, nothing unwinds
//! - Route table swapped atomically; in-flight requests keep their snapshot
//! - Dispatch is synchronous; the HTTP layer decides where it runs

pub mod dispatcher;
pub mod error_mapper;
pub mod fault;
pub mod negotiator;

use thiserror::Error;

use crate::descriptor::SourceError;
use crate::routing::RouteError;

pub use dispatcher::{Dispatched, Dispatcher, FALLBACK_CONTENT_TYPE};
pub use error_mapper::{ErrorMapper, ErrorPayload};
pub use fault::Fault;
pub use negotiator::negotiate;

/// Errors raised while initializing a dispatcher.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Failed to read operations: {0}")]
    Source(#[from] SourceError),

    #[error("Failed to build route: {0}")]
    Route(#[from] RouteError),
}

/// No registered route matches the request.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("No matching route found for {method} {path}")]
pub struct NoRoute {
    pub method: String,
    pub path: String,
}
