//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path)
//!     → table.rs (method bucket lookup)
//!     → matcher.rs (anchored template match, captures by value)
//!     → Return: matched Route + MatchContext, or NoMatch
//!
//! Route Compilation (at startup or reload):
//!     OperationDescriptor[]
//!     → operation.rs (normalize, compile template)
//!     → resolve handler from the service registry
//!     → Freeze as immutable RouteTable
//! ```
//!
//! # Design Decisions
//! - Routes compiled once, immutable at runtime
//! - Deterministic: same input always matches same route
//! - First match wins (registration order)

pub mod matcher;
pub mod operation;
pub mod table;

use thiserror::Error;

pub use matcher::{MatchContext, PathMatcher};
pub use operation::{
    CollectionFormat, HandlerRef, Location, Operation, Parameter, ParameterType, ResponseHeader,
    ResponseSpec, SchemaRef,
};
pub use table::{Route, RouteTable};

/// Errors raised while building routes.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("Unsupported HTTP method \"{0}\"")]
    UnsupportedMethod(String),

    #[error("Invalid path template \"{template}\": {source}")]
    Pattern {
        template: String,
        #[source]
        source: regex::Error,
    },

    #[error("Placeholder \"{name}\" appears more than once in \"{template}\"")]
    DuplicatePlaceholder { template: String, name: String },

    #[error("Invalid response status code \"{code}\" on {path}")]
    InvalidStatusCode { path: String, code: String },

    #[error("No handler registered for {0}")]
    UnknownHandler(HandlerRef),
}
