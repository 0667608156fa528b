//! Parameter binding subsystem.
//!
//! # Data Flow
//! ```text
//! Matched Operation + MatchContext + ApiRequest
//!     → binder.rs (per-parameter dispatch by location)
//!         - path:  capture at placeholder index, coerced
//!         - query: scalar or collection-format array
//!         - body:  decoded, constructed as the schema type
//!     → arguments.rs (positional Arguments for the handler)
//! ```

pub mod arguments;
pub mod binder;

pub use arguments::{Argument, Arguments};
pub use binder::{sanitize, ParameterBinder};
