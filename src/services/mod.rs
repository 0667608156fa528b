//! Service registry subsystem.
//!
//! # Data Flow
//! ```text
//! Application startup
//!     → registry.rs (register handlers, body types, error types)
//!     → Arc<ServiceRegistry> handed to the dispatcher
//!     → handlers resolved into routes at table build time
//!
//! Per request:
//!     → body types constructed from decoded documents (binding)
//!     → error types constructed with the fault message (error path)
//! ```

pub mod handler;
pub mod registry;
pub mod responses;

pub use handler::{Handler, HandlerResult};
pub use registry::ServiceRegistry;
pub use responses::{ErrorResponse, MessageResponse, STANDARD_ERROR_TYPES};
