//! Descriptor-driven HTTP request dispatcher.
//!
//! Operations (method, path template, typed parameters, declared
//! responses, produced media types) are registered from descriptors. Each
//! request is matched to an operation, its arguments are bound from the
//! path, query string and body, the bound handler is invoked and the
//! result is encoded in the negotiated media type. Faults after a match
//! become the operation's declared error response.

pub mod binding;
pub mod codec;
pub mod config;
pub mod demo;
pub mod descriptor;
pub mod dispatch;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod services;

pub use config::DispatcherConfig;
pub use dispatch::{Dispatcher, Fault};
pub use http::{ApiRequest, ApiResponse, HttpServer};
pub use lifecycle::Shutdown;
pub use services::ServiceRegistry;
