//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, limits, timeout)
//!     → request.rs (buffered body → ApiRequest)
//!     → dispatcher (route, bind, invoke, encode)
//!     → response.rs (ApiResponse → Axum response)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{ApiRequest, UuidRequestId, X_REQUEST_ID};
pub use response::ApiResponse;
pub use server::{AppState, HttpServer};
