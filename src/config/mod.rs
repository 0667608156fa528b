//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → DispatcherConfig (validated, immutable)
//!
//! When api.watch is set:
//!     watcher.rs detects a change to the API document
//!     → DocumentSource re-parses it
//!     → ApiDocument sent to the server
//!     → dispatcher rebuilds and swaps its route table
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; only the API document reloads
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, ConfigError};
pub use schema::{
    ApiConfig, DispatcherConfig, LimitsConfig, ListenerConfig, ObservabilityConfig, TimeoutConfig,
};
pub use validation::{validate_config, ValidationError};
pub use watcher::DocumentWatcher;
