//! Operation descriptor subsystem.
//!
//! # Data Flow
//! ```text
//! API document (JSON/TOML) or in-memory list
//!     → source.rs (OperationSource impls)
//!     → document.rs (plain serde descriptor shapes)
//!     → routing (compiled into immutable Operations)
//! ```
//!
//! # Design Decisions
//! - Descriptors are plain data; how they were discovered is irrelevant here
//! - Enumerated fields stay as strings until a route is built, so unknown
//!   values surface at bind time exactly where they matter

pub mod document;
pub mod source;

pub use document::{
    ApiDocument, HandlerDescriptor, HeaderDescriptor, OperationDescriptor, ParameterDescriptor,
    ResponseDescriptor, SchemaDescriptor,
};
pub use source::{parse_document, DocumentSource, OperationSource, SourceError, StaticSource};
