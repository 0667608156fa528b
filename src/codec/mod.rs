//! Serialization capability.
//!
//! # Responsibilities
//! - Encode result and error documents at a negotiated media type
//! - Decode request bodies at the request's media type
//!
//! # Design Decisions
//! - The dispatcher only talks to the `Codec` trait; encoding lives here
//! - Documents travel as `serde_json::Value`; typed construction happens
//!   through the service registry

pub mod json;

use bytes::Bytes;
use serde_json::Value;

use crate::dispatch::Fault;

pub use json::JsonCodec;

/// Media type assumed when a request body does not declare one.
pub const DEFAULT_MEDIA_TYPE: &str = "application/json";

/// Encodes and decodes documents by media type.
pub trait Codec: Send + Sync {
    /// Whether this codec handles the media type.
    fn supports(&self, media_type: &str) -> bool;

    fn encode(&self, value: &Value, media_type: &str) -> Result<Bytes, Fault>;

    fn decode(&self, body: &[u8], media_type: &str) -> Result<Value, Fault>;
}

/// Reduce a Content-Type header value to its bare, lowercase media type.
///
/// Missing or blank values fall back to [`DEFAULT_MEDIA_TYPE`].
pub fn essence(content_type: Option<&str>) -> String {
    content_type
        .and_then(|ct| ct.split(';').next())
        .map(str::trim)
        .filter(|ct| !ct.is_empty())
        .map(str::to_ascii_lowercase)
        .unwrap_or_else(|| DEFAULT_MEDIA_TYPE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_essence() {
        assert_eq!(essence(Some("application/json; charset=utf-8")), "application/json");
        assert_eq!(essence(Some(" Application/JSON ")), "application/json");
        assert_eq!(essence(Some("")), DEFAULT_MEDIA_TYPE);
        assert_eq!(essence(None), DEFAULT_MEDIA_TYPE);
    }
}
