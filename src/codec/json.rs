//! JSON codec.

use bytes::Bytes;
use serde_json::Value;

use crate::codec::Codec;
use crate::dispatch::Fault;

/// Handles `application/json` and structured `+json` media types.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn supports(&self, media_type: &str) -> bool {
        let media_type = media_type.trim().to_ascii_lowercase();
        media_type == "application/json"
            || (media_type.starts_with("application/") && media_type.ends_with("+json"))
    }

    fn encode(&self, value: &Value, media_type: &str) -> Result<Bytes, Fault> {
        if !self.supports(media_type) {
            return Err(Fault::Serialization(format!(
                "cannot encode as \"{media_type}\""
            )));
        }
        serde_json::to_vec(value)
            .map(Bytes::from)
            .map_err(|e| Fault::Serialization(e.to_string()))
    }

    fn decode(&self, body: &[u8], media_type: &str) -> Result<Value, Fault> {
        if !self.supports(media_type) {
            return Err(Fault::Serialization(format!(
                "cannot decode \"{media_type}\""
            )));
        }
        serde_json::from_slice(body).map_err(|e| Fault::Serialization(e.to_string()))
    }
}
