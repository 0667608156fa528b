//! Error response types.

use serde::{Deserialize, Serialize};

/// A typed error payload that carries a message.
pub trait ErrorResponse: Serialize + Default + Send + 'static {
    fn set_message(&mut self, message: String);
}

/// The stock error payload: `{"message": "..."}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl ErrorResponse for MessageResponse {
    fn set_message(&mut self, message: String) {
        self.message = message;
    }
}

/// Type names under which [`MessageResponse`] is registered by default.
pub const STANDARD_ERROR_TYPES: &[&str] = &[
    "BadRequest",
    "NotFound",
    "MethodNotAllowed",
    "NotAcceptable",
    "Conflict",
    "UnprocessableEntity",
    "InternalServerError",
];
