//! Request-scoped faults.

use thiserror::Error;

/// Every failure that can occur after a route has matched.
///
/// All variants are converted into an error response by the dispatcher;
/// none escape to the transport.
#[derive(Debug, Error)]
pub enum Fault {
    /// Accept value is not among the operation's produced media types.
    #[error("Requested Content-Type \"{0}\", defined by Accept header is NOT supported")]
    UnsupportedMediaType(String),

    #[error("Parameter location \"{0}\" is not supported")]
    UnsupportedParameterLocation(String),

    #[error("Unknown collection format \"{0}\" is not supported")]
    UnsupportedCollectionFormat(String),

    #[error("Type \"{param_type}\" is not supported for {location} parameter \"{name}\"")]
    UnsupportedParameterType {
        name: String,
        location: String,
        param_type: String,
    },

    /// A value could not be coerced to the declared type.
    #[error("Invalid value \"{value}\" for parameter \"{name}\": expected {expected}")]
    InvalidArgument {
        name: String,
        value: String,
        expected: String,
    },

    /// A path parameter names no placeholder of the template.
    #[error("Path parameter \"{0}\" has no placeholder in the path template")]
    UnboundPathParameter(String),

    #[error("Binding {location} parameter \"{name}\" is not implemented")]
    NotImplemented { location: String, name: String },

    #[error("Schema type \"{0}\" is not registered")]
    UnknownSchema(String),

    /// Raised by an invoked handler, optionally carrying a status code.
    #[error("{message}")]
    Handler { status: Option<u16>, message: String },

    #[error("Can't find response for status code \"{0}\"")]
    MissingResponseDefinition(u16),

    #[error("Serialization failed: {0}")]
    Serialization(String),
}

impl Fault {
    /// A handler fault without a status code.
    pub fn handler(message: impl Into<String>) -> Self {
        Self::Handler {
            status: None,
            message: message.into(),
        }
    }

    /// A handler fault carrying a status code.
    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        Self::Handler {
            status: Some(status),
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::with_status(400, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::with_status(404, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::with_status(409, message)
    }

    /// Carried status code; zero counts as absent.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Handler { status, .. } => status.filter(|s| *s != 0),
            _ => None,
        }
    }

    /// Stable label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnsupportedMediaType(_) => "unsupported_media_type",
            Self::UnsupportedParameterLocation(_) => "unsupported_parameter_location",
            Self::UnsupportedCollectionFormat(_) => "unsupported_collection_format",
            Self::UnsupportedParameterType { .. } => "unsupported_parameter_type",
            Self::InvalidArgument { .. } => "invalid_argument",
            Self::UnboundPathParameter(_) => "unbound_path_parameter",
            Self::NotImplemented { .. } => "not_implemented",
            Self::UnknownSchema(_) => "unknown_schema",
            Self::Handler { .. } => "handler",
            Self::MissingResponseDefinition(_) => "missing_response_definition",
            Self::Serialization(_) => "serialization",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status() {
        assert_eq!(Fault::not_found("x").status(), Some(404));
        assert_eq!(Fault::with_status(0, "x").status(), None);
        assert_eq!(Fault::handler("x").status(), None);
        assert_eq!(Fault::UnknownSchema("Pet".into()).status(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Fault::not_found("no such widget").to_string(), "no such widget");
        assert_eq!(
            Fault::UnsupportedCollectionFormat("pipes".into()).to_string(),
            "Unknown collection format \"pipes\" is not supported"
        );
        assert_eq!(
            Fault::MissingResponseDefinition(418).to_string(),
            "Can't find response for status code \"418\""
        );
    }
}
