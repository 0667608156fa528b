//! Compiled operation model.
//!
//! # Responsibilities
//! - Normalize descriptor strings into typed values
//! - Compile the path template once
//! - Expose read-only accessors used by binding and dispatch
//!
//! # Design Decisions
//! - Immutable after construction; shared via `Arc` across requests
//! - Unknown locations, types and collection formats are preserved
//!   verbatim so the binder can report them precisely

use std::collections::HashMap;
use std::fmt;
use std::ops::RangeInclusive;

use crate::descriptor::{OperationDescriptor, ParameterDescriptor, ResponseDescriptor};
use crate::routing::matcher::PathMatcher;
use crate::routing::RouteError;

/// HTTP verbs an operation may be registered for.
const METHODS: &[&str] = &["get", "put", "post", "patch", "delete", "head", "options"];

/// Status codes accepted in declared responses and configuration.
pub const STATUS_CODES: RangeInclusive<u16> = 100..=599;

/// Where a parameter's value comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Path,
    Query,
    Header,
    Body,
    FormData,
    Other(String),
}

impl From<&str> for Location {
    fn from(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "path" => Self::Path,
            "query" => Self::Query,
            "header" => Self::Header,
            "body" => Self::Body,
            "formdata" => Self::FormData,
            _ => Self::Other(value.to_string()),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path => f.write_str("path"),
            Self::Query => f.write_str("query"),
            Self::Header => f.write_str("header"),
            Self::Body => f.write_str("body"),
            Self::FormData => f.write_str("formData"),
            Self::Other(s) => f.write_str(s),
        }
    }
}

/// Declared parameter type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterType {
    String,
    Integer,
    Float,
    Array,
    Object,
    Other(String),
}

impl From<&str> for ParameterType {
    fn from(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "string" => Self::String,
            "integer" => Self::Integer,
            "float" | "number" => Self::Float,
            "array" => Self::Array,
            "object" => Self::Object,
            _ => Self::Other(value.to_string()),
        }
    }
}

impl fmt::Display for ParameterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => f.write_str("string"),
            Self::Integer => f.write_str("integer"),
            Self::Float => f.write_str("float"),
            Self::Array => f.write_str("array"),
            Self::Object => f.write_str("object"),
            Self::Other(s) => f.write_str(s),
        }
    }
}

/// Encoding of array-typed query values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionFormat {
    Csv,
    Multi,
    Other(String),
}

impl From<&str> for CollectionFormat {
    fn from(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "csv" => Self::Csv,
            "multi" => Self::Multi,
            _ => Self::Other(value.to_string()),
        }
    }
}

impl fmt::Display for CollectionFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Csv => f.write_str("csv"),
            Self::Multi => f.write_str("multi"),
            Self::Other(s) => f.write_str(s),
        }
    }
}

/// Reference to a named type, e.g. `#/definitions/Pet`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SchemaRef(String);

impl SchemaRef {
    const PREFIX: &'static str = "#/definitions/";

    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    /// The referenced type name with the definitions prefix removed.
    pub fn type_name(&self) -> &str {
        self.0.strip_prefix(Self::PREFIX).unwrap_or(&self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SchemaRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One argument specification.
#[derive(Debug, Clone)]
pub struct Parameter {
    pub name: String,
    pub location: Location,
    pub param_type: ParameterType,
    /// Only meaningful for arrays; defaults to csv.
    pub collection_format: CollectionFormat,
    pub schema_ref: Option<SchemaRef>,
    pub required: bool,
}

impl From<&ParameterDescriptor> for Parameter {
    fn from(desc: &ParameterDescriptor) -> Self {
        Self {
            name: desc.name.clone(),
            location: Location::from(desc.location.as_str()),
            param_type: desc
                .param_type
                .as_deref()
                .map(ParameterType::from)
                .unwrap_or(ParameterType::String),
            collection_format: desc
                .collection_format
                .as_deref()
                .map(CollectionFormat::from)
                .unwrap_or(CollectionFormat::Csv),
            schema_ref: desc.schema.as_ref().map(|s| SchemaRef::new(&s.reference)),
            required: desc.required,
        }
    }
}

/// Informational response header.
#[derive(Debug, Clone)]
pub struct ResponseHeader {
    pub name: String,
    pub header_type: Option<String>,
    pub description: Option<String>,
}

/// A declared response.
#[derive(Debug, Clone)]
pub struct ResponseSpec {
    pub status_code: u16,
    pub schema_ref: Option<SchemaRef>,
    pub description: String,
    pub headers: Vec<ResponseHeader>,
}

impl ResponseSpec {
    fn from_descriptor(status_code: u16, desc: &ResponseDescriptor) -> Self {
        Self {
            status_code,
            schema_ref: desc.schema.as_ref().map(|s| SchemaRef::new(&s.reference)),
            description: desc.description.clone(),
            headers: desc
                .headers
                .iter()
                .map(|(name, h)| ResponseHeader {
                    name: name.clone(),
                    header_type: h.header_type.clone(),
                    description: h.description.clone(),
                })
                .collect(),
        }
    }
}

/// Service lookup key plus the method to invoke on it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HandlerRef {
    pub service: String,
    pub method: String,
}

impl HandlerRef {
    pub fn new(service: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            method: method.into(),
        }
    }
}

impl fmt::Display for HandlerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.service, self.method)
    }
}

/// One bound (method, path template) endpoint.
#[derive(Debug, Clone)]
pub struct Operation {
    method: String,
    matcher: PathMatcher,
    operation_id: Option<String>,
    parameters: Vec<Parameter>,
    responses: HashMap<u16, ResponseSpec>,
    produces: Vec<String>,
    handler: HandlerRef,
}

impl Operation {
    /// Build an operation from its descriptor.
    pub fn from_descriptor(desc: &OperationDescriptor) -> Result<Self, RouteError> {
        let method = desc.method.to_ascii_lowercase();
        if !METHODS.contains(&method.as_str()) {
            return Err(RouteError::UnsupportedMethod(desc.method.clone()));
        }

        let matcher = PathMatcher::compile(&desc.path)?;

        let mut responses = HashMap::with_capacity(desc.responses.len());
        for (code, response) in &desc.responses {
            let status = code
                .trim()
                .parse::<u16>()
                .ok()
                .filter(|s| STATUS_CODES.contains(s))
                .ok_or_else(|| RouteError::InvalidStatusCode {
                    path: desc.path.clone(),
                    code: code.clone(),
                })?;
            responses.insert(status, ResponseSpec::from_descriptor(status, response));
        }

        Ok(Self {
            method,
            matcher,
            operation_id: desc.operation_id.clone(),
            parameters: desc.parameters.iter().map(Parameter::from).collect(),
            responses,
            produces: desc.produces.clone(),
            handler: HandlerRef::new(&desc.handler.service, &desc.handler.method),
        })
    }

    /// Lowercase HTTP method.
    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn template(&self) -> &str {
        self.matcher.template()
    }

    pub fn matcher(&self) -> &PathMatcher {
        &self.matcher
    }

    pub fn placeholders(&self) -> &[String] {
        self.matcher.placeholders()
    }

    pub fn operation_id(&self) -> Option<&str> {
        self.operation_id.as_deref()
    }

    /// Label used in logs and metrics.
    pub fn label(&self) -> &str {
        self.operation_id.as_deref().unwrap_or_else(|| self.template())
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn response(&self, status_code: u16) -> Option<&ResponseSpec> {
        self.responses.get(&status_code)
    }

    pub fn responses(&self) -> impl Iterator<Item = &ResponseSpec> {
        self.responses.values()
    }

    pub fn produces(&self) -> &[String] {
        &self.produces
    }

    pub fn handler(&self) -> &HandlerRef {
        &self.handler
    }
}
