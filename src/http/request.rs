//! Request accessor and request IDs.
//!
//! # Responsibilities
//! - Expose method, path, headers, named values and the raw body
//! - Merge query-string and form-encoded body values for named lookup
//! - Generate `x-request-id` values (UUID v4)
//!
//! # Design Decisions
//! - Built once per request from the buffered body; read-only afterwards
//! - Query values take precedence over form values for single lookups
//! - Repeated names may use the bare (`tag`) or bracketed (`tag[]`) form

use axum::http::{header, request::Parts, HeaderMap, HeaderName, HeaderValue, Method, Request};
use bytes::Bytes;
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

/// Header carrying the per-request correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// Read-only view of an inbound request.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    headers: HeaderMap,
    query: Vec<(String, String)>,
    form: Vec<(String, String)>,
    body: Bytes,
}

impl ApiRequest {
    /// Create a request from a method and a path with optional query string.
    pub fn new(method: Method, uri: &str) -> Self {
        let (path, query) = match uri.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (uri, None),
        };

        Self {
            method,
            path: path.to_string(),
            headers: HeaderMap::new(),
            query: query.map(parse_pairs).unwrap_or_default(),
            form: Vec::new(),
            body: Bytes::new(),
        }
    }

    /// Build from HTTP request parts and an already buffered body.
    pub fn from_parts(parts: &Parts, body: Bytes) -> Self {
        let mut request = Self {
            method: parts.method.clone(),
            path: parts.uri.path().to_string(),
            headers: parts.headers.clone(),
            query: parts.uri.query().map(parse_pairs).unwrap_or_default(),
            form: Vec::new(),
            body,
        };
        request.refresh_form();
        request
    }

    /// Add a header; invalid names or values are ignored.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                self.headers.append(name, value);
                self.refresh_form();
            }
            _ => tracing::warn!(header = %name, "Ignoring invalid header"),
        }
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self.refresh_form();
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// A single header by name; non-UTF-8 values read as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn accept(&self) -> Option<&str> {
        self.header(header::ACCEPT.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header(header::CONTENT_TYPE.as_str())
    }

    /// First value submitted under `name`, from the query string or a form body.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .chain(self.form.iter())
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Every value submitted under `name` or `name[]`, in submission order.
    pub fn param_values(&self, name: &str) -> Vec<&str> {
        let bracketed = format!("{name}[]");
        self.query
            .iter()
            .chain(self.form.iter())
            .filter(|(key, _)| key == name || *key == bracketed)
            .map(|(_, value)| value.as_str())
            .collect()
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    fn refresh_form(&mut self) {
        let is_form = self
            .content_type()
            .map(|ct| crate::codec::essence(Some(ct)) == FORM_URLENCODED)
            .unwrap_or(false);

        self.form = if is_form {
            url::form_urlencoded::parse(&self.body)
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect()
        } else {
            Vec::new()
        };
    }
}

fn parse_pairs(query: &str) -> Vec<(String, String)> {
    url::form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

/// Request ID generator backed by UUID v4.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}
