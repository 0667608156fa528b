//! Name-keyed service registry.
//!
//! # Responsibilities
//! - Hold handlers keyed by (service, method)
//! - Hold body types keyed by schema name
//! - Hold error response types keyed by `"{api}/{Type}"`
//!
//! # Design Decisions
//! - Populated once at startup, then shared read-only via `Arc`
//! - Handlers are resolved into routes when the route table is built,
//!   so request handling never looks them up by name
//! - Body types are constructed fresh per request from the decoded document

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::binding::Arguments;
use crate::routing::HandlerRef;
use crate::services::handler::{Handler, HandlerResult};
use crate::services::responses::{ErrorResponse, MessageResponse, STANDARD_ERROR_TYPES};

type TypeConstructor =
    Arc<dyn Fn(Value) -> Result<Box<dyn Any + Send>, serde_json::Error> + Send + Sync>;

type ErrorConstructor = Arc<dyn Fn(&str) -> Result<Value, serde_json::Error> + Send + Sync>;

/// Registry of handlers and named types.
#[derive(Default)]
pub struct ServiceRegistry {
    handlers: HashMap<HandlerRef, Arc<dyn Handler>>,
    types: HashMap<String, TypeConstructor>,
    errors: HashMap<String, ErrorConstructor>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a closure for `service::method`, replacing any previous one.
    pub fn register_handler<F>(&mut self, service: &str, method: &str, handler: F) -> &mut Self
    where
        F: Fn(Arguments) -> HandlerResult + Send + Sync + 'static,
    {
        self.register_shared(service, method, Arc::new(handler))
    }

    /// Register an already shared handler, e.g. one service object exposing
    /// several methods.
    pub fn register_shared(
        &mut self,
        service: &str,
        method: &str,
        handler: Arc<dyn Handler>,
    ) -> &mut Self {
        self.handlers.insert(HandlerRef::new(service, method), handler);
        self
    }

    /// Register a body type under its schema name.
    pub fn register_type<T>(&mut self, name: &str) -> &mut Self
    where
        T: DeserializeOwned + Send + 'static,
    {
        let constructor: TypeConstructor = Arc::new(|value: Value| {
            let instance: T = serde_json::from_value(value)?;
            Ok(Box::new(instance) as Box<dyn Any + Send>)
        });
        self.types.insert(name.to_string(), constructor);
        self
    }

    /// Register an error response type for an API.
    pub fn register_error<T>(&mut self, api: &str, name: &str) -> &mut Self
    where
        T: ErrorResponse,
    {
        let constructor: ErrorConstructor = Arc::new(|message: &str| {
            let mut response = T::default();
            response.set_message(message.to_string());
            serde_json::to_value(response)
        });
        self.errors.insert(error_key(api, name), constructor);
        self
    }

    /// Register [`MessageResponse`] under the standard error type names.
    pub fn register_standard_errors(&mut self, api: &str) -> &mut Self {
        for name in STANDARD_ERROR_TYPES {
            self.register_error::<MessageResponse>(api, name);
        }
        self
    }

    pub fn resolve_handler(&self, handler: &HandlerRef) -> Option<Arc<dyn Handler>> {
        self.handlers.get(handler).cloned()
    }

    pub fn has_type(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Construct a fresh instance of the named type from a decoded document.
    ///
    /// Returns `None` when the type is not registered.
    pub fn construct(
        &self,
        name: &str,
        value: Value,
    ) -> Option<Result<Box<dyn Any + Send>, serde_json::Error>> {
        self.types.get(name).map(|constructor| constructor(value))
    }

    /// Build the error payload registered as `"{api}/{name}"`.
    ///
    /// Returns `None` when the type is not registered.
    pub fn error_payload(
        &self,
        api: &str,
        name: &str,
        message: &str,
    ) -> Option<Result<Value, serde_json::Error>> {
        self.errors
            .get(&error_key(api, name))
            .map(|constructor| constructor(message))
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

impl fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut handlers: Vec<String> = self.handlers.keys().map(ToString::to_string).collect();
        handlers.sort();
        let mut types: Vec<&String> = self.types.keys().collect();
        types.sort();
        let mut errors: Vec<&String> = self.errors.keys().collect();
        errors.sort();

        f.debug_struct("ServiceRegistry")
            .field("handlers", &handlers)
            .field("types", &types)
            .field("errors", &errors)
            .finish()
    }
}

fn error_key(api: &str, name: &str) -> String {
    format!("{api}/{name}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Pet {
        name: String,
    }

    #[test]
    fn test_handler_resolution() {
        let mut registry = ServiceRegistry::new();
        registry.register_handler("pets", "list", |_args: Arguments| Ok(Some(json!([]))));

        let handler = registry
            .resolve_handler(&HandlerRef::new("pets", "list"))
            .unwrap();
        assert_eq!(handler.call(Arguments::default()).unwrap(), Some(json!([])));
        assert!(registry
            .resolve_handler(&HandlerRef::new("pets", "delete"))
            .is_none());
        assert_eq!(registry.handler_count(), 1);
    }

    #[test]
    fn test_type_construction() {
        let mut registry = ServiceRegistry::new();
        registry.register_type::<Pet>("Pet");

        let pet = registry
            .construct("Pet", json!({"name": "rex"}))
            .unwrap()
            .unwrap();
        let pet = pet.downcast::<Pet>().unwrap();
        assert_eq!(pet.name, "rex");

        assert!(registry.construct("Pet", json!({"id": 1})).unwrap().is_err());
        assert!(registry.construct("Cat", json!({})).is_none());
    }

    #[test]
    fn test_error_payload_keyed_by_api() {
        let mut registry = ServiceRegistry::new();
        registry.register_standard_errors("OA2");

        let payload = registry
            .error_payload("OA2", "NotFound", "no such pet")
            .unwrap()
            .unwrap();
        assert_eq!(payload, json!({"message": "no such pet"}));

        assert!(registry.error_payload("OA3", "NotFound", "x").is_none());
        assert!(registry.error_payload("OA2", "Teapot", "x").is_none());
    }
}
