//! Route table.
//!
//! # Responsibilities
//! - Store compiled routes grouped by lowercase method
//! - Look up the first route whose template matches a path
//! - Return the matched route and its captures, or an explicit no-match
//!
//! # Design Decisions
//! - Immutable once published (thread-safe without locks)
//! - O(1) method bucket lookup via HashMap
//! - O(n) template scan within a bucket, in registration order
//! - No deduplication: a later identical route is simply unreachable

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::descriptor::OperationDescriptor;
use crate::routing::matcher::MatchContext;
use crate::routing::operation::{Location, Operation};
use crate::routing::RouteError;
use crate::services::{Handler, ServiceRegistry};

/// An operation bound to its resolved handler.
#[derive(Clone)]
pub struct Route {
    operation: Arc<Operation>,
    handler: Arc<dyn Handler>,
}

impl Route {
    pub fn new(operation: Operation, handler: Arc<dyn Handler>) -> Self {
        Self {
            operation: Arc::new(operation),
            handler,
        }
    }

    /// Compile a descriptor and resolve its handler from the registry.
    pub fn build(desc: &OperationDescriptor, services: &ServiceRegistry) -> Result<Self, RouteError> {
        let operation = Operation::from_descriptor(desc)?;
        let handler = services
            .resolve_handler(operation.handler())
            .ok_or_else(|| RouteError::UnknownHandler(operation.handler().clone()))?;

        for param in operation.parameters() {
            match &param.location {
                Location::Header | Location::FormData => tracing::warn!(
                    route = %operation.label(),
                    parameter = %param.name,
                    location = %param.location,
                    "Parameter location is not bindable; requests will fail"
                ),
                Location::Body => {
                    if let Some(schema) = &param.schema_ref {
                        if !services.has_type(schema.type_name()) {
                            tracing::warn!(
                                route = %operation.label(),
                                schema = %schema,
                                "Body schema type is not registered"
                            );
                        }
                    }
                }
                _ => {}
            }
        }

        Ok(Self::new(operation, handler))
    }

    pub fn operation(&self) -> &Operation {
        &self.operation
    }

    pub fn handler(&self) -> &dyn Handler {
        self.handler.as_ref()
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.operation.method())
            .field("template", &self.operation.template())
            .field("handler", &self.operation.handler().to_string())
            .finish()
    }
}

/// Method-grouped, ordered collection of routes.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    buckets: HashMap<String, Vec<Route>>,
    ordered: Vec<Route>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a route to its method bucket.
    pub fn add(&mut self, route: Route) {
        self.buckets
            .entry(route.operation().method().to_string())
            .or_default()
            .push(route.clone());
        self.ordered.push(route);
    }

    /// Routes registered for `method`, in registration order.
    pub fn candidates(&self, method: &str) -> &[Route] {
        self.buckets
            .get(&method.to_ascii_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// First route for `method` whose template matches `path`.
    pub fn lookup(&self, method: &str, path: &str) -> Option<(&Route, MatchContext)> {
        self.candidates(method).iter().find_map(|route| {
            route
                .operation()
                .matcher()
                .match_path(path)
                .map(|context| (route, context))
        })
    }

    /// All routes in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Route> {
        self.ordered.iter()
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::Arguments;
    use crate::descriptor::HandlerDescriptor;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn descriptor(method: &str, path: &str, handler: &str) -> OperationDescriptor {
        OperationDescriptor {
            method: method.into(),
            path: path.into(),
            operation_id: Some(handler.into()),
            handler: HandlerDescriptor {
                service: "svc".into(),
                method: handler.into(),
            },
            parameters: Vec::new(),
            responses: BTreeMap::new(),
            produces: vec!["application/json".into()],
        }
    }

    fn registry() -> ServiceRegistry {
        let mut services = ServiceRegistry::new();
        services.register_handler("svc", "first", |_: Arguments| Ok(Some(json!("first"))));
        services.register_handler("svc", "second", |_: Arguments| Ok(Some(json!("second"))));
        services.register_handler("svc", "create", |_: Arguments| Ok(None));
        services
    }

    #[test]
    fn test_first_match_wins() {
        let services = registry();
        let mut table = RouteTable::new();
        table.add(Route::build(&descriptor("GET", "/items/{id}", "first"), &services).unwrap());
        table.add(Route::build(&descriptor("get", "/items/{name}", "second"), &services).unwrap());

        let (route, ctx) = table.lookup("GET", "/items/9").unwrap();
        assert_eq!(route.operation().handler().method, "first");
        assert_eq!(ctx.get(0), Some("9"));
        assert_eq!(
            route.handler().call(Arguments::default()).unwrap(),
            Some(json!("first"))
        );
        assert_eq!(table.candidates("get").len(), 2);
    }

    #[test]
    fn test_method_scoping() {
        let services = registry();
        let mut table = RouteTable::new();
        table.add(Route::build(&descriptor("POST", "/items", "create"), &services).unwrap());

        assert!(table.lookup("post", "/items").is_some());
        assert!(table.lookup("GET", "/items").is_none());
        assert!(table.candidates("delete").is_empty());
    }

    #[test]
    fn test_no_match() {
        let services = registry();
        let mut table = RouteTable::new();
        table.add(Route::build(&descriptor("GET", "/items/{id}", "first"), &services).unwrap());

        assert!(table.lookup("GET", "/items").is_none());
        assert!(table.lookup("GET", "/items/1/2").is_none());
    }

    #[test]
    fn test_registration_order_preserved() {
        let services = registry();
        let mut table = RouteTable::new();
        table.add(Route::build(&descriptor("POST", "/items", "create"), &services).unwrap());
        table.add(Route::build(&descriptor("GET", "/items/{id}", "first"), &services).unwrap());

        let methods: Vec<&str> = table.iter().map(|r| r.operation().method()).collect();
        assert_eq!(methods, vec!["post", "get"]);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_unknown_handler() {
        let services = registry();
        let err = Route::build(&descriptor("GET", "/x", "missing"), &services).unwrap_err();
        assert!(matches!(err, RouteError::UnknownHandler(h) if h.method == "missing"));
    }
}
