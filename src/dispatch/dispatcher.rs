//! Request dispatcher.
//!
//! # Responsibilities
//! - Own the published route table and swap it atomically on reload
//! - Run one request through match, bind, invoke, negotiate and encode
//! - Turn every post-match fault into an error response
//!
//! # Design Decisions
//! - The response is written once, from a fully built outcome, so a
//!   half-written success body is never mixed with an error body
//! - Faults raised while building the error response fall back to a
//!   plain-text 500 that carries the original message
//! - Unmatched requests are returned to the caller untouched

use std::sync::Arc;

use arc_swap::ArcSwap;
use axum::http::StatusCode;
use bytes::Bytes;

use crate::binding::ParameterBinder;
use crate::codec::{self, Codec, JsonCodec};
use crate::descriptor::{OperationDescriptor, OperationSource};
use crate::dispatch::error_mapper::ErrorMapper;
use crate::dispatch::negotiator::negotiate;
use crate::dispatch::{DispatchError, Fault, NoRoute};
use crate::http::{ApiRequest, ApiResponse};
use crate::observability::metrics;
use crate::routing::{MatchContext, Operation, Route, RouteError, RouteTable};
use crate::services::ServiceRegistry;

/// Media type of the last-resort error body.
pub const FALLBACK_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Summary of a dispatched request.
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatched {
    /// Operation id, or the path template.
    pub route: String,
    pub status: StatusCode,
    /// Fault kind when the request ended in an error response.
    pub fault: Option<&'static str>,
}

/// Everything needed to write the response.
struct Outcome {
    status: Option<StatusCode>,
    content_type: String,
    body: Option<Bytes>,
    fault: Option<&'static str>,
}

impl Outcome {
    fn fallback(fault: &Fault) -> Self {
        Self {
            status: Some(StatusCode::INTERNAL_SERVER_ERROR),
            content_type: FALLBACK_CONTENT_TYPE.to_string(),
            body: Some(Bytes::from(fault.to_string())),
            fault: Some(fault.kind()),
        }
    }

    fn write(self, response: &mut ApiResponse) {
        if let Some(status) = self.status {
            response.set_status(status);
        }
        response.set_content_type(&self.content_type);
        if let Some(body) = self.body {
            response.append_body(&body);
        }
    }
}

/// Routes requests to registered handlers.
pub struct Dispatcher {
    api: String,
    services: Arc<ServiceRegistry>,
    codec: Arc<dyn Codec>,
    routes: ArcSwap<RouteTable>,
    default_status: u16,
}

impl Dispatcher {
    pub fn new(api: impl Into<String>, services: Arc<ServiceRegistry>) -> Self {
        Self {
            api: api.into(),
            services,
            codec: Arc::new(JsonCodec),
            routes: ArcSwap::from_pointee(RouteTable::new()),
            default_status: 500,
        }
    }

    pub fn with_codec(mut self, codec: Arc<dyn Codec>) -> Self {
        self.codec = codec;
        self
    }

    /// Status used for faults that carry no code of their own.
    pub fn with_default_status(mut self, status: u16) -> Self {
        self.default_status = status;
        self
    }

    pub fn api(&self) -> &str {
        &self.api
    }

    pub fn services(&self) -> &ServiceRegistry {
        &self.services
    }

    /// Register every operation from `source`, after any already present.
    pub fn init(&self, source: &dyn OperationSource) -> Result<usize, DispatchError> {
        let descriptors = source.operations()?;
        let routes = build_routes(&descriptors, &self.services)?;
        let count = routes.len();

        self.routes.rcu(|current| {
            let mut table = RouteTable::clone(current);
            for route in &routes {
                table.add(route.clone());
            }
            table
        });

        tracing::info!(api = %self.api, routes = count, "Route table initialized");
        Ok(count)
    }

    /// Compile one operation and append it to the table.
    pub fn add_operation(&self, descriptor: &OperationDescriptor) -> Result<(), RouteError> {
        let route = Route::build(descriptor, &self.services)?;
        tracing::debug!(
            method = %route.operation().method(),
            template = %route.operation().template(),
            handler = %route.operation().handler(),
            "Registered operation"
        );
        self.routes.rcu(|current| {
            let mut table = RouteTable::clone(current);
            table.add(route.clone());
            table
        });
        Ok(())
    }

    /// Replace the whole table. On error the current table stays published.
    pub fn reload(&self, descriptors: &[OperationDescriptor]) -> Result<usize, RouteError> {
        let routes = build_routes(descriptors, &self.services)?;
        let mut table = RouteTable::new();
        for route in routes {
            table.add(route);
        }
        let count = table.len();
        self.routes.store(Arc::new(table));
        tracing::info!(api = %self.api, routes = count, "Route table reloaded");
        Ok(count)
    }

    /// Snapshot of the published table.
    pub fn routes(&self) -> Arc<RouteTable> {
        self.routes.load_full()
    }

    /// Handle one request.
    ///
    /// Returns `Err(NoRoute)` without touching `response` when no route
    /// matches. Otherwise the response is always populated.
    pub fn handle(
        &self,
        request: &ApiRequest,
        response: &mut ApiResponse,
    ) -> Result<Dispatched, NoRoute> {
        let table = self.routes.load();
        let method = request.method().as_str().to_ascii_lowercase();
        let Some((route, context)) = table.lookup(&method, request.path()) else {
            tracing::debug!(method = %method, path = %request.path(), "No matching route");
            return Err(NoRoute {
                method,
                path: request.path().to_string(),
            });
        };

        let operation = route.operation();
        let outcome = match self.execute(route, &context, request) {
            Ok(outcome) => outcome,
            Err(fault) => self.recover(operation, &fault, request),
        };

        let dispatched = Dispatched {
            route: operation.label().to_string(),
            status: outcome.status.unwrap_or(StatusCode::OK),
            fault: outcome.fault,
        };
        outcome.write(response);
        Ok(dispatched)
    }

    fn execute(
        &self,
        route: &Route,
        context: &MatchContext,
        request: &ApiRequest,
    ) -> Result<Outcome, Fault> {
        let operation = route.operation();
        let arguments = ParameterBinder::new(&self.services, self.codec.as_ref())
            .bind(operation, context, request)?;

        let result = route.handler().call(arguments)?;

        let media_type = negotiate(request.accept(), operation.produces())?;
        let body = match result {
            Some(value) => Some(self.codec.encode(&value, &codec::essence(Some(media_type)))?),
            None => None,
        };

        Ok(Outcome {
            status: None,
            content_type: media_type.to_string(),
            body,
            fault: None,
        })
    }

    fn recover(&self, operation: &Operation, fault: &Fault, request: &ApiRequest) -> Outcome {
        tracing::error!(
            route = %operation.label(),
            kind = fault.kind(),
            error = %fault,
            "Operation failed"
        );
        metrics::record_fault(fault.kind());

        match self.error_outcome(operation, fault, request) {
            Ok(outcome) => outcome,
            Err(secondary) => {
                tracing::warn!(
                    route = %operation.label(),
                    error = %secondary,
                    "Declared error response unavailable, sending fallback"
                );
                Outcome::fallback(fault)
            }
        }
    }

    fn error_outcome(
        &self,
        operation: &Operation,
        fault: &Fault,
        request: &ApiRequest,
    ) -> Result<Outcome, Fault> {
        let payload = ErrorMapper::new(&self.api, &self.services, self.default_status)
            .map(fault, operation)?;
        let media_type = negotiate(request.accept(), operation.produces())?;
        // Parameters such as charset stay on the Content-Type only.
        let body = self
            .codec
            .encode(&payload.document, &codec::essence(Some(media_type)))?;

        Ok(Outcome {
            status: Some(payload.status),
            content_type: media_type.to_string(),
            body: Some(body),
            fault: Some(fault.kind()),
        })
    }
}

fn build_routes(
    descriptors: &[OperationDescriptor],
    services: &ServiceRegistry,
) -> Result<Vec<Route>, RouteError> {
    descriptors
        .iter()
        .map(|descriptor| Route::build(descriptor, services))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::Arguments;
    use crate::descriptor::{
        HandlerDescriptor, ParameterDescriptor, ResponseDescriptor, SchemaDescriptor, StaticSource,
    };
    use axum::http::Method;
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn responses(codes: &[(&str, &str)]) -> BTreeMap<String, ResponseDescriptor> {
        codes
            .iter()
            .map(|(code, schema)| {
                (
                    code.to_string(),
                    ResponseDescriptor {
                        description: String::new(),
                        schema: Some(SchemaDescriptor {
                            reference: format!("#/definitions/{schema}"),
                        }),
                        headers: BTreeMap::new(),
                    },
                )
            })
            .collect()
    }

    fn get_widget() -> OperationDescriptor {
        OperationDescriptor {
            method: "get".into(),
            path: "/widgets/{id}".into(),
            operation_id: Some("getWidget".into()),
            handler: HandlerDescriptor {
                service: "widgets".into(),
                method: "get".into(),
            },
            parameters: vec![ParameterDescriptor {
                name: "id".into(),
                location: "path".into(),
                param_type: Some("integer".into()),
                collection_format: None,
                schema: None,
                required: true,
                description: None,
            }],
            responses: responses(&[
                ("200", "Widget"),
                ("404", "NotFound"),
                ("500", "InternalServerError"),
            ]),
            produces: vec!["application/json".into()],
        }
    }

    fn dispatcher() -> Dispatcher {
        let mut services = ServiceRegistry::new();
        services.register_standard_errors("OA2");
        services.register_handler("widgets", "get", |args: Arguments| {
            let id = args.require_integer(0)?;
            if id == 7 {
                Ok(Some(json!({"id": 7, "name": "sprocket"})))
            } else {
                Err(Fault::not_found(format!("Widget {id} not found")))
            }
        });
        let dispatcher = Dispatcher::new("OA2", Arc::new(services));
        dispatcher
            .init(&StaticSource::new(vec![get_widget()]))
            .unwrap();
        dispatcher
    }

    fn request(uri: &str) -> ApiRequest {
        ApiRequest::new(Method::GET, uri).with_header("accept", "application/json")
    }

    #[test]
    fn test_success() {
        let dispatcher = dispatcher();
        let mut response = ApiResponse::new();
        let dispatched = dispatcher
            .handle(&request("/widgets/7"), &mut response)
            .unwrap();

        assert_eq!(dispatched.route, "getWidget");
        assert_eq!(dispatched.status, StatusCode::OK);
        assert_eq!(response.status(), None);
        assert_eq!(response.content_type(), Some("application/json"));
        let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body, json!({"id": 7, "name": "sprocket"}));
    }

    #[test]
    fn test_handler_fault_uses_declared_response() {
        let dispatcher = dispatcher();
        let mut response = ApiResponse::new();
        let dispatched = dispatcher
            .handle(&request("/widgets/9"), &mut response)
            .unwrap();

        assert_eq!(dispatched.fault, Some("handler"));
        assert_eq!(response.status(), Some(StatusCode::NOT_FOUND));
        assert_eq!(response.content_type(), Some("application/json"));
        let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body, json!({"message": "Widget 9 not found"}));
    }

    #[test]
    fn test_binding_fault_uses_default_status() {
        let dispatcher = dispatcher();
        let mut response = ApiResponse::new();
        dispatcher
            .handle(&request("/widgets/abc"), &mut response)
            .unwrap();

        assert_eq!(response.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
        let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert!(body["message"].as_str().unwrap().contains("abc"));
    }

    #[test]
    fn test_unacceptable_media_type_falls_back() {
        let dispatcher = dispatcher();
        let mut response = ApiResponse::new();
        let request =
            ApiRequest::new(Method::GET, "/widgets/7").with_header("accept", "application/xml");
        let dispatched = dispatcher.handle(&request, &mut response).unwrap();

        assert_eq!(dispatched.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.content_type(), Some(FALLBACK_CONTENT_TYPE));
        assert_eq!(
            std::str::from_utf8(response.body()).unwrap(),
            "Requested Content-Type \"application/xml\", defined by Accept header is NOT supported"
        );
    }

    #[test]
    fn test_no_route() {
        let dispatcher = dispatcher();
        let mut response = ApiResponse::new();
        let err = dispatcher
            .handle(&request("/gadgets/1"), &mut response)
            .unwrap_err();

        assert_eq!(err.method, "get");
        assert_eq!(err.path, "/gadgets/1");
        assert_eq!(response.status(), None);
        assert!(response.body().is_empty());
        assert_eq!(response.content_type(), None);
    }

    #[test]
    fn test_missing_response_definition_falls_back() {
        let mut services = ServiceRegistry::new();
        services.register_standard_errors("OA2");
        services.register_handler("widgets", "get", |_: Arguments| {
            Err(Fault::with_status(418, "teapot"))
        });
        let dispatcher = Dispatcher::new("OA2", Arc::new(services));
        dispatcher.add_operation(&get_widget()).unwrap();

        let mut response = ApiResponse::new();
        dispatcher
            .handle(&request("/widgets/1"), &mut response)
            .unwrap();

        assert_eq!(response.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
        assert_eq!(response.content_type(), Some(FALLBACK_CONTENT_TYPE));
        assert_eq!(std::str::from_utf8(response.body()).unwrap(), "teapot");
    }

    #[test]
    fn test_handler_without_result_writes_no_body() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let mut services = ServiceRegistry::new();
        services.register_handler("widgets", "get", move |_: Arguments| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(None)
        });
        let dispatcher = Dispatcher::new("OA2", Arc::new(services));
        dispatcher.add_operation(&get_widget()).unwrap();

        let mut response = ApiResponse::new();
        dispatcher
            .handle(&request("/widgets/1"), &mut response)
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(response.status(), None);
        assert_eq!(response.content_type(), Some("application/json"));
        assert!(response.body().is_empty());
    }

    #[test]
    fn test_parameterized_produces_encodes_json() {
        let content_type = "application/json; charset=utf-8";
        let mut services = ServiceRegistry::new();
        services.register_standard_errors("OA2");
        services.register_handler("widgets", "get", |args: Arguments| {
            let id = args.require_integer(0)?;
            if id == 7 {
                Ok(Some(json!({"id": 7})))
            } else {
                Err(Fault::not_found(format!("Widget {id} not found")))
            }
        });
        let dispatcher = Dispatcher::new("OA2", Arc::new(services));
        let mut descriptor = get_widget();
        descriptor.produces = vec![content_type.into()];
        dispatcher.add_operation(&descriptor).unwrap();

        let mut response = ApiResponse::new();
        let request =
            ApiRequest::new(Method::GET, "/widgets/7").with_header("accept", content_type);
        let dispatched = dispatcher.handle(&request, &mut response).unwrap();
        assert_eq!(dispatched.status, StatusCode::OK);
        assert_eq!(response.status(), None);
        assert_eq!(response.content_type(), Some(content_type));
        let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body, json!({"id": 7}));

        let mut response = ApiResponse::new();
        let request =
            ApiRequest::new(Method::GET, "/widgets/9").with_header("accept", content_type);
        dispatcher.handle(&request, &mut response).unwrap();
        assert_eq!(response.status(), Some(StatusCode::NOT_FOUND));
        assert_eq!(response.content_type(), Some(content_type));
        let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body, json!({"message": "Widget 9 not found"}));
    }

    #[test]
    fn test_reload_replaces_table() {
        let dispatcher = dispatcher();
        assert_eq!(dispatcher.routes().len(), 1);

        let mut moved = get_widget();
        moved.path = "/parts/{id}".into();
        assert_eq!(dispatcher.reload(&[moved]).unwrap(), 1);

        let mut response = ApiResponse::new();
        assert!(dispatcher
            .handle(&request("/widgets/7"), &mut response)
            .is_err());
        assert!(dispatcher
            .handle(&request("/parts/7"), &mut response)
            .is_ok());
    }

    #[test]
    fn test_failed_reload_keeps_table() {
        let dispatcher = dispatcher();
        let mut broken = get_widget();
        broken.handler.method = "missing".into();

        assert!(dispatcher.reload(&[get_widget(), broken]).is_err());
        assert_eq!(dispatcher.routes().len(), 1);
        let mut response = ApiResponse::new();
        assert!(dispatcher
            .handle(&request("/widgets/7"), &mut response)
            .is_ok());
    }
}
