//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with a catch-all route into the dispatcher
//! - Wire up middleware (tracing, limits, timeout, request ID)
//! - Bind server to listener
//! - Apply API document updates to the live route table
//! - Observability (metrics, correlation IDs)
//!
//! # Design Decisions
//! - Dispatch is synchronous, so it runs on the blocking pool
//! - Bodies are buffered up to the configured limit before dispatch
//! - Unrouted requests get a plain 404; everything else is the dispatcher's

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::DispatcherConfig;
use crate::descriptor::ApiDocument;
use crate::dispatch::Dispatcher;
use crate::http::request::{ApiRequest, UuidRequestId, X_REQUEST_ID};
use crate::http::response::ApiResponse;
use crate::observability::metrics;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub max_body_size: usize,
}

/// HTTP front end for a dispatcher.
pub struct HttpServer {
    router: Router,
    config: DispatcherConfig,
    dispatcher: Arc<Dispatcher>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: DispatcherConfig, dispatcher: Arc<Dispatcher>) -> Self {
        let state = AppState {
            dispatcher: dispatcher.clone(),
            max_body_size: config.limits.max_body_size,
        };

        let router = Self::build_router(&config, state);
        Self {
            router,
            config,
            dispatcher,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &DispatcherConfig, state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(dispatch_handler))
            .route("/", any(dispatch_handler))
            .with_state(state)
            .layer(RequestBodyLimitLayer::new(config.limits.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.timeouts.request_secs,
            )))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
    }

    /// The fully layered router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires.
    ///
    /// Documents received on `document_updates` replace the route table;
    /// a document that fails to build leaves the current table in place.
    pub async fn run(
        self,
        listener: TcpListener,
        document_updates: Option<mpsc::UnboundedReceiver<ApiDocument>>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            api = %self.dispatcher.api(),
            routes = self.dispatcher.routes().len(),
            "HTTP server starting"
        );

        if let Some(mut updates) = document_updates {
            let dispatcher = self.dispatcher.clone();
            tokio::spawn(async move {
                while let Some(document) = updates.recv().await {
                    match dispatcher.reload(&document.operations) {
                        Ok(count) => tracing::info!(routes = count, "Applied API document update"),
                        Err(e) => tracing::error!(
                            error = %e,
                            "Rejected API document update, keeping current routes"
                        ),
                    }
                }
            });
        }

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, stopping HTTP server");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }
}

/// Catch-all handler: buffer the body and hand the request to the dispatcher.
async fn dispatch_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    let (parts, body) = request.into_parts();
    let method = parts.method.to_string();

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %parts.uri.path(),
        "Dispatching request"
    );

    let body = match axum::body::to_bytes(body, state.max_body_size).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(request_id = %request_id, error = %e, "Failed to read request body");
            metrics::record_request(&method, "none", 413, start_time);
            return (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response();
        }
    };

    let api_request = ApiRequest::from_parts(&parts, body);
    let dispatcher = state.dispatcher.clone();
    let joined = tokio::task::spawn_blocking(move || {
        let mut response = ApiResponse::new();
        let result = dispatcher.handle(&api_request, &mut response);
        (result, response)
    })
    .await;

    match joined {
        Ok((Ok(dispatched), response)) => {
            tracing::debug!(
                request_id = %request_id,
                route = %dispatched.route,
                status = dispatched.status.as_u16(),
                "Request dispatched"
            );
            metrics::record_request(
                &method,
                &dispatched.route,
                dispatched.status.as_u16(),
                start_time,
            );
            response.into_response()
        }
        Ok((Err(no_route), _)) => {
            tracing::warn!(request_id = %request_id, path = %no_route.path, "No route matched");
            metrics::record_unrouted(&method);
            metrics::record_request(&method, "none", 404, start_time);
            (StatusCode::NOT_FOUND, "No matching route found").into_response()
        }
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Dispatch task failed");
            metrics::record_request(&method, "none", 500, start_time);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
    }
}
