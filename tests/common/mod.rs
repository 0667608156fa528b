//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use api_dispatcher::config::DispatcherConfig;
use api_dispatcher::demo::{widgets_document, WidgetStore};
use api_dispatcher::descriptor::{ApiDocument, OperationDescriptor, StaticSource};
use api_dispatcher::{Dispatcher, HttpServer, ServiceRegistry, Shutdown};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

pub const API: &str = "OA2";

/// Dispatcher serving the bundled widget document over a seeded store.
pub fn widget_dispatcher() -> Arc<Dispatcher> {
    let mut services = ServiceRegistry::new();
    WidgetStore::seeded().register(&mut services, API);

    let dispatcher = Dispatcher::new(API, Arc::new(services));
    dispatcher
        .init(&StaticSource::from(widgets_document().unwrap()))
        .unwrap();
    Arc::new(dispatcher)
}

/// Build one operation descriptor from JSON.
pub fn operation(value: Value) -> OperationDescriptor {
    serde_json::from_value(value).unwrap()
}

/// A GET operation on `path` bound to `service::method`, declaring 200 and
/// a standard 500.
pub fn simple_operation(path: &str, service: &str, method: &str, parameters: Value) -> OperationDescriptor {
    operation(json!({
        "method": "get",
        "path": path,
        "handler": { "service": service, "method": method },
        "parameters": parameters,
        "responses": {
            "200": { "description": "ok" },
            "500": { "description": "failure", "schema": { "$ref": "#/definitions/InternalServerError" } }
        },
        "produces": ["application/json"]
    }))
}

pub fn document(operations: Vec<OperationDescriptor>) -> ApiDocument {
    ApiDocument {
        title: None,
        operations,
    }
}

/// A running server bound to an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub updates: mpsc::UnboundedSender<ApiDocument>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start `dispatcher` behind the HTTP server on 127.0.0.1:0.
pub async fn start_server(dispatcher: Arc<Dispatcher>, mut config: DispatcherConfig) -> TestServer {
    config.listener.bind_address = "127.0.0.1:0".to_string();
    let listener = TcpListener::bind(&config.listener.bind_address)
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let (updates, document_updates) = mpsc::unbounded_channel();

    let server = HttpServer::new(config, dispatcher);
    tokio::spawn(async move {
        let _ = server
            .run(listener, Some(document_updates), server_shutdown)
            .await;
    });

    TestServer {
        addr,
        shutdown,
        updates,
    }
}
