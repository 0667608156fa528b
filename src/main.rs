//! API dispatcher service.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ─────────────▶ http::server (request id, limits, timeout, trace)
//!                        │
//!                        ▼
//!                    dispatch::Dispatcher
//!                        │  routing::RouteTable  (method bucket, template match)
//!                        │  binding::ParameterBinder (path, query, body)
//!                        │  services::Handler    (registered closure)
//!                        │  negotiate + codec    (Accept vs produces)
//!                        ▼
//!     Client Response ◀── ApiResponse (result, declared error, or fallback)
//!
//!     Cross-cutting: config (TOML), descriptor watcher (hot reload),
//!                    observability (tracing, Prometheus), lifecycle (signals)
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;

use api_dispatcher::config::{load_config, DispatcherConfig, DocumentWatcher};
use api_dispatcher::demo::{widgets_document, WidgetStore};
use api_dispatcher::descriptor::{DocumentSource, OperationSource, StaticSource};
use api_dispatcher::lifecycle::{spawn_signal_handler, Shutdown};
use api_dispatcher::observability::{init_logging, init_metrics};
use api_dispatcher::{Dispatcher, HttpServer, ServiceRegistry};

#[derive(Parser)]
#[command(name = "api-dispatcher")]
#[command(about = "Serve an API described by operation descriptors", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server (default)
    Serve,
    /// Print the compiled route table and exit
    Routes,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => DispatcherConfig::default(),
    };

    init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "api-dispatcher starting");

    let dispatcher = Arc::new(build_dispatcher(&config)?);

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Routes => {
            for route in dispatcher.routes().iter() {
                let operation = route.operation();
                println!(
                    "{:<8} {:<32} {:<20} {}",
                    operation.method().to_uppercase(),
                    operation.template(),
                    operation.handler(),
                    operation.label()
                );
            }
            Ok(())
        }
        Commands::Serve => serve(config, dispatcher).await,
    }
}

fn build_dispatcher(config: &DispatcherConfig) -> Result<Dispatcher, Box<dyn std::error::Error>> {
    let mut services = ServiceRegistry::new();
    WidgetStore::seeded().register(&mut services, &config.api.name);

    let source: Box<dyn OperationSource> = match &config.api.document {
        Some(path) => Box::new(DocumentSource::new(path)),
        None => Box::new(StaticSource::from(widgets_document()?)),
    };

    let dispatcher = Dispatcher::new(config.api.name.clone(), Arc::new(services))
        .with_default_status(config.api.default_error_status);
    dispatcher.init(source.as_ref())?;
    Ok(dispatcher)
}

async fn serve(
    config: DispatcherConfig,
    dispatcher: Arc<Dispatcher>,
) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        bind_address = %config.listener.bind_address,
        api = %config.api.name,
        request_timeout_secs = config.timeouts.request_secs,
        max_body_size = config.limits.max_body_size,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        init_metrics(config.observability.metrics_address.parse()?)?;
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    // The watcher stops when its handle is dropped.
    let (_watcher, document_updates) = match (&config.api.document, config.api.watch) {
        (Some(path), true) => {
            let (watcher, updates) = DocumentWatcher::new(path);
            (Some(watcher.run()?), Some(updates))
        }
        _ => (None, None),
    };

    let shutdown = Shutdown::new();
    spawn_signal_handler(&shutdown);

    let server = HttpServer::new(config, dispatcher);
    server
        .run(listener, document_updates, shutdown.subscribe())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
