//! API server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use api::config::{Config, LogFormat};
use event_log::{EventLog, InMemoryEventLog, PostgresEventLog};
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

fn init_tracing(format: LogFormat, filter: EnvFilter) {
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

#[tokio::main]
async fn main() {
    // 1. Read configuration (fallback warnings go to a plain subscriber),
    //    then initialize tracing from it
    let (config, filter) = tracing::subscriber::with_default(tracing_subscriber::fmt().finish(), || {
        let config = Config::from_env();
        let filter = config.log_filter();
        (config, filter)
    });
    init_tracing(config.log_format, filter);

    // 2. Install Prometheus metrics recorder
    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Choose the domain event log
    let events: Arc<dyn EventLog> = match &config.database_url {
        Some(url) => {
            tracing::info!("publishing domain events to PostgreSQL");
            Arc::new(
                PostgresEventLog::connect(url)
                    .await
                    .expect("failed to connect to the event log database"),
            )
        }
        None => {
            tracing::info!("publishing domain events in memory");
            Arc::new(InMemoryEventLog::new())
        }
    };

    // 4. Register handlers; a missing or duplicate registration stops startup
    let state =
        api::create_default_state(&config, events).expect("handler registration failed");
    tracing::info!(
        handlers = state.mediator.len(),
        serializer = state.translation().encoder().name(),
        culture = %config.culture,
        "mediator ready"
    );

    // 5. Build the application
    let app = api::create_app(state, metrics_handle);

    // 6. Start server
    let addr = config.addr();
    tracing::info!(%addr, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("server error");

    tracing::info!("server shut down gracefully");
}
