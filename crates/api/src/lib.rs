//! HTTP surface of the listing service.
//!
//! Routes for properties, owners, customers, carts and entity history
//! dispatch through the domain mediator. One middleware wraps the whole
//! router and turns every failure into the uniform error envelope.

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod serialization;
pub mod state;
pub mod validation;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post};
use event_log::EventLog;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use config::Config;
pub use error::HandlerFailure;
pub use state::{AppState, default_services};

use domain::RegistrationError;
use middleware::translate_errors;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: AppState, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    let translation = state.translation().clone();

    Router::new()
        .route("/health", get(routes::health::check))
        .route(
            "/api/v1/properties",
            post(routes::properties::create).get(routes::properties::list),
        )
        .route(
            "/api/v1/properties/{id}",
            get(routes::properties::get)
                .put(routes::properties::update)
                .delete(routes::properties::remove),
        )
        .route(
            "/api/v1/owners",
            post(routes::owners::create).get(routes::owners::list),
        )
        .route(
            "/api/v1/owners/{id}",
            get(routes::owners::get)
                .put(routes::owners::update)
                .delete(routes::owners::remove),
        )
        .route(
            "/api/v1/customers",
            post(routes::customers::create).get(routes::customers::list),
        )
        .route(
            "/api/v1/customers/{id}",
            get(routes::customers::get)
                .put(routes::customers::update)
                .delete(routes::customers::remove),
        )
        .route("/api/v1/carts", post(routes::carts::create))
        .route(
            "/api/v1/carts/{id}",
            get(routes::carts::get).delete(routes::carts::remove),
        )
        .route("/api/v1/carts/{id}/items", post(routes::carts::add_item))
        .route(
            "/api/v1/carts/{id}/items/{property_id}",
            delete(routes::carts::remove_item),
        )
        .route("/api/v1/history/{id}", get(routes::history::get))
        .with_state(state)
        .merge(metrics_router)
        .layer(axum::middleware::from_fn_with_state(
            translation,
            translate_errors,
        ))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the default application state over in-memory collaborators.
pub fn create_default_state(
    config: &Config,
    events: Arc<dyn EventLog>,
) -> Result<AppState, RegistrationError> {
    AppState::new(&default_services(config, events), config)
}
