use axum::{
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware::identity_middleware;
use crate::state::AppState;

/// Create the main application router with all routes and middleware
#[tracing::instrument(skip(state))]
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // API routes carry the proxy-asserted identity for mutation logging
    let api_routes = Router::new()
        // Customer endpoints
        .route("/api/customers", get(handlers::customers::list_customers))
        .route("/api/customers", post(handlers::customers::create_customer))
        .route("/api/customers/:id", get(handlers::customers::get_customer))
        .route(
            "/api/customers/:id",
            put(handlers::customers::update_customer),
        )
        // Product endpoints
        .route("/api/products", get(handlers::products::list_products))
        .route("/api/products", post(handlers::products::create_product))
        .route("/api/products/:id", get(handlers::products::get_product))
        // License endpoints
        .route("/api/licenses", get(handlers::licenses::list_licenses))
        .route("/api/licenses", post(handlers::licenses::create_license))
        .route(
            "/api/licenses/:public_id",
            get(handlers::licenses::get_license),
        )
        .route(
            "/api/licenses/:public_id",
            put(handlers::licenses::update_license),
        )
        // Dashboard and reminder audit endpoints
        .route("/api/dashboard", get(handlers::dashboard::dashboard))
        .route("/api/reminders", get(handlers::reminders::list_reminders))
        .layer(axum::middleware::from_fn(identity_middleware));

    // Probes, metrics scrape, and the token-guarded calendar feed
    let public_routes = Router::new()
        .route("/healthz", get(handlers::health::health_check))
        .route("/healthz/ready", get(handlers::health::readiness_check))
        .route("/metrics", get(handlers::metrics::metrics_handler))
        .route("/calendar/:token", get(handlers::calendar::calendar_feed));

    // Combine all routes
    Router::new()
        .merge(api_routes)
        .merge(public_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
