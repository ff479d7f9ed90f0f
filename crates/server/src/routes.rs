//! Route configuration.

use crate::auth::auth_middleware;
use crate::handlers;
use crate::metrics::metrics_handler;
use crate::state::AppState;
use axum::Router;
use axum::middleware;
use axum::routing::get;
use tower_http::trace::TraceLayer;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Health check (intentionally unauthenticated for load balancers/k8s probes)
        .route("/v1/health", get(handlers::health_check))
        .route(
            "/v1/assets/{id}/meta",
            get(handlers::get_all_metadata)
                .put(handlers::put_all_metadata)
                .delete(handlers::delete_all_metadata),
        )
        .route(
            "/v1/assets/{id}/meta/{fields}",
            get(handlers::get_some_metadata)
                .put(handlers::put_some_metadata)
                .delete(handlers::delete_some_metadata),
        );

    let mut router = Router::new().merge(api_routes);

    // SECURITY: when enabled, restrict /metrics to scraper IPs at the network level.
    if state.config.server.metrics_enabled {
        router = router.route("/metrics", get(metrics_handler));
    }

    // Order of execution: TraceLayer -> Auth -> Handler
    router
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
