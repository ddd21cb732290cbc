use crate::api::{handlers, AppState};
use crate::metrics::track_metrics;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};

/// Build the main API router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health and metrics
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics_endpoint))
        // Reliability analytics
        .route("/v1/reliability/mtbf", get(handlers::get_mtbf))
        .route("/v1/reliability/mttr", get(handlers::get_mttr))
        .route("/v1/reliability/pareto", get(handlers::get_pareto))
        .route("/v1/reliability/failure-modes", get(handlers::get_failure_modes))
        .route("/v1/reliability/predictions", get(handlers::get_predictions))
        // Cost analytics
        .route("/v1/costs/summary", get(handlers::get_cost_summary))
        .route("/v1/costs/budget/:year", get(handlers::get_budget_variance))
        // Data ingestion
        .route("/v1/events", post(handlers::create_event))
        .route("/v1/events/:id", get(handlers::get_event))
        .route("/v1/assets", post(handlers::create_asset))
        .route("/v1/categories", post(handlers::create_category))
        .route("/v1/budgets", post(handlers::create_budget))
        .route("/v1/labor-rates", post(handlers::create_labor_rate))
        .route("/v1/operating-hours", post(handlers::record_operating_hours))
        // Add state
        .with_state(state)
        // Add middleware
        .layer(middleware::from_fn(track_metrics))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(false))
                .on_response(DefaultOnResponse::new().include_headers(false)),
        )
        .layer(CorsLayer::permissive())
}
