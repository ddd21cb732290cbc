//! HTTP API tests driving the router in-process

mod common;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use cmms_analytics::analytics::AnalyticsConfig;
use cmms_analytics::api::{build_router, AppState};
use cmms_analytics::state::InMemoryStore;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const MAY: &str = "start=2024-05-01T00:00:00Z&end=2024-06-01T00:00:00Z";

async fn seeded_app() -> Router {
    let store = Arc::new(InMemoryStore::new());
    common::seed_plant(store.as_ref()).await;
    build_router(AppState::new(store, AnalyticsConfig::default()))
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    read(response).await
}

async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    read(response).await
}

async fn read(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn test_health_check() {
    let app = seeded_app().await;

    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_metrics_endpoint_serves_text() {
    let app = seeded_app().await;
    let _ = get(&app, &format!("/v1/reliability/mtbf?{}", MAY)).await;

    let response = app
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_mtbf_json_shape() {
    let app = seeded_app().await;

    let (status, body) = get(&app, &format!("/v1/reliability/mtbf?{}", MAY)).await;
    assert_eq!(status, StatusCode::OK);

    let machines = body["machines"].as_array().unwrap();
    assert_eq!(machines.len(), 3);
    assert_eq!(machines[0]["assetId"], "LATHE-2");
    assert_eq!(machines[0]["mtbfHours"], 200.0);
    assert!(machines[2]["mtbfHours"].is_null());
    assert_eq!(body["summary"]["machines_with_failures"], 2);
}

#[tokio::test]
async fn test_asset_filter_from_query_string() {
    let app = seeded_app().await;

    let (status, body) = get(
        &app,
        &format!("/v1/reliability/mttr?{}&asset_id=PRESS-1,%20PUMP-3", MAY),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let machines = body["machines"].as_array().unwrap();
    assert_eq!(machines.len(), 1);
    assert_eq!(machines[0]["assetId"], "PRESS-1");
    assert_eq!(machines[0]["mttrMinutes"], 180.0);
}

#[tokio::test]
async fn test_pareto_dimension_parameter() {
    let app = seeded_app().await;

    let (status, body) = get(
        &app,
        &format!("/v1/reliability/pareto?{}&dimension=machines", MAY),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["id"], "PRESS-1");
    assert_eq!(body["data"][0]["count"], 3);
    assert_eq!(body["data"][0]["cumulativePercentage"], 75.0);

    let (status, body) = get(
        &app,
        &format!("/v1/reliability/pareto?{}&dimension=bogus", MAY),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_inverted_window_rejected() {
    let app = seeded_app().await;

    let (status, body) = get(
        &app,
        "/v1/reliability/mtbf?start=2024-06-01T00:00:00Z&end=2024-05-01T00:00:00Z",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_cost_summary_reports_missing_downtime_rate_as_null() {
    let app = seeded_app().await;

    let (status, body) = get(
        &app,
        &format!("/v1/costs/summary?{}&as_of=2024-05-25T00:00:00Z", MAY),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["downtimeTotal"].is_null());
    assert_eq!(body["grandTotal"], 1160.0);
    assert_eq!(body["budget"]["variance"], 840.0);
    assert_eq!(body["budget"]["isOverBudget"], false);
}

#[tokio::test]
async fn test_budget_variance_by_year() {
    let app = seeded_app().await;

    let (status, body) = get(&app, "/v1/costs/budget/2024").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["months"].as_array().unwrap().len(), 1);
    assert_eq!(body["totals"]["actualTotal"], 1160.0);
}

#[tokio::test]
async fn test_predictions_endpoint() {
    let app = seeded_app().await;

    let (status, body) = get(
        &app,
        "/v1/reliability/predictions?as_of=2024-05-25T00:00:00Z",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["predictions"][0]["asset_id"], "PRESS-1");
    assert_eq!(body["predictions"][0]["severity"], "critical");
    assert_eq!(body["summary"]["excluded_assets"], 2);
}

#[tokio::test]
async fn test_event_ending_before_start_is_integrity_error() {
    let app = seeded_app().await;

    let (status, body) = post(
        &app,
        "/v1/events",
        json!({
            "asset_id": "PUMP-3",
            "event_type": "breakdown",
            "started_at": "2024-05-12T10:00:00Z",
            "ended_at": "2024-05-12T09:00:00Z"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "DATA_INTEGRITY_ERROR");
}

#[tokio::test]
async fn test_create_event() {
    let app = seeded_app().await;

    let (status, body) = post(
        &app,
        "/v1/events",
        json!({
            "asset_id": "PUMP-3",
            "event_type": "breakdown",
            "started_at": "2024-05-12T10:00:00Z",
            "ended_at": "2024-05-12T11:30:00Z",
            "cause_category_id": "MECH",
            "labor_hours": 1.5,
            "technician_role": "mechanic"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["asset_id"], "PUMP-3");

    let id = body["id"].as_str().unwrap().to_string();
    let (status, fetched) = get(&app, &format!("/v1/events/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["cause_category_id"], "MECH");

    let (_, body) = get(
        &app,
        &format!("/v1/reliability/mttr?{}&location=Line%20B", MAY),
    )
    .await;
    assert_eq!(body["machines"][0]["mttrMinutes"], 90.0);
}

#[tokio::test]
async fn test_unknown_event_not_found() {
    let app = seeded_app().await;

    let (status, body) = get(&app, "/v1/events/00000000-0000-0000-0000-000000000000").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_duplicate_budget_conflicts() {
    let app = seeded_app().await;
    let budget = json!({
        "year": 2024,
        "month": 6,
        "budgeted_labor": 500.0,
        "budgeted_parts": 250.0
    });

    let (status, _) = post(&app, "/v1/budgets", budget.clone()).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = post(&app, "/v1/budgets", budget).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");
}

#[tokio::test]
async fn test_budget_month_out_of_range_rejected() {
    let app = seeded_app().await;

    let (status, _) = post(
        &app,
        "/v1/budgets",
        json!({"year": 2024, "month": 13, "budgeted_labor": 1.0, "budgeted_parts": 1.0}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_overlapping_labor_rates_surface_on_analytics() {
    let app = seeded_app().await;

    let (status, _) = post(
        &app,
        "/v1/labor-rates",
        json!({
            "scope": {"role": "mechanic"},
            "hourly_rate": 55.0,
            "effective_from": "2024-03-01"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = get(
        &app,
        &format!("/v1/costs/summary?{}&as_of=2024-05-25T00:00:00Z", MAY),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "DATA_INTEGRITY_ERROR");
}

#[tokio::test]
async fn test_labor_rate_with_inverted_window_rejected() {
    let app = seeded_app().await;

    let (status, _) = post(
        &app,
        "/v1/labor-rates",
        json!({
            "scope": {"user": "tech-2"},
            "hourly_rate": 45.0,
            "effective_from": "2024-03-01",
            "effective_to": "2024-02-01"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
