use crate::analytics::{
    integrity, AnalysisWindow, AnalyticsFilter, AnalyticsQuery, BudgetVarianceReport,
    CostSummary, FailureModeReport, MtbfReport, MttrReport, ParetoDimension, ParetoReport,
    PredictionReport,
};
use crate::api::AppState;
use crate::error::{AppError, Result};
use crate::metrics;
use crate::models::*;
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Result<Json<HealthResponse>> {
    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
    }))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}

/// Prometheus text exposition
pub async fn metrics_endpoint() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        metrics::gather_metrics(),
    )
}

/// Query parameters shared by the analytics endpoints
#[derive(Debug, Default, Deserialize)]
pub struct AnalyticsParams {
    /// Window start (RFC 3339, inclusive)
    pub start: Option<DateTime<Utc>>,
    /// Window end (RFC 3339, exclusive)
    pub end: Option<DateTime<Utc>>,
    /// Comma-separated asset ids
    pub asset_id: Option<String>,
    pub location: Option<String>,
    pub role: Option<String>,
    /// Reference date for the current-month budget; defaults to now
    pub as_of: Option<DateTime<Utc>>,
}

impl AnalyticsParams {
    fn filter(&self) -> AnalyticsFilter {
        let mut filter = AnalyticsFilter::new();
        if let Some(ids) = &self.asset_id {
            filter = filter.with_asset_ids(
                ids.split(',')
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .map(str::to_string)
                    .collect(),
            );
        }
        if let Some(location) = &self.location {
            filter = filter.with_location(location.clone());
        }
        if let Some(role) = &self.role {
            filter = filter.with_role(role.clone());
        }
        filter
    }

    fn window(&self, state: &AppState, now: DateTime<Utc>) -> Result<AnalysisWindow> {
        let days = state.engine.config().default_window_days;
        let window = match (self.start, self.end) {
            (Some(start), Some(end)) => AnalysisWindow::new(start, end)?,
            (Some(start), None) => AnalysisWindow::new(start, now)?,
            (None, Some(end)) => AnalysisWindow::trailing_days(end, days)?,
            (None, None) => state.engine.default_window(now)?,
        };
        Ok(window)
    }

    fn query(&self, state: &AppState) -> Result<AnalyticsQuery> {
        let now = Utc::now();
        Ok(AnalyticsQuery::new(self.window(state, now)?)
            .with_filter(self.filter())
            .with_as_of(self.as_of.unwrap_or(now)))
    }
}

#[derive(Debug, Deserialize)]
pub struct DimensionParam {
    pub dimension: Option<String>,
}

/// MTBF per machine
pub async fn get_mtbf(
    State(state): State<AppState>,
    Query(params): Query<AnalyticsParams>,
) -> Result<Json<MtbfReport>> {
    let query = params.query(&state)?;
    Ok(Json(state.engine.mtbf(&query).await?))
}

/// MTTR per machine
pub async fn get_mttr(
    State(state): State<AppState>,
    Query(params): Query<AnalyticsParams>,
) -> Result<Json<MttrReport>> {
    let query = params.query(&state)?;
    Ok(Json(state.engine.mttr(&query).await?))
}

/// Pareto classification; `dimension` defaults to `causes`
pub async fn get_pareto(
    State(state): State<AppState>,
    Query(params): Query<AnalyticsParams>,
    Query(dimension): Query<DimensionParam>,
) -> Result<Json<ParetoReport>> {
    let dimension = match dimension.dimension.as_deref() {
        Some(value) => ParetoDimension::from_str(value).map_err(|_| {
            AppError::Validation(format!(
                "Unknown Pareto dimension '{}'; expected machines, causes, downtime or costs",
                value
            ))
        })?,
        None => ParetoDimension::Causes,
    };

    let query = params.query(&state)?;
    Ok(Json(state.engine.pareto(&query, dimension).await?))
}

/// Breakdowns per cause category
pub async fn get_failure_modes(
    State(state): State<AppState>,
    Query(params): Query<AnalyticsParams>,
) -> Result<Json<FailureModeReport>> {
    let query = params.query(&state)?;
    Ok(Json(state.engine.failure_modes(&query).await?))
}

/// Next-failure forecasts; the window parameters are ignored
pub async fn get_predictions(
    State(state): State<AppState>,
    Query(params): Query<AnalyticsParams>,
) -> Result<Json<PredictionReport>> {
    let now = params.as_of.unwrap_or_else(Utc::now);
    Ok(Json(state.engine.predictions(&params.filter(), now).await?))
}

/// Cost totals with the current month's budget comparison
pub async fn get_cost_summary(
    State(state): State<AppState>,
    Query(params): Query<AnalyticsParams>,
) -> Result<Json<CostSummary>> {
    let query = params.query(&state)?;
    Ok(Json(state.engine.cost_summary(&query).await?))
}

/// Budget against actual for each budgeted month of a year
pub async fn get_budget_variance(
    State(state): State<AppState>,
    Path(year): Path<i32>,
) -> Result<Json<BudgetVarianceReport>> {
    Ok(Json(state.engine.budget_variance(year).await?))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateEventRequest {
    #[validate(length(min = 1, max = 255))]
    pub asset_id: String,
    pub event_type: EventType,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub cause_category_id: Option<String>,
    #[serde(default)]
    pub labor_hours: f64,
    #[serde(default)]
    pub overtime_hours: f64,
    pub technician_id: Option<String>,
    pub technician_role: Option<String>,
    #[serde(default)]
    pub parts_cost: f64,
    #[serde(default)]
    pub external_cost: f64,
    #[serde(default)]
    pub downtime_hours: f64,
}

impl From<CreateEventRequest> for MaintenanceEvent {
    fn from(request: CreateEventRequest) -> Self {
        let mut event = MaintenanceEvent::new(request.asset_id, request.event_type, request.started_at)
            .with_labor(request.labor_hours, request.overtime_hours)
            .with_technician(request.technician_id, request.technician_role)
            .with_costs(request.parts_cost, request.external_cost)
            .with_downtime(request.downtime_hours);
        event.ended_at = request.ended_at;
        event.cause_category_id = request.cause_category_id;
        event
    }
}

/// Record a maintenance event
pub async fn create_event(
    State(state): State<AppState>,
    Json(request): Json<CreateEventRequest>,
) -> Result<(StatusCode, Json<MaintenanceEvent>)> {
    request.validate()?;

    let event = MaintenanceEvent::from(request);
    integrity::validate_event(&event)?;

    let result = state.store.save_event(&event).await;
    metrics::record_storage("save_event", result.is_ok());
    result?;

    tracing::info!(
        event_id = %event.id,
        asset_id = %event.asset_id,
        event_type = %event.event_type,
        "Maintenance event recorded"
    );

    Ok((StatusCode::CREATED, Json(event)))
}

/// Fetch a single maintenance event
pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MaintenanceEvent>> {
    let result = state.store.get_event(&id).await;
    metrics::record_storage("get_event", result.is_ok());

    result?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Maintenance event {}", id)))
}

/// Register or update an asset
pub async fn create_asset(
    State(state): State<AppState>,
    Json(asset): Json<Asset>,
) -> Result<(StatusCode, Json<Asset>)> {
    asset.validate()?;

    let result = state.store.save_asset(&asset).await;
    metrics::record_storage("save_asset", result.is_ok());
    result?;

    Ok((StatusCode::CREATED, Json(asset)))
}

/// Register or rename a cause category
pub async fn create_category(
    State(state): State<AppState>,
    Json(category): Json<CauseCategory>,
) -> Result<(StatusCode, Json<CauseCategory>)> {
    category.validate()?;

    let result = state.store.save_category(&category).await;
    metrics::record_storage("save_category", result.is_ok());
    result?;

    Ok((StatusCode::CREATED, Json(category)))
}

/// Create a monthly budget; a month can only be budgeted once
pub async fn create_budget(
    State(state): State<AppState>,
    Json(budget): Json<BudgetPeriod>,
) -> Result<(StatusCode, Json<BudgetPeriod>)> {
    budget.validate()?;

    let result = state.store.save_budget(&budget).await;
    metrics::record_storage("save_budget", result.is_ok());
    result?;

    tracing::info!(year = budget.year, month = budget.month, "Budget period created");
    Ok((StatusCode::CREATED, Json(budget)))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateLaborRateRequest {
    pub scope: RateScope,
    #[validate(range(min = 0.0))]
    pub hourly_rate: f64,
    #[validate(range(min = 1.0))]
    pub overtime_multiplier: Option<f64>,
    pub effective_from: NaiveDate,
    pub effective_to: Option<NaiveDate>,
}

/// Add an effective-dated labor rate
///
/// Overlapping windows are accepted here and reported by the analytics
/// endpoints, which refuse to price labor against ambiguous rates.
pub async fn create_labor_rate(
    State(state): State<AppState>,
    Json(request): Json<CreateLaborRateRequest>,
) -> Result<(StatusCode, Json<LaborRate>)> {
    request.validate()?;

    let mut rate = LaborRate::new(request.scope, request.hourly_rate, request.effective_from);
    rate.overtime_multiplier = request.overtime_multiplier;
    rate.effective_to = request.effective_to;

    if !rate.has_valid_window() {
        return Err(AppError::Validation(
            "effective_to must be after effective_from".to_string(),
        ));
    }

    let result = state.store.save_labor_rate(&rate).await;
    metrics::record_storage("save_labor_rate", result.is_ok());
    result?;

    tracing::info!(rate_id = %rate.id, scope = %rate.scope, "Labor rate created");
    Ok((StatusCode::CREATED, Json(rate)))
}

/// Record the operating hours of an asset for a day
pub async fn record_operating_hours(
    State(state): State<AppState>,
    Json(entry): Json<OperatingHoursEntry>,
) -> Result<(StatusCode, Json<OperatingHoursEntry>)> {
    entry.validate()?;

    let result = state.store.save_operating_hours(&entry).await;
    metrics::record_storage("save_operating_hours", result.is_ok());
    result?;

    Ok((StatusCode::CREATED, Json(entry)))
}
