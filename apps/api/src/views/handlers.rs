//! Axum route handlers for the dashboard views.

use axum::{extract::State, Json};

use crate::errors::AppError;
use crate::extract::ValidatedQuery;
use crate::ingest::classifier::DisasterCategory;
use crate::state::AppState;
use crate::views::historical::{analyze, HistoricalQuery, HistoricalRisk};
use crate::views::zones::{
    heatmap_points, location_summaries, risk_zones, zone_summaries, HeatmapPoint, LocationSummary,
    RiskZone, ZoneSummary,
};

/// GET /api/v1/zones
pub async fn handle_zone_summaries(State(state): State<AppState>) -> Json<Vec<ZoneSummary>> {
    let index = state.incidents.snapshot().await;
    Json(zone_summaries(&index))
}

/// GET /api/v1/zones/heatmap
pub async fn handle_heatmap(State(state): State<AppState>) -> Json<Vec<HeatmapPoint>> {
    let index = state.incidents.snapshot().await;
    Json(heatmap_points(&index))
}

/// GET /api/v1/zones/risk
pub async fn handle_risk_zones(State(state): State<AppState>) -> Json<Vec<RiskZone>> {
    let index = state.incidents.snapshot().await;
    Json(risk_zones(&index))
}

/// GET /api/v1/zones/locations
///
/// Severity per zone alongside how many volunteers, resources and assignments sit there.
pub async fn handle_location_summaries(
    State(state): State<AppState>,
) -> Result<Json<Vec<LocationSummary>>, AppError> {
    let index = state.incidents.snapshot().await;
    let counts = state.store.zone_counts().await?;
    Ok(Json(location_summaries(&index, &counts)))
}

/// GET /api/v1/zones/historical-risk
pub async fn handle_historical_risk(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<HistoricalQuery>,
) -> Result<Json<HistoricalRisk>, AppError> {
    let index = state.incidents.snapshot().await;
    let risk = analyze(&index, &query).map_err(|e| AppError::Validation(e.to_string()))?;
    Ok(Json(risk))
}

/// GET /api/v1/categories
pub async fn handle_categories() -> Json<Vec<&'static str>> {
    Json(DisasterCategory::ALL.iter().map(DisasterCategory::as_str).collect())
}
