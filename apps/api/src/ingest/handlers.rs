use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};
use tracing::error;

use crate::errors::AppError;
use crate::geo::refresh::refresh_coordinates;
use crate::ingest::index::{IncidentIndex, IngestStats};
use crate::state::AppState;

/// POST /api/v1/reports/reload
///
/// Re-reads the report and coordinates files and swaps in the rebuilt index.
/// Readers holding the previous snapshot are unaffected.
pub async fn handle_reload_reports(
    State(state): State<AppState>,
) -> Result<Json<IngestStats>, AppError> {
    let index = IncidentIndex::load_off_runtime(
        state.config.reports_path.clone(),
        state.config.coordinates_path.clone(),
    )
    .await?;
    let stats = index.stats();
    state.incidents.replace(index).await;
    Ok(Json(stats))
}

/// POST /api/v1/zones/coordinates/refresh
///
/// Geocoding is paced at one call per second, so the refresh runs in the
/// background and this returns immediately.
pub async fn handle_refresh_coordinates(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    tokio::spawn(async move {
        let result = refresh_coordinates(
            &state.coordinates,
            &state.incidents,
            &state.config.reports_path,
            &state.config.coordinates_path,
        )
        .await;
        if let Err(e) = result {
            error!("Coordinate refresh failed: {e:?}");
        }
    });

    (
        StatusCode::ACCEPTED,
        Json(json!({ "status": "refresh started" })),
    )
}
