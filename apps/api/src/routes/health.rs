use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Returns service status along with the size and age of the incident index.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let index = state.incidents.snapshot().await;
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "relief",
        "records": index.records.len(),
        "zones": index.severity.len(),
        "index_built_at": index.built_at,
    }))
}
