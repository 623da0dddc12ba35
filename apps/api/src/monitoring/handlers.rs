//! Axum route handlers for disaster alerts and sensor readings.

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::extract::{optional_text, required_text, ValidatedJson, ValidatedQuery};
use crate::models::monitoring::{
    DisasterAlert, NewAlert, NewSensorReading, SensorFilter, SensorReading,
};
use crate::state::AppState;

const DEFAULT_PER_PAGE: i64 = 20;
const MAX_PER_PAGE: i64 = 100;
const SENSOR_LIST_LIMIT: i64 = 100;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AlertQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct AlertListResponse {
    pub alerts: Vec<DisasterAlert>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub pages: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SensorQuery {
    pub sensor_type: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Accepts RFC 3339, a naive `YYYY-MM-DDTHH:MM:SS[.f]` (read as UTC), or a bare
/// date meaning its midnight.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .map(|naive| Utc.from_utc_datetime(&naive))
}

fn timestamp_bound(field: &str, raw: Option<String>) -> Result<Option<DateTime<Utc>>, AppError> {
    optional_text(raw)
        .map(|v| {
            parse_timestamp(&v)
                .ok_or_else(|| AppError::Validation(format!("Invalid {field} format")))
        })
        .transpose()
}

fn coordinate(field: &str, value: f64, limit: f64) -> Result<f64, AppError> {
    if !value.is_finite() || value.abs() > limit {
        return Err(AppError::Validation(format!(
            "{field} must be between -{limit} and {limit}"
        )));
    }
    Ok(value)
}

/// Ceiling division; zero alerts is zero pages.
fn page_count(total: i64, per_page: i64) -> i64 {
    (total + per_page - 1) / per_page
}

// ────────────────────────────────────────────────────────────────────────────
// Alerts
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/alerts/report
///
/// The location must geocode; an alert is never stored without coordinates.
pub async fn handle_report_alert(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<NewAlert>,
) -> Result<(StatusCode, Json<DisasterAlert>), AppError> {
    let new = NewAlert {
        alert_type: required_text("alert_type", &req.alert_type)?,
        severity: required_text("severity", &req.severity)?,
        description: required_text("description", &req.description)?,
        location: required_text("location", &req.location)?,
    };

    let Some(point) = state.coordinates.resolve(&new.location).await else {
        return Err(AppError::Validation(format!(
            "Could not determine coordinates for location: {}",
            new.location
        )));
    };

    let alert = state.store.create_alert(new, point).await?;
    info!(alert_id = alert.id, location = %alert.location, "Alert reported");
    Ok((StatusCode::CREATED, Json(alert)))
}

/// GET /api/v1/alerts?page=N&per_page=M
pub async fn handle_list_alerts(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<AlertQuery>,
) -> Result<Json<AlertListResponse>, AppError> {
    let page = query.page.unwrap_or(1);
    if page < 1 {
        return Err(AppError::Validation("page must be at least 1".to_string()));
    }
    let per_page = query.per_page.unwrap_or(DEFAULT_PER_PAGE);
    if !(1..=MAX_PER_PAGE).contains(&per_page) {
        return Err(AppError::Validation(format!(
            "per_page must be between 1 and {MAX_PER_PAGE}"
        )));
    }

    let offset = (page - 1).saturating_mul(per_page);
    let listed = state.store.list_alerts(offset, per_page).await?;
    Ok(Json(AlertListResponse {
        pages: page_count(listed.total, per_page),
        alerts: listed.alerts,
        total: listed.total,
        page,
        per_page,
    }))
}

// ────────────────────────────────────────────────────────────────────────────
// Sensor data
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sensor-data
pub async fn handle_create_sensor_reading(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<NewSensorReading>,
) -> Result<(StatusCode, Json<SensorReading>), AppError> {
    if !req.value.is_finite() {
        return Err(AppError::Validation("value must be a finite number".to_string()));
    }
    let new = NewSensorReading {
        sensor_type: required_text("sensor_type", &req.sensor_type)?,
        value: req.value,
        latitude: coordinate("latitude", req.latitude, 90.0)?,
        longitude: coordinate("longitude", req.longitude, 180.0)?,
    };

    let reading = state.store.create_sensor_reading(new).await?;
    Ok((StatusCode::CREATED, Json(reading)))
}

/// GET /api/v1/sensor-data?sensor_type=T&start_date=D&end_date=D
///
/// Newest first, capped at 100 readings.
pub async fn handle_list_sensor_readings(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<SensorQuery>,
) -> Result<Json<Vec<SensorReading>>, AppError> {
    let filter = SensorFilter {
        sensor_type: optional_text(query.sensor_type),
        start: timestamp_bound("start_date", query.start_date)?,
        end: timestamp_bound("end_date", query.end_date)?,
        limit: SENSOR_LIST_LIMIT,
    };
    Ok(Json(state.store.list_sensor_readings(&filter).await?))
}
