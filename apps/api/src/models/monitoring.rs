use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One field sensor reading.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct SensorReading {
    pub id: i64,
    pub sensor_type: String,
    pub value: f64,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(rename = "timestamp")]
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewSensorReading {
    pub sensor_type: String,
    pub value: f64,
    pub latitude: f64,
    pub longitude: f64,
}

/// Selection for sensor listings. Bounds are inclusive.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorFilter {
    pub sensor_type: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub limit: i64,
}

impl SensorFilter {
    pub fn admits(&self, reading: &SensorReading) -> bool {
        self.sensor_type
            .as_deref()
            .map_or(true, |t| reading.sensor_type == t)
            && self.start.map_or(true, |s| reading.recorded_at >= s)
            && self.end.map_or(true, |e| reading.recorded_at <= e)
    }
}

/// A reported alert, pinned to the coordinates its location resolved to.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct DisasterAlert {
    #[serde(rename = "alert_id")]
    pub id: i64,
    pub alert_type: String,
    pub severity: String,
    pub description: String,
    pub location: String,
    pub latitude: f64,
    pub longitude: f64,
    pub issued_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewAlert {
    pub alert_type: String,
    pub severity: String,
    pub description: String,
    pub location: String,
}

/// One page of alerts, newest first, plus the total across all pages.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertPage {
    pub alerts: Vec<DisasterAlert>,
    pub total: i64,
}
