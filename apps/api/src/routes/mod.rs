pub mod health;

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::assignment::handlers as assignment;
use crate::ingest::handlers as ingest;
use crate::monitoring::handlers as monitoring;
use crate::state::AppState;
use crate::views::handlers as views;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Ingestion
        .route("/api/v1/reports/reload", post(ingest::handle_reload_reports))
        .route(
            "/api/v1/zones/coordinates/refresh",
            post(ingest::handle_refresh_coordinates),
        )
        // Dashboard views
        .route("/api/v1/zones", get(views::handle_zone_summaries))
        .route("/api/v1/zones/heatmap", get(views::handle_heatmap))
        .route("/api/v1/zones/risk", get(views::handle_risk_zones))
        .route(
            "/api/v1/zones/locations",
            get(views::handle_location_summaries),
        )
        .route(
            "/api/v1/zones/historical-risk",
            get(views::handle_historical_risk),
        )
        .route("/api/v1/categories", get(views::handle_categories))
        // Resources & volunteers
        .route(
            "/api/v1/resources",
            post(assignment::handle_create_resource).get(assignment::handle_list_resources),
        )
        .route(
            "/api/v1/resources/:id",
            delete(assignment::handle_delete_resource),
        )
        .route(
            "/api/v1/volunteers",
            post(assignment::handle_create_volunteer).get(assignment::handle_list_volunteers),
        )
        .route(
            "/api/v1/volunteers/:id",
            delete(assignment::handle_delete_volunteer),
        )
        // Assignments
        .route(
            "/api/v1/assignments",
            post(assignment::handle_create_assignment).get(assignment::handle_list_assignments),
        )
        .route("/api/v1/assignments/auto", post(assignment::handle_auto_assign))
        .route(
            "/api/v1/assignments/auto/drain",
            post(assignment::handle_drain_auto_assign),
        )
        // Alerts & sensor data
        .route("/api/v1/alerts", get(monitoring::handle_list_alerts))
        .route("/api/v1/alerts/report", post(monitoring::handle_report_alert))
        .route(
            "/api/v1/sensor-data",
            post(monitoring::handle_create_sensor_reading)
                .get(monitoring::handle_list_sensor_readings),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::assignment::memory::MemoryStore;
    use crate::assignment::store::{ReliefStore, StoreError};
    use crate::config::Config;
    use crate::geo::coordinates::ZoneCoordinates;
    use crate::geo::resolver::CoordinateResolver;
    use crate::geo::{GeoPoint, GeocodeError, Geocoder};
    use crate::ingest::classifier::DisasterClassifier;
    use crate::ingest::index::{IncidentIndex, IncidentIndexHandle};
    use crate::ingest::records::RawReport;
    use crate::models::monitoring::{
        AlertPage, DisasterAlert, NewAlert, NewSensorReading, SensorFilter, SensorReading,
    };
    use crate::models::relief::{
        Assignment, AssignmentView, NewResource, NewVolunteer, Resource, Volunteer, ZoneCounts,
    };

    struct NoGeocoder;

    #[async_trait]
    impl Geocoder for NoGeocoder {
        async fn geocode(&self, _zone: &str) -> Result<Option<GeoPoint>, GeocodeError> {
            Ok(None)
        }
    }

    /// Knows Assam and nothing else.
    struct AssamGeocoder;

    #[async_trait]
    impl Geocoder for AssamGeocoder {
        async fn geocode(&self, zone: &str) -> Result<Option<GeoPoint>, GeocodeError> {
            Ok((zone == "Assam").then_some(GeoPoint {
                latitude: 26.2,
                longitude: 92.9,
            }))
        }
    }

    /// Memory store whose auto-assignment claim always fails at the storage layer.
    #[derive(Default)]
    struct FailingStore {
        inner: MemoryStore,
    }

    #[async_trait]
    impl ReliefStore for FailingStore {
        async fn create_resource(&self, new: NewResource) -> Result<Resource, StoreError> {
            self.inner.create_resource(new).await
        }
        async fn list_resources(&self) -> Result<Vec<Resource>, StoreError> {
            self.inner.list_resources().await
        }
        async fn delete_resource(&self, id: i64) -> Result<(), StoreError> {
            self.inner.delete_resource(id).await
        }
        async fn create_volunteer(&self, new: NewVolunteer) -> Result<Volunteer, StoreError> {
            self.inner.create_volunteer(new).await
        }
        async fn list_volunteers(&self) -> Result<Vec<Volunteer>, StoreError> {
            self.inner.list_volunteers().await
        }
        async fn delete_volunteer(&self, id: i64) -> Result<(), StoreError> {
            self.inner.delete_volunteer(id).await
        }
        async fn pair(
            &self,
            volunteer_id: i64,
            resource_id: i64,
            zone: &str,
        ) -> Result<Assignment, StoreError> {
            self.inner.pair(volunteer_id, resource_id, zone).await
        }
        async fn claim_first_match(
            &self,
            _ranked_zones: &[String],
        ) -> Result<Option<(Assignment, Volunteer, Resource)>, StoreError> {
            Err(StoreError::Storage(sqlx::Error::PoolTimedOut))
        }
        async fn list_assignments(&self) -> Result<Vec<AssignmentView>, StoreError> {
            self.inner.list_assignments().await
        }
        async fn zone_counts(&self) -> Result<HashMap<String, ZoneCounts>, StoreError> {
            self.inner.zone_counts().await
        }
        async fn create_alert(
            &self,
            new: NewAlert,
            at: GeoPoint,
        ) -> Result<DisasterAlert, StoreError> {
            self.inner.create_alert(new, at).await
        }
        async fn list_alerts(&self, offset: i64, limit: i64) -> Result<AlertPage, StoreError> {
            self.inner.list_alerts(offset, limit).await
        }
        async fn create_sensor_reading(
            &self,
            new: NewSensorReading,
        ) -> Result<SensorReading, StoreError> {
            self.inner.create_sensor_reading(new).await
        }
        async fn list_sensor_readings(
            &self,
            filter: &SensorFilter,
        ) -> Result<Vec<SensorReading>, StoreError> {
            self.inner.list_sensor_readings(filter).await
        }
    }

    fn sample_index() -> IncidentIndex {
        let reports: Vec<RawReport> = [
            "Flood in Assam kills 10",
            "Earthquake tremors felt in Assam",
            "Drought in Bihar",
        ]
        .iter()
        .map(|t| RawReport {
            title: t.to_string(),
            body: String::new(),
            date: None,
        })
        .collect();
        IncidentIndex::build(&reports, ZoneCoordinates::new(), &DisasterClassifier::default())
    }

    fn app_with(
        config: Config,
        store: Arc<dyn ReliefStore>,
        geocoder: Arc<dyn Geocoder>,
    ) -> Router {
        let state = AppState::new(
            config,
            IncidentIndexHandle::new(sample_index()),
            store,
            CoordinateResolver::new(geocoder, Duration::from_secs(1)),
        );
        build_router(state)
    }

    fn app() -> Router {
        app_with(
            Config::from_lookup(|_| None).unwrap(),
            Arc::new(MemoryStore::new()),
            Arc::new(NoGeocoder),
        )
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(match body {
                Some(v) => Body::from(v.to_string()),
                None => Body::empty(),
            })
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(&app(), "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["service"], "relief");
        assert_eq!(body["zones"], 2);
    }

    #[tokio::test]
    async fn test_create_resource_validation() {
        let app = app();
        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/resources",
            Some(json!({"resource_type": "water", "quantity": 0, "location": "Assam"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

        let (status, _) = send(
            &app,
            "POST",
            "/api/v1/resources",
            Some(json!({"resource_type": "water", "quantity": 5, "location": "Assam", "colour": "blue"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &app,
            "POST",
            "/api/v1/resources",
            Some(json!({"resource_type": "water", "location": "Assam"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_resource_lifecycle_and_severity_filter() {
        let app = app();
        for location in ["Assam", "Bihar"] {
            let (status, _) = send(
                &app,
                "POST",
                "/api/v1/resources",
                Some(json!({"resource_type": "food", "quantity": 10, "location": location})),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let (_, body) = send(&app, "GET", "/api/v1/resources?severity_min=2", None).await;
        let listed = body.as_array().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0]["location"], "Assam");
        assert_eq!(listed[0]["location_severity"], 2);

        let (status, _) = send(&app, "DELETE", "/api/v1/resources/1", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, body) = send(&app, "DELETE", "/api/v1/resources/1", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_auto_assign_step_then_no_match() {
        let app = app();
        send(
            &app,
            "POST",
            "/api/v1/volunteers",
            Some(json!({"name": "Asha", "contact": "555-0100", "location": "Assam"})),
        )
        .await;
        send(
            &app,
            "POST",
            "/api/v1/resources",
            Some(json!({"resource_type": "water", "quantity": 50, "location": "Assam"})),
        )
        .await;

        let (status, body) = send(&app, "POST", "/api/v1/assignments/auto", None).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["zone"], "Assam");
        assert_eq!(body["volunteer_name"], "Asha");
        assert_eq!(body["resource_type"], "water");

        let (status, body) = send(&app, "POST", "/api/v1/assignments/auto", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NO_MATCH");

        let (_, body) = send(&app, "GET", "/api/v1/assignments", None).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["volunteer"]["name"], "Asha");
    }

    #[tokio::test]
    async fn test_manual_assignment_unknown_ids() {
        let (status, body) = send(
            &app(),
            "POST",
            "/api/v1/assignments",
            Some(json!({"volunteer_id": 1, "resource_id": 1, "zone": "Assam"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["message"], "Volunteer 1 not found");
    }

    #[tokio::test]
    async fn test_drain_reports_every_assignment() {
        let app = app();
        for (name, location) in [("Asha", "Assam"), ("Ravi", "Bihar")] {
            send(
                &app,
                "POST",
                "/api/v1/volunteers",
                Some(json!({"name": name, "contact": "555-0100", "location": location})),
            )
            .await;
            send(
                &app,
                "POST",
                "/api/v1/resources",
                Some(json!({"resource_type": "tents", "quantity": 4, "location": location})),
            )
            .await;
        }

        let (status, body) = send(&app, "POST", "/api/v1/assignments/auto/drain", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["created"], 2);
        assert_eq!(body["assignments"][0]["zone"], "Assam");
        assert_eq!(body["assignments"][1]["zone"], "Bihar");
    }

    #[tokio::test]
    async fn test_zone_views() {
        let app = app();
        let (status, body) = send(&app, "GET", "/api/v1/zones", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["zone"], "Assam");
        assert_eq!(body[0]["severity"], 2);
        assert_eq!(body[0]["categories"], json!(["Earthquake", "Flood"]));
        assert_eq!(body[0]["coordinates"], Value::Null);

        let (_, body) = send(&app, "GET", "/api/v1/zones/heatmap", None).await;
        assert_eq!(body, json!([]));

        let (_, body) = send(&app, "GET", "/api/v1/zones/locations", None).await;
        assert_eq!(body[1]["location"], "Bihar");
        assert_eq!(body[1]["coords"], json!([null, null]));
    }

    #[tokio::test]
    async fn test_historical_risk_rejects_unknown_category() {
        let (status, body) = send(
            &app(),
            "GET",
            "/api/v1/zones/historical-risk?disaster_type=Meteor",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_categories() {
        let (_, body) = send(&app(), "GET", "/api/v1/categories", None).await;
        let names = body.as_array().unwrap();
        assert_eq!(names.len(), 15);
        assert!(names.contains(&json!("Cold Wave")));
    }

    #[tokio::test]
    async fn test_severity_min_accepts_fractional_and_negative() {
        let app = app();
        for location in ["Assam", "Bihar"] {
            send(
                &app,
                "POST",
                "/api/v1/volunteers",
                Some(json!({"name": "Asha", "contact": "555-0100", "location": location})),
            )
            .await;
        }

        let (status, body) = send(&app, "GET", "/api/v1/volunteers?severity_min=1.5", None).await;
        assert_eq!(status, StatusCode::OK);
        let listed = body.as_array().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0]["location"], "Assam");

        let (status, body) = send(&app, "GET", "/api/v1/volunteers?severity_min=-1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 2);

        let (status, _) = send(&app, "GET", "/api/v1/volunteers?severity_min=high", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_auto_assign_storage_failure_leaves_state_unchanged() {
        let store = Arc::new(FailingStore::default());
        let app = app_with(
            Config::from_lookup(|_| None).unwrap(),
            store.clone(),
            Arc::new(NoGeocoder),
        );
        send(
            &app,
            "POST",
            "/api/v1/volunteers",
            Some(json!({"name": "Asha", "contact": "555-0100", "location": "Assam"})),
        )
        .await;
        send(
            &app,
            "POST",
            "/api/v1/resources",
            Some(json!({"resource_type": "water", "quantity": 50, "location": "Assam"})),
        )
        .await;

        let (status, body) = send(&app, "POST", "/api/v1/assignments/auto", None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "STORAGE_FAILURE");

        let volunteers = store.inner.list_volunteers().await.unwrap();
        assert!(volunteers[0].available);
        assert_eq!(volunteers[0].assigned_zone, None);
        assert!(!store.inner.list_resources().await.unwrap()[0].assigned);
        assert!(store.inner.list_assignments().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reload_reports_swaps_index() {
        let dir = tempfile::tempdir().unwrap();
        let reports_path = dir.path().join("reports.json");
        let coordinates_path = dir.path().join("coords.json");
        std::fs::write(
            &reports_path,
            r#"[{"Title": "Drought in Bihar"}, {"Title": "Flood in Bihar"}]"#,
        )
        .unwrap();

        let paths = [
            ("REPORTS_PATH", reports_path.display().to_string()),
            ("COORDINATES_PATH", coordinates_path.display().to_string()),
        ];
        let config = Config::from_lookup(|key| {
            paths
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.clone())
        })
        .unwrap();
        let app = app_with(config, Arc::new(MemoryStore::new()), Arc::new(NoGeocoder));

        let (status, body) = send(&app, "POST", "/api/v1/reports/reload", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["records"], 2);
        assert_eq!(body["zones"], 1);

        let (_, body) = send(&app, "GET", "/api/v1/zones", None).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["zone"], "Bihar");
        assert_eq!(body[0]["severity"], 2);

        // A broken file fails the reload and keeps the current index.
        std::fs::write(&reports_path, "not json").unwrap();
        let (status, body) = send(&app, "POST", "/api/v1/reports/reload", None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "INTERNAL_ERROR");
        let (_, body) = send(&app, "GET", "/api/v1/zones", None).await;
        assert_eq!(body[0]["zone"], "Bihar");
    }

    #[tokio::test(start_paused = true)]
    async fn test_alert_report_and_paged_listing() {
        let app = app_with(
            Config::from_lookup(|_| None).unwrap(),
            Arc::new(MemoryStore::new()),
            Arc::new(AssamGeocoder),
        );
        let alert = |alert_type: &str, location: &str| {
            json!({
                "alert_type": alert_type,
                "severity": "high",
                "description": "River above danger mark",
                "location": location,
            })
        };

        let (status, body) = send(&app, "POST", "/api/v1/alerts/report", Some(alert("flood", "Assam"))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["alert_id"], 1);
        assert_eq!(body["latitude"], 26.2);
        assert_eq!(body["longitude"], 92.9);

        let (status, body) = send(&app, "POST", "/api/v1/alerts/report", Some(alert("flood", "Atlantis"))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"]["message"],
            "Could not determine coordinates for location: Atlantis"
        );

        let (status, _) = send(
            &app,
            "POST",
            "/api/v1/alerts/report",
            Some(json!({"alert_type": "flood", "severity": "high", "location": "Assam"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(&app, "POST", "/api/v1/alerts/report", Some(alert(" ", "Assam"))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], "alert_type cannot be empty");

        for kind in ["cyclone", "landslide"] {
            let (status, _) = send(&app, "POST", "/api/v1/alerts/report", Some(alert(kind, "Assam"))).await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let (status, body) = send(&app, "GET", "/api/v1/alerts?per_page=2", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 3);
        assert_eq!(body["page"], 1);
        assert_eq!(body["per_page"], 2);
        assert_eq!(body["pages"], 2);
        assert_eq!(body["alerts"][0]["alert_type"], "landslide");
        assert_eq!(body["alerts"][1]["alert_type"], "cyclone");

        let (_, body) = send(&app, "GET", "/api/v1/alerts?page=2&per_page=2", None).await;
        assert_eq!(body["alerts"].as_array().unwrap().len(), 1);
        assert_eq!(body["alerts"][0]["alert_type"], "flood");

        let (status, _) = send(&app, "GET", "/api/v1/alerts?page=0", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = send(&app, "GET", "/api/v1/alerts?per_page=500", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_sensor_data_create_and_filter() {
        let app = app();
        for (sensor_type, value) in [("rainfall", 12.5), ("river_level", 7.1), ("rainfall", 30.0)] {
            let (status, body) = send(
                &app,
                "POST",
                "/api/v1/sensor-data",
                Some(json!({
                    "sensor_type": sensor_type,
                    "value": value,
                    "latitude": 26.2,
                    "longitude": 92.9,
                })),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
            assert!(body["timestamp"].is_string());
        }

        let (status, _) = send(
            &app,
            "POST",
            "/api/v1/sensor-data",
            Some(json!({"sensor_type": "rainfall", "latitude": 26.2, "longitude": 92.9})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &app,
            "POST",
            "/api/v1/sensor-data",
            Some(json!({"sensor_type": "rainfall", "value": 1.0, "latitude": 95.0, "longitude": 92.9})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(&app, "GET", "/api/v1/sensor-data?sensor_type=rainfall", None).await;
        assert_eq!(status, StatusCode::OK);
        let values: Vec<f64> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["value"].as_f64().unwrap())
            .collect();
        assert_eq!(values, vec![30.0, 12.5]);

        let (_, body) = send(&app, "GET", "/api/v1/sensor-data?start_date=2000-01-01", None).await;
        assert_eq!(body.as_array().unwrap().len(), 3);
        let (_, body) = send(&app, "GET", "/api/v1/sensor-data?end_date=2000-01-01", None).await;
        assert_eq!(body, json!([]));

        let (status, body) = send(&app, "GET", "/api/v1/sensor-data?start_date=soon", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], "Invalid start_date format");
    }
}
