use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use tracing::debug;

use crate::assignment::store::{ReliefStore, StoreError};
use crate::geo::GeoPoint;
use crate::models::monitoring::{
    AlertPage, DisasterAlert, NewAlert, NewSensorReading, SensorFilter, SensorReading,
};
use crate::models::relief::{
    Assignment, AssignmentView, NewResource, NewVolunteer, Resource, ResourceSummary, Volunteer,
    VolunteerSummary, ZoneCounts,
};

const RESOURCE_COLUMNS: &str = "id, resource_type, quantity, location, assigned, created_at";
const VOLUNTEER_COLUMNS: &str =
    "id, name, contact, location, available, assigned_zone, assistance_type";
const ASSIGNMENT_COLUMNS: &str = "id, zone, resource_id, volunteer_id, assigned_at";
const ALERT_COLUMNS: &str =
    "id, alert_type, severity, description, location, latitude, longitude, issued_at";
const SENSOR_COLUMNS: &str = "id, sensor_type, value, latitude, longitude, recorded_at";

#[derive(Debug, FromRow)]
struct AssignmentJoinRow {
    id: i64,
    zone: String,
    assigned_at: chrono::DateTime<chrono::Utc>,
    volunteer_id: i64,
    resource_id: i64,
    v_id: Option<i64>,
    v_name: Option<String>,
    v_assistance_type: Option<String>,
    r_id: Option<i64>,
    r_resource_type: Option<String>,
}

impl From<AssignmentJoinRow> for AssignmentView {
    fn from(row: AssignmentJoinRow) -> Self {
        let volunteer = match (row.v_id, row.v_name) {
            (Some(id), Some(name)) => Some(VolunteerSummary {
                id,
                name,
                assistance_type: row.v_assistance_type,
            }),
            _ => None,
        };
        let resource = match (row.r_id, row.r_resource_type) {
            (Some(id), Some(resource_type)) => Some(ResourceSummary { id, resource_type }),
            _ => None,
        };
        AssignmentView {
            id: row.id,
            zone: row.zone,
            assigned_at: row.assigned_at,
            volunteer_id: row.volunteer_id,
            volunteer,
            resource_id: row.resource_id,
            resource,
        }
    }
}

/// Postgres-backed store. Mutating operations run in a transaction that locks
/// the rows they touch; dropping the transaction on any error rolls it back.
#[derive(Clone)]
pub struct PgReliefStore {
    pool: PgPool,
}

impl PgReliefStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn count_by(&self, sql: &str) -> Result<Vec<(String, i64)>, StoreError> {
        Ok(sqlx::query_as::<_, (String, i64)>(sql)
            .fetch_all(&self.pool)
            .await?)
    }
}

#[async_trait]
impl ReliefStore for PgReliefStore {
    async fn create_resource(&self, new: NewResource) -> Result<Resource, StoreError> {
        let sql = format!(
            "INSERT INTO resources (resource_type, quantity, location) VALUES ($1, $2, $3) RETURNING {RESOURCE_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Resource>(&sql)
            .bind(&new.resource_type)
            .bind(new.quantity)
            .bind(&new.location)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn list_resources(&self) -> Result<Vec<Resource>, StoreError> {
        let sql = format!("SELECT {RESOURCE_COLUMNS} FROM resources ORDER BY id");
        Ok(sqlx::query_as::<_, Resource>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn delete_resource(&self, id: i64) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM resources WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("Resource {id}")));
        }
        Ok(())
    }

    async fn create_volunteer(&self, new: NewVolunteer) -> Result<Volunteer, StoreError> {
        let sql = format!(
            r#"
            INSERT INTO volunteers (name, contact, location, available, assigned_zone, assistance_type)
            VALUES ($1, $2, $3, TRUE, $4, $5)
            RETURNING {VOLUNTEER_COLUMNS}
            "#
        );
        Ok(sqlx::query_as::<_, Volunteer>(&sql)
            .bind(&new.name)
            .bind(&new.contact)
            .bind(&new.location)
            .bind(&new.assigned_zone)
            .bind(&new.assistance_type)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn list_volunteers(&self) -> Result<Vec<Volunteer>, StoreError> {
        let sql = format!("SELECT {VOLUNTEER_COLUMNS} FROM volunteers ORDER BY id");
        Ok(sqlx::query_as::<_, Volunteer>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn delete_volunteer(&self, id: i64) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM volunteers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("Volunteer {id}")));
        }
        Ok(())
    }

    async fn pair(
        &self,
        volunteer_id: i64,
        resource_id: i64,
        zone: &str,
    ) -> Result<Assignment, StoreError> {
        let mut tx = self.pool.begin().await?;

        let volunteer: Option<i64> =
            sqlx::query_scalar("SELECT id FROM volunteers WHERE id = $1 FOR UPDATE")
                .bind(volunteer_id)
                .fetch_optional(&mut *tx)
                .await?;
        if volunteer.is_none() {
            return Err(StoreError::NotFound(format!("Volunteer {volunteer_id}")));
        }

        let resource: Option<i64> =
            sqlx::query_scalar("SELECT id FROM resources WHERE id = $1 FOR UPDATE")
                .bind(resource_id)
                .fetch_optional(&mut *tx)
                .await?;
        if resource.is_none() {
            return Err(StoreError::NotFound(format!("Resource {resource_id}")));
        }

        let sql = format!(
            "INSERT INTO assignments (zone, resource_id, volunteer_id) VALUES ($1, $2, $3) RETURNING {ASSIGNMENT_COLUMNS}"
        );
        let assignment = sqlx::query_as::<_, Assignment>(&sql)
            .bind(zone)
            .bind(resource_id)
            .bind(volunteer_id)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query("UPDATE resources SET assigned = TRUE WHERE id = $1")
            .bind(resource_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("UPDATE volunteers SET assigned_zone = $1 WHERE id = $2")
            .bind(zone)
            .bind(volunteer_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(assignment)
    }

    async fn claim_first_match(
        &self,
        ranked_zones: &[String],
    ) -> Result<Option<(Assignment, Volunteer, Resource)>, StoreError> {
        let mut tx = self.pool.begin().await?;

        // SKIP LOCKED: rows another attempt is holding are treated as taken, so two
        // concurrent attempts can never select the same volunteer or resource.
        let pick_volunteer = format!(
            r#"
            SELECT {VOLUNTEER_COLUMNS} FROM volunteers
            WHERE location = $1 AND available
            ORDER BY id
            LIMIT 1
            FOR UPDATE SKIP LOCKED
            "#
        );
        let pick_resource = format!(
            r#"
            SELECT {RESOURCE_COLUMNS} FROM resources
            WHERE location = $1 AND NOT assigned
            ORDER BY id
            LIMIT 1
            FOR UPDATE SKIP LOCKED
            "#
        );

        for zone in ranked_zones {
            let Some(volunteer) = sqlx::query_as::<_, Volunteer>(&pick_volunteer)
                .bind(zone)
                .fetch_optional(&mut *tx)
                .await?
            else {
                continue;
            };
            let Some(resource) = sqlx::query_as::<_, Resource>(&pick_resource)
                .bind(zone)
                .fetch_optional(&mut *tx)
                .await?
            else {
                continue;
            };

            let insert = format!(
                "INSERT INTO assignments (zone, resource_id, volunteer_id) VALUES ($1, $2, $3) RETURNING {ASSIGNMENT_COLUMNS}"
            );
            let assignment = sqlx::query_as::<_, Assignment>(&insert)
                .bind(zone)
                .bind(resource.id)
                .bind(volunteer.id)
                .fetch_one(&mut *tx)
                .await?;

            let update_volunteer = format!(
                "UPDATE volunteers SET available = FALSE, assigned_zone = $1 WHERE id = $2 RETURNING {VOLUNTEER_COLUMNS}"
            );
            let volunteer = sqlx::query_as::<_, Volunteer>(&update_volunteer)
                .bind(zone)
                .bind(volunteer.id)
                .fetch_one(&mut *tx)
                .await?;

            let update_resource = format!(
                "UPDATE resources SET assigned = TRUE WHERE id = $1 RETURNING {RESOURCE_COLUMNS}"
            );
            let resource = sqlx::query_as::<_, Resource>(&update_resource)
                .bind(resource.id)
                .fetch_one(&mut *tx)
                .await?;

            tx.commit().await?;
            return Ok(Some((assignment, volunteer, resource)));
        }

        debug!(zones = ranked_zones.len(), "No zone has a free volunteer and resource");
        tx.rollback().await?;
        Ok(None)
    }

    async fn list_assignments(&self) -> Result<Vec<AssignmentView>, StoreError> {
        let rows = sqlx::query_as::<_, AssignmentJoinRow>(
            r#"
            SELECT a.id, a.zone, a.assigned_at, a.volunteer_id, a.resource_id,
                   v.id AS v_id, v.name AS v_name, v.assistance_type AS v_assistance_type,
                   r.id AS r_id, r.resource_type AS r_resource_type
            FROM assignments a
            LEFT JOIN volunteers v ON v.id = a.volunteer_id
            LEFT JOIN resources r ON r.id = a.resource_id
            ORDER BY a.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(AssignmentView::from).collect())
    }

    async fn zone_counts(&self) -> Result<HashMap<String, ZoneCounts>, StoreError> {
        let mut counts: HashMap<String, ZoneCounts> = HashMap::new();
        for (zone, n) in self
            .count_by("SELECT location, COUNT(*) FROM volunteers GROUP BY location")
            .await?
        {
            counts.entry(zone).or_default().volunteers = n;
        }
        for (zone, n) in self
            .count_by("SELECT location, COUNT(*) FROM resources GROUP BY location")
            .await?
        {
            counts.entry(zone).or_default().resources = n;
        }
        for (zone, n) in self
            .count_by("SELECT zone, COUNT(*) FROM assignments GROUP BY zone")
            .await?
        {
            counts.entry(zone).or_default().assignments = n;
        }
        Ok(counts)
    }

    async fn create_alert(&self, new: NewAlert, at: GeoPoint) -> Result<DisasterAlert, StoreError> {
        let sql = format!(
            r#"
            INSERT INTO disaster_alerts (alert_type, severity, description, location, latitude, longitude)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {ALERT_COLUMNS}
            "#
        );
        Ok(sqlx::query_as::<_, DisasterAlert>(&sql)
            .bind(&new.alert_type)
            .bind(&new.severity)
            .bind(&new.description)
            .bind(&new.location)
            .bind(at.latitude)
            .bind(at.longitude)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn list_alerts(&self, offset: i64, limit: i64) -> Result<AlertPage, StoreError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM disaster_alerts")
            .fetch_one(&self.pool)
            .await?;
        let sql = format!(
            "SELECT {ALERT_COLUMNS} FROM disaster_alerts ORDER BY issued_at DESC, id DESC OFFSET $1 LIMIT $2"
        );
        let alerts = sqlx::query_as::<_, DisasterAlert>(&sql)
            .bind(offset)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(AlertPage { alerts, total })
    }

    async fn create_sensor_reading(
        &self,
        new: NewSensorReading,
    ) -> Result<SensorReading, StoreError> {
        let sql = format!(
            "INSERT INTO sensor_data (sensor_type, value, latitude, longitude) VALUES ($1, $2, $3, $4) RETURNING {SENSOR_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, SensorReading>(&sql)
            .bind(&new.sensor_type)
            .bind(new.value)
            .bind(new.latitude)
            .bind(new.longitude)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn list_sensor_readings(
        &self,
        filter: &SensorFilter,
    ) -> Result<Vec<SensorReading>, StoreError> {
        let sql = format!(
            r#"
            SELECT {SENSOR_COLUMNS} FROM sensor_data
            WHERE ($1::text IS NULL OR sensor_type = $1)
              AND ($2::timestamptz IS NULL OR recorded_at >= $2)
              AND ($3::timestamptz IS NULL OR recorded_at <= $3)
            ORDER BY recorded_at DESC, id DESC
            LIMIT $4
            "#
        );
        Ok(sqlx::query_as::<_, SensorReading>(&sql)
            .bind(&filter.sensor_type)
            .bind(filter.start)
            .bind(filter.end)
            .bind(filter.limit)
            .fetch_all(&self.pool)
            .await?)
    }
}
