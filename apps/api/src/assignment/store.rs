use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

use crate::geo::GeoPoint;
use crate::models::monitoring::{
    AlertPage, DisasterAlert, NewAlert, NewSensorReading, SensorFilter, SensorReading,
};
use crate::models::relief::{
    Assignment, AssignmentView, NewResource, NewVolunteer, Resource, Volunteer, ZoneCounts,
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),

    /// The transaction was rolled back; nothing was written.
    #[error("storage failure: {0}")]
    Storage(#[from] sqlx::Error),
}

/// Persistence for resources, volunteers, assignments, alerts and sensor readings.
///
/// `pair` and `claim_first_match` are the only operations that mutate
/// `assigned` / `available` / `assigned_zone`, and each runs as one atomic unit
/// with respect to every other call on the same store.
#[async_trait]
pub trait ReliefStore: Send + Sync {
    async fn create_resource(&self, new: NewResource) -> Result<Resource, StoreError>;

    /// All resources, lowest id first.
    async fn list_resources(&self) -> Result<Vec<Resource>, StoreError>;

    async fn delete_resource(&self, id: i64) -> Result<(), StoreError>;

    async fn create_volunteer(&self, new: NewVolunteer) -> Result<Volunteer, StoreError>;

    /// All volunteers, lowest id first.
    async fn list_volunteers(&self) -> Result<Vec<Volunteer>, StoreError>;

    async fn delete_volunteer(&self, id: i64) -> Result<(), StoreError>;

    /// Manual pairing. Both ids must exist; availability is not checked. Marks the
    /// resource assigned and sets the volunteer's zone, leaving `available` as is.
    async fn pair(
        &self,
        volunteer_id: i64,
        resource_id: i64,
        zone: &str,
    ) -> Result<Assignment, StoreError>;

    /// Walks `ranked_zones` in order and commits the first zone holding both an
    /// available volunteer and an unassigned resource (lowest ids win).
    /// Performs at most one assignment; `None` when no zone qualifies.
    async fn claim_first_match(
        &self,
        ranked_zones: &[String],
    ) -> Result<Option<(Assignment, Volunteer, Resource)>, StoreError>;

    /// Assignments in id order, each resolved against current entities.
    async fn list_assignments(&self) -> Result<Vec<AssignmentView>, StoreError>;

    async fn zone_counts(&self) -> Result<HashMap<String, ZoneCounts>, StoreError>;

    async fn create_alert(&self, new: NewAlert, at: GeoPoint) -> Result<DisasterAlert, StoreError>;

    /// Newest first. `offset`/`limit` select one page; `total` counts every alert.
    async fn list_alerts(&self, offset: i64, limit: i64) -> Result<AlertPage, StoreError>;

    async fn create_sensor_reading(
        &self,
        new: NewSensorReading,
    ) -> Result<SensorReading, StoreError>;

    /// Newest first, at most `filter.limit` rows.
    async fn list_sensor_readings(
        &self,
        filter: &SensorFilter,
    ) -> Result<Vec<SensorReading>, StoreError>;
}
