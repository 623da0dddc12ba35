use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use crate::assignment::store::{ReliefStore, StoreError};
use crate::geo::GeoPoint;
use crate::models::monitoring::{
    AlertPage, DisasterAlert, NewAlert, NewSensorReading, SensorFilter, SensorReading,
};
use crate::models::relief::{
    Assignment, AssignmentView, NewResource, NewVolunteer, Resource, ResourceSummary, Volunteer,
    VolunteerSummary, ZoneCounts,
};

#[derive(Debug, Default)]
struct Tables {
    resources: BTreeMap<i64, Resource>,
    volunteers: BTreeMap<i64, Volunteer>,
    assignments: BTreeMap<i64, Assignment>,
    alerts: BTreeMap<i64, DisasterAlert>,
    sensor_readings: BTreeMap<i64, SensorReading>,
    next_resource_id: i64,
    next_volunteer_id: i64,
    next_assignment_id: i64,
    next_alert_id: i64,
    next_sensor_reading_id: i64,
}

impl Tables {
    fn next_id(counter: &mut i64) -> i64 {
        *counter += 1;
        *counter
    }
}

/// In-process store used when no database is configured.
///
/// One mutex guards every table, so every operation (including the
/// select-then-mutate of auto-assignment) is serialized.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReliefStore for MemoryStore {
    async fn create_resource(&self, new: NewResource) -> Result<Resource, StoreError> {
        let mut t = self.tables.lock().await;
        let id = Tables::next_id(&mut t.next_resource_id);
        let resource = Resource {
            id,
            resource_type: new.resource_type,
            quantity: new.quantity,
            location: new.location,
            assigned: false,
            created_at: Utc::now(),
        };
        t.resources.insert(id, resource.clone());
        Ok(resource)
    }

    async fn list_resources(&self) -> Result<Vec<Resource>, StoreError> {
        Ok(self.tables.lock().await.resources.values().cloned().collect())
    }

    async fn delete_resource(&self, id: i64) -> Result<(), StoreError> {
        self.tables
            .lock()
            .await
            .resources
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("Resource {id}")))
    }

    async fn create_volunteer(&self, new: NewVolunteer) -> Result<Volunteer, StoreError> {
        let mut t = self.tables.lock().await;
        let id = Tables::next_id(&mut t.next_volunteer_id);
        let volunteer = Volunteer {
            id,
            name: new.name,
            contact: new.contact,
            location: new.location,
            available: true,
            assigned_zone: new.assigned_zone,
            assistance_type: new.assistance_type,
        };
        t.volunteers.insert(id, volunteer.clone());
        Ok(volunteer)
    }

    async fn list_volunteers(&self) -> Result<Vec<Volunteer>, StoreError> {
        Ok(self.tables.lock().await.volunteers.values().cloned().collect())
    }

    async fn delete_volunteer(&self, id: i64) -> Result<(), StoreError> {
        self.tables
            .lock()
            .await
            .volunteers
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("Volunteer {id}")))
    }

    async fn pair(
        &self,
        volunteer_id: i64,
        resource_id: i64,
        zone: &str,
    ) -> Result<Assignment, StoreError> {
        let mut guard = self.tables.lock().await;
        let t = &mut *guard;

        // Check both before touching either, so a miss leaves no partial state.
        if !t.volunteers.contains_key(&volunteer_id) {
            return Err(StoreError::NotFound(format!("Volunteer {volunteer_id}")));
        }
        if !t.resources.contains_key(&resource_id) {
            return Err(StoreError::NotFound(format!("Resource {resource_id}")));
        }

        let id = Tables::next_id(&mut t.next_assignment_id);
        let assignment = Assignment {
            id,
            zone: zone.to_string(),
            resource_id,
            volunteer_id,
            assigned_at: Utc::now(),
        };
        if let Some(resource) = t.resources.get_mut(&resource_id) {
            resource.assigned = true;
        }
        if let Some(volunteer) = t.volunteers.get_mut(&volunteer_id) {
            volunteer.assigned_zone = Some(zone.to_string());
        }
        t.assignments.insert(id, assignment.clone());
        Ok(assignment)
    }

    async fn claim_first_match(
        &self,
        ranked_zones: &[String],
    ) -> Result<Option<(Assignment, Volunteer, Resource)>, StoreError> {
        let mut guard = self.tables.lock().await;
        let t = &mut *guard;

        for zone in ranked_zones {
            let volunteer_id = t
                .volunteers
                .values()
                .find(|v| v.available && &v.location == zone)
                .map(|v| v.id);
            let resource_id = t
                .resources
                .values()
                .find(|r| !r.assigned && &r.location == zone)
                .map(|r| r.id);

            let (Some(volunteer_id), Some(resource_id)) = (volunteer_id, resource_id) else {
                continue;
            };

            let (Some(volunteer), Some(resource)) = (
                t.volunteers.get_mut(&volunteer_id),
                t.resources.get_mut(&resource_id),
            ) else {
                continue;
            };
            volunteer.available = false;
            volunteer.assigned_zone = Some(zone.clone());
            resource.assigned = true;
            let (volunteer, resource) = (volunteer.clone(), resource.clone());

            let id = Tables::next_id(&mut t.next_assignment_id);
            let assignment = Assignment {
                id,
                zone: zone.clone(),
                resource_id,
                volunteer_id,
                assigned_at: Utc::now(),
            };
            t.assignments.insert(id, assignment.clone());
            return Ok(Some((assignment, volunteer, resource)));
        }

        Ok(None)
    }

    async fn list_assignments(&self) -> Result<Vec<AssignmentView>, StoreError> {
        let t = self.tables.lock().await;
        Ok(t.assignments
            .values()
            .map(|a| AssignmentView {
                id: a.id,
                zone: a.zone.clone(),
                assigned_at: a.assigned_at,
                volunteer_id: a.volunteer_id,
                volunteer: t.volunteers.get(&a.volunteer_id).map(|v| VolunteerSummary {
                    id: v.id,
                    name: v.name.clone(),
                    assistance_type: v.assistance_type.clone(),
                }),
                resource_id: a.resource_id,
                resource: t.resources.get(&a.resource_id).map(|r| ResourceSummary {
                    id: r.id,
                    resource_type: r.resource_type.clone(),
                }),
            })
            .collect())
    }

    async fn zone_counts(&self) -> Result<HashMap<String, ZoneCounts>, StoreError> {
        let t = self.tables.lock().await;
        let mut counts: HashMap<String, ZoneCounts> = HashMap::new();
        for v in t.volunteers.values() {
            counts.entry(v.location.clone()).or_default().volunteers += 1;
        }
        for r in t.resources.values() {
            counts.entry(r.location.clone()).or_default().resources += 1;
        }
        for a in t.assignments.values() {
            counts.entry(a.zone.clone()).or_default().assignments += 1;
        }
        Ok(counts)
    }

    async fn create_alert(&self, new: NewAlert, at: GeoPoint) -> Result<DisasterAlert, StoreError> {
        let mut t = self.tables.lock().await;
        let id = Tables::next_id(&mut t.next_alert_id);
        let alert = DisasterAlert {
            id,
            alert_type: new.alert_type,
            severity: new.severity,
            description: new.description,
            location: new.location,
            latitude: at.latitude,
            longitude: at.longitude,
            issued_at: Utc::now(),
        };
        t.alerts.insert(id, alert.clone());
        Ok(alert)
    }

    async fn list_alerts(&self, offset: i64, limit: i64) -> Result<AlertPage, StoreError> {
        let t = self.tables.lock().await;
        let mut alerts: Vec<DisasterAlert> = t.alerts.values().cloned().collect();
        alerts.sort_by(|a, b| (b.issued_at, b.id).cmp(&(a.issued_at, a.id)));
        let total = alerts.len() as i64;
        let alerts = alerts
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(0))
            .take(usize::try_from(limit).unwrap_or(0))
            .collect();
        Ok(AlertPage { alerts, total })
    }

    async fn create_sensor_reading(
        &self,
        new: NewSensorReading,
    ) -> Result<SensorReading, StoreError> {
        let mut t = self.tables.lock().await;
        let id = Tables::next_id(&mut t.next_sensor_reading_id);
        let reading = SensorReading {
            id,
            sensor_type: new.sensor_type,
            value: new.value,
            latitude: new.latitude,
            longitude: new.longitude,
            recorded_at: Utc::now(),
        };
        t.sensor_readings.insert(id, reading.clone());
        Ok(reading)
    }

    async fn list_sensor_readings(
        &self,
        filter: &SensorFilter,
    ) -> Result<Vec<SensorReading>, StoreError> {
        let t = self.tables.lock().await;
        let mut readings: Vec<SensorReading> = t
            .sensor_readings
            .values()
            .filter(|r| filter.admits(r))
            .cloned()
            .collect();
        readings.sort_by(|a, b| (b.recorded_at, b.id).cmp(&(a.recorded_at, a.id)));
        readings.truncate(usize::try_from(filter.limit).unwrap_or(0));
        Ok(readings)
    }
}
