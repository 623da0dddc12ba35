//! Axum route handlers for resources, volunteers and assignments.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::assignment::engine::{AutoAssignOutcome, AutoAssigned};
use crate::errors::AppError;
use crate::extract::{optional_text, required_text, ValidatedJson, ValidatedQuery};
use crate::ingest::index::IncidentIndex;
use crate::models::relief::{
    Assignment, AssignmentView, NewResource, NewVolunteer, Resource, Volunteer,
};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeverityFilter {
    /// Fractional and negative thresholds are accepted.
    pub severity_min: Option<f64>,
}

impl SeverityFilter {
    fn admits(&self, index: &IncidentIndex, location: &str) -> bool {
        self.severity_min
            .map_or(true, |min| f64::from(index.severity_of(location)) >= min)
    }
}

#[derive(Debug, Serialize)]
pub struct ResourceEntry {
    #[serde(flatten)]
    pub resource: Resource,
    pub location_severity: u32,
}

#[derive(Debug, Serialize)]
pub struct VolunteerEntry {
    #[serde(flatten)]
    pub volunteer: Volunteer,
    pub location_severity: u32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManualAssignmentRequest {
    pub volunteer_id: i64,
    pub resource_id: i64,
    pub zone: String,
}

#[derive(Debug, Serialize)]
pub struct AutoAssignResponse {
    pub zone: String,
    pub volunteer_id: i64,
    pub resource_id: i64,
    pub volunteer_name: String,
    pub resource_type: String,
    pub assignment: Assignment,
}

impl From<AutoAssigned> for AutoAssignResponse {
    fn from(step: AutoAssigned) -> Self {
        Self {
            zone: step.assignment.zone.clone(),
            volunteer_id: step.volunteer.id,
            resource_id: step.resource.id,
            volunteer_name: step.volunteer.name,
            resource_type: step.resource.resource_type,
            assignment: step.assignment,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DrainResponse {
    pub created: usize,
    pub assignments: Vec<AutoAssignResponse>,
}

// ────────────────────────────────────────────────────────────────────────────
// Resources
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/resources
pub async fn handle_create_resource(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<NewResource>,
) -> Result<(StatusCode, Json<Resource>), AppError> {
    if req.quantity < 1 {
        return Err(AppError::Validation(
            "quantity must be at least 1".to_string(),
        ));
    }
    let new = NewResource {
        resource_type: required_text("resource_type", &req.resource_type)?,
        quantity: req.quantity,
        location: required_text("location", &req.location)?,
    };

    let resource = state.store.create_resource(new).await?;
    Ok((StatusCode::CREATED, Json(resource)))
}

/// GET /api/v1/resources?severity_min=N
pub async fn handle_list_resources(
    State(state): State<AppState>,
    ValidatedQuery(filter): ValidatedQuery<SeverityFilter>,
) -> Result<Json<Vec<ResourceEntry>>, AppError> {
    let index = state.incidents.snapshot().await;
    let entries = state
        .store
        .list_resources()
        .await?
        .into_iter()
        .filter(|r| filter.admits(&index, &r.location))
        .map(|resource| ResourceEntry {
            location_severity: index.severity_of(&resource.location),
            resource,
        })
        .collect();
    Ok(Json(entries))
}

/// DELETE /api/v1/resources/:id
pub async fn handle_delete_resource(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.store.delete_resource(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ────────────────────────────────────────────────────────────────────────────
// Volunteers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/volunteers
///
/// New volunteers always start available, whatever zone they were given.
pub async fn handle_create_volunteer(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<NewVolunteer>,
) -> Result<(StatusCode, Json<Volunteer>), AppError> {
    let new = NewVolunteer {
        name: required_text("name", &req.name)?,
        contact: required_text("contact", &req.contact)?,
        location: required_text("location", &req.location)?,
        assigned_zone: optional_text(req.assigned_zone),
        assistance_type: optional_text(req.assistance_type),
    };

    let volunteer = state.store.create_volunteer(new).await?;
    Ok((StatusCode::CREATED, Json(volunteer)))
}

/// GET /api/v1/volunteers?severity_min=N
pub async fn handle_list_volunteers(
    State(state): State<AppState>,
    ValidatedQuery(filter): ValidatedQuery<SeverityFilter>,
) -> Result<Json<Vec<VolunteerEntry>>, AppError> {
    let index = state.incidents.snapshot().await;
    let entries = state
        .store
        .list_volunteers()
        .await?
        .into_iter()
        .filter(|v| filter.admits(&index, &v.location))
        .map(|volunteer| VolunteerEntry {
            location_severity: index.severity_of(&volunteer.location),
            volunteer,
        })
        .collect();
    Ok(Json(entries))
}

/// DELETE /api/v1/volunteers/:id
pub async fn handle_delete_volunteer(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.store.delete_volunteer(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ────────────────────────────────────────────────────────────────────────────
// Assignments
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/assignments
///
/// Manual pairing. Both ids must exist; availability is deliberately not checked.
pub async fn handle_create_assignment(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<ManualAssignmentRequest>,
) -> Result<(StatusCode, Json<Assignment>), AppError> {
    let zone = required_text("zone", &req.zone)?;
    let assignment = state
        .engine
        .pair(req.volunteer_id, req.resource_id, &zone)
        .await?;
    Ok((StatusCode::CREATED, Json(assignment)))
}

/// GET /api/v1/assignments
pub async fn handle_list_assignments(
    State(state): State<AppState>,
) -> Result<Json<Vec<AssignmentView>>, AppError> {
    Ok(Json(state.store.list_assignments().await?))
}

/// POST /api/v1/assignments/auto
///
/// One greedy step: at most one pairing per call.
pub async fn handle_auto_assign(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<AutoAssignResponse>), AppError> {
    let index = state.incidents.snapshot().await;
    match state.engine.attempt_auto_assign(&index.severity).await? {
        AutoAssignOutcome::Assigned(step) => Ok((StatusCode::CREATED, Json(step.into()))),
        AutoAssignOutcome::NoMatch => Err(AppError::NoMatch(
            "No zone has both an available volunteer and an unassigned resource".to_string(),
        )),
    }
}

/// POST /api/v1/assignments/auto/drain
pub async fn handle_drain_auto_assign(
    State(state): State<AppState>,
) -> Result<Json<DrainResponse>, AppError> {
    let index = state.incidents.snapshot().await;
    let created = state.engine.drain(&index.severity).await?;
    Ok(Json(DrainResponse {
        created: created.len(),
        assignments: created.into_iter().map(AutoAssignResponse::from).collect(),
    }))
}
