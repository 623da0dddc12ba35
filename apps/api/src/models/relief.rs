use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A relief resource stationed in a zone. `assigned` flips to true once, on pairing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Resource {
    pub id: i64,
    pub resource_type: String,
    pub quantity: i32,
    pub location: String,
    pub assigned: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Volunteer {
    pub id: i64,
    pub name: String,
    pub contact: String,
    pub location: String,
    pub available: bool,
    pub assigned_zone: Option<String>,
    pub assistance_type: Option<String>,
}

/// One volunteer/resource pairing. Immutable after creation; the ids are
/// lookups, not ownership.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Assignment {
    pub id: i64,
    pub zone: String,
    pub resource_id: i64,
    pub volunteer_id: i64,
    pub assigned_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolunteerSummary {
    pub id: i64,
    pub name: String,
    pub assistance_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceSummary {
    pub id: i64,
    pub resource_type: String,
}

/// An assignment resolved against current entities; a side is `None` once deleted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssignmentView {
    pub id: i64,
    pub zone: String,
    pub assigned_at: DateTime<Utc>,
    pub volunteer_id: i64,
    pub volunteer: Option<VolunteerSummary>,
    pub resource_id: i64,
    pub resource: Option<ResourceSummary>,
}

/// Per-zone entity counts for the location summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ZoneCounts {
    pub volunteers: i64,
    pub resources: i64,
    pub assignments: i64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewResource {
    pub resource_type: String,
    pub quantity: i32,
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewVolunteer {
    pub name: String,
    pub contact: String,
    pub location: String,
    #[serde(default)]
    pub assigned_zone: Option<String>,
    #[serde(default)]
    pub assistance_type: Option<String>,
}
