use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::assignment::store::{ReliefStore, StoreError};
use crate::ingest::severity::SeverityIndex;
use crate::models::relief::{Assignment, Resource, Volunteer};

/// One committed auto-assignment, with both entities as they were left by it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AutoAssigned {
    pub assignment: Assignment,
    pub volunteer: Volunteer,
    pub resource: Resource,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AutoAssignOutcome {
    Assigned(AutoAssigned),
    NoMatch,
}

/// Zones ordered by descending severity, ties broken by zone name.
pub fn rank_zones(severity: &SeverityIndex) -> Vec<String> {
    let mut ranked: Vec<(&String, u32)> = severity.iter().map(|(z, s)| (z, *s)).collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked.into_iter().map(|(zone, _)| zone.clone()).collect()
}

#[derive(Clone)]
pub struct AssignmentEngine {
    store: Arc<dyn ReliefStore>,
}

impl AssignmentEngine {
    pub fn new(store: Arc<dyn ReliefStore>) -> Self {
        Self { store }
    }

    /// Operator override: records the pairing without checking availability.
    pub async fn pair(
        &self,
        volunteer_id: i64,
        resource_id: i64,
        zone: &str,
    ) -> Result<Assignment, StoreError> {
        let assignment = self.store.pair(volunteer_id, resource_id, zone).await?;
        info!(
            assignment_id = assignment.id,
            volunteer_id, resource_id, zone, "Manual assignment recorded"
        );
        Ok(assignment)
    }

    /// Commits at most one volunteer/resource pair, in the highest-severity zone
    /// that has both an available volunteer and an unassigned resource.
    pub async fn attempt_auto_assign(
        &self,
        severity: &SeverityIndex,
    ) -> Result<AutoAssignOutcome, StoreError> {
        let ranked = rank_zones(severity);
        debug!(candidates = ranked.len(), "Attempting auto-assignment");

        match self.store.claim_first_match(&ranked).await? {
            Some((assignment, volunteer, resource)) => {
                info!(
                    assignment_id = assignment.id,
                    zone = %assignment.zone,
                    volunteer_id = volunteer.id,
                    resource_id = resource.id,
                    "Auto-assignment committed"
                );
                Ok(AutoAssignOutcome::Assigned(AutoAssigned {
                    assignment,
                    volunteer,
                    resource,
                }))
            }
            None => Ok(AutoAssignOutcome::NoMatch),
        }
    }

    /// Repeats the single step until it reports no match.
    pub async fn drain(&self, severity: &SeverityIndex) -> Result<Vec<AutoAssigned>, StoreError> {
        let mut created = Vec::new();
        while let AutoAssignOutcome::Assigned(step) = self.attempt_auto_assign(severity).await? {
            created.push(step);
        }
        info!(count = created.len(), "Auto-assignment drained");
        Ok(created)
    }
}
