use std::collections::BTreeSet;
use std::path::Path;

use anyhow::Result;
use serde::Serialize;
use tracing::info;

use crate::geo::coordinates::{load_coordinates, save_coordinates};
use crate::geo::resolver::CoordinateResolver;
use crate::ingest::index::{IncidentIndex, IncidentIndexHandle};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefreshSummary {
    pub attempted: usize,
    pub resolved: usize,
    pub still_missing: usize,
}

/// Zones worth a geocoder call: every zone with records but no point, plus
/// entries the coordinates file lists as unknown.
fn zones_missing_coordinates(index: &IncidentIndex) -> BTreeSet<String> {
    let from_records = index
        .zones()
        .filter(|zone| index.coordinates_of(zone).is_none())
        .map(str::to_string);
    let from_file = index
        .coordinates
        .iter()
        .filter(|(_, point)| point.is_none())
        .map(|(zone, _)| zone.clone());
    from_records.chain(from_file).collect()
}

/// Geocodes missing zones, persists the coordinates file, and swaps in an index
/// rebuilt from disk so the new zones and points are picked up.
pub async fn refresh_coordinates(
    resolver: &CoordinateResolver,
    incidents: &IncidentIndexHandle,
    reports_path: &Path,
    coordinates_path: &Path,
) -> Result<RefreshSummary> {
    let snapshot = incidents.snapshot().await;
    let missing = zones_missing_coordinates(&snapshot);
    info!(zones = missing.len(), "Refreshing zone coordinates");

    let mut found = Vec::with_capacity(missing.len());
    for zone in &missing {
        found.push((zone.clone(), resolver.resolve(zone).await));
    }
    let resolved = found.iter().filter(|(_, point)| point.is_some()).count();

    // Re-read the file: it may have changed while the geocoder was being paced.
    let mut coordinates = load_coordinates(coordinates_path);
    for (zone, point) in found {
        match point {
            Some(point) => {
                coordinates.insert(zone, Some(point));
            }
            None => {
                coordinates.entry(zone).or_insert(None);
            }
        }
    }

    save_coordinates(coordinates_path, &coordinates)?;
    let index = IncidentIndex::load_off_runtime(
        reports_path.to_path_buf(),
        coordinates_path.to_path_buf(),
    )
    .await?;
    incidents.replace(index).await;

    let summary = RefreshSummary {
        attempted: missing.len(),
        resolved,
        still_missing: missing.len() - resolved,
    };
    info!(
        attempted = summary.attempted,
        resolved = summary.resolved,
        still_missing = summary.still_missing,
        "Zone coordinates refreshed"
    );
    Ok(summary)
}
