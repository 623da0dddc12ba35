//! Zone-level read models built from an index snapshot.
//!
//! Every view covers only zones with at least one resolved record. The spatial
//! views (heatmap, risk) further skip zones whose coordinates are unknown.

use std::collections::HashMap;

use serde::Serialize;

use crate::geo::GeoPoint;
use crate::ingest::classifier::DisasterCategory;
use crate::ingest::index::IncidentIndex;
use crate::ingest::severity::{display_categories, zone_categories};
use crate::models::relief::ZoneCounts;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneSummary {
    pub zone: String,
    pub severity: u32,
    pub categories: Vec<DisasterCategory>,
    pub coordinates: Option<GeoPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapPoint {
    pub location: String,
    pub latitude: f64,
    pub longitude: f64,
    pub severity: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskZone {
    pub location: String,
    pub latitude: f64,
    pub longitude: f64,
    pub disaster_types: Vec<DisasterCategory>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationSummary {
    pub location: String,
    pub severity: u32,
    pub volunteers_count: i64,
    pub resources_count: i64,
    pub assignments_count: i64,
    /// `[lat, lon]`, or `[null, null]` when unknown.
    pub coords: [Option<f64>; 2],
}

fn display_categories_for(index: &IncidentIndex, zone: &str) -> Vec<DisasterCategory> {
    display_categories(&zone_categories(&index.records, zone))
}

pub fn zone_summaries(index: &IncidentIndex) -> Vec<ZoneSummary> {
    index
        .zones()
        .map(|zone| ZoneSummary {
            zone: zone.to_string(),
            severity: index.severity_of(zone),
            categories: display_categories_for(index, zone),
            coordinates: index.coordinates_of(zone),
        })
        .collect()
}

pub fn heatmap_points(index: &IncidentIndex) -> Vec<HeatmapPoint> {
    index
        .zones()
        .filter_map(|zone| {
            let point = index.coordinates_of(zone)?;
            Some(HeatmapPoint {
                location: zone.to_string(),
                latitude: point.latitude,
                longitude: point.longitude,
                severity: index.severity_of(zone),
            })
        })
        .collect()
}

pub fn risk_zones(index: &IncidentIndex) -> Vec<RiskZone> {
    index
        .zones()
        .filter_map(|zone| {
            let point = index.coordinates_of(zone)?;
            Some(RiskZone {
                location: zone.to_string(),
                latitude: point.latitude,
                longitude: point.longitude,
                disaster_types: display_categories_for(index, zone),
            })
        })
        .collect()
}

pub fn location_summaries(
    index: &IncidentIndex,
    counts: &HashMap<String, ZoneCounts>,
) -> Vec<LocationSummary> {
    index
        .zones()
        .map(|zone| {
            let c = counts.get(zone).copied().unwrap_or_default();
            let coords = match index.coordinates_of(zone) {
                Some(p) => [Some(p.latitude), Some(p.longitude)],
                None => [None, None],
            };
            LocationSummary {
                location: zone.to_string(),
                severity: index.severity_of(zone),
                volunteers_count: c.volunteers,
                resources_count: c.resources,
                assignments_count: c.assignments,
                coords,
            }
        })
        .collect()
}
