use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::geo::coordinates::{load_coordinates, ZoneCoordinates};
use crate::geo::GeoPoint;
use crate::ingest::classifier::DisasterClassifier;
use crate::ingest::location::ZoneMatcher;
use crate::ingest::records::{load_reports, DisasterRecord, RawReport};
use crate::ingest::severity::{aggregate, SeverityIndex};

/// Everything derived from one ingestion pass: records, severity, and the zone
/// coordinates the spatial views read. Read-only once built.
#[derive(Debug)]
pub struct IncidentIndex {
    pub records: Vec<DisasterRecord>,
    pub severity: SeverityIndex,
    pub coordinates: ZoneCoordinates,
    pub built_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestStats {
    pub records: usize,
    pub resolved: usize,
    pub unresolved: usize,
    pub undated: usize,
    pub zones: usize,
}

impl IncidentIndex {
    /// Known zones are the gazetteer plus every zone named in `coordinates`.
    pub fn build(
        reports: &[RawReport],
        coordinates: ZoneCoordinates,
        classifier: &DisasterClassifier,
    ) -> Self {
        let zones = ZoneMatcher::with_gazetteer(coordinates.keys());
        debug!(known_zones = zones.zone_count(), reports = reports.len(), "Deriving disaster records");
        let records: Vec<DisasterRecord> = reports
            .iter()
            .map(|raw| DisasterRecord::derive(raw, &zones, classifier))
            .collect();
        let severity = aggregate(&records);

        Self {
            records,
            severity,
            coordinates,
            built_at: Utc::now(),
        }
    }

    /// Reads the report and coordinates files and builds a fresh index.
    pub fn load(reports_path: &Path, coordinates_path: &Path) -> Result<Self> {
        let reports = load_reports(reports_path)?;
        let coordinates = load_coordinates(coordinates_path);
        let index = Self::build(&reports, coordinates, &DisasterClassifier::default());

        let stats = index.stats();
        info!(
            records = stats.records,
            resolved = stats.resolved,
            unresolved = stats.unresolved,
            undated = stats.undated,
            zones = stats.zones,
            "Incident index built"
        );
        Ok(index)
    }

    /// `load` on the blocking pool, for callers on the async runtime.
    pub async fn load_off_runtime(reports_path: PathBuf, coordinates_path: PathBuf) -> Result<Self> {
        tokio::task::spawn_blocking(move || Self::load(&reports_path, &coordinates_path)).await?
    }

    /// Records with a resolved zone. Zone-less records never reach zone views.
    pub fn resolved_records(&self) -> impl Iterator<Item = &DisasterRecord> {
        self.records.iter().filter(|r| r.zone.is_some())
    }

    /// Zones with at least one resolved record, in name order.
    pub fn zones(&self) -> impl Iterator<Item = &str> {
        self.severity.keys().map(String::as_str)
    }

    pub fn severity_of(&self, zone: &str) -> u32 {
        self.severity.get(zone).copied().unwrap_or(0)
    }

    pub fn coordinates_of(&self, zone: &str) -> Option<GeoPoint> {
        self.coordinates.get(zone).copied().flatten()
    }

    pub fn stats(&self) -> IngestStats {
        let resolved = self.resolved_records().count();
        IngestStats {
            records: self.records.len(),
            resolved,
            unresolved: self.records.len() - resolved,
            undated: self.records.iter().filter(|r| r.date.is_none()).count(),
            zones: self.severity.len(),
        }
    }
}

/// Shared slot holding the current index. Rebuilds swap the `Arc`, so readers
/// holding a snapshot keep a consistent view and never wait on a rebuild.
#[derive(Debug)]
pub struct IncidentIndexHandle {
    current: RwLock<Arc<IncidentIndex>>,
}

impl IncidentIndexHandle {
    pub fn new(index: IncidentIndex) -> Self {
        Self {
            current: RwLock::new(Arc::new(index)),
        }
    }

    pub async fn snapshot(&self) -> Arc<IncidentIndex> {
        self.current.read().await.clone()
    }

    pub async fn replace(&self, index: IncidentIndex) {
        *self.current.write().await = Arc::new(index);
    }
}
