use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::ingest::classifier::{DisasterCategory, DisasterClassifier};
use crate::ingest::location::ZoneMatcher;

/// One raw report as it arrives from the ingestion file.
/// The capitalised aliases match the column names of the historical dataset.
#[derive(Debug, Clone, Deserialize)]
pub struct RawReport {
    #[serde(default, alias = "Title")]
    pub title: String,
    #[serde(default, alias = "Disaster_Info")]
    pub body: String,
    #[serde(default, alias = "Date")]
    pub date: Option<String>,
}

/// A report with its zone and categories derived.
#[derive(Debug, Clone, Serialize)]
pub struct DisasterRecord {
    pub title: String,
    pub body: String,
    /// `None` when the raw date was missing or unparseable.
    pub date: Option<NaiveDate>,
    pub zone: Option<String>,
    /// Never empty; `{Other}` when nothing specific was detected.
    pub categories: BTreeSet<DisasterCategory>,
}

impl DisasterRecord {
    /// Derives zone and categories. Same text in, same record out.
    pub fn derive(raw: &RawReport, zones: &ZoneMatcher, classifier: &DisasterClassifier) -> Self {
        let zone = zones
            .resolve_report(&raw.title, &raw.body)
            .map(str::to_string);
        let categories = classifier.classify(&format!("{}\n{}", raw.title, raw.body));

        Self {
            title: raw.title.clone(),
            body: raw.body.clone(),
            date: raw.date.as_deref().and_then(parse_report_date),
            zone,
            categories,
        }
    }

    /// Non-empty and not exactly `{Other}`.
    pub fn is_specific(&self) -> bool {
        self.categories.iter().any(DisasterCategory::is_specific)
    }
}

/// Accepts `YYYY-MM-DD`, RFC 3339 and `YYYY-MM-DD HH:MM:SS`. Anything else is `None`.
pub fn parse_report_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
}

/// Reads the ingestion file (a JSON array of reports).
/// A missing file is not an error: the service starts with no records.
pub fn load_reports(path: &Path) -> Result<Vec<RawReport>> {
    if !path.exists() {
        warn!(
            path = %path.display(),
            "Report file not found; severity and zone views will be empty"
        );
        return Ok(Vec::new());
    }

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read report file: {}", path.display()))?;
    let reports: Vec<RawReport> = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse report file: {}", path.display()))?;

    info!(path = %path.display(), count = reports.len(), "Loaded disaster reports");
    Ok(reports)
}
