use std::collections::{BTreeMap, BTreeSet};

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crate::ingest::classifier::{DisasterCategory, UnknownCategory};
use crate::ingest::index::IncidentIndex;
use crate::ingest::records::DisasterRecord;

const ALL_LOCATIONS: &str = "All India";
const ALL_TYPES: &str = "All";
const ALL_TYPES_LABEL: &str = "All Disasters";
const NO_SPECIFIC_TYPES: &str = "No Specific Types Identified";
const NO_SUGGESTION: &str = "No specific disaster suggested based on weather inputs.";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoricalQuery {
    pub location: Option<String>,
    pub disaster_type: Option<String>,
    pub temperature: Option<f64>,
    pub rainfall: Option<f64>,
    pub windspeed: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoricalRisk {
    pub query_location: String,
    pub query_disaster_type: String,
    pub total_historical_events_found: usize,
    pub details_by_type: BTreeMap<String, usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_events_per_year: Option<f64>,
    pub suggested_disaster_based_on_weather_input: String,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Filters resolved records by zone substring and category, then summarizes them.
pub fn analyze(
    index: &IncidentIndex,
    query: &HistoricalQuery,
) -> Result<HistoricalRisk, UnknownCategory> {
    let location = non_blank(&query.location);
    let disaster_type = non_blank(&query.disaster_type);

    let needle = location
        .filter(|l| *l != ALL_LOCATIONS)
        .map(str::to_lowercase);
    let category = disaster_type
        .filter(|t| *t != ALL_TYPES)
        .map(str::parse::<DisasterCategory>)
        .transpose()?;

    let matched: Vec<&DisasterRecord> = index
        .resolved_records()
        .filter(|r| match &needle {
            Some(needle) => r
                .zone
                .as_deref()
                .is_some_and(|zone| zone.to_lowercase().contains(needle.as_str())),
            None => true,
        })
        .filter(|r| category.map_or(true, |c| r.categories.contains(&c)))
        .collect();

    let mut counts: BTreeMap<DisasterCategory, usize> = BTreeMap::new();
    for record in &matched {
        for category in &record.categories {
            *counts.entry(*category).or_insert(0) += 1;
        }
    }
    let present: BTreeSet<DisasterCategory> = counts
        .keys()
        .copied()
        .filter(DisasterCategory::is_specific)
        .collect();

    let suggestion = if location.is_some() && !matched.is_empty() {
        suggest(query, &present)
    } else {
        NO_SUGGESTION
    };

    Ok(HistoricalRisk {
        query_location: location.unwrap_or(ALL_LOCATIONS).to_string(),
        query_disaster_type: disaster_type.unwrap_or(ALL_TYPES_LABEL).to_string(),
        total_historical_events_found: matched.len(),
        details_by_type: details_by_type(counts),
        average_events_per_year: average_per_year(&matched),
        suggested_disaster_based_on_weather_input: suggestion.to_string(),
    })
}

/// `Other` is dropped next to specific types and relabelled when alone.
fn details_by_type(mut counts: BTreeMap<DisasterCategory, usize>) -> BTreeMap<String, usize> {
    if counts.len() == 1 {
        if let Some(n) = counts.get(&DisasterCategory::Other) {
            return BTreeMap::from([(NO_SPECIFIC_TYPES.to_string(), *n)]);
        }
    }
    counts.remove(&DisasterCategory::Other);
    counts
        .into_iter()
        .map(|(category, n)| (category.to_string(), n))
        .collect()
}

/// Dated records over the inclusive span of their years, to two decimals.
/// Undated records take no part.
fn average_per_year(records: &[&DisasterRecord]) -> Option<f64> {
    let years: Vec<i32> = records.iter().filter_map(|r| r.date).map(|d| d.year()).collect();
    let first = *years.iter().min()?;
    let last = *years.iter().max()?;
    let span = f64::from(last - first + 1);
    Some((years.len() as f64 / span * 100.0).round() / 100.0)
}

fn suggest(query: &HistoricalQuery, present: &BTreeSet<DisasterCategory>) -> &'static str {
    let has = |c: DisasterCategory| present.contains(&c);
    let above = |v: Option<f64>, limit: f64| v.is_some_and(|v| v > limit);

    if above(query.temperature, 40.0) && has(DisasterCategory::Heatwave) {
        "High temperature suggests potential Heatwave risk."
    } else if above(query.rainfall, 100.0) && has(DisasterCategory::Flood) {
        "High rainfall suggests potential Flood risk."
    } else if above(query.windspeed, 50.0) && has(DisasterCategory::Cyclone) {
        "High wind speed suggests potential Cyclone risk."
    } else if query.temperature.is_some_and(|t| t < 5.0) && has(DisasterCategory::ColdWave) {
        "Low temperature suggests potential Cold Wave risk."
    } else if has(DisasterCategory::Flood) {
        "Historically, Flood is common in this area."
    } else if has(DisasterCategory::Earthquake) {
        "Historically, Earthquake is common in this area."
    } else if has(DisasterCategory::Cyclone) {
        "Historically, Cyclone is common in this area."
    } else {
        NO_SUGGESTION
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::coordinates::ZoneCoordinates;
    use crate::ingest::classifier::DisasterClassifier;
    use crate::ingest::records::RawReport;

    fn index() -> IncidentIndex {
        let reports: Vec<RawReport> = [
            ("Flood in Assam", Some("2019-07-01")),
            ("Flood in Assam again", Some("2021-07-01")),
            ("Earthquake in Assam", None),
            ("Heatwave grips Rajasthan", Some("2020-05-20")),
            ("Officials visit Bihar", Some("2022-01-01")),
            ("Routine update", Some("2022-01-01")),
        ]
        .iter()
        .map(|(title, date)| RawReport {
            title: title.to_string(),
            body: String::new(),
            date: date.map(str::to_string),
        })
        .collect();
        IncidentIndex::build(&reports, ZoneCoordinates::new(), &DisasterClassifier::default())
    }

    fn query(location: Option<&str>, disaster_type: Option<&str>) -> HistoricalQuery {
        HistoricalQuery {
            location: location.map(str::to_string),
            disaster_type: disaster_type.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_all_records_without_filters() {
        let risk = analyze(&index(), &HistoricalQuery::default()).unwrap();
        assert_eq!(risk.query_location, "All India");
        assert_eq!(risk.query_disaster_type, "All Disasters");
        assert_eq!(risk.total_historical_events_found, 5);
        assert!(!risk.details_by_type.contains_key("Other"));
        assert_eq!(risk.details_by_type.get("Flood"), Some(&2));
        assert_eq!(
            risk.suggested_disaster_based_on_weather_input,
            NO_SUGGESTION
        );
    }

    #[test]
    fn test_location_filter_is_case_insensitive_substring() {
        let risk = analyze(&index(), &query(Some("ass"), None)).unwrap();
        assert_eq!(risk.total_historical_events_found, 3);
        assert_eq!(risk.query_location, "ass");
    }

    #[test]
    fn test_undated_records_are_left_out_of_yearly_average() {
        let risk = analyze(&index(), &query(Some("Assam"), None)).unwrap();
        // Two dated events across 2019..=2021.
        assert_eq!(risk.average_events_per_year, Some(0.67));
    }

    #[test]
    fn test_category_filter() {
        let risk = analyze(&index(), &query(None, Some("earthquake"))).unwrap();
        assert_eq!(risk.total_historical_events_found, 1);
        assert_eq!(risk.average_events_per_year, None);
    }

    #[test]
    fn test_unknown_category_is_rejected() {
        assert!(analyze(&index(), &query(None, Some("Meteor"))).is_err());
    }

    #[test]
    fn test_other_only_relabelled() {
        let risk = analyze(&index(), &query(Some("Bihar"), None)).unwrap();
        assert_eq!(
            risk.details_by_type,
            BTreeMap::from([("No Specific Types Identified".to_string(), 1)])
        );
    }

    #[test]
    fn test_weather_heuristic_prefers_matching_reading() {
        let mut q = query(Some("Rajasthan"), None);
        q.temperature = Some(45.0);
        let risk = analyze(&index(), &q).unwrap();
        assert_eq!(
            risk.suggested_disaster_based_on_weather_input,
            "High temperature suggests potential Heatwave risk."
        );
    }

    #[test]
    fn test_weather_heuristic_falls_back_to_history() {
        let mut q = query(Some("Assam"), None);
        q.temperature = Some(45.0);
        let risk = analyze(&index(), &q).unwrap();
        assert_eq!(
            risk.suggested_disaster_based_on_weather_input,
            "Historically, Flood is common in this area."
        );
    }

    #[test]
    fn test_no_suggestion_when_nothing_found() {
        let risk = analyze(&index(), &query(Some("Kerala"), None)).unwrap();
        assert_eq!(risk.total_historical_events_found, 0);
        assert!(risk.details_by_type.is_empty());
        assert_eq!(
            risk.suggested_disaster_based_on_weather_input,
            NO_SUGGESTION
        );
    }
}
