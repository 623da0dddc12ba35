//! Disaster classifier — maps free text to one or more disaster categories
//! through a fixed keyword table.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Fixed disaster taxonomy plus the `Other` sentinel.
///
/// Variants are declared in name order so `Ord` (and therefore `BTreeSet`
/// iteration) yields categories sorted by display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DisasterCategory {
    Avalanche,
    Cloudburst,
    #[serde(rename = "Cold Wave")]
    ColdWave,
    Cyclone,
    Drought,
    Earthquake,
    Epidemic,
    Flood,
    #[serde(rename = "Forest Fire")]
    ForestFire,
    Hailstorm,
    Heatwave,
    Landslide,
    Lightning,
    Other,
    Tsunami,
}

impl DisasterCategory {
    pub const ALL: [DisasterCategory; 15] = [
        DisasterCategory::Avalanche,
        DisasterCategory::Cloudburst,
        DisasterCategory::ColdWave,
        DisasterCategory::Cyclone,
        DisasterCategory::Drought,
        DisasterCategory::Earthquake,
        DisasterCategory::Epidemic,
        DisasterCategory::Flood,
        DisasterCategory::ForestFire,
        DisasterCategory::Hailstorm,
        DisasterCategory::Heatwave,
        DisasterCategory::Landslide,
        DisasterCategory::Lightning,
        DisasterCategory::Other,
        DisasterCategory::Tsunami,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DisasterCategory::Avalanche => "Avalanche",
            DisasterCategory::Cloudburst => "Cloudburst",
            DisasterCategory::ColdWave => "Cold Wave",
            DisasterCategory::Cyclone => "Cyclone",
            DisasterCategory::Drought => "Drought",
            DisasterCategory::Earthquake => "Earthquake",
            DisasterCategory::Epidemic => "Epidemic",
            DisasterCategory::Flood => "Flood",
            DisasterCategory::ForestFire => "Forest Fire",
            DisasterCategory::Hailstorm => "Hailstorm",
            DisasterCategory::Heatwave => "Heatwave",
            DisasterCategory::Landslide => "Landslide",
            DisasterCategory::Lightning => "Lightning",
            DisasterCategory::Other => "Other",
            DisasterCategory::Tsunami => "Tsunami",
        }
    }

    pub fn is_specific(&self) -> bool {
        *self != DisasterCategory::Other
    }
}

impl fmt::Display for DisasterCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown disaster category '{0}'")]
pub struct UnknownCategory(pub String);

impl FromStr for DisasterCategory {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        DisasterCategory::ALL
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownCategory(wanted.to_string()))
    }
}

/// Lowercase triggers per category. A trigger may appear under several categories
/// ("cyclone" and "storm" count as both Flood and Cyclone).
const KEYWORD_TABLE: &[(DisasterCategory, &[&str])] = &[
    (
        DisasterCategory::Flood,
        &[
            "flood",
            "rainfall",
            "heavy rain",
            "cyclone",
            "storm",
            "inundation",
            "waterlogging",
        ],
    ),
    (
        DisasterCategory::Earthquake,
        &["earthquake", "seismic", "tremor", "quake"],
    ),
    (
        DisasterCategory::Cyclone,
        &["cyclone", "storm", "hurricane", "typhoon", "gale", "wind"],
    ),
    (
        DisasterCategory::Drought,
        &["drought", "dry spell", "water scarcity", "famine"],
    ),
    (
        DisasterCategory::Landslide,
        &["landslide", "mudslide", "landslip", "debris flow"],
    ),
    (
        DisasterCategory::Heatwave,
        &["heatwave", "hot weather", "extreme heat", "scorching"],
    ),
    (
        DisasterCategory::ColdWave,
        &["cold wave", "extreme cold", "frost"],
    ),
    (
        DisasterCategory::Tsunami,
        &["tsunami", "tidal wave", "sea wave"],
    ),
    (DisasterCategory::Hailstorm, &["hailstorm", "hail"]),
    (
        DisasterCategory::Lightning,
        &["lightning", "thunderstorm", "bolt"],
    ),
    (DisasterCategory::Avalanche, &["avalanch", "snowslide"]),
    (
        DisasterCategory::ForestFire,
        &["forest fire", "wildfire", "bushfire"],
    ),
    (DisasterCategory::Cloudburst, &["cloudburst"]),
    (
        DisasterCategory::Epidemic,
        &["epidemic", "disease outbreak", "health crisis"],
    ),
];

/// Keyword classifier built once from a category → triggers table.
///
/// Matching is a plain substring test against the lowercased text, so inflected
/// forms ("flooding", "tremors") still hit their category.
#[derive(Debug, Clone)]
pub struct DisasterClassifier {
    triggers: Vec<(String, DisasterCategory)>,
}

impl Default for DisasterClassifier {
    fn default() -> Self {
        Self::from_table(KEYWORD_TABLE)
    }
}

impl DisasterClassifier {
    pub fn from_table(table: &[(DisasterCategory, &[&str])]) -> Self {
        let triggers = table
            .iter()
            .flat_map(|(category, keywords)| {
                keywords
                    .iter()
                    .map(move |kw| (kw.to_lowercase(), *category))
            })
            .collect();
        Self { triggers }
    }

    /// Returns every category with at least one trigger in `text`; `{Other}` when none match.
    pub fn classify(&self, text: &str) -> BTreeSet<DisasterCategory> {
        let text_lower = text.to_lowercase();
        let mut categories: BTreeSet<DisasterCategory> = self
            .triggers
            .iter()
            .filter(|(keyword, _)| text_lower.contains(keyword.as_str()))
            .map(|(_, category)| *category)
            .collect();

        if categories.is_empty() {
            categories.insert(DisasterCategory::Other);
        }
        categories
    }
}
