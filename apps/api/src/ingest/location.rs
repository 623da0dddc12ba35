//! Location resolver — infers a canonical zone name from free text.
//!
//! The matcher is built once from the known zone names, ordered longest first
//! so "New Delhi" wins over "Delhi" when both would match. Matching is
//! case-insensitive and must sit on word boundaries on both sides.

use std::collections::BTreeSet;

/// Indian states and union territories, plus major cities. Combined with the
/// keys of the coordinates file to form the known zone set.
pub const DEFAULT_GAZETTEER: &[&str] = &[
    "Andhra Pradesh",
    "Arunachal Pradesh",
    "Assam",
    "Bihar",
    "Chhattisgarh",
    "Goa",
    "Gujarat",
    "Haryana",
    "Himachal Pradesh",
    "Jharkhand",
    "Karnataka",
    "Kerala",
    "Madhya Pradesh",
    "Maharashtra",
    "Manipur",
    "Meghalaya",
    "Mizoram",
    "Nagaland",
    "Odisha",
    "Punjab",
    "Rajasthan",
    "Sikkim",
    "Tamil Nadu",
    "Telangana",
    "Tripura",
    "Uttar Pradesh",
    "Uttarakhand",
    "West Bengal",
    "Andaman and Nicobar Islands",
    "Chandigarh",
    "Dadra and Nagar Haveli and Daman and Diu",
    "Lakshadweep",
    "Delhi",
    "Puducherry",
    "Jammu and Kashmir",
    "Ladakh",
    "Mumbai",
    "Bengaluru",
    "Chennai",
    "Kolkata",
    "Hyderabad",
    "Ahmedabad",
    "Pune",
    "Jaipur",
    "Lucknow",
    "Bhopal",
    "Patna",
    "Ranchi",
    "Guwahati",
    "Srinagar",
    "Thiruvananthapuram",
    "Bhubaneswar",
    "Visakhapatnam",
];

#[derive(Debug, Clone)]
struct ZonePattern {
    name: String,
    needle: String,
    needle_chars: usize,
}

/// Word-boundary zone matcher over a fixed, length-ordered zone list.
#[derive(Debug, Clone, Default)]
pub struct ZoneMatcher {
    patterns: Vec<ZonePattern>,
}

impl ZoneMatcher {
    /// Builds the matcher. Duplicates and blank names are dropped; ordering is
    /// by character length descending, then name ascending for determinism.
    pub fn new<I, S>(zones: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let unique: BTreeSet<String> = zones
            .into_iter()
            .map(|z| z.as_ref().trim().to_string())
            .filter(|z| !z.is_empty())
            .collect();

        let mut patterns: Vec<ZonePattern> = unique
            .into_iter()
            .map(|name| {
                let needle = name.to_lowercase();
                ZonePattern {
                    needle_chars: needle.chars().count(),
                    needle,
                    name,
                }
            })
            .collect();

        patterns.sort_by(|a, b| {
            b.needle_chars
                .cmp(&a.needle_chars)
                .then_with(|| a.name.cmp(&b.name))
        });

        Self { patterns }
    }

    /// Gazetteer plus any extra zone names (typically the coordinates file keys).
    pub fn with_gazetteer<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut zones: Vec<String> = DEFAULT_GAZETTEER.iter().map(|z| z.to_string()).collect();
        zones.extend(extra.into_iter().map(|z| z.as_ref().to_string()));
        Self::new(zones)
    }

    pub fn zone_count(&self) -> usize {
        self.patterns.len()
    }

    /// Returns the first zone, in match order, that occurs in `text` on word boundaries.
    pub fn resolve(&self, text: &str) -> Option<&str> {
        if text.is_empty() {
            return None;
        }
        let haystack = text.to_lowercase();
        self.patterns
            .iter()
            .find(|p| contains_on_word_boundary(&haystack, &p.needle))
            .map(|p| p.name.as_str())
    }

    /// Title first; the body is only consulted when the title names no zone.
    pub fn resolve_report(&self, title: &str, body: &str) -> Option<&str> {
        self.resolve(title).or_else(|| self.resolve(body))
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn contains_on_word_boundary(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    haystack.match_indices(needle).any(|(start, matched)| {
        let end = start + matched.len();
        let before_ok = haystack[..start]
            .chars()
            .next_back()
            .map_or(true, |c| !is_word_char(c));
        let after_ok = haystack[end..]
            .chars()
            .next()
            .map_or(true, |c| !is_word_char(c));
        before_ok && after_ok
    })
}
