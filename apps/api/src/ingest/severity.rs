use std::collections::{BTreeMap, BTreeSet};

use crate::ingest::classifier::DisasterCategory;
use crate::ingest::records::DisasterRecord;

/// Zone → number of records carrying at least one specific category.
/// A pure function of the record set; rebuilt, never edited in place.
pub type SeverityIndex = BTreeMap<String, u32>;

/// Counts specific records per resolved zone. Every zone with a resolved record
/// is present, including zones whose records were all `Other` (count 0).
pub fn aggregate<'a, I>(records: I) -> SeverityIndex
where
    I: IntoIterator<Item = &'a DisasterRecord>,
{
    let mut index = SeverityIndex::new();
    for record in records {
        let Some(zone) = record.zone.as_deref() else {
            continue;
        };
        let count = index.entry(zone.to_string()).or_insert(0);
        if record.is_specific() {
            *count += 1;
        }
    }
    index
}

/// Category set as shown in zone summaries: `Other` is dropped when anything
/// specific is present, and an `Other`-only set is shown as empty.
pub fn display_categories(categories: &BTreeSet<DisasterCategory>) -> Vec<DisasterCategory> {
    categories
        .iter()
        .copied()
        .filter(DisasterCategory::is_specific)
        .collect()
}

/// Union of the categories of every record in `zone`, before the display rule.
pub fn zone_categories<'a, I>(records: I, zone: &str) -> BTreeSet<DisasterCategory>
where
    I: IntoIterator<Item = &'a DisasterRecord>,
{
    records
        .into_iter()
        .filter(|r| r.zone.as_deref() == Some(zone))
        .flat_map(|r| r.categories.iter().copied())
        .collect()
}
