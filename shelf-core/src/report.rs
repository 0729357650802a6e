//! Simple groupings over an already-filtered record list.
use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use shelf_state::{Collation, Record};

/// The group name used for records with no value to group by.
pub const UNKNOWN: &str = "Unknown";

/// The number of records added on one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrowthPoint {
    pub date: NaiveDate,
    /// Records added on `date`.
    pub added: usize,
    /// Records added on or before `date`.
    pub total: usize,
}

/// Counts records per genre, largest group first. A record counts once for
/// each of its genres; records without any count as [`UNKNOWN`].
pub fn genre_counts(records: &[Record]) -> Vec<(String, usize)> {
    count_values(records, |record| &record.genre)
}

/// Counts records per label, largest group first.
pub fn label_counts(records: &[Record]) -> Vec<(String, usize)> {
    count_values(records, |record| &record.label)
}

/// Counts records per release decade, oldest first, with [`UNKNOWN`] last.
pub fn decade_counts(records: &[Record]) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<Option<u32>, usize> = BTreeMap::new();
    for record in records {
        *counts.entry(record.decade()).or_default() += 1;
    }

    let unknown = counts.remove(&None);
    counts
        .into_iter()
        .filter_map(|(decade, count)| decade.map(|d| (format!("{d}s"), count)))
        .chain(unknown.map(|count| (UNKNOWN.to_string(), count)))
        .collect()
}

/// Counts records per day added, in chronological order.
/// Records with a missing or unparseable `date_added` are skipped.
pub fn growth_series(records: &[Record]) -> Vec<GrowthPoint> {
    let mut per_day: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for record in records {
        let Some(date_added) = record.date_added.as_deref() else {
            continue;
        };
        match parse_day(date_added) {
            Some(day) => *per_day.entry(day).or_default() += 1,
            None => tracing::debug!("skipping unparseable date {date_added:?} for {}", record.id),
        }
    }

    let mut total = 0;
    per_day
        .into_iter()
        .map(|(date, added)| {
            total += added;
            GrowthPoint { date, added, total }
        })
        .collect()
}

/// Every genre that appears in `records`, in collation order.
pub fn distinct_genres(collation: &Collation, records: &[Record]) -> Vec<String> {
    distinct_values(collation, records, |record| &record.genre)
}

/// Every label that appears in `records`, in collation order.
pub fn distinct_labels(collation: &Collation, records: &[Record]) -> Vec<String> {
    distinct_values(collation, records, |record| &record.label)
}

fn parse_day(date_added: &str) -> Option<NaiveDate> {
    let day = date_added.trim().get(..10)?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

fn count_values(
    records: &[Record],
    values: impl Fn(&Record) -> &Vec<String>,
) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for record in records {
        let values = values(record);
        if values.is_empty() {
            *counts.entry(UNKNOWN).or_default() += 1;
        }
        for value in values {
            *counts.entry(value.as_str()).or_default() += 1;
        }
    }

    let mut counts: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(name, count)| (name.to_string(), count))
        .collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

fn distinct_values(
    collation: &Collation,
    records: &[Record],
    values: impl Fn(&Record) -> &Vec<String>,
) -> Vec<String> {
    let unique: BTreeSet<&str> = records
        .iter()
        .flat_map(|record| values(record).iter().map(String::as_str))
        .filter(|value| !value.trim().is_empty())
        .collect();
    let mut unique: Vec<String> = unique.into_iter().map(str::to_string).collect();
    unique.sort_by(|a, b| collation.compare(a, b));
    unique
}
