use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use shelf_state::{Collation, Record};

use crate::util::{normalize_needle, parse_year_input};

/// How genre and label filters are compared against a record's values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Case-insensitive substring of the comma-joined values.
    #[default]
    Substring,
    /// Case-insensitive equality with any single value.
    Exact,
}

/// The filters applied to the collection. Empty fields impose no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSpec {
    /// Free text matched against title, artist and track titles.
    pub term: String,
    /// Matched against the record's genres.
    pub genre: String,
    /// Matched against the record's labels.
    pub label: String,
    /// Matched exactly against the release year. Non-numeric input is ignored.
    pub year: String,
    /// How `genre` and `label` are matched.
    pub match_mode: MatchMode,
}
impl FilterSpec {
    /// Returns true if no filter is active.
    pub fn is_empty(&self) -> bool {
        let predicate = self.predicate();
        predicate.term.is_none()
            && predicate.genre.is_none()
            && predicate.label.is_none()
            && predicate.year.is_none()
    }

    /// Returns true if `record` satisfies every active filter.
    pub fn matches(&self, record: &Record) -> bool {
        self.predicate().matches(record)
    }

    fn predicate(&self) -> Predicate {
        Predicate {
            term: normalize_needle(&self.term),
            genre: normalize_needle(&self.genre),
            label: normalize_needle(&self.label),
            year: parse_year_input(&self.year),
            match_mode: self.match_mode,
        }
    }
}

/// A [`FilterSpec`] with its inputs normalised once, ready to test many records.
struct Predicate {
    term: Option<String>,
    genre: Option<String>,
    label: Option<String>,
    year: Option<u32>,
    match_mode: MatchMode,
}
impl Predicate {
    fn matches(&self, record: &Record) -> bool {
        if let Some(year) = self.year
            && record.year != Some(year)
        {
            return false;
        }
        if let Some(term) = &self.term {
            let in_track = record
                .tracklist
                .iter()
                .any(|track| track.to_lowercase().contains(term));
            if !(record.title.to_lowercase().contains(term)
                || record.artist.to_lowercase().contains(term)
                || in_track)
            {
                return false;
            }
        }
        if let Some(genre) = &self.genre
            && !self.values_match(&record.genre, genre)
        {
            return false;
        }
        if let Some(label) = &self.label
            && !self.values_match(&record.label, label)
        {
            return false;
        }
        true
    }

    fn values_match(&self, values: &[String], needle: &str) -> bool {
        match self.match_mode {
            MatchMode::Substring => values.join(", ").to_lowercase().contains(needle),
            MatchMode::Exact => values.iter().any(|v| v.to_lowercase() == needle),
        }
    }
}

/// A field the collection can be sorted by in either direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    /// By title.
    Title,
    /// By artist, then title.
    Artist,
    /// By release year; records without a year count as year 0.
    Year,
    /// By date added; records without a date count as the earliest.
    DateAdded,
}
impl SortField {
    /// Returns a human-readable name for the field.
    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::Title => "Title",
            SortField::Artist => "Artist",
            SortField::Year => "Year",
            SortField::DateAdded => "Date Added",
        }
    }
}

/// The direction of a field sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}
impl SortDirection {
    /// The opposite direction.
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

/// The order the collection is presented in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortSpec {
    /// Most recently added first; records without a date last.
    #[default]
    Recent,
    /// By artist, then title.
    Alphabetical,
    /// By a chosen field in a chosen direction.
    Field {
        field: SortField,
        direction: SortDirection,
    },
}
impl SortSpec {
    /// The sort that results from selecting `field`: reselecting the active
    /// field flips its direction, a new field starts ascending.
    pub fn toggled(self, field: SortField) -> Self {
        match self {
            SortSpec::Field {
                field: current,
                direction,
            } if current == field => SortSpec::Field {
                field,
                direction: direction.flipped(),
            },
            _ => SortSpec::Field {
                field,
                direction: SortDirection::Ascending,
            },
        }
    }

    /// Compare two records under this sort.
    pub fn compare(&self, collation: &Collation, a: &Record, b: &Record) -> Ordering {
        match self {
            SortSpec::Recent => b.date_added.cmp(&a.date_added),
            SortSpec::Alphabetical => collation.cmp_artist_title(a, b),
            SortSpec::Field { field, direction } => {
                let ordering = match field {
                    SortField::Title => collation.compare(&a.title, &b.title),
                    SortField::Artist => collation.cmp_artist_title(a, b),
                    SortField::Year => a.year.unwrap_or(0).cmp(&b.year.unwrap_or(0)),
                    SortField::DateAdded => a.date_added.cmp(&b.date_added),
                };
                match direction {
                    SortDirection::Ascending => ordering,
                    SortDirection::Descending => ordering.reverse(),
                }
            }
        }
    }
}
impl std::fmt::Display for SortSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortSpec::Recent => write!(f, "Recent"),
            SortSpec::Alphabetical => write!(f, "Alphabetical"),
            SortSpec::Field { field, direction } => {
                let arrow = match direction {
                    SortDirection::Ascending => "▲",
                    SortDirection::Descending => "▼",
                };
                write!(f, "{} {arrow}", field.as_str())
            }
        }
    }
}

/// Filters and sorts record lists. Holds the collation so it is built once.
#[derive(Default)]
pub struct QueryEngine {
    collation: Collation,
}
impl QueryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn collation(&self) -> &Collation {
        &self.collation
    }

    /// Returns the records matching `filter`, ordered by `sort`.
    ///
    /// The sort is stable, so records that compare equal keep their input order.
    pub fn filter_and_sort(
        &self,
        records: &[Record],
        filter: &FilterSpec,
        sort: &SortSpec,
    ) -> Vec<Record> {
        let mut result = self.filter(records, filter);
        result.sort_by(|a, b| sort.compare(&self.collation, a, b));
        result
    }

    /// Returns the records matching `filter`, in input order.
    pub fn filter(&self, records: &[Record], filter: &FilterSpec) -> Vec<Record> {
        let predicate = filter.predicate();
        records
            .iter()
            .filter(|record| predicate.matches(record))
            .cloned()
            .collect()
    }

    /// Returns the records ordered by `sort`.
    pub fn sort(&self, records: &[Record], sort: &SortSpec) -> Vec<Record> {
        let mut result = records.to_vec();
        result.sort_by(|a, b| sort.compare(&self.collation, a, b));
        result
    }
}

/// Convenience wrapper around [`QueryEngine::filter_and_sort`] for one-off queries.
pub fn filter_and_sort(records: &[Record], filter: &FilterSpec, sort: &SortSpec) -> Vec<Record> {
    QueryEngine::new().filter_and_sort(records, filter, sort)
}
