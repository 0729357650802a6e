use std::collections::{BTreeMap, HashSet};

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::{ImageHints, Record, RecordId};

/// The object keys a wrapped collection payload may hold its records under, in priority order.
pub const COLLECTION_KEYS: [&str; 3] = ["records", "collection", "items"];

/// Parses a collection payload into records.
///
/// Never fails: invalid JSON or an unrecognised shape produce an empty list,
/// and individual malformed records are skipped.
pub fn parse_collection(bytes: &[u8]) -> Vec<Record> {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(value) => records_from_value(value),
        Err(e) => {
            tracing::warn!("collection payload is not valid JSON, treating as empty: {e}");
            vec![]
        }
    }
}

/// Extracts records from an already-decoded collection payload.
///
/// Accepts a bare array, or an object holding an array under one of [`COLLECTION_KEYS`].
pub fn records_from_value(value: Value) -> Vec<Record> {
    let Some(items) = extract_items(value) else {
        tracing::warn!("collection payload has an unexpected shape, treating as empty");
        return vec![];
    };

    let mut seen = HashSet::new();
    let mut records = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        if !item.is_object() {
            tracing::warn!("skipping collection entry {index}: not an object");
            continue;
        }
        let raw = match serde_json::from_value::<RawRecord>(item) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("skipping collection entry {index}: {e}");
                continue;
            }
        };
        let Some(record) = raw.into_record() else {
            tracing::warn!("skipping collection entry {index}: no id");
            continue;
        };
        if !seen.insert(record.id.clone()) {
            tracing::warn!("skipping collection entry {index}: duplicate id {}", record.id);
            continue;
        }
        records.push(record);
    }
    records
}

/// Parses persisted bin assignments. Entries whose value is not a positive
/// integer (or a string holding one) are skipped.
pub fn parse_bin_assignments(raw: Map<String, Value>) -> BTreeMap<RecordId, u32> {
    raw.into_iter()
        .filter_map(|(id, value)| {
            let bin = match &value {
                Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
                Value::String(s) => s.trim().parse::<u32>().ok(),
                _ => None,
            }
            .filter(|bin| *bin > 0);
            if bin.is_none() && !value.is_null() {
                tracing::warn!("ignoring unusable bin value for {id}: {value}");
            }
            Some((RecordId::new(id), bin?))
        })
        .collect()
}

fn extract_items(value: Value) -> Option<Vec<Value>> {
    match value {
        Value::Array(items) => Some(items),
        Value::Object(mut map) => COLLECTION_KEYS.iter().find_map(|key| match map.remove(*key) {
            Some(Value::Array(items)) => Some(items),
            _ => None,
        }),
        _ => None,
    }
}

/// A scalar that producers send as either a number or a string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawScalar {
    Integer(i64),
    Unsigned(u64),
    Float(f64),
    Text(String),
    Other(Value),
}
impl RawScalar {
    fn into_text(self) -> Option<String> {
        let text = match self {
            RawScalar::Integer(n) => n.to_string(),
            RawScalar::Unsigned(n) => n.to_string(),
            RawScalar::Float(n) => n.to_string(),
            RawScalar::Text(s) => s.trim().to_string(),
            RawScalar::Other(_) => return None,
        };
        (!text.is_empty()).then_some(text)
    }

    fn into_positive(self) -> Option<u32> {
        let value = match self {
            RawScalar::Integer(n) => u32::try_from(n).ok(),
            RawScalar::Unsigned(n) => u32::try_from(n).ok(),
            RawScalar::Float(n) if n.fract() == 0.0 && n >= 1.0 && n <= u32::MAX as f64 => {
                Some(n as u32)
            }
            RawScalar::Text(s) => s.trim().parse::<u32>().ok(),
            _ => None,
        };
        value.filter(|n| *n > 0)
    }
}

/// One entry of a list-valued field: a bare string, or an object naming it.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawEntry {
    Text(String),
    Object(Map<String, Value>),
    Other(Value),
}
impl RawEntry {
    fn into_text(self, key: &str) -> Option<String> {
        let text = match self {
            RawEntry::Text(s) => s,
            RawEntry::Object(mut map) => match map.remove(key) {
                Some(Value::String(s)) => s,
                _ => return None,
            },
            RawEntry::Other(_) => return None,
        };
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    }
}

/// A field that may be a single string or a list of entries.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawList {
    One(String),
    Many(Vec<RawEntry>),
    Other(Value),
}
impl RawList {
    fn into_texts(self, key: &str) -> Vec<String> {
        match self {
            RawList::One(s) => RawEntry::Text(s).into_text(key).into_iter().collect(),
            RawList::Many(entries) => entries
                .into_iter()
                .filter_map(|entry| entry.into_text(key))
                .collect(),
            RawList::Other(_) => vec![],
        }
    }
}

/// The nested release summary some producers wrap record metadata in.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BasicInformation {
    title: Option<RawScalar>,
    artists: Option<RawList>,
    year: Option<RawScalar>,
    genres: Option<RawList>,
    labels: Option<RawList>,
    formats: Option<RawList>,
    cover_image: Option<RawScalar>,
    thumb: Option<RawScalar>,
}

/// `basic_information` as sent: usually an object, but anything else is ignored
/// rather than failing the whole record.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawBasicInformation {
    Object(BasicInformation),
    Other(Value),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawRecord {
    id: Option<RawScalar>,
    title: Option<RawScalar>,
    name: Option<RawScalar>,
    artist: Option<RawScalar>,
    artists: Option<RawList>,
    year: Option<RawScalar>,
    genre: Option<RawList>,
    label: Option<RawList>,
    format: Option<RawList>,
    tracklist: Option<RawList>,
    date_added: Option<RawScalar>,
    cover_image: Option<RawScalar>,
    thumb: Option<RawScalar>,
    back_image: Option<RawScalar>,
    back_thumb: Option<RawScalar>,
    #[serde(rename = "imageId")]
    image_id: Option<RawScalar>,
    basic_information: Option<RawBasicInformation>,
}
impl RawRecord {
    fn into_record(self) -> Option<Record> {
        let id = RecordId::new(self.id?.into_text()?);
        let info = match self.basic_information {
            Some(RawBasicInformation::Object(info)) => info,
            _ => BasicInformation::default(),
        };

        let text = |value: Option<RawScalar>| value.and_then(RawScalar::into_text);
        let list = |value: Option<RawList>, key: &str| {
            value.map(|v| v.into_texts(key)).unwrap_or_default()
        };
        let first = |values: Vec<String>| values.into_iter().next();
        let or_list = |primary: Vec<String>, fallback: Vec<String>| {
            if primary.is_empty() { fallback } else { primary }
        };

        let title = text(self.title)
            .or_else(|| text(self.name))
            .or_else(|| text(info.title))
            .unwrap_or_default();
        let artist = text(self.artist)
            .or_else(|| first(list(self.artists, "name")))
            .or_else(|| first(list(info.artists, "name")))
            .unwrap_or_default();
        let year = self
            .year
            .and_then(RawScalar::into_positive)
            .or_else(|| info.year.and_then(RawScalar::into_positive));

        Some(Record {
            id,
            title,
            artist,
            year,
            genre: or_list(list(self.genre, "name"), list(info.genres, "name")),
            label: or_list(list(self.label, "name"), list(info.labels, "name")),
            format: or_list(list(self.format, "name"), list(info.formats, "name")),
            tracklist: list(self.tracklist, "title"),
            date_added: text(self.date_added),
            images: ImageHints {
                cover_image: text(self.cover_image).or_else(|| text(info.cover_image)),
                thumb: text(self.thumb).or_else(|| text(info.thumb)),
                back_image: text(self.back_image),
                back_thumb: text(self.back_thumb),
                image_id: text(self.image_id),
            },
            bin: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(records: &[Record]) -> Vec<&str> {
        records.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn test_bare_array_payload() {
        let records = parse_collection(
            br#"[
                {"id": 1, "artist": "B", "title": "Y"},
                {"id": "2", "artist": "A", "title": "Z"}
            ]"#,
        );
        assert_eq!(ids(&records), ["1", "2"]);
        assert_eq!(records[0].artist, "B");
        assert_eq!(records[1].title, "Z");
    }

    #[test]
    fn test_wrapped_payloads() {
        for key in COLLECTION_KEYS {
            let payload = format!(r#"{{"{key}": [{{"id": 7, "artist": "A", "title": "T"}}]}}"#);
            assert_eq!(ids(&parse_collection(payload.as_bytes())), ["7"], "key {key}");
        }
    }

    #[test]
    fn test_wrapped_payload_prefers_first_array_key() {
        let records = parse_collection(
            br#"{"records": "nope", "collection": [{"id": 1}], "items": [{"id": 2}]}"#,
        );
        assert_eq!(ids(&records), ["1"]);
    }

    #[test]
    fn test_unexpected_shapes_are_empty() {
        assert!(parse_collection(b"not json").is_empty());
        assert!(parse_collection(b"42").is_empty());
        assert!(parse_collection(br#"{"error": "Failed to read collection"}"#).is_empty());
        assert!(parse_collection(br#"{"records": {"id": 1}}"#).is_empty());
    }

    #[test]
    fn test_bad_entries_are_skipped() {
        let records = parse_collection(
            br#"[
                "just a string",
                {"title": "no id"},
                {"id": "", "title": "blank id"},
                {"id": 1, "title": "first"},
                {"id": 1, "title": "duplicate"},
                [1, 2, 3],
                {"id": 2, "title": "second"}
            ]"#,
        );
        assert_eq!(ids(&records), ["1", "2"]);
        assert_eq!(records[0].title, "first");
    }

    #[test]
    fn test_list_fields_accept_every_shape() {
        let records = parse_collection(
            br#"[
                {"id": 1, "genre": "Jazz", "label": ["Blue Note", "  "], "format": [{"name": "Vinyl"}, {"name": "LP"}]},
                {"id": 2, "genre": ["Rock", "Pop"], "label": null, "format": 12}
            ]"#,
        );
        assert_eq!(records[0].genre, ["Jazz"]);
        assert_eq!(records[0].label, ["Blue Note"]);
        assert_eq!(records[0].format, ["Vinyl", "LP"]);
        assert_eq!(records[0].joined_format(), "Vinyl, LP");
        assert_eq!(records[1].genre, ["Rock", "Pop"]);
        assert_eq!(records[1].joined_genre(), "Rock, Pop");
        assert!(records[1].label.is_empty());
        assert!(records[1].format.is_empty());
    }

    #[test]
    fn test_tracklist_strings_and_objects() {
        let records = parse_collection(
            br#"[{"id": 1, "tracklist": ["Intro", {"title": "Love Song", "duration": "3:12"}, {"position": "B1"}]}]"#,
        );
        assert_eq!(records[0].tracklist, ["Intro", "Love Song"]);
    }

    #[test]
    fn test_year_normalisation() {
        let records = parse_collection(
            br#"[
                {"id": 1, "year": 1977},
                {"id": 2, "year": "1984"},
                {"id": 3, "year": 0},
                {"id": 4, "year": "unknown"},
                {"id": 5, "year": -3},
                {"id": 6}
            ]"#,
        );
        let years: Vec<_> = records.iter().map(|r| r.year).collect();
        assert_eq!(years, [Some(1977), Some(1984), None, None, None, None]);
    }

    #[test]
    fn test_discogs_basic_information() {
        let records = parse_collection(
            br#"[{
                "id": 1626692,
                "date_added": "2021-03-04T10:00:00-08:00",
                "basic_information": {
                    "title": "Kind of Blue",
                    "year": 1959,
                    "artists": [{"name": "Miles Davis", "id": 23755}],
                    "genres": ["Jazz"],
                    "labels": [{"name": "Columbia", "catno": "CL 1355"}],
                    "formats": [{"name": "Vinyl", "qty": "1"}],
                    "cover_image": "https://img.example.com/kob.jpg",
                    "thumb": "https://img.example.com/kob-150.jpg"
                }
            }]"#,
        );
        let record = &records[0];
        assert_eq!(record.id.as_str(), "1626692");
        assert_eq!(record.title, "Kind of Blue");
        assert_eq!(record.artist, "Miles Davis");
        assert_eq!(record.year, Some(1959));
        assert_eq!(record.genre, ["Jazz"]);
        assert_eq!(record.label, ["Columbia"]);
        assert_eq!(record.format, ["Vinyl"]);
        assert_eq!(
            record.images.cover_image.as_deref(),
            Some("https://img.example.com/kob.jpg")
        );
        assert_eq!(record.date_added.as_deref(), Some("2021-03-04T10:00:00-08:00"));
    }

    #[test]
    fn test_top_level_fields_win_over_basic_information() {
        let records = parse_collection(
            br#"[{"id": 1, "title": "Top", "basic_information": {"title": "Nested", "artists": [{"name": "Nested Artist"}]}}]"#,
        );
        assert_eq!(records[0].title, "Top");
        assert_eq!(records[0].artist, "Nested Artist");
    }

    #[test]
    fn test_malformed_basic_information_is_ignored() {
        let records = parse_collection(
            br#"[
                {"id": 1, "title": "Top", "basic_information": "not an object"},
                {"id": 2, "title": "Also top", "basic_information": 17}
            ]"#,
        );
        assert_eq!(ids(&records), ["1", "2"]);
        assert_eq!(records[0].title, "Top");
        assert_eq!(records[1].title, "Also top");
        assert_eq!(records[0].artist, "");
    }

    #[test]
    fn test_large_unsigned_ids_are_exact() {
        let records = parse_collection(
            br#"[{"id": 18446744073709551615, "year": 1977}, {"id": 9223372036854775808}]"#,
        );
        assert_eq!(ids(&records), ["18446744073709551615", "9223372036854775808"]);
        assert_eq!(records[0].year, Some(1977));
    }

    #[test]
    fn test_image_hints() {
        let records = parse_collection(
            br#"[{"id": 42, "cover_image": "", "thumb": "/images/thumb_42.jpg", "back_image": "images/42_back.jpg", "imageId": 9001}]"#,
        );
        let images = &records[0].images;
        assert_eq!(images.cover_image, None);
        assert_eq!(images.thumb.as_deref(), Some("/images/thumb_42.jpg"));
        assert_eq!(images.back_image.as_deref(), Some("images/42_back.jpg"));
        assert_eq!(images.image_id.as_deref(), Some("9001"));
        assert_eq!(records[0].bin, None);
    }

    #[test]
    fn test_bin_assignments() {
        let raw: Map<String, Value> = serde_json::from_str(
            r#"{"1": 1, "2": "2", "3": null, "4": "x", "5": 0, "6": 3.5}"#,
        )
        .unwrap();
        let bins = parse_bin_assignments(raw);
        assert_eq!(
            bins.into_iter().collect::<Vec<_>>(),
            [(RecordId::new("1"), 1), (RecordId::new("2"), 2)]
        );
    }
}
