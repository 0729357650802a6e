use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// A record ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub SmolStr);
impl RecordId {
    /// Create a record ID from anything string-like.
    pub fn new(id: impl AsRef<str>) -> Self {
        RecordId(SmolStr::new(id))
    }

    /// The ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}
impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        RecordId::new(id)
    }
}

/// Where a record's artwork might live. All hints are optional and unverified.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageHints {
    /// A direct front cover location.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    /// A front cover thumbnail location.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumb: Option<String>,
    /// A direct back cover location.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub back_image: Option<String>,
    /// A back cover thumbnail location.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub back_thumb: Option<String>,
    /// An alternate identifier local image files may be named after.
    #[serde(rename = "imageId", skip_serializing_if = "Option::is_none")]
    pub image_id: Option<String>,
}

/// A physical item in the collection, as `shelf` cares about it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// The record ID
    pub id: RecordId,
    /// The title; empty when unknown
    pub title: String,
    /// The artist; empty when unknown
    pub artist: String,
    /// The release year
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,
    /// The genres
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub genre: Vec<String>,
    /// The labels
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub label: Vec<String>,
    /// The formats
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub format: Vec<String>,
    /// The track titles, in order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tracklist: Vec<String>,
    /// When the record was added to the collection, as an ISO-8601-like string
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_added: Option<String>,
    /// Artwork location hints
    #[serde(flatten)]
    pub images: ImageHints,
    /// The bin the record is shelved in. Never sourced from upstream.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bin: Option<u32>,
}
impl Record {
    /// Create a record with the given identity and no other metadata.
    pub fn new(
        id: impl Into<RecordId>,
        artist: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Record {
            id: id.into(),
            title: title.into(),
            artist: artist.into(),
            year: None,
            genre: vec![],
            label: vec![],
            format: vec![],
            tracklist: vec![],
            date_added: None,
            images: ImageHints::default(),
            bin: None,
        }
    }

    /// The genres joined with `", "`.
    pub fn joined_genre(&self) -> String {
        self.genre.join(", ")
    }

    /// The labels joined with `", "`.
    pub fn joined_label(&self) -> String {
        self.label.join(", ")
    }

    /// The formats joined with `", "`.
    pub fn joined_format(&self) -> String {
        self.format.join(", ")
    }

    /// The first year of the decade the record was released in, such as `1970`.
    pub fn decade(&self) -> Option<u32> {
        self.year.map(|year| year / 10 * 10)
    }
}
impl std::fmt::Display for Record {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let artist = if self.artist.is_empty() {
            "Unknown Artist"
        } else {
            &self.artist
        };
        let title = if self.title.is_empty() {
            "(untitled)"
        } else {
            &self.title
        };
        write!(f, "{artist} - {title}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decade() {
        let mut record = Record::new("1", "Can", "Tago Mago");
        assert_eq!(record.decade(), None);
        record.year = Some(1971);
        assert_eq!(record.decade(), Some(1970));
        record.year = Some(2000);
        assert_eq!(record.decade(), Some(2000));
    }

    #[test]
    fn test_display_placeholders() {
        assert_eq!(Record::new("1", "", "").to_string(), "Unknown Artist - (untitled)");
        assert_eq!(Record::new("1", "Can", "Ege Bamyasi").to_string(), "Can - Ege Bamyasi");
    }
}
