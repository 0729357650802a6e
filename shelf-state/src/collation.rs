use std::cmp::Ordering;

use crate::Record;

/// Locale-aware string ordering, used everywhere records are put in shelf order.
///
/// Uses the root locale at the collator's default strength, so case still
/// distinguishes otherwise-equal strings. Falls back to code point order if
/// the collator cannot be built.
pub struct Collation {
    collator: Option<icu_collator::CollatorBorrowed<'static>>,
}
impl Collation {
    /// Build a new collation.
    pub fn new() -> Self {
        let collator = match icu_collator::Collator::try_new(
            icu_collator::CollatorPreferences::default(),
            icu_collator::options::CollatorOptions::default(),
        ) {
            Ok(collator) => Some(collator),
            Err(e) => {
                tracing::warn!("failed to build collator, using code point order: {e}");
                None
            }
        };
        Self { collator }
    }

    /// Compare two strings.
    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        match &self.collator {
            Some(collator) => collator.compare(a, b),
            None => a.cmp(b),
        }
    }

    /// Compare two records by artist, then title. This is the order records are shelved in.
    pub fn cmp_artist_title(&self, a: &Record, b: &Record) -> Ordering {
        self.compare(&a.artist, &b.artist)
            .then_with(|| self.compare(&a.title, &b.title))
    }
}
impl Default for Collation {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_is_locale_aware() {
        let collation = Collation::new();
        assert_eq!(collation.compare("apple", "Banana"), Ordering::Less);
        assert_eq!(collation.compare("Banana", "apple"), Ordering::Greater);
        assert_eq!(collation.compare("Éclair", "Eclairs"), Ordering::Less);
        assert_eq!(collation.compare("same", "same"), Ordering::Equal);
    }

    #[test]
    fn test_compare_is_case_sensitive() {
        let collation = Collation::new();
        assert_ne!(collation.compare("abba", "ABBA"), Ordering::Equal);
    }

    #[test]
    fn test_cmp_artist_title() {
        let collation = Collation::new();
        let a = Record::new("1", "B", "Y");
        let b = Record::new("2", "A", "Z");
        let c = Record::new("3", "B", "X");
        assert_eq!(collation.cmp_artist_title(&b, &a), Ordering::Less);
        assert_eq!(collation.cmp_artist_title(&c, &a), Ordering::Less);
        assert_eq!(collation.cmp_artist_title(&a, &a), Ordering::Equal);
    }
}
