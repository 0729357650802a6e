use std::{
    collections::{BTreeMap, HashMap},
    time::{Duration, Instant},
};

use shelf_state::{Record, RecordId};

use crate::{
    bins::{self, BinBoundaries, BinChange, BinPartitioner, BinRange},
    config::{Config, ViewPreferences, ViewSize},
    debounce::Debouncer,
    images::{CoverSide, ImageResolver, build_candidates_for},
    query::{FilterSpec, MatchMode, QueryEngine, SortField, SortSpec},
    report,
};

/// Holds the collection and everything the user has chosen about how to see it,
/// and keeps the displayed rows in step.
///
/// Every setter recomputes the rows immediately, except search input, which is
/// only applied once [`CollectionView::tick`] sees that typing has settled.
pub struct CollectionView {
    engine: QueryEngine,
    partitioner: BinPartitioner,

    records: Vec<Record>,
    rows: Vec<Record>,
    filter: FilterSpec,
    preferences: ViewPreferences,

    boundaries: BinBoundaries,
    /// Whether bins have been applied (or seeded) since the last reset.
    binned: bool,

    search: Debouncer<String>,

    image_dir: String,
    covers: HashMap<RecordId, ImageResolver>,
}
impl CollectionView {
    pub fn new(
        preferences: ViewPreferences,
        image_dir: impl Into<String>,
        debounce: Duration,
    ) -> Self {
        let filter = FilterSpec {
            match_mode: preferences.match_mode,
            ..Default::default()
        };
        Self {
            engine: QueryEngine::new(),
            partitioner: BinPartitioner::new(),
            records: vec![],
            rows: vec![],
            filter,
            preferences,
            boundaries: BinBoundaries::new(),
            binned: false,
            search: Debouncer::new(debounce),
            image_dir: image_dir.into(),
            covers: HashMap::new(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.view.clone(),
            config.images.dir.clone(),
            config.search.debounce(),
        )
    }

    /// Replaces the whole collection. Boundaries for records that no longer
    /// exist are dropped, and bins are reassigned if they were in use.
    pub fn replace_records(&mut self, records: Vec<Record>) {
        let dropped = self.boundaries.retain_known(&records);
        if dropped > 0 {
            tracing::debug!("dropped {dropped} boundaries for removed records");
        }

        self.records = if self.binned {
            self.partitioner.apply(&records, &self.boundaries)
        } else {
            records
        };

        let image_dir = &self.image_dir;
        let mut covers = std::mem::take(&mut self.covers);
        self.covers = self
            .records
            .iter()
            .map(|record| {
                let candidates = build_candidates_for(record, image_dir, CoverSide::Front);
                // Keep the progress of resolvers whose candidates haven't changed.
                let resolver = match covers.remove(&record.id) {
                    Some(resolver) if resolver.candidates() == candidates.as_slice() => resolver,
                    _ => ImageResolver::new(candidates),
                };
                (record.id.clone(), resolver)
            })
            .collect();

        tracing::info!("showing collection of {} records", self.records.len());
        self.recompute();
    }

    /// Restores persisted bin numbers as each record's bin, and derives the
    /// boundaries from them.
    ///
    /// Bins are shown as persisted, not renumbered, so the next
    /// [`Self::apply_bins`] reports every record whose stored bin is missing or
    /// out of step.
    pub fn seed_bins(&mut self, assignments: &BTreeMap<RecordId, u32>) {
        if assignments.is_empty() {
            return;
        }
        self.boundaries = self
            .partitioner
            .boundaries_from_assignments(&self.records, assignments);
        self.binned = true;
        self.records = self
            .records
            .iter()
            .map(|record| Record {
                bin: assignments.get(&record.id).copied(),
                ..record.clone()
            })
            .collect();
        tracing::debug!(
            "seeded {} boundaries from {} assignments",
            self.boundaries.len(),
            assignments.len()
        );
        self.recompute();
    }

    /// Records search input. It takes effect on the first [`Self::tick`] after
    /// the debounce period.
    pub fn set_search_input(&mut self, text: impl Into<String>, now: Instant) {
        self.search.push(text.into(), now);
    }

    /// Applies settled search input. Returns whether the rows changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        let Some(term) = self.search.poll(now) else {
            return false;
        };
        if term == self.filter.term {
            return false;
        }
        tracing::debug!("search settled on {term:?}");
        self.filter.term = term;
        self.recompute();
        true
    }

    /// Applies search input immediately, discarding anything pending.
    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.search.cancel();
        self.filter.term = term.into();
        self.recompute();
    }

    pub fn set_genre(&mut self, genre: impl Into<String>) {
        self.filter.genre = genre.into();
        self.recompute();
    }

    pub fn set_label(&mut self, label: impl Into<String>) {
        self.filter.label = label.into();
        self.recompute();
    }

    pub fn set_year(&mut self, year: impl Into<String>) {
        self.filter.year = year.into();
        self.recompute();
    }

    pub fn set_match_mode(&mut self, match_mode: MatchMode) {
        self.preferences.match_mode = match_mode;
        self.filter.match_mode = match_mode;
        self.recompute();
    }

    pub fn set_sort(&mut self, sort: SortSpec) {
        self.preferences.sort = sort;
        self.recompute();
    }

    /// Sorts by `field`, flipping the direction if it is already the sort field.
    pub fn toggle_sort_field(&mut self, field: SortField) {
        self.set_sort(self.preferences.sort.toggled(field));
    }

    pub fn set_view_size(&mut self, view_size: ViewSize) {
        self.preferences.view_size = view_size;
    }

    pub fn set_dark_mode(&mut self, dark_mode: bool) {
        self.preferences.dark_mode = dark_mode;
    }

    /// Marks or unmarks `id` as the last record of its bin. Bins are not
    /// reassigned until [`Self::apply_bins`].
    ///
    /// Returns whether `id` is now a boundary, or `None` if there's no such record.
    pub fn toggle_boundary(&mut self, id: &RecordId) -> Option<bool> {
        if !self.records.iter().any(|record| record.id == *id) {
            tracing::warn!("cannot toggle boundary for unknown record {id}");
            return None;
        }
        let is_boundary = self.boundaries.toggle(id);
        tracing::debug!("boundary for {id} is now {is_boundary}");
        Some(is_boundary)
    }

    pub fn is_boundary(&self, id: &RecordId) -> bool {
        self.boundaries.contains(id)
    }

    /// Reassigns every bin from the current boundaries.
    /// Returns the records whose bin changed, for persistence.
    pub fn apply_bins(&mut self) -> Vec<BinChange> {
        let binned = self.partitioner.apply(&self.records, &self.boundaries);
        self.binned = true;
        self.replace_bins(binned)
    }

    /// Clears every bin and boundary.
    /// Returns the records whose bin changed, for persistence.
    pub fn reset_bins(&mut self) -> Vec<BinChange> {
        let reset = bins::reset_bins(&self.records, &mut self.boundaries);
        self.binned = false;
        self.replace_bins(reset)
    }

    fn replace_bins(&mut self, records: Vec<Record>) -> Vec<BinChange> {
        let changes = bins::bin_changes(&self.records, &records);
        tracing::info!("{} records changed bin", changes.len());
        self.records = records;
        self.recompute();
        changes
    }

    /// The records to display, filtered and sorted.
    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    /// The whole collection, in the order it was provided.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn record(&self, id: &RecordId) -> Option<&Record> {
        self.records.iter().find(|record| record.id == *id)
    }

    pub fn filter(&self) -> &FilterSpec {
        &self.filter
    }

    pub fn sort(&self) -> SortSpec {
        self.preferences.sort
    }

    pub fn boundaries(&self) -> &BinBoundaries {
        &self.boundaries
    }

    /// The bins across the whole collection, in shelf order.
    pub fn bin_ranges(&self) -> Vec<BinRange> {
        self.partitioner.ranges(&self.records)
    }

    /// The genres present in the collection, for filter choices.
    pub fn genres(&self) -> Vec<String> {
        report::distinct_genres(self.engine.collation(), &self.records)
    }

    /// The labels present in the collection, for filter choices.
    pub fn labels(&self) -> Vec<String> {
        report::distinct_labels(self.engine.collation(), &self.records)
    }

    /// The front cover image to display for `id`.
    pub fn cover(&self, id: &RecordId) -> Option<&str> {
        self.covers.get(id).map(ImageResolver::current)
    }

    /// Reports that the displayed cover for `id` failed to load.
    /// Returns whether there is another candidate to try.
    pub fn cover_failed(&mut self, id: &RecordId) -> bool {
        self.covers
            .get_mut(id)
            .is_some_and(ImageResolver::on_load_failure)
    }

    /// The back cover candidates for `id`. Not tracked, as back covers are
    /// only shown on demand.
    pub fn back_cover(&self, id: &RecordId) -> Option<ImageResolver> {
        let record = self.record(id)?;
        Some(ImageResolver::for_record(record, &self.image_dir, CoverSide::Back))
    }

    pub fn preferences(&self) -> &ViewPreferences {
        &self.preferences
    }

    fn recompute(&mut self) {
        self.rows = self
            .engine
            .filter_and_sort(&self.records, &self.filter, &self.preferences.sort);
        tracing::debug!(
            "{} of {} records shown, sorted by {}",
            self.rows.len(),
            self.records.len(),
            self.preferences.sort
        );
    }
}
