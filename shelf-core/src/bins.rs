use std::collections::{BTreeMap, BTreeSet, HashMap};

use shelf_state::{Collation, Record, RecordId};

/// The records marked as the last item in their bin.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BinBoundaries {
    ids: BTreeSet<RecordId>,
}
impl BinBoundaries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `id` as a boundary if it isn't one, unmarks it otherwise.
    /// Returns whether `id` is a boundary afterwards.
    pub fn toggle(&mut self, id: &RecordId) -> bool {
        if self.ids.remove(id) {
            false
        } else {
            self.ids.insert(id.clone());
            true
        }
    }

    pub fn contains(&self, id: &RecordId) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RecordId> {
        self.ids.iter()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Drops boundaries for records that are no longer in `records`.
    /// Returns the number of boundaries dropped.
    pub fn retain_known(&mut self, records: &[Record]) -> usize {
        let known: BTreeSet<&RecordId> = records.iter().map(|r| &r.id).collect();
        let before = self.ids.len();
        self.ids.retain(|id| known.contains(id));
        before - self.ids.len()
    }

    /// Reconstructs boundaries from persisted bin numbers.
    /// See [`BinPartitioner::boundaries_from_assignments`].
    pub fn from_assignments(records: &[Record], assignments: &BTreeMap<RecordId, u32>) -> Self {
        BinPartitioner::new().boundaries_from_assignments(records, assignments)
    }
}
impl FromIterator<RecordId> for BinBoundaries {
    fn from_iter<T: IntoIterator<Item = RecordId>>(iter: T) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

/// A record whose bin differs between two assignments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinChange {
    pub id: RecordId,
    pub before: Option<u32>,
    pub after: Option<u32>,
}

/// A summary of one bin, in shelf order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinRange {
    /// The bin number.
    pub bin: u32,
    /// The first record shelved in the bin.
    pub first: RecordId,
    /// The last record shelved in the bin.
    pub last: RecordId,
    /// The number of records in the bin.
    pub count: usize,
}

/// Assigns bin numbers along the canonical shelf order (artist, then title).
///
/// Bins are always recomputed from scratch, so the result depends only on the
/// record set and the boundaries, never on earlier assignments.
#[derive(Default)]
pub struct BinPartitioner {
    collation: Collation,
}
impl BinPartitioner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns indices into `records` in shelf order. Records that compare
    /// equal keep their input order.
    pub fn canonical_order(&self, records: &[Record]) -> Vec<usize> {
        let mut order: Vec<usize> = (0..records.len()).collect();
        order.sort_by(|&a, &b| self.collation.cmp_artist_title(&records[a], &records[b]));
        order
    }

    /// Returns the bin of each record, indexed like `records`.
    pub fn assign(&self, records: &[Record], boundaries: &BinBoundaries) -> Vec<u32> {
        let mut bins = vec![0; records.len()];
        let mut current_bin = 1;
        for index in self.canonical_order(records) {
            bins[index] = current_bin;
            if boundaries.contains(&records[index].id) {
                current_bin += 1;
            }
        }
        bins
    }

    /// Returns a copy of `records`, in input order, with every bin assigned.
    pub fn apply(&self, records: &[Record], boundaries: &BinBoundaries) -> Vec<Record> {
        let bins = self.assign(records, boundaries);
        let result: Vec<Record> = records
            .iter()
            .zip(bins)
            .map(|(record, bin)| Record {
                bin: Some(bin),
                ..record.clone()
            })
            .collect();
        tracing::debug!(
            "assigned {} records to bins with {} boundaries",
            result.len(),
            boundaries.len()
        );
        result
    }

    /// Reconstructs boundaries from previously persisted bin numbers: a record
    /// is a boundary when the next assigned record in shelf order has a higher bin.
    /// Records without an assignment are passed over.
    pub fn boundaries_from_assignments(
        &self,
        records: &[Record],
        assignments: &BTreeMap<RecordId, u32>,
    ) -> BinBoundaries {
        let assigned: Vec<(&RecordId, u32)> = self
            .canonical_order(records)
            .into_iter()
            .filter_map(|index| {
                let id = &records[index].id;
                assignments.get(id).map(|bin| (id, *bin))
            })
            .collect();

        assigned
            .windows(2)
            .filter(|pair| pair[1].1 > pair[0].1)
            .map(|pair| pair[0].0.clone())
            .collect()
    }

    /// Summarises the assigned bins in shelf order. Records without a bin are skipped.
    pub fn ranges(&self, records: &[Record]) -> Vec<BinRange> {
        let mut ranges: Vec<BinRange> = vec![];
        for index in self.canonical_order(records) {
            let record = &records[index];
            let Some(bin) = record.bin else {
                continue;
            };
            match ranges.last_mut() {
                Some(range) if range.bin == bin => {
                    range.last = record.id.clone();
                    range.count += 1;
                }
                _ => ranges.push(BinRange {
                    bin,
                    first: record.id.clone(),
                    last: record.id.clone(),
                    count: 1,
                }),
            }
        }
        ranges
    }
}

/// Returns indices into `records` in shelf order.
pub fn canonical_order(records: &[Record]) -> Vec<usize> {
    BinPartitioner::new().canonical_order(records)
}

/// Returns a copy of `records` with bins assigned from `boundaries`.
pub fn apply_bins(records: &[Record], boundaries: &BinBoundaries) -> Vec<Record> {
    BinPartitioner::new().apply(records, boundaries)
}

/// Returns a copy of `records` with every bin cleared, and clears `boundaries`.
///
/// This discards all bin work; callers are expected to confirm with the user first.
pub fn reset_bins(records: &[Record], boundaries: &mut BinBoundaries) -> Vec<Record> {
    tracing::debug!("resetting bins ({} boundaries)", boundaries.len());
    boundaries.clear();
    records
        .iter()
        .map(|record| Record {
            bin: None,
            ..record.clone()
        })
        .collect()
}

/// Summarises the assigned bins of `records` in shelf order.
pub fn bin_ranges(records: &[Record]) -> Vec<BinRange> {
    BinPartitioner::new().ranges(records)
}

/// Lists records in `after` whose bin differs from the same record in `before`.
/// Records only present in `after` count as previously unassigned.
pub fn bin_changes(before: &[Record], after: &[Record]) -> Vec<BinChange> {
    let previous: HashMap<&RecordId, Option<u32>> =
        before.iter().map(|record| (&record.id, record.bin)).collect();
    after
        .iter()
        .filter_map(|record| {
            let before = previous.get(&record.id).copied().flatten();
            (before != record.bin).then(|| BinChange {
                id: record.id.clone(),
                before,
                after: record.bin,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    use rand::{Rng, SeedableRng, rngs::StdRng, seq::IndexedRandom};

    fn record(id: &str, artist: &str, title: &str) -> Record {
        Record::new(id, artist, title)
    }

    fn bins_by_id(records: &[Record]) -> Vec<(&str, Option<u32>)> {
        let mut bins: Vec<_> = records.iter().map(|r| (r.id.as_str(), r.bin)).collect();
        bins.sort();
        bins
    }

    fn boundaries(ids: &[&str]) -> BinBoundaries {
        ids.iter().map(|id| RecordId::new(id)).collect()
    }

    #[test]
    fn test_boundary_starts_next_bin() {
        let records = vec![record("1", "A", "A"), record("2", "B", "B"), record("3", "C", "C")];
        let result = apply_bins(&records, &boundaries(&["2"]));
        assert_eq!(
            bins_by_id(&result),
            [("1", Some(1)), ("2", Some(1)), ("3", Some(2))]
        );
    }

    #[test]
    fn test_bins_follow_shelf_order_not_input_order() {
        let records = vec![
            record("z", "Zappa", "Hot Rats"),
            record("a", "Abba", "Arrival"),
            record("m", "Miles Davis", "Kind of Blue"),
        ];
        let result = apply_bins(&records, &boundaries(&["a"]));
        // Input order is preserved in the output.
        assert_eq!(
            result.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(),
            ["z", "a", "m"]
        );
        assert_eq!(
            bins_by_id(&result),
            [("a", Some(1)), ("m", Some(2)), ("z", Some(2))]
        );
    }

    #[test]
    fn test_no_boundaries_is_one_bin() {
        let records = vec![record("1", "A", "A"), record("2", "B", "B")];
        let result = apply_bins(&records, &BinBoundaries::new());
        assert!(result.iter().all(|r| r.bin == Some(1)));
    }

    #[test]
    fn test_empty_collection() {
        assert!(apply_bins(&[], &boundaries(&["1"])).is_empty());
        let mut b = boundaries(&["1"]);
        assert!(reset_bins(&[], &mut b).is_empty());
        assert!(b.is_empty());
    }

    #[test]
    fn test_removing_boundary_merges_bins() {
        let records = vec![
            record("1", "A", "A"),
            record("2", "B", "B"),
            record("3", "C", "C"),
            record("4", "D", "D"),
        ];
        let mut b = boundaries(&["1", "3"]);
        let first = apply_bins(&records, &b);
        assert_eq!(
            bins_by_id(&first),
            [("1", Some(1)), ("2", Some(2)), ("3", Some(2)), ("4", Some(3))]
        );

        assert!(!b.toggle(&RecordId::new("1")));
        let second = apply_bins(&first, &b);
        assert_eq!(
            bins_by_id(&second),
            [("1", Some(1)), ("2", Some(1)), ("3", Some(1)), ("4", Some(2))]
        );
    }

    #[test]
    fn test_toggle() {
        let mut b = BinBoundaries::new();
        let id = RecordId::new("7");
        assert!(b.toggle(&id));
        assert!(b.contains(&id));
        assert!(!b.toggle(&id));
        assert!(!b.contains(&id));
        assert!(b.is_empty());
    }

    #[test]
    fn test_retain_known() {
        let records = vec![record("1", "A", "A"), record("2", "B", "B")];
        let mut b = boundaries(&["1", "gone", "also gone"]);
        assert_eq!(b.retain_known(&records), 2);
        assert_eq!(b, boundaries(&["1"]));
    }

    #[test]
    fn test_reset_clears_everything() {
        let records = vec![record("1", "A", "A"), record("2", "B", "B")];
        let mut b = boundaries(&["1"]);
        let binned = apply_bins(&records, &b);
        let reset = reset_bins(&binned, &mut b);
        assert!(reset.iter().all(|r| r.bin.is_none()));
        assert!(b.is_empty());
        // The input is untouched.
        assert!(binned.iter().all(|r| r.bin.is_some()));
    }

    #[test]
    fn test_equal_keys_are_stable() {
        let records: Vec<_> = (0..6).map(|i| record(&i.to_string(), "Same", "Same")).collect();
        let b = boundaries(&["2"]);
        let first = apply_bins(&records, &b);
        assert_eq!(
            first.iter().map(|r| r.bin.unwrap()).collect::<Vec<_>>(),
            [1, 1, 1, 2, 2, 2]
        );
        assert_eq!(apply_bins(&first, &b), first);
    }

    #[test]
    fn test_boundary_on_last_record_opens_no_bin() {
        let records = vec![record("1", "A", "A"), record("2", "B", "B")];
        let result = apply_bins(&records, &boundaries(&["2"]));
        assert!(result.iter().all(|r| r.bin == Some(1)));
    }

    #[test]
    fn test_bins_monotonic_randomised() {
        let mut rng = StdRng::seed_from_u64(1234);
        let partitioner = BinPartitioner::new();
        let artists = ["Abba", "abba", "Can", "Neu!", "Ñu", "Talk Talk"];
        let titles = ["Arrival", "Tago Mago", "75", "Colour of Spring", ""];
        for _ in 0..100 {
            let count = rng.random_range(1..40);
            let records: Vec<_> = (0..count)
                .map(|i| {
                    record(
                        &i.to_string(),
                        artists.choose(&mut rng).unwrap(),
                        titles.choose(&mut rng).unwrap(),
                    )
                })
                .collect();
            let order = partitioner.canonical_order(&records);
            // Boundaries never include the last record in shelf order here, so each opens a bin.
            let b: BinBoundaries = order[..order.len() - 1]
                .iter()
                .filter(|_| rng.random_bool(0.3))
                .map(|&i| records[i].id.clone())
                .collect();

            let result = partitioner.apply(&records, &b);
            let walked: Vec<u32> = order.iter().map(|&i| result[i].bin.unwrap()).collect();
            assert!(walked.windows(2).all(|w| w[0] <= w[1]), "{walked:?}");
            let distinct: BTreeSet<u32> = walked.iter().copied().collect();
            assert_eq!(distinct.len(), b.len() + 1);
            assert_eq!(partitioner.apply(&records, &b), result);
        }
    }

    #[test]
    fn test_boundaries_round_trip_through_assignments() {
        let records = vec![
            record("1", "A", "A"),
            record("2", "B", "B"),
            record("3", "C", "C"),
            record("4", "D", "D"),
            record("5", "E", "E"),
        ];
        let b = boundaries(&["2", "3"]);
        let partitioner = BinPartitioner::new();
        let assignments: BTreeMap<RecordId, u32> = partitioner
            .apply(&records, &b)
            .into_iter()
            .map(|r| (r.id, r.bin.unwrap()))
            .collect();
        assert_eq!(BinBoundaries::from_assignments(&records, &assignments), b);
    }

    #[test]
    fn test_boundaries_from_partial_assignments() {
        let records = vec![record("1", "A", "A"), record("2", "B", "B"), record("3", "C", "C")];
        let assignments = BTreeMap::from([(RecordId::new("1"), 1), (RecordId::new("3"), 2)]);
        let partitioner = BinPartitioner::new();
        assert_eq!(
            partitioner.boundaries_from_assignments(&records, &assignments),
            boundaries(&["1"])
        );
    }

    #[test]
    fn test_bin_changes() {
        let records = vec![record("1", "A", "A"), record("2", "B", "B"), record("3", "C", "C")];
        let first = apply_bins(&records, &boundaries(&["1"]));
        let second = apply_bins(&first, &boundaries(&["2"]));
        assert_eq!(
            bin_changes(&first, &second),
            [BinChange {
                id: RecordId::new("2"),
                before: Some(2),
                after: Some(1),
            }]
        );
        assert_eq!(bin_changes(&records, &first).len(), 3);
        assert!(bin_changes(&second, &second).is_empty());
    }

    #[test]
    fn test_ranges() {
        let records = vec![
            record("4", "D", "D"),
            record("1", "A", "A"),
            record("3", "C", "C"),
            record("2", "B", "B"),
        ];
        let partitioner = BinPartitioner::new();
        let binned = partitioner.apply(&records, &boundaries(&["1"]));
        assert_eq!(
            partitioner.ranges(&binned),
            [
                BinRange {
                    bin: 1,
                    first: RecordId::new("1"),
                    last: RecordId::new("1"),
                    count: 1,
                },
                BinRange {
                    bin: 2,
                    first: RecordId::new("2"),
                    last: RecordId::new("4"),
                    count: 3,
                },
            ]
        );
        assert!(bin_ranges(&records).is_empty());
    }
}
