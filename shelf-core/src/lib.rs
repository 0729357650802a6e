//! The collection catalog: filtering and sorting, bin assignment, cover image
//! resolution, and the view that ties them together.
pub mod bins;
pub mod config;
pub mod debounce;
pub mod images;
pub mod query;
pub mod report;
pub mod util;

mod view;
pub use view::CollectionView;

pub use bins::{
    BinBoundaries, BinChange, BinPartitioner, BinRange, apply_bins, bin_changes, bin_ranges,
    canonical_order, reset_bins,
};
pub use config::{
    Config, ConfigError, ConfigFileStore, PreferencesStore, ViewPreferences, ViewSize,
};
pub use debounce::Debouncer;
pub use images::{CoverSide, ImageResolver, build_candidates, build_candidates_for};
pub use query::{
    FilterSpec, MatchMode, QueryEngine, SortDirection, SortField, SortSpec, filter_and_sort,
};

pub use shelf_state;
