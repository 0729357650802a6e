//! Representations of a record collection, as well as a way to retrieve it from the inventory service.
//!
//! Separated out to allow for use in other utilities.
#![deny(missing_docs)]

use std::collections::BTreeMap;

pub use shelf_api as sa;

mod record;
pub use record::{ImageHints, Record, RecordId};

mod ingest;
pub use ingest::{COLLECTION_KEYS, parse_bin_assignments, parse_collection, records_from_value};

mod collation;
pub use collation::Collation;

/// The output of [`fetch_all`].
pub struct FetchAllOutput {
    /// The records, in the order the service returned them.
    pub records: Vec<Record>,
    /// The persisted bin assignments, keyed by record.
    pub bins: BTreeMap<RecordId, u32>,
}

/// Fetches the collection and its persisted bin assignments.
///
/// A collection payload of an unexpected shape produces an empty record list
/// rather than an error; only transport failures are reported.
pub async fn fetch_all(client: &sa::Client) -> sa::ClientResult<FetchAllOutput> {
    let records = fetch_collection(client).await?;
    let bins = fetch_bin_assignments(client).await?;
    Ok(FetchAllOutput { records, bins })
}

/// Fetches and normalises the collection.
pub async fn fetch_collection(client: &sa::Client) -> sa::ClientResult<Vec<Record>> {
    let bytes = client.get_collection().await?;
    let records = parse_collection(&bytes);
    tracing::info!("loaded {} records", records.len());
    Ok(records)
}

/// Fetches the persisted bin assignments.
pub async fn fetch_bin_assignments(
    client: &sa::Client,
) -> sa::ClientResult<BTreeMap<RecordId, u32>> {
    let raw = client.get_bins().await?;
    Ok(parse_bin_assignments(raw))
}
