use serde::Serialize;

use crate::{BIN_ROUTE, Client, ClientResult, bin_route};

#[derive(Debug, Serialize)]
struct BinBody {
    bin: Option<u32>,
}

/// Bin persistence endpoints.
impl Client {
    /// Fetch the persisted bin assignments as a JSON object of record id to bin.
    ///
    /// Values are left as raw JSON, as producers disagree on whether bins are
    /// numbers or strings.
    pub async fn get_bins(&self) -> ClientResult<serde_json::Map<String, serde_json::Value>> {
        self.request(BIN_ROUTE).await
    }

    /// Persist a single record's bin. `None` clears the assignment.
    pub async fn set_bin(&self, id: &str, bin: Option<u32>) -> ClientResult<()> {
        self.post_json(&bin_route(id), &BinBody { bin }).await
    }
}
