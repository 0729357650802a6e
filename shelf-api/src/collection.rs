use crate::{COLLECTION_ROUTE, Client, ClientResult};

/// Collection endpoints.
impl Client {
    /// Fetch the raw collection payload.
    ///
    /// The body is returned undecoded: the service has historically answered with
    /// several different shapes, and interpreting them is the caller's concern.
    pub async fn get_collection(&self) -> ClientResult<Vec<u8>> {
        let bytes = self.request_raw(COLLECTION_ROUTE).await?;
        tracing::info!("fetched collection payload ({} bytes)", bytes.len());
        Ok(bytes)
    }
}
