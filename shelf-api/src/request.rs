use serde::{Serialize, de::DeserializeOwned};

use crate::{Client, ClientError, ClientResult};

/// Making requests to the inventory service.
impl Client {
    /// Make a `GET` request and deserialize the JSON body into `T`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response is not valid.
    pub async fn request<T: DeserializeOwned>(&self, endpoint: &str) -> ClientResult<T> {
        let bytes = self.request_raw(endpoint).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Make a `GET` request and return the raw body.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server does not answer with a success status.
    pub async fn request_raw(&self, endpoint: &str) -> ClientResult<Vec<u8>> {
        let url = self.resolve(endpoint);
        tracing::debug!("GET {url}");
        let response = self.client.get(url).send().await?;
        let response = Self::check_status(endpoint, response)?;
        Ok(response.bytes().await?.into())
    }

    /// Make a `POST` request with a JSON body, discarding the response body.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server does not answer with a success status.
    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> ClientResult<()> {
        let url = self.resolve(endpoint);
        tracing::debug!("POST {url}");
        let response = self.client.post(url).json(body).send().await?;
        Self::check_status(endpoint, response)?;
        Ok(())
    }

    fn check_status(
        endpoint: &str,
        response: reqwest::Response,
    ) -> ClientResult<reqwest::Response> {
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::StatusError {
                code: status.as_u16(),
                endpoint: endpoint.to_string(),
            });
        }
        Ok(response)
    }
}
