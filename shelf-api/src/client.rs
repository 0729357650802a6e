#[derive(Debug)]
/// An error that can occur when interacting with the client.
pub enum ClientError {
    /// An error that occurred when making a request.
    ReqwestError(reqwest::Error),
    /// An error that occurred when deserializing a response.
    DeserializationError(serde_json::Error),
    /// The server answered with a non-success status.
    StatusError {
        /// The HTTP status code.
        code: u16,
        /// The endpoint that was requested.
        endpoint: String,
    },
}
impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::ReqwestError(e) => write!(f, "Reqwest error: {e}"),
            ClientError::DeserializationError(e) => write!(f, "Deserialization error: {e}"),
            ClientError::StatusError { code, endpoint } => {
                write!(f, "Server returned {code} for {endpoint}")
            }
        }
    }
}
impl std::error::Error for ClientError {}
impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        ClientError::ReqwestError(e)
    }
}
impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        ClientError::DeserializationError(e)
    }
}
/// A result type for the client.
pub type ClientResult<T> = Result<T, ClientError>;

/// A client for the inventory service.
pub struct Client {
    pub(crate) base_url: String,
    pub(crate) client: reqwest::Client,
}
impl Client {
    /// Create a new client. A trailing slash on `base_url` is ignored.
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }

    /// The base URL requests are made against.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolve a server-relative route (such as `/cover/42`) against the base URL.
    /// Absolute URLs are returned unchanged.
    pub fn resolve(&self, route: &str) -> String {
        if route.starts_with("http://") || route.starts_with("https://") {
            return route.to_string();
        }
        format!("{}/{}", self.base_url, route.trim_start_matches('/'))
    }
}
