//! Remote service clients.
//!
//! # Responsibilities
//! - Turn a `ClientInfo` entry plus an API route into a ready client
//! - Issue GET requests and surface transport, status, and body errors
//!
//! Clients are cheap to clone; they share one `reqwest::Client` pool.

use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::config::ClientInfo;

pub const API_VERSION_ROUTE: &str = "/api/version";
pub const API_EVENT_ROUTE: &str = "/api/v1/event";
pub const API_VALUE_DESCRIPTOR_ROUTE: &str = "/api/v1/valuedescriptor";
pub const API_DEVICE_ROUTE: &str = "/api/v1/device";
pub const API_NOTIFICATION_ROUTE: &str = "/api/v1/notification";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors that can occur talking to a remote service.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("failed to read response body from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// A client bound to one endpoint of a remote service.
#[derive(Debug, Clone)]
pub struct RemoteClient {
    name: String,
    url: Url,
    http: reqwest::Client,
}

impl RemoteClient {
    /// Create a client for `route` on the service described by `info`.
    pub fn new(name: impl Into<String>, info: &ClientInfo, route: &str) -> Result<Self, ClientError> {
        let raw = format!("{}{}", info.url(), route);
        let url = Url::parse(&raw).map_err(|source| ClientError::InvalidUrl { url: raw, source })?;
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(ClientError::Build)?;

        Ok(Self {
            name: name.into(),
            url,
            http,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// GET the endpoint and return the body of a 2xx response.
    pub async fn get_bytes(&self) -> Result<Vec<u8>, ClientError> {
        let url = self.url.to_string();
        let response = self
            .http
            .get(self.url.clone())
            .send()
            .await
            .map_err(|source| ClientError::Transport {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| ClientError::Body { url, source })?;
        Ok(body.to_vec())
    }
}
