//! Transport seam and the reqwest-backed HTTP implementation.

use std::time::Duration;

use async_trait::async_trait;
use geolane_core::{Error, Response, Result};
use reqwest::Client;
use tracing::debug;

/// A fully resolved outbound request.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    /// Flat query parameters, in the order they should be sent.
    pub params: Vec<(String, String)>,
}

/// Performs the actual call to the remote service.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn perform(&self, request: TransportRequest) -> Result<Response>;
}

/// HTTP GET via reqwest. Non-2xx responses become [`Error::Status`].
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Http(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn perform(&self, request: TransportRequest) -> Result<Response> {
        debug!("GET {} ({} params)", request.url, request.params.len());

        let mut builder = self.client.get(&request.url).query(&request.params);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::Http(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Http(format!("Failed to read response body: {}", e)))?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}
