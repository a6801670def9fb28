//! HTTP client for the static site that serves section data and assets.
//!
//! Request URLs are site-relative paths (`/data/horror.json`) and are
//! resolved against the configured base URL.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Method, Url};
use tracing::debug;

use super::{ApiError, Network, Request, Response};

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
/// Static JSON should come back fast; a slow server is treated as a failure.
const REQUEST_TIMEOUT_SECS: u64 = 15;

/// Connect timeout in seconds. A host that does not answer counts as unreachable.
const CONNECT_TIMEOUT_SECS: u64 = 5;

/// HTTP client for the catalog site.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new client rooted at `base_url`
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .with_context(|| format!("Invalid base URL: {}", base_url))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()?;

        Ok(Self { client, base_url })
    }

    fn resolve(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path)
            .map_err(|e| ApiError::InvalidRequest(format!("{}: {}", path, e)))
    }
}

#[async_trait]
impl Network for ApiClient {
    async fn send(&self, request: &Request) -> Result<Response, ApiError> {
        let url = self.resolve(&request.url)?;
        let method = Method::from_bytes(request.method.to_ascii_uppercase().as_bytes())
            .map_err(|e| ApiError::InvalidRequest(format!("{}: {}", request.method, e)))?;

        debug!(method = %method, url = %url, "Sending request");

        let response = self.client.request(method, url).send().await?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.bytes().await?.to_vec();

        debug!(request = %request, status, bytes = body.len(), "Received response");

        Ok(Response {
            status,
            headers,
            body,
        })
    }
}
