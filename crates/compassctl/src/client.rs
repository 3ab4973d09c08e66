//! HTTP client for communicating with compassd.

use anyhow::{anyhow, Context, Result};
use compass_common::{ErrorResponse, HealthResponse, QueryRequest, QueryResponse, ToolsResponse};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Environment override for the daemon URL
pub const URL_ENV: &str = "COMPASS_URL";

/// Upper bound on one call; the daemon enforces its own, shorter, deadline
const CLIENT_TIMEOUT: Duration = Duration::from_secs(60);

pub fn default_url() -> String {
    format!("http://{}", compass_common::DEFAULT_ADDR)
}

pub struct CompassClient {
    http: reqwest::Client,
    base_url: String,
}

impl CompassClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(CLIENT_TIMEOUT)
            .user_agent(concat!("compassctl/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn query(&self, request: &QueryRequest) -> Result<QueryResponse> {
        let response = self
            .http
            .post(self.url("/v1/query"))
            .json(request)
            .send()
            .await
            .map_err(|e| self.connect_error(e))?;
        decode(response).await
    }

    pub async fn health(&self) -> Result<HealthResponse> {
        let response = self
            .http
            .get(self.url("/v1/health"))
            .send()
            .await
            .map_err(|e| self.connect_error(e))?;
        decode(response).await
    }

    pub async fn tools(&self) -> Result<ToolsResponse> {
        let response = self
            .http
            .get(self.url("/v1/tools"))
            .send()
            .await
            .map_err(|e| self.connect_error(e))?;
        decode(response).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn connect_error(&self, err: reqwest::Error) -> anyhow::Error {
        if err.is_connect() {
            anyhow!(
                "Cannot reach compassd at {}.\n\n\
                 Start it with `compassd`, or point {} / --url at a running daemon.",
                self.base_url,
                URL_ENV
            )
        } else if err.is_timeout() {
            anyhow!("compassd at {} did not answer in time", self.base_url)
        } else {
            anyhow!("Request to compassd failed: {}", err)
        }
    }
}

/// Parse a success body, or turn the daemon's `{ error }` into an anyhow error
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    let body = response.text().await.context("Failed to read response")?;

    if !status.is_success() {
        let message = serde_json::from_str::<ErrorResponse>(&body)
            .map(|e| e.error)
            .unwrap_or(body);
        return Err(anyhow!("compassd returned {}: {}", status, message));
    }

    serde_json::from_str(&body).context("Unexpected response from compassd")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash() {
        let client = CompassClient::new("http://localhost:7870/").unwrap();
        assert_eq!(client.url("/v1/health"), "http://localhost:7870/v1/health");
    }

    #[test]
    fn test_default_url() {
        assert_eq!(default_url(), "http://127.0.0.1:7870");
    }
}
