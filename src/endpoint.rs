//! Remote data endpoint: one HTTP GET, one decoded payload.
//!
//! Everything network-facing goes through [`EndpointClient`]. Retry and
//! backoff are deliberately left to the HTTP library defaults.

use crate::config::Config;
use reqwest::Client;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Errors surfaced by one endpoint call.
///
/// A well-formed response that merely carries no data is not an error; the
/// fetchers map that shape to an empty record instead.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("failed to decode response body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Thin client over the vendor endpoints.
///
/// Cheap to clone; the underlying `reqwest::Client` is reference-counted.
#[derive(Debug, Clone)]
pub struct EndpointClient {
    http: Client,
    config: Config,
}

impl EndpointClient {
    pub fn new(config: Config) -> Result<Self, FetchError> {
        let http = Client::builder()
            .user_agent(&config.http.user_agent)
            .timeout(config.http_timeout())
            .build()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// URL of a mobile fund API operation, e.g. `FundMNHisNetList`.
    pub fn api_url(&self, operation: &str) -> String {
        format!("{}/{}", self.config.api_base, operation)
    }

    /// Performs one GET and decodes the body as JSON.
    pub async fn get_json(&self, url: &str, params: &[(&str, String)]) -> Result<Value, FetchError> {
        let body = self.get_text(url, params).await?;
        let payload = serde_json::from_str(&body)?;
        Ok(payload)
    }

    /// Performs one GET and returns the raw body text.
    pub async fn get_text(&self, url: &str, params: &[(&str, String)]) -> Result<String, FetchError> {
        debug!("GET {}", url);
        let response = self
            .http
            .get(url)
            .query(params)
            .header("Accept", "*/*")
            .header("Referer", "http://fundf10.eastmoney.com/")
            .header("GTOKEN", &self.config.credentials.g_token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response.text().await?)
    }

    /// Performs one GET and returns the raw body bytes. Used for artifact
    /// downloads, where an empty body is a valid (if useless) response.
    pub async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        debug!("GET {}", url);
        let response = self
            .http
            .get(url)
            .header("Accept", "*/*")
            .header("Referer", "http://fundf10.eastmoney.com/")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response.bytes().await?.to_vec())
    }
}
