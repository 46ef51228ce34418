//! Centralized configuration management for efund

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the mobile fund API (FundMNewApi endpoints)
    pub api_base: String,
    /// Base URL of the filing-announcement listing API
    pub listing_base: String,
    /// URL of the fund ranking handler (non-JSON body)
    pub ranking_url: String,
    /// Base URL for PDF report artifacts
    pub pdf_base: String,
    /// Default directory for downloaded PDF reports
    pub download_dir: PathBuf,
    /// Pre-obtained mobile-app credentials, passed through verbatim
    pub credentials: Credentials,
    /// HTTP client configuration
    pub http: HttpConfig,
    /// Maximum in-flight tasks per batch
    pub concurrency: usize,
}

/// Opaque mobile-app credentials inserted into query parameters as-is.
/// Obtaining or refreshing them is out of scope; these defaults are the
/// publicly circulating app values.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub device_id: String,
    pub user_id: String,
    pub passport_id: String,
    pub c_token: String,
    pub u_token: String,
    pub g_token: String,
}

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// User agent string
    pub user_agent: String,
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            device_id: "3EA024C2-7F22-408B-95E4-383D38160FB3".to_string(),
            user_id: "f8d95b2330d84d9e804e7f28a802d809".to_string(),
            passport_id: "3061335960830820".to_string(),
            c_token: "a6hdhrfejje88ruaeduau1rdufna1e--.6".to_string(),
            u_token: "a166hhqnrajucnfcjkfkeducanekj1dd1cc2a-e9.6".to_string(),
            g_token: "98B423068C1F4DEF9842F82ADF08C5db".to_string(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            user_agent: "EMProjJijin/6.2.8 (iPhone; iOS 13.6; Scale/2.00)".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables and defaults
    pub fn from_env() -> Result<Self> {
        let api_base = std::env::var("EFUND_API_BASE")
            .unwrap_or_else(|_| "https://fundmobapi.eastmoney.com/FundMNewApi".to_string());

        let listing_base = std::env::var("EFUND_LISTING_BASE")
            .unwrap_or_else(|_| "http://api.fund.eastmoney.com".to_string());

        let ranking_url = std::env::var("EFUND_RANKING_URL")
            .unwrap_or_else(|_| "http://fund.eastmoney.com/data/rankhandler.aspx".to_string());

        let pdf_base = std::env::var("EFUND_PDF_BASE")
            .unwrap_or_else(|_| "http://pdf.dfcfw.com".to_string());

        let download_dir = std::env::var("EFUND_DOWNLOAD_DIR")
            .unwrap_or_else(|_| "./pdf".to_string())
            .into();

        let defaults = Credentials::default();
        let credentials = Credentials {
            device_id: env_or_default("EFUND_DEVICE_ID", &defaults.device_id),
            user_id: env_or_default("EFUND_USER_ID", &defaults.user_id),
            passport_id: env_or_default("EFUND_PASSPORT_ID", &defaults.passport_id),
            c_token: env_or_default("EFUND_CTOKEN", &defaults.c_token),
            u_token: env_or_default("EFUND_UTOKEN", &defaults.u_token),
            g_token: env_or_default("EFUND_GTOKEN", &defaults.g_token),
        };

        let http = HttpConfig {
            timeout_seconds: parse_env_var("EFUND_HTTP_TIMEOUT_SECONDS")?.unwrap_or(30),
            user_agent: env_or_default("EFUND_USER_AGENT", &HttpConfig::default().user_agent),
        };

        let concurrency = parse_env_var("EFUND_CONCURRENCY")?.unwrap_or(8);

        Ok(Config {
            api_base,
            listing_base,
            ranking_url,
            pdf_base,
            download_dir,
            credentials,
            http,
            concurrency,
        })
    }

    /// Get HTTP timeout as Duration
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_seconds)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(anyhow::anyhow!("EFUND_CONCURRENCY must be at least 1"));
        }

        std::fs::create_dir_all(&self.download_dir).with_context(|| {
            format!(
                "Cannot create download directory: {}",
                self.download_dir.display()
            )
        })?;

        Ok(())
    }
}

fn env_or_default(var_name: &str, default: &str) -> String {
    std::env::var(var_name).unwrap_or_else(|_| default.to_string())
}

/// Helper function to parse environment variable as a specific type
fn parse_env_var<T>(var_name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display + Send + Sync + std::error::Error + 'static,
{
    match std::env::var(var_name) {
        Ok(val) => val.parse().map(Some).with_context(|| {
            format!("Failed to parse environment variable {} = '{}'", var_name, val)
        }),
        Err(_) => Ok(None),
    }
}
