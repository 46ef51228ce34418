//! Per-endpoint record fetchers.
//!
//! Each fetcher wraps one endpoint call and reshapes the payload into
//! normalized [`Record`]s via a rename table. A response that is well-formed
//! but carries no data yields an empty record (or an empty table), never an
//! error, so batch aggregation can treat every code uniformly.

pub mod basics;
pub mod holdings;
pub mod quotes;
pub mod rankings;

pub use basics::BasicsFetcher;

use crate::config::Credentials;
use crate::endpoint::FetchError;
use crate::models::{EmptyPolicy, Record};
use async_trait::async_trait;

/// One fetch per fund code, normalized into a [`Record`].
#[async_trait]
pub trait RecordFetcher: Send + Sync {
    /// Short name for logs and progress display.
    fn name(&self) -> &'static str;

    /// What the batch runner does with this fetcher's empty records.
    fn empty_policy(&self) -> EmptyPolicy {
        EmptyPolicy::IncludeEmpty
    }

    /// Fetches and normalizes one code. Absent data maps to
    /// `Ok(Record::empty())`; only transport and decode failures are errors.
    async fn fetch(&self, code: &str) -> Result<Record, FetchError>;
}

pub(crate) const APP_VERSION: &str = "6.3.8";

/// The common mobile-app parameter set every FundMNewApi operation expects.
/// Credentials are pass-through; endpoint-specific parameters are appended
/// by each fetcher.
pub(crate) fn mobile_params(credentials: &Credentials) -> Vec<(&'static str, String)> {
    vec![
        ("MobileKey", credentials.device_id.clone()),
        ("OSVersion", "14.3".to_string()),
        ("appType", "ttjj".to_string()),
        ("appVersion", APP_VERSION.to_string()),
        ("cToken", credentials.c_token.clone()),
        ("deviceid", credentials.device_id.clone()),
        ("passportid", credentials.passport_id.clone()),
        ("plat", "Iphone".to_string()),
        ("product", "EFund".to_string()),
        ("serverVersion", APP_VERSION.to_string()),
        ("uToken", credentials.u_token.clone()),
        ("userId", credentials.user_id.clone()),
        ("version", APP_VERSION.to_string()),
    ]
}
