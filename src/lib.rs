//! Fund-market data client for the Eastmoney mobile API.
//!
//! Fetches net asset values, holdings, rankings, period performance and PDF
//! filings, reshaping the vendor's JSON into normalized records. Multi-code
//! lookups and report downloads fan out through a concurrent batch runner
//! with shared progress and hard-stop cancellation.

pub mod batch;
pub mod config;
pub mod downloader;
pub mod endpoint;
pub mod fetcher;
pub mod models;

pub use batch::{BatchError, BatchRunner, Progress};
pub use endpoint::{EndpointClient, FetchError};
pub use models::{EmptyPolicy, Record};
