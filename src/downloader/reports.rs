//! Report-listing fetch and single-file download.

use crate::config::Config;
use crate::endpoint::{EndpointClient, FetchError};
use crate::models::{DownloadJob, ReportEntry};
use anyhow::Result;
use serde_json::Value;
use tokio::fs;
use tracing::info;

/// Fetches the filing-announcement listing for one fund, oldest first.
pub async fn report_listing(
    client: &EndpointClient,
    code: &str,
) -> Result<Vec<ReportEntry>, FetchError> {
    let params = vec![
        ("fundcode", code.to_string()),
        ("pageIndex", "1".to_string()),
        ("pageSize", "200000".to_string()),
        ("type", "3".to_string()),
    ];

    let url = format!("{}/f10/JJGG", client.config().listing_base);
    let payload = client.get_json(&url, &params).await?;
    let entries = listing_entries(&payload);
    info!(code, reports = entries.len(), "fetched report listing");
    Ok(entries)
}

pub(crate) fn listing_entries(payload: &Value) -> Vec<ReportEntry> {
    let Some(entries) = payload["Data"].as_array() else {
        return Vec::new();
    };
    entries
        .iter()
        .filter_map(|entry| {
            // The vendor serves IDs sometimes as strings, sometimes as numbers.
            let artifact_id = match &entry["ID"] {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                _ => return None,
            };
            let title = entry["TITLE"].as_str()?.to_string();
            Some(ReportEntry { artifact_id, title })
        })
        .collect()
}

/// Direct link to a report artifact.
pub(crate) fn pdf_url(config: &Config, artifact_id: &str) -> String {
    format!("{}/pdf/H2_{}_1.pdf", config.pdf_base, artifact_id)
}

/// Downloads one report to its destination path. Returns whether the file
/// was kept: a zero-length payload is written and immediately removed so no
/// empty artifact stays on disk.
pub(crate) async fn download_one(client: &EndpointClient, job: &DownloadJob) -> Result<bool> {
    if let Some(parent) = job.dest.parent() {
        fs::create_dir_all(parent).await?;
    }

    let bytes = client.get_bytes(&job.url).await?;
    fs::write(&job.dest, &bytes).await?;

    if bytes.is_empty() {
        fs::remove_file(&job.dest).await?;
        return Ok(false);
    }
    Ok(true)
}
