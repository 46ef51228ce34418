//! Concurrent PDF report downloading.
//!
//! Specialization of the batch pattern where the per-identifier work is one
//! blocking download written to local storage. One failing download never
//! blocks or aborts its siblings; cancellation aborts every in-flight
//! download immediately, which may leave the destination directory with a
//! subset of files.

pub mod reports;

pub use reports::report_listing;

use crate::batch::Progress;
use crate::endpoint::EndpointClient;
use crate::models::{DownloadJob, ReportEntry};
use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Downloads the most recent `max_count` report PDFs of a listing into
/// `dest_root/<code>/<title>.pdf` and returns how many files were kept.
///
/// "Most recent" means the last entries in listing order, not a sort by any
/// date field. A zero-length payload is rolled back and does not advance
/// `progress`, though it does consume a task slot.
pub async fn download_reports(
    client: &EndpointClient,
    code: &str,
    listing: &[ReportEntry],
    max_count: usize,
    dest_root: &Path,
    cancel: CancellationToken,
    progress: Arc<Progress>,
) -> Result<usize> {
    let start = listing.len().saturating_sub(max_count);
    let jobs: Vec<DownloadJob> = listing[start..]
        .iter()
        .map(|entry| {
            DownloadJob::new(
                code,
                reports::pdf_url(client.config(), &entry.artifact_id),
                entry,
                dest_root,
            )
        })
        .collect();

    let semaphore = Arc::new(Semaphore::new(client.config().concurrency));
    let mut tasks = JoinSet::new();

    for job in jobs {
        let client = client.clone();
        let progress = Arc::clone(&progress);
        let semaphore = Arc::clone(&semaphore);
        let cancel = cancel.clone();

        tasks.spawn(async move {
            let _permit = tokio::select! {
                _ = cancel.cancelled() => return false,
                permit = semaphore.acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => return false,
                },
            };

            let outcome = tokio::select! {
                _ = cancel.cancelled() => return false,
                outcome = reports::download_one(&client, &job) => outcome,
            };

            match outcome {
                Ok(true) => {
                    progress.mark_done(&job.code);
                    debug!(dest = %job.dest.display(), "downloaded report");
                    true
                }
                Ok(false) => {
                    debug!(dest = %job.dest.display(), "empty payload, file removed");
                    false
                }
                Err(err) => {
                    warn!(url = %job.url, error = %err, "report download failed");
                    false
                }
            }
        });
    }

    let mut kept = 0;
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(true) => kept += 1,
            Ok(false) => {}
            Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
            Err(_) => {}
        }
    }

    Ok(kept)
}
