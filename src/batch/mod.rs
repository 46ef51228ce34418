//! Concurrent batch fetch-and-aggregate.
//!
//! Fans a collection of fund codes out to a bounded pool of worker tasks,
//! each invoking one [`RecordFetcher`], and collects the records into a
//! single aggregate. The runner owns its worker set per invocation; there is
//! no global task registry.

pub mod progress;

pub use progress::Progress;

use crate::fetcher::RecordFetcher;
use crate::models::{EmptyPolicy, Record};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Contract errors, surfaced before any task starts.
#[derive(Error, Debug)]
pub enum BatchError {
    #[error("invalid fund code {0:?}: codes must be non-blank")]
    InvalidIdentifier(String),
}

/// Executes one fetch per fund code in a bounded pool of concurrent tasks.
///
/// Cancellation is a hard stop: when the token fires, in-flight requests are
/// dropped rather than drained, and the partial aggregate `run` returns is
/// for the caller to discard.
#[derive(Debug, Clone)]
pub struct BatchRunner {
    concurrency: usize,
    cancel: CancellationToken,
}

impl BatchRunner {
    pub fn new(cancel: CancellationToken) -> Self {
        Self {
            concurrency: 8,
            cancel,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Fetches one record per code and returns the aggregate.
    ///
    /// Spawns one worker task per code, eagerly, with in-flight work bounded
    /// by a semaphore, and blocks until every task reached a terminal state
    /// (completed, or aborted by cancellation). Aggregate order is completion
    /// order, not submission order; every record carries its source `code`
    /// field so callers can re-sort.
    ///
    /// A single task's transport or decode failure never aborts its siblings:
    /// it is logged and folded in per the fetcher's [`EmptyPolicy`], exactly
    /// like a no-data response. A panicking fetcher is a bug and is resumed
    /// on the caller.
    pub async fn run<F>(
        &self,
        codes: &[String],
        fetcher: Arc<F>,
        progress: Arc<Progress>,
    ) -> Result<Vec<Record>, BatchError>
    where
        F: RecordFetcher + ?Sized + 'static,
    {
        // Contract errors fail fast, before any task starts.
        for code in codes {
            if code.trim().is_empty() {
                return Err(BatchError::InvalidIdentifier(code.clone()));
            }
        }

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();

        for code in codes {
            let code = code.clone();
            let fetcher = Arc::clone(&fetcher);
            let progress = Arc::clone(&progress);
            let semaphore = Arc::clone(&semaphore);
            let cancel = self.cancel.clone();

            tasks.spawn(async move {
                let _permit = tokio::select! {
                    _ = cancel.cancelled() => return None,
                    permit = semaphore.acquire_owned() => match permit {
                        Ok(permit) => permit,
                        Err(_) => return None,
                    },
                };

                let outcome = tokio::select! {
                    _ = cancel.cancelled() => return None,
                    outcome = fetcher.fetch(&code) => outcome,
                };

                let record = match outcome {
                    Ok(record) => record,
                    Err(err) => {
                        warn!(
                            fetcher = fetcher.name(),
                            code = %code,
                            error = %err,
                            "fetch failed, treating as no data"
                        );
                        Record::empty()
                    }
                };

                progress.mark_done(&code);

                if record.is_empty() && fetcher.empty_policy() == EmptyPolicy::Omit {
                    return None;
                }
                let mut record = record;
                record.tag_code(&code);
                Some(record)
            });
        }

        let mut records = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Some(record)) => records.push(record),
                Ok(None) => {}
                Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
                Err(_) => {}
            }
        }

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::FetchError;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Canned fetcher: known codes yield a record, unknown codes yield the
    /// no-data shape, listed codes fail with a transport-level error.
    struct CannedFetcher {
        records: HashMap<String, Record>,
        failing: Vec<String>,
        policy: EmptyPolicy,
        calls: AtomicUsize,
        delay: Duration,
    }

    impl CannedFetcher {
        fn new(policy: EmptyPolicy) -> Self {
            Self {
                records: HashMap::new(),
                failing: Vec::new(),
                policy,
                calls: AtomicUsize::new(0),
                delay: Duration::ZERO,
            }
        }

        fn with_record(mut self, code: &str, name: &str, value: f64) -> Self {
            let mut record = Record::empty();
            record.insert("code", json!(code));
            record.insert("name", json!(name));
            record.insert("value", json!(value));
            self.records.insert(code.to_string(), record);
            self
        }

        fn with_failure(mut self, code: &str) -> Self {
            self.failing.push(code.to_string());
            self
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }
    }

    #[async_trait]
    impl RecordFetcher for CannedFetcher {
        fn name(&self) -> &'static str {
            "canned"
        }

        fn empty_policy(&self) -> EmptyPolicy {
            self.policy
        }

        async fn fetch(&self, code: &str) -> Result<Record, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.failing.iter().any(|c| c == code) {
                return Err(FetchError::Status {
                    status: 502,
                    url: "http://test.invalid".to_string(),
                });
            }
            Ok(self.records.get(code).cloned().unwrap_or_else(Record::empty))
        }
    }

    fn codes(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_mixed_data_and_no_data() {
        let fetcher = Arc::new(
            CannedFetcher::new(EmptyPolicy::IncludeEmpty).with_record("000001", "Fund A", 1.23),
        );
        let progress = Arc::new(Progress::new(2));
        let runner = BatchRunner::new(CancellationToken::new());

        let records = runner
            .run(
                &codes(&["000001", "000002"]),
                Arc::clone(&fetcher),
                Arc::clone(&progress),
            )
            .await
            .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(progress.completed(), 2);

        let full = records
            .iter()
            .find(|r| r.get("code") == Some(&json!("000001")))
            .unwrap();
        assert_eq!(full.get("name"), Some(&json!("Fund A")));
        assert_eq!(full.get("value"), Some(&json!(1.23)));

        // The no-data entry carries only its source tag.
        let sparse = records
            .iter()
            .find(|r| r.get("code") == Some(&json!("000002")))
            .unwrap();
        assert_eq!(sparse.len(), 1);
    }

    #[tokio::test]
    async fn test_omit_policy_drops_empty_contributions() {
        let fetcher =
            Arc::new(CannedFetcher::new(EmptyPolicy::Omit).with_record("000001", "Fund A", 1.23));
        let progress = Arc::new(Progress::new(3));
        let runner = BatchRunner::new(CancellationToken::new());

        let records = runner
            .run(
                &codes(&["000001", "000002", "000003"]),
                fetcher,
                Arc::clone(&progress),
            )
            .await
            .unwrap();

        assert_eq!(records.len(), 1);
        // Omitted codes still consumed a task slot.
        assert_eq!(progress.completed(), 3);
    }

    #[tokio::test]
    async fn test_task_failure_does_not_abort_siblings() {
        let fetcher = Arc::new(
            CannedFetcher::new(EmptyPolicy::IncludeEmpty)
                .with_record("000001", "Fund A", 1.23)
                .with_failure("000002"),
        );
        let progress = Arc::new(Progress::new(2));
        let runner = BatchRunner::new(CancellationToken::new());

        let records = runner
            .run(
                &codes(&["000001", "000002"]),
                fetcher,
                Arc::clone(&progress),
            )
            .await
            .unwrap();

        // Failure folds into an empty record, never an error.
        assert_eq!(records.len(), 2);
        assert_eq!(progress.completed(), 2);
    }

    #[tokio::test]
    async fn test_blank_identifier_fails_before_any_fetch() {
        let fetcher = Arc::new(CannedFetcher::new(EmptyPolicy::IncludeEmpty));
        let progress = Arc::new(Progress::new(2));
        let runner = BatchRunner::new(CancellationToken::new());

        let err = runner
            .run(
                &codes(&["000001", "  "]),
                Arc::clone(&fetcher),
                Arc::clone(&progress),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, BatchError::InvalidIdentifier(_)));
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
        assert_eq!(progress.completed(), 0);
    }

    #[tokio::test]
    async fn test_cancellation_aborts_in_flight_tasks_promptly() {
        let fetcher = Arc::new(
            CannedFetcher::new(EmptyPolicy::IncludeEmpty).with_delay(Duration::from_secs(30)),
        );
        let progress = Arc::new(Progress::new(10));
        let cancel = CancellationToken::new();
        let runner = BatchRunner::new(cancel.clone()).with_concurrency(10);

        let all: Vec<String> = (0..10).map(|i| format!("{:06}", i)).collect();

        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            canceller.cancel();
        });

        let records = tokio::time::timeout(
            Duration::from_secs(5),
            runner.run(&all, fetcher, Arc::clone(&progress)),
        )
        .await
        .expect("cancelled batch must terminate promptly")
        .unwrap();

        assert!(records.len() <= 10);
        assert!(progress.completed() <= 10);
    }

    #[tokio::test]
    async fn test_aggregate_never_exceeds_submitted_codes() {
        let fetcher = Arc::new(
            CannedFetcher::new(EmptyPolicy::IncludeEmpty)
                .with_record("000001", "Fund A", 1.0)
                .with_record("000002", "Fund B", 2.0),
        );
        let progress = Arc::new(Progress::new(4));
        let runner = BatchRunner::new(CancellationToken::new()).with_concurrency(2);

        let submitted = codes(&["000001", "000002", "000003", "000004"]);
        let records = runner
            .run(&submitted, fetcher, Arc::clone(&progress))
            .await
            .unwrap();

        assert!(records.len() <= submitted.len());
        assert_eq!(progress.completed(), submitted.len());
    }
}
