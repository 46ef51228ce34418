//! Shared progress state for concurrent batches.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Progress over one batch: a monotonically non-decreasing counter of tasks
/// that ran to completion, plus the identifier processed most recently.
///
/// Updated by many tasks concurrently; observed by the caller via polling.
/// Tasks aborted by cancellation do not advance the counter, so after an
/// uninterrupted run `completed() == total()` and it never exceeds it.
#[derive(Debug)]
pub struct Progress {
    total: usize,
    completed: AtomicUsize,
    current: Mutex<Option<String>>,
}

impl Progress {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            completed: AtomicUsize::new(0),
            current: Mutex::new(None),
        }
    }

    /// Records one completed task and publishes its identifier.
    pub fn mark_done(&self, code: &str) {
        self.completed.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut current) = self.current.lock() {
            *current = Some(code.to_string());
        }
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Identifier of the most recently completed task, if any yet.
    pub fn current(&self) -> Option<String> {
        self.current.lock().ok().and_then(|c| c.clone())
    }

    pub fn is_finished(&self) -> bool {
        self.completed() >= self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_counts_and_label() {
        let progress = Progress::new(3);
        assert_eq!(progress.completed(), 0);
        assert_eq!(progress.current(), None);
        assert!(!progress.is_finished());

        progress.mark_done("000001");
        progress.mark_done("000002");
        assert_eq!(progress.completed(), 2);
        assert_eq!(progress.current(), Some("000002".to_string()));

        progress.mark_done("000003");
        assert!(progress.is_finished());
        assert_eq!(progress.total(), 3);
    }
}
