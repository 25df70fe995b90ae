//! Settlement idempotency guard: makes retried settlement requests safe.
//!
//! Each request carries an [`IdempotencyKey`]. Executions under a key are
//! recorded together with the plan digest and the progress made so far:
//!
//! - [`Progress::Complete`]: every leg was processed. A retry with the same
//!   digest gets the recorded summary back without touching the store.
//! - [`Progress::Partial`]: a leg failed after earlier legs committed. A
//!   retry resumes after the committed legs instead of applying them again.
//!
//! The same key with a different digest is rejected with
//! [`LedgerError::IdempotencyKeyReused`].
//!
//! The guard keeps a bounded cache with oldest-first eviction so memory
//! stays predictable in long-running services.

use std::collections::{HashMap, VecDeque};

use splitledger_types::{ExecutionSummary, IdempotencyKey, LedgerError, Result};

/// How far a recorded settlement got.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress {
    /// All legs processed; the summary is final.
    Complete(ExecutionSummary),
    /// Interrupted. The summary covers the committed prefix of the legs;
    /// its `transactions_processed` is the index to resume from.
    Partial(ExecutionSummary),
}

#[derive(Debug, Clone)]
struct Recorded {
    digest: String,
    progress: Progress,
}

/// Remembers settlement requests by key.
pub struct IdempotencyGuard {
    entries: HashMap<IdempotencyKey, Recorded>,
    /// Insertion order for eviction (front = oldest).
    order: VecDeque<IdempotencyKey>,
    max_size: usize,
}

impl IdempotencyGuard {
    /// Create a new guard holding at most `max_size` keys (minimum 1).
    #[must_use]
    pub fn new(max_size: usize) -> Self {
        let max_size = max_size.max(1);
        Self {
            entries: HashMap::with_capacity(max_size.min(1024)),
            order: VecDeque::with_capacity(max_size.min(1024)),
            max_size,
        }
    }

    /// Look up what was recorded under `key`.
    ///
    /// # Errors
    /// Returns [`LedgerError::IdempotencyKeyReused`] if `key` was recorded
    /// with a different digest.
    pub fn lookup(&self, key: &IdempotencyKey, digest: &str) -> Result<Option<Progress>> {
        match self.entries.get(key) {
            None => Ok(None),
            Some(recorded) if recorded.digest == digest => Ok(Some(recorded.progress.clone())),
            Some(_) => Err(LedgerError::IdempotencyKeyReused { key: key.clone() }),
        }
    }

    /// Record a finished execution.
    pub fn record(&mut self, key: IdempotencyKey, digest: String, summary: ExecutionSummary) {
        self.upsert(key, digest, Progress::Complete(summary));
    }

    /// Record the committed prefix of an interrupted execution.
    pub fn record_partial(&mut self, key: IdempotencyKey, digest: String, summary: ExecutionSummary) {
        self.upsert(key, digest, Progress::Partial(summary));
    }

    /// Whether `key` is currently remembered.
    #[must_use]
    pub fn contains(&self, key: &IdempotencyKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of remembered keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no keys are remembered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replace the entry of a known key in place; otherwise insert it,
    /// evicting the oldest key at capacity.
    fn upsert(&mut self, key: IdempotencyKey, digest: String, progress: Progress) {
        if let Some(existing) = self.entries.get_mut(&key) {
            *existing = Recorded { digest, progress };
            return;
        }

        if self.entries.len() >= self.max_size {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }

        self.order.push_back(key.clone());
        self.entries.insert(key, Recorded { digest, progress });
    }
}
