//! Typed access to the record store with bounded conflict retries.

use std::future::Future;

use common::RecordId;
use record_store::{Filter, Record, RecordStore, WriteBatch};

use crate::document::Document;
use crate::error::DomainError;

/// Number of times an operation is attempted when its commit keeps losing
/// optimistic-concurrency races.
pub const DEFAULT_COMMIT_ATTEMPTS: u32 = 3;

/// Loads and commits documents over a [`RecordStore`].
///
/// Services build their writes from freshly loaded documents, so a
/// concurrency conflict means "re-read and re-validate". [`Repository::with_retry`]
/// runs that loop a bounded number of times.
#[derive(Clone)]
pub struct Repository<S: RecordStore> {
    store: S,
    max_attempts: u32,
}

impl<S: RecordStore> Repository<S> {
    /// Creates a new repository over the given store.
    pub fn new(store: S) -> Self {
        Self {
            store,
            max_attempts: DEFAULT_COMMIT_ATTEMPTS,
        }
    }

    /// Sets how many times a conflicting operation is attempted (at least once).
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns the configured attempt budget.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Loads a document, returning None if it doesn't exist.
    pub async fn load<D: Document>(
        &self,
        id: impl Into<RecordId>,
    ) -> Result<Option<D>, DomainError> {
        match self.store.get(D::COLLECTION, id.into()).await? {
            Some(record) => Ok(Some(D::from_record(record)?)),
            None => Ok(None),
        }
    }

    /// Loads a document, failing with `NotFound` if it doesn't exist.
    pub async fn require<D: Document>(&self, id: impl Into<RecordId>) -> Result<D, DomainError> {
        let id = id.into();
        self.load(id)
            .await?
            .ok_or_else(|| DomainError::not_found(D::ENTITY, id))
    }

    /// Loads every document matching the filter, oldest first.
    pub async fn find<D: Document>(&self, filter: Filter) -> Result<Vec<D>, DomainError> {
        self.store
            .find(D::COLLECTION, filter)
            .await?
            .into_iter()
            .map(|record| D::from_record(record).map_err(DomainError::from))
            .collect()
    }

    /// Commits a batch atomically.
    pub async fn commit(&self, batch: WriteBatch) -> Result<Vec<Record>, DomainError> {
        Ok(self.store.commit(batch).await?)
    }

    /// Runs `attempt` until it succeeds, fails for a reason other than a
    /// concurrency race, or the attempt budget is spent.
    pub async fn with_retry<T, F, Fut>(
        &self,
        operation: &'static str,
        attempt: F,
    ) -> Result<T, DomainError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, DomainError>>,
    {
        self.with_retry_limit(operation, self.max_attempts, attempt)
            .await
    }

    /// Like [`Repository::with_retry`], but with an explicit attempt limit.
    ///
    /// Used where every lost race is known to move the loser closer to a
    /// definite answer, so the limit can be sized to the work that remains.
    pub async fn with_retry_limit<T, F, Fut>(
        &self,
        operation: &'static str,
        max_attempts: u32,
        mut attempt: F,
    ) -> Result<T, DomainError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, DomainError>>,
    {
        let max_attempts = max_attempts.max(1);
        let mut attempts = 0;
        loop {
            attempts += 1;
            match attempt().await {
                Err(DomainError::Store(e)) if e.is_retryable() => {
                    metrics::counter!("commit_conflicts_total", "operation" => operation)
                        .increment(1);
                    if attempts >= max_attempts {
                        tracing::warn!(operation, attempts, error = %e, "giving up after repeated conflicts");
                        return Err(DomainError::Conflict(format!(
                            "{operation} lost to concurrent updates {attempts} times: {e}"
                        )));
                    }
                    tracing::debug!(operation, attempts, error = %e, "retrying after conflict");
                }
                other => return other,
            }
        }
    }
}
