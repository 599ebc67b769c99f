use async_trait::async_trait;
use serde_json::Value;

use crate::{Collection, Filter, Record, RecordId, Result, Version, Write, WriteBatch};

/// Core trait for record store implementations.
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Applies a batch of writes atomically.
    ///
    /// Either every write is applied or none is. The batch fails with
    /// `ConcurrencyConflict` if any update's expected version does not match,
    /// `UniqueViolation` if an insert repeats a unique field value, and
    /// `NotFound` if an update targets a missing record.
    ///
    /// Returns the resulting records in batch order.
    async fn commit(&self, batch: WriteBatch) -> Result<Vec<Record>>;

    /// Retrieves a record by id.
    async fn get(&self, collection: Collection, id: RecordId) -> Result<Option<Record>>;

    /// Retrieves every record in a collection matching the filter.
    ///
    /// Records are returned oldest first.
    async fn find(&self, collection: Collection, filter: Filter) -> Result<Vec<Record>>;
}

/// Extension trait providing single-write conveniences.
#[async_trait]
pub trait RecordStoreExt: RecordStore {
    /// Inserts a single record.
    async fn insert(&self, collection: Collection, id: RecordId, data: Value) -> Result<Record> {
        let mut records = self
            .commit(Write::insert(collection, id, data).into())
            .await?;
        Ok(records.remove(0))
    }

    /// Merges a patch into a single record.
    async fn update(
        &self,
        collection: Collection,
        id: RecordId,
        patch: Value,
        expected_version: Option<Version>,
    ) -> Result<Record> {
        let write = Write::Update {
            collection,
            id,
            patch,
            expected_version,
        };
        let mut records = self.commit(write.into()).await?;
        Ok(records.remove(0))
    }

    /// Returns the first record matching the filter.
    async fn find_one(&self, collection: Collection, filter: Filter) -> Result<Option<Record>> {
        Ok(self
            .find(collection, filter.limit(1))
            .await?
            .into_iter()
            .next())
    }
}

// Blanket implementation for all RecordStore implementations
impl<T: RecordStore + ?Sized> RecordStoreExt for T {}

/// Merges the top-level keys of `patch` into `data`.
pub(crate) fn merge_patch(data: &mut Value, patch: &Value) {
    if let (Some(target), Some(source)) = (data.as_object_mut(), patch.as_object()) {
        for (key, value) in source {
            target.insert(key.clone(), value.clone());
        }
    }
}
