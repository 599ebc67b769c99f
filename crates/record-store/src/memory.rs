use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::{
    Collection, Filter, Record, RecordId, RecordStoreError, Result, Version, Write, WriteBatch,
    store::{RecordStore, merge_patch},
};

type Key = (Collection, RecordId);

/// In-memory record store implementation.
///
/// Commits are serialized behind a single write lock, which gives every batch
/// the same all-or-nothing semantics as the PostgreSQL implementation.
#[derive(Clone, Default)]
pub struct InMemoryRecordStore {
    records: Arc<RwLock<HashMap<Key, Record>>>,
}

impl InMemoryRecordStore {
    /// Creates a new empty in-memory record store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of records stored.
    pub async fn record_count(&self) -> usize {
        self.records.read().await.len()
    }

    /// Returns the number of records in one collection.
    pub async fn collection_count(&self, collection: Collection) -> usize {
        self.records
            .read()
            .await
            .keys()
            .filter(|(c, _)| *c == collection)
            .count()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn commit(&self, batch: WriteBatch) -> Result<Vec<Record>> {
        batch.validate()?;

        let mut store = self.records.write().await;
        let now = Utc::now();

        // Stage every write against a scratch copy of the touched records so
        // a failure part-way through leaves the store untouched.
        let mut staged: Vec<Record> = Vec::with_capacity(batch.len());
        for write in batch.writes() {
            match write {
                Write::Insert {
                    collection,
                    id,
                    data,
                    unique,
                } => {
                    if store.contains_key(&(*collection, *id)) {
                        return Err(RecordStoreError::DuplicateId {
                            collection: *collection,
                            id: *id,
                        });
                    }

                    for key in unique {
                        let clashes_stored = store.values().any(|r| {
                            r.collection == *collection && r.field(&key.field) == Some(&key.value)
                        });
                        let clashes_staged = staged.iter().any(|r| {
                            r.collection == *collection && r.field(&key.field) == Some(&key.value)
                        });
                        if clashes_stored || clashes_staged {
                            return Err(RecordStoreError::UniqueViolation {
                                collection: *collection,
                                field: key.field.clone(),
                                value: key.value_text(),
                            });
                        }
                    }

                    staged.push(Record {
                        collection: *collection,
                        id: *id,
                        version: Version::first(),
                        created_at: now,
                        updated_at: now,
                        data: data.clone(),
                    });
                }
                Write::Update {
                    collection,
                    id,
                    patch,
                    expected_version,
                } => {
                    let current =
                        store
                            .get(&(*collection, *id))
                            .ok_or(RecordStoreError::NotFound {
                                collection: *collection,
                                id: *id,
                            })?;

                    if let Some(expected) = expected_version
                        && current.version != *expected
                    {
                        return Err(RecordStoreError::ConcurrencyConflict {
                            collection: *collection,
                            id: *id,
                            expected: *expected,
                            actual: current.version,
                        });
                    }

                    let mut next = current.clone();
                    merge_patch(&mut next.data, patch);
                    next.version = current.version.next();
                    next.updated_at = now;
                    staged.push(next);
                }
            }
        }

        for record in &staged {
            store.insert((record.collection, record.id), record.clone());
        }

        Ok(staged)
    }

    async fn get(&self, collection: Collection, id: RecordId) -> Result<Option<Record>> {
        Ok(self.records.read().await.get(&(collection, id)).cloned())
    }

    async fn find(&self, collection: Collection, filter: Filter) -> Result<Vec<Record>> {
        let store = self.records.read().await;
        let mut records: Vec<_> = store
            .values()
            .filter(|r| r.collection == collection && filter.matches(r))
            .cloned()
            .collect();

        records.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        let offset = filter.offset.unwrap_or(0);
        let records = records.into_iter().skip(offset);
        let records = match filter.limit {
            Some(limit) => records.take(limit).collect(),
            None => records.collect(),
        };

        Ok(records)
    }
}
