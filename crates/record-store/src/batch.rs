use std::collections::HashSet;

use serde_json::Value;

use crate::{Collection, RecordId, RecordStoreError, Result, Version};

/// A field whose value must be unique across a collection.
///
/// Unique fields are checked on insert only; callers must treat them as
/// immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UniqueKey {
    pub field: String,
    pub value: Value,
}

impl UniqueKey {
    /// Returns the value rendered for error messages and lock keys.
    pub fn value_text(&self) -> String {
        match &self.value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// A single write inside a [`WriteBatch`].
#[derive(Debug, Clone, PartialEq)]
pub enum Write {
    /// Creates a new record at [`Version::first`].
    Insert {
        collection: Collection,
        id: RecordId,
        data: Value,
        unique: Vec<UniqueKey>,
    },

    /// Merges `patch` (top-level keys) into an existing record.
    ///
    /// If `expected_version` is set, the write only applies when the stored
    /// record is still at that version.
    Update {
        collection: Collection,
        id: RecordId,
        patch: Value,
        expected_version: Option<Version>,
    },
}

impl Write {
    /// Creates an insert with no unique constraints.
    pub fn insert(collection: Collection, id: RecordId, data: Value) -> Self {
        Write::Insert {
            collection,
            id,
            data,
            unique: Vec::new(),
        }
    }

    /// Creates an update that applies regardless of the stored version.
    pub fn update(collection: Collection, id: RecordId, patch: Value) -> Self {
        Write::Update {
            collection,
            id,
            patch,
            expected_version: None,
        }
    }

    /// Creates an update guarded by an expected version.
    pub fn update_expecting(
        collection: Collection,
        id: RecordId,
        patch: Value,
        expected: Version,
    ) -> Self {
        Write::Update {
            collection,
            id,
            patch,
            expected_version: Some(expected),
        }
    }

    /// Declares `field` unique across the collection.
    ///
    /// Has no effect on updates, or if the document has no such field.
    pub fn unique_on(mut self, field: impl Into<String>) -> Self {
        if let Write::Insert { data, unique, .. } = &mut self {
            let field = field.into();
            if let Some(value) = data.get(&field).filter(|v| !v.is_null()) {
                unique.push(UniqueKey {
                    value: value.clone(),
                    field,
                });
            }
        }
        self
    }

    /// Returns the collection this write targets.
    pub fn collection(&self) -> Collection {
        match self {
            Write::Insert { collection, .. } | Write::Update { collection, .. } => *collection,
        }
    }

    /// Returns the id of the record this write targets.
    pub fn id(&self) -> RecordId {
        match self {
            Write::Insert { id, .. } | Write::Update { id, .. } => *id,
        }
    }
}

/// An ordered set of writes applied all-or-nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    writes: Vec<Write>,
}

impl WriteBatch {
    /// Creates an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a write to the batch.
    pub fn push(mut self, write: Write) -> Self {
        self.writes.push(write);
        self
    }

    /// Returns the writes in order.
    pub fn writes(&self) -> &[Write] {
        &self.writes
    }

    /// Returns the number of writes.
    pub fn len(&self) -> usize {
        self.writes.len()
    }

    /// Returns true if the batch has no writes.
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Validates the batch before it is applied.
    ///
    /// A batch must be non-empty, must touch each record at most once, and
    /// every document or patch must be a JSON object.
    pub fn validate(&self) -> Result<()> {
        if self.writes.is_empty() {
            return Err(RecordStoreError::InvalidWrite(
                "Cannot commit an empty batch".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for write in &self.writes {
            if !seen.insert((write.collection(), write.id())) {
                return Err(RecordStoreError::InvalidWrite(format!(
                    "{} record {} is written more than once in the batch",
                    write.collection(),
                    write.id()
                )));
            }

            let body = match write {
                Write::Insert { data, .. } => data,
                Write::Update { patch, .. } => patch,
            };
            if !body.is_object() {
                return Err(RecordStoreError::InvalidWrite(format!(
                    "{} record {} body must be a JSON object",
                    write.collection(),
                    write.id()
                )));
            }
        }

        Ok(())
    }
}

impl From<Write> for WriteBatch {
    fn from(write: Write) -> Self {
        WriteBatch::new().push(write)
    }
}

impl FromIterator<Write> for WriteBatch {
    fn from_iter<I: IntoIterator<Item = Write>>(iter: I) -> Self {
        Self {
            writes: iter.into_iter().collect(),
        }
    }
}
