use serde_json::Value;

use crate::Record;

/// Builder for record lookups.
///
/// A filter is an AND-combination of equality predicates on top-level
/// document fields. A predicate against `null` also matches records where the
/// field is absent. Results are ordered by creation time, then id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    /// Field/value pairs that must all match.
    pub predicates: Vec<(String, Value)>,

    /// Maximum number of records to return.
    pub limit: Option<usize>,

    /// Number of records to skip.
    pub offset: Option<usize>,
}

impl Filter {
    /// Creates a filter matching every record in a collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requires `field` to equal `value`.
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.predicates.push((field.into(), value.into()));
        self
    }

    /// Requires `field` to be null or absent.
    pub fn is_null(self, field: impl Into<String>) -> Self {
        self.eq(field, Value::Null)
    }

    /// Limits the number of records returned.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skips this many records before returning results.
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Returns true if the record satisfies every predicate.
    pub fn matches(&self, record: &Record) -> bool {
        self.predicates
            .iter()
            .all(|(field, expected)| match record.field(field) {
                Some(actual) => actual == expected,
                None => expected.is_null(),
            })
    }
}
