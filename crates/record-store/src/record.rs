use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::RecordId;

/// Version number for a record, used for optimistic concurrency control.
///
/// A record is created at version 1 and every committed update bumps it by 1.
/// Version 0 means "not stored yet".
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Version(i64);

impl Version {
    /// Creates a new version from a raw value.
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the initial version (0) for a record that has not been stored.
    pub fn initial() -> Self {
        Self(0)
    }

    /// Returns the first version (1), assigned on insert.
    pub fn first() -> Self {
        Self(1)
    }

    /// Returns the next version.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    /// Returns the raw version value.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Version {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Version> for i64 {
    fn from(version: Version) -> Self {
        version.0
    }
}

/// The record collections known to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Accounts,
    Products,
    Orders,
    Shipments,
}

impl Collection {
    /// Returns the collection name as stored.
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Accounts => "accounts",
            Collection::Products => "products",
            Collection::Orders => "orders",
            Collection::Shipments => "shipments",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Collection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "accounts" => Ok(Collection::Accounts),
            "products" => Ok(Collection::Products),
            "orders" => Ok(Collection::Orders),
            "shipments" => Ok(Collection::Shipments),
            other => Err(format!("unknown collection '{other}'")),
        }
    }
}

/// A stored record: a JSON document plus store-managed metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// The collection this record lives in.
    pub collection: Collection,

    /// Unique identifier within the collection.
    pub id: RecordId,

    /// Current version, bumped on every committed update.
    pub version: Version,

    /// When the record was inserted.
    pub created_at: DateTime<Utc>,

    /// When the record was last updated.
    pub updated_at: DateTime<Utc>,

    /// The document body. Always a JSON object.
    pub data: serde_json::Value,
}

impl Record {
    /// Returns the top-level field of the document, if present.
    pub fn field(&self, name: &str) -> Option<&serde_json::Value> {
        self.data.get(name)
    }
}
