//! Mapping between domain entities and stored records.

use common::RecordId;
use record_store::{Collection, Record, Version, Write};
use serde::{Serialize, de::DeserializeOwned};

/// Trait for entities persisted as records.
///
/// A document knows which collection it lives in and carries the version it
/// was loaded at, so that writing it back is a compare-and-swap against that
/// version.
pub trait Document: Serialize + DeserializeOwned + Send + Sync + Sized {
    /// The collection this document is stored in.
    const COLLECTION: Collection;

    /// Human-readable entity name used in errors.
    const ENTITY: &'static str;

    /// Returns the document's record id.
    fn record_id(&self) -> RecordId;

    /// Returns the version the document was loaded at.
    ///
    /// `Version::initial()` for a document that has not been stored yet.
    fn version(&self) -> Version;

    /// Sets the document version.
    ///
    /// Called after loading and after a successful commit.
    fn set_version(&mut self, version: Version);

    /// Fields whose values must be unique across the collection.
    fn unique_fields() -> &'static [&'static str] {
        &[]
    }

    /// Rebuilds a document from a stored record.
    fn from_record(record: Record) -> Result<Self, serde_json::Error> {
        let version = record.version;
        let mut document: Self = serde_json::from_value(record.data)?;
        document.set_version(version);
        Ok(document)
    }

    /// Builds the write that stores a new document.
    fn insert_write(&self) -> Result<Write, serde_json::Error> {
        let data = serde_json::to_value(self)?;
        let write = Self::unique_fields().iter().fold(
            Write::insert(Self::COLLECTION, self.record_id(), data),
            |write, field| write.unique_on(*field),
        );
        Ok(write)
    }

    /// Builds the write that replaces the stored document, guarded by the
    /// version it was loaded at.
    fn update_write(&self) -> Result<Write, serde_json::Error> {
        let data = serde_json::to_value(self)?;
        Ok(Write::update_expecting(
            Self::COLLECTION,
            self.record_id(),
            data,
            self.version(),
        ))
    }
}
