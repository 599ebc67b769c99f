//! Versioned record store for the fulfillment platform.
//!
//! Records are JSON documents grouped into collections. Every change goes
//! through [`RecordStore::commit`], which applies a [`WriteBatch`] atomically
//! and rejects it if any updated record has moved past the version the caller
//! read.

pub mod batch;
pub mod error;
pub mod filter;
pub mod memory;
pub mod postgres;
pub mod record;
pub mod store;

pub use batch::{UniqueKey, Write, WriteBatch};
pub use common::RecordId;
pub use error::{RecordStoreError, Result};
pub use filter::Filter;
pub use memory::InMemoryRecordStore;
pub use postgres::PostgresRecordStore;
pub use record::{Collection, Record, Version};
pub use store::{RecordStore, RecordStoreExt};
