//! Shared types for the fulfillment platform.

pub mod types;

pub use types::{ParseRecordIdError, RecordId};
