//! Read access to the persisted document store.

pub mod document;
pub mod memory;
pub mod repository;

pub use document::{Direction, Document, DocumentStore, FieldValue, Filter, FilterOp, Query};
pub use memory::InMemoryStore;
pub use repository::{collections, HistoryRepository, StoreHistoryRepository};

use pulse_types::PulseError;

pub fn store_error(message: impl Into<String>) -> PulseError {
    PulseError::Store(message.into())
}

pub fn repository_error(message: impl Into<String>) -> PulseError {
    PulseError::Repository(message.into())
}
