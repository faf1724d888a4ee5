//! Persistence boundary for mapping indexes.
//!
//! The resolver only needs two things from storage: load one category's
//! full index, and append one new entry to it. `MappingStore` captures that
//! contract; `MemoryStore` and `JsonFileStore` are the shipped backends.

pub mod file;
pub mod memory;
pub mod schema;

pub use file::JsonFileStore;
pub use memory::MemoryStore;
pub use schema::INDEX_RECORD_VERSION;

use crate::category::CategoryTag;
use crate::error::StoreError;
use crate::mapping::{CategoryIndex, MappingEntry};
use std::sync::Arc;

/// Durable storage for per-category mapping indexes.
///
/// `read` returns `Ok(None)` for a category that has never been written;
/// absence is not an error. `write` is a conditional append: it must fail
/// with `StoreError::Conflict` when the entry's id is already present and
/// leave the stored index untouched in that case.
pub trait MappingStore: Send + Sync {
    fn read(&self, category: CategoryTag) -> Result<Option<CategoryIndex>, StoreError>;

    fn write(&self, entry: &MappingEntry) -> Result<(), StoreError>;
}

impl<S: MappingStore + ?Sized> MappingStore for Arc<S> {
    fn read(&self, category: CategoryTag) -> Result<Option<CategoryIndex>, StoreError> {
        (**self).read(category)
    }

    fn write(&self, entry: &MappingEntry) -> Result<(), StoreError> {
        (**self).write(entry)
    }
}

impl<S: MappingStore + ?Sized> MappingStore for &S {
    fn read(&self, category: CategoryTag) -> Result<Option<CategoryIndex>, StoreError> {
        (**self).read(category)
    }

    fn write(&self, entry: &MappingEntry) -> Result<(), StoreError> {
        (**self).write(entry)
    }
}

/// Merge `entry` into `index` under the conditional-append rule.
pub(crate) fn append_entry(
    index: &mut CategoryIndex,
    entry: &MappingEntry,
) -> Result<(), StoreError> {
    entry.validate().map_err(StoreError::InvalidEntry)?;
    index
        .try_insert(entry.clone())
        .map_err(|rejected| StoreError::Conflict {
            category: rejected.category,
            id: rejected.id,
        })
}
