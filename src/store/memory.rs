//! In-process store keyed by category tag.

use crate::category::CategoryTag;
use crate::error::StoreError;
use crate::mapping::{CategoryIndex, MappingEntry};
use crate::store::{MappingStore, append_entry};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
/// Volatile `MappingStore` for tests and embedders that persist elsewhere.
pub struct MemoryStore {
    indexes: Mutex<BTreeMap<CategoryTag, CategoryIndex>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-populated with `entries`, applying the same
    /// conditional-append checks as `write`.
    pub fn with_entries<I>(entries: I) -> Result<Self, StoreError>
    where
        I: IntoIterator<Item = MappingEntry>,
    {
        let store = Self::new();
        for entry in entries {
            store.write(&entry)?;
        }
        Ok(store)
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<CategoryTag, CategoryIndex>> {
        self.indexes.lock().unwrap_or_else(|err| err.into_inner())
    }
}

impl MappingStore for MemoryStore {
    fn read(&self, category: CategoryTag) -> Result<Option<CategoryIndex>, StoreError> {
        Ok(self.lock().get(&category).cloned())
    }

    fn write(&self, entry: &MappingEntry) -> Result<(), StoreError> {
        let mut indexes = self.lock();
        let mut index = indexes.get(&entry.category).cloned().unwrap_or_default();
        append_entry(&mut index, entry)?;
        indexes.insert(entry.category, index);
        Ok(())
    }
}
