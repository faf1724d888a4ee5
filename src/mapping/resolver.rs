//! Resolve-or-allocate over an injected `MappingStore`.
//!
//! A `Registry` never caches indexes: each call reads the category's full
//! index, decides, and writes at most one entry. Allocation holds a
//! per-category lock across that whole read-compute-write so two callers
//! sharing one registry can never pick the same free id.

use crate::category::{CategoryTag, resolve_category};
use crate::error::RegistryError;
use crate::mapping::MappingEntry;
use crate::store::MappingStore;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// Outcome of `Registry::resolve_or_allocate`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Resolution {
    pub id: u32,
    /// True when this call allocated and persisted the id.
    pub created: bool,
    pub category_name: String,
}

impl Resolution {
    /// Whether the name was already mapped before this call.
    pub fn existed(&self) -> bool {
        !self.created
    }
}

/// Name-to-id registry bound to one store.
pub struct Registry<S> {
    store: S,
    locks: Mutex<BTreeMap<CategoryTag, Arc<Mutex<()>>>>,
}

impl<S: MappingStore> Registry<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            locks: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Return the id for `name` in `category_name`, allocating the lowest
    /// unused id and persisting it when the name is new.
    ///
    /// A category that has never been written is treated as empty. A failed
    /// write is returned as-is; the computed id is not retried or reserved.
    pub fn resolve_or_allocate(
        &self,
        category_name: &str,
        name: &str,
    ) -> Result<Resolution, RegistryError> {
        let category = resolve_category(category_name)?;
        if name.is_empty() {
            return Err(RegistryError::EmptyName);
        }

        let lock = self.category_lock(category);
        let _guard = lock.lock().unwrap_or_else(|err| err.into_inner());
        let index = self.store.read(category)?.unwrap_or_default();
        let scan = index.scan(name);

        if let Some(id) = scan.existing {
            return Ok(Resolution {
                id,
                created: false,
                category_name: category_name.to_string(),
            });
        }

        let id = scan
            .first_free
            .ok_or_else(|| RegistryError::IdSpaceExhausted(category_name.to_string()))?;
        let entry = MappingEntry::new(category, id, name);
        self.store.write(&entry)?;
        tracing::debug!(category = category_name, id, name, "allocated mapping id");

        Ok(Resolution {
            id,
            created: true,
            category_name: category_name.to_string(),
        })
    }

    /// Name recorded for `id` in `category_name`. Never allocates.
    pub fn resolve_name(&self, category_name: &str, id: u32) -> Result<String, RegistryError> {
        let category = resolve_category(category_name)?;
        let index = self
            .store
            .read(category)?
            .ok_or_else(|| RegistryError::NoIndexForCategory(category_name.to_string()))?;

        index
            .iter()
            .find(|entry| entry.id == id)
            .map(|entry| entry.name.clone())
            .ok_or_else(|| RegistryError::NotFound {
                category: category_name.to_string(),
                id,
            })
    }

    fn category_lock(&self, category: CategoryTag) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|err| err.into_inner());
        Arc::clone(locks.entry(category).or_default())
    }
}
