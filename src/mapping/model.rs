//! Record shapes for one mapping index.
//!
//! `MappingEntry` is the unit the store appends; `CategoryIndex` is the full,
//! id-ordered view the resolver scans. Ordering by id matters: the lowest
//! free id is discovered by walking keys upward from zero.

use crate::category::CategoryTag;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::btree_map;

/// Version stamped on every newly created entry.
pub const MAPPING_SCHEMA_VERSION: u32 = 1;

/// One allocated identifier within a category. Immutable once stored.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct MappingEntry {
    pub id: u32,
    pub category: CategoryTag,
    pub name: String,
    pub schema_version: u32,
}

impl MappingEntry {
    /// Build an entry at the current schema version.
    pub fn new(category: CategoryTag, id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            category,
            name: name.into(),
            schema_version: MAPPING_SCHEMA_VERSION,
        }
    }

    /// Structural checks shared by every store before accepting an entry.
    pub fn validate(&self) -> Result<(), String> {
        if !self.category.is_known() {
            return Err(format!("entry {} has no valid category", self.id));
        }
        if self.name.is_empty() {
            return Err(format!(
                "entry {} in '{}' has an empty name",
                self.id,
                self.category.to_name()
            ));
        }
        if self.schema_version == 0 {
            return Err(format!("entry {} has schema_version 0", self.id));
        }
        Ok(())
    }
}

/// Every entry of one category, keyed and ordered by id.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CategoryIndex {
    entries: BTreeMap<u32, MappingEntry>,
}

/// Result of one pass over a `CategoryIndex`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct IndexScan {
    /// Id of the first entry (ascending) whose name matched.
    pub existing: Option<u32>,
    /// Smallest id not present as a key; `None` only when all of `u32` is used.
    pub first_free: Option<u32>,
}

impl CategoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: u32) -> Option<&MappingEntry> {
        self.entries.get(&id)
    }

    /// Entries in ascending id order.
    pub fn iter(&self) -> btree_map::Values<'_, u32, MappingEntry> {
        self.entries.values()
    }

    /// Insert an entry only if its id is unused. Hands the entry back on conflict.
    pub fn try_insert(&mut self, entry: MappingEntry) -> Result<(), MappingEntry> {
        match self.entries.entry(entry.id) {
            btree_map::Entry::Occupied(_) => Err(entry),
            btree_map::Entry::Vacant(slot) => {
                slot.insert(entry);
                Ok(())
            }
        }
    }

    /// Walk the index once, answering both "does `name` already have an id"
    /// and "what is the lowest unused id".
    ///
    /// The free-id counter only advances while keys are contiguous from 0, so
    /// `{0, 1, 3}` yields 2 rather than 4.
    pub fn scan(&self, name: &str) -> IndexScan {
        let mut existing = None;
        let mut next_free = Some(0u32);
        let mut gap_found = false;

        for (&id, entry) in &self.entries {
            tracing::trace!(
                id,
                category = entry.category.to_name(),
                version = entry.schema_version,
                name = %entry.name,
                "scanning mapping entry"
            );
            if existing.is_none() && entry.name == name {
                existing = Some(entry.id);
            }
            if !gap_found {
                if Some(id) == next_free {
                    next_free = id.checked_add(1);
                } else {
                    gap_found = true;
                }
            }
            if existing.is_some() && gap_found {
                break;
            }
        }

        IndexScan {
            existing,
            first_free: next_free,
        }
    }

    /// Name stored under `id`, if any.
    pub fn name_of(&self, id: u32) -> Option<&str> {
        self.get(id).map(|entry| entry.name.as_str())
    }
}

impl FromIterator<MappingEntry> for CategoryIndex {
    /// Later duplicates of an id replace earlier ones; stores that care about
    /// duplicates must check before collecting.
    fn from_iter<I: IntoIterator<Item = MappingEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|entry| (entry.id, entry)).collect(),
        }
    }
}

impl<'a> IntoIterator for &'a CategoryIndex {
    type Item = &'a MappingEntry;
    type IntoIter = btree_map::Values<'a, u32, MappingEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.values()
    }
}
