//! Deterministic name-to-id registry.
//!
//! Entities referenced by the betting protocol (sports, rounds, teams,
//! tournaments, contenders) are carried in transactions as compact integer
//! ids. This crate owns the mapping: given a mapping index and a name it
//! returns the existing id, or allocates the lowest unused id in that index
//! and persists it. Entries are append-only; there is no update or delete.
//!
//! The store is an injected collaborator (`MappingStore`), so the same
//! `Registry` runs over the JSON data directory used by the `mapreg` binary
//! or over `MemoryStore` in tests.

pub mod category;
pub mod config;
pub mod error;
pub mod logging;
pub mod mapping;
pub mod rpc;
pub mod store;

pub use category::{CategoryTag, resolve_category};
pub use config::RegistryConfig;
pub use error::{RegistryError, StoreError};
pub use mapping::{
    CategoryIndex, IndexScan, MAPPING_SCHEMA_VERSION, MappingEntry, Registry, Resolution,
};
pub use store::{JsonFileStore, MappingStore, MemoryStore};
