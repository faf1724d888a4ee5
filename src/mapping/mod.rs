//! Mapping records and the resolver that allocates them.
//!
//! `model` holds the entry/index shapes; `resolver` implements
//! resolve-or-allocate and reverse lookup on top of an injected store.

pub mod model;
pub mod resolver;

pub use model::{CategoryIndex, IndexScan, MAPPING_SCHEMA_VERSION, MappingEntry};
pub use resolver::{Registry, Resolution};
