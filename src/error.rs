//! Error taxonomy for registry and store operations.
//!
//! Every failure is returned to the caller as a value; nothing here is logged
//! or retried. The RPC layer renders these into user-facing messages.

use std::path::PathBuf;
use thiserror::Error;

use crate::category::CategoryTag;

/// Failures surfaced by `Registry` operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The category name does not round-trip through the directory.
    #[error("invalid mapping index '{0}'")]
    InvalidCategory(String),

    /// The caller asked to map an empty name.
    #[error("mapping name must not be empty")]
    EmptyName,

    /// Lookup-only call against a category that has never been written.
    #[error("no mappings saved for index '{0}'")]
    NoIndexForCategory(String),

    /// The category has an index but no entry with the requested id.
    #[error("no mapping with id {id} in index '{category}'")]
    NotFound { category: String, id: u32 },

    /// Every representable id in the category is taken.
    #[error("mapping index '{0}' has no free ids left")]
    IdSpaceExhausted(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Failures raised by a `MappingStore` implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("i/o error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A persisted record failed to decode or validate.
    #[error("corrupt index record {}: {detail}", .path.display())]
    Corrupt { path: PathBuf, detail: String },

    /// Conditional append rejected: the id is already taken.
    #[error("mapping id {id} already exists in index '{}'", .category.to_name())]
    Conflict { category: CategoryTag, id: u32 },

    /// The entry itself is malformed (e.g. empty name, unknown category).
    #[error("refusing to store invalid entry: {0}")]
    InvalidEntry(String),

    /// The embedded record schema failed to compile.
    #[error("index record schema unusable: {0}")]
    Schema(String),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn corrupt(path: impl Into<PathBuf>, detail: impl Into<String>) -> Self {
        StoreError::Corrupt {
            path: path.into(),
            detail: detail.into(),
        }
    }
}
