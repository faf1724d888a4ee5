//! JSON-on-disk store: one record file per category.
//!
//! Each category lives at `<root>/<category-name>.json` holding the full
//! entry list. Reads validate the record against the embedded schema and the
//! structural invariants (matching category, unique ids, non-empty names);
//! any violation is reported as `StoreError::Corrupt` rather than silently
//! repaired. Writes take an exclusive advisory lock on `<category-name>.lock`,
//! re-read the record, apply the conditional append, and atomically replace
//! the file through a sibling temp file. The lock spans processes, so a
//! writer holding a stale view gets `StoreError::Conflict` instead of
//! overwriting another process's allocation.

use crate::category::CategoryTag;
use crate::error::StoreError;
use crate::mapping::{CategoryIndex, MappingEntry};
use crate::store::schema::{INDEX_RECORD_VERSION, RecordSchema};
use crate::store::{MappingStore, append_entry};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::NamedTempFile;

const RECORD_EXTENSION: &str = "json";
const LOCK_EXTENSION: &str = "lock";

/// Serialized form of one category's index.
#[derive(Debug, Serialize, Deserialize)]
struct IndexRecord {
    schema_version: u32,
    category: String,
    entries: Vec<MappingEntry>,
}

/// `MappingStore` persisting each category as a JSON document under `root`.
pub struct JsonFileStore {
    root: PathBuf,
    schema: &'static RecordSchema,
    // Serializes read-merge-replace between threads; the lock file covers
    // other processes.
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Open a store rooted at `root`. The directory is created lazily on the
    /// first write, so opening a fresh location has no side effects.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        Ok(Self {
            root: root.into(),
            schema: RecordSchema::shared()?,
            write_lock: Mutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Record path for a category.
    pub fn record_path(&self, category: CategoryTag) -> PathBuf {
        self.root.join(format!("{}.{RECORD_EXTENSION}", category.to_name()))
    }

    /// Advisory lock file guarding writes to a category's record.
    pub fn lock_path(&self, category: CategoryTag) -> PathBuf {
        self.record_path(category).with_extension(LOCK_EXTENSION)
    }

    /// Block until this process holds the category's exclusive file lock.
    /// The lock is released when the returned handle is dropped.
    fn lock_category(&self, category: CategoryTag) -> Result<File, StoreError> {
        fs::create_dir_all(&self.root).map_err(|err| StoreError::io(&self.root, err))?;
        let path = self.lock_path(category);
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|err| StoreError::io(&path, err))?;
        file.lock_exclusive().map_err(|err| StoreError::io(&path, err))?;
        Ok(file)
    }

    fn load(&self, category: CategoryTag) -> Result<Option<CategoryIndex>, StoreError> {
        let path = self.record_path(category);
        let data = match fs::read_to_string(&path) {
            Ok(data) => data,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(StoreError::io(&path, err)),
        };

        let value: Value = serde_json::from_str(&data)
            .map_err(|err| StoreError::corrupt(&path, format!("invalid JSON: {err}")))?;
        self.schema
            .check(&value)
            .map_err(|details| StoreError::corrupt(&path, details))?;
        let record: IndexRecord = serde_json::from_value(value)
            .map_err(|err| StoreError::corrupt(&path, err.to_string()))?;

        decode_record(&path, category, record).map(Some)
    }

    fn persist(&self, category: CategoryTag, index: &CategoryIndex) -> Result<(), StoreError> {
        fs::create_dir_all(&self.root).map_err(|err| StoreError::io(&self.root, err))?;
        let path = self.record_path(category);
        let record = IndexRecord {
            schema_version: INDEX_RECORD_VERSION,
            category: category.to_name().to_string(),
            entries: index.iter().cloned().collect(),
        };

        let mut tmp =
            NamedTempFile::new_in(&self.root).map_err(|err| StoreError::io(&self.root, err))?;
        serde_json::to_writer_pretty(&mut tmp, &record)
            .map_err(|err| StoreError::io(tmp.path(), io::Error::from(err)))?;
        tmp.write_all(b"\n")
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|err| StoreError::io(tmp.path(), err))?;
        tmp.persist(&path).map_err(|err| StoreError::io(&path, err.error))?;
        Ok(())
    }
}

fn decode_record(
    path: &Path,
    category: CategoryTag,
    record: IndexRecord,
) -> Result<CategoryIndex, StoreError> {
    if record.category != category.to_name() {
        return Err(StoreError::corrupt(
            path,
            format!(
                "record declares category '{}' but is stored as '{}'",
                record.category,
                category.to_name()
            ),
        ));
    }

    let mut index = CategoryIndex::new();
    for entry in record.entries {
        if entry.category != category {
            return Err(StoreError::corrupt(
                path,
                format!(
                    "entry {} belongs to '{}', not '{}'",
                    entry.id,
                    entry.category.to_name(),
                    category.to_name()
                ),
            ));
        }
        entry
            .validate()
            .map_err(|detail| StoreError::corrupt(path, detail))?;
        index.try_insert(entry).map_err(|dup| {
            StoreError::corrupt(path, format!("duplicate mapping id {}", dup.id))
        })?;
    }
    Ok(index)
}

impl MappingStore for JsonFileStore {
    fn read(&self, category: CategoryTag) -> Result<Option<CategoryIndex>, StoreError> {
        self.load(category)
    }

    fn write(&self, entry: &MappingEntry) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|err| err.into_inner());
        let _file_lock = self.lock_category(entry.category)?;
        let mut index = self.load(entry.category)?.unwrap_or_default();
        append_entry(&mut index, entry)?;
        tracing::debug!(
            category = entry.category.to_name(),
            id = entry.id,
            path = %self.record_path(entry.category).display(),
            "persisting mapping entry"
        );
        self.persist(entry.category, &index)
    }
}
