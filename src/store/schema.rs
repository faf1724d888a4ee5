//! Embedded JSON Schema for persisted index records.
//!
//! The schema ships inside the binary so a data directory can be validated
//! without locating the repository on disk. Compiled once per process.

use crate::error::StoreError;
use jsonschema::JSONSchema;
use serde_json::Value;
use std::sync::OnceLock;

const INDEX_RECORD_SCHEMA: &str = include_str!("../../schema/category_index.schema.json");

/// Version constant the schema pins in `/properties/schema_version/const`.
pub const INDEX_RECORD_VERSION: u32 = 1;

pub(crate) struct RecordSchema {
    compiled: JSONSchema,
}

impl RecordSchema {
    /// Shared compiled validator for index records.
    pub(crate) fn shared() -> Result<&'static RecordSchema, StoreError> {
        static SCHEMA: OnceLock<Result<RecordSchema, String>> = OnceLock::new();
        SCHEMA
            .get_or_init(Self::compile)
            .as_ref()
            .map_err(|err| StoreError::Schema(err.clone()))
    }

    fn compile() -> Result<RecordSchema, String> {
        let raw: Value = serde_json::from_str(INDEX_RECORD_SCHEMA)
            .map_err(|err| format!("embedded schema is not JSON: {err}"))?;
        let pinned = raw
            .pointer("/properties/schema_version/const")
            .and_then(Value::as_u64);
        if pinned != Some(u64::from(INDEX_RECORD_VERSION)) {
            return Err(format!(
                "embedded schema pins schema_version {pinned:?}, expected {INDEX_RECORD_VERSION}"
            ));
        }
        let compiled = JSONSchema::compile(&raw).map_err(|err| err.to_string())?;
        Ok(RecordSchema { compiled })
    }

    /// Validate a decoded record, joining every violation into one message.
    pub(crate) fn check(&self, record: &Value) -> Result<(), String> {
        if let Err(errors) = self.compiled.validate(record) {
            let details = errors
                .map(|err| err.to_string())
                .collect::<Vec<_>>()
                .join("\n");
            return Err(details);
        }
        Ok(())
    }
}
