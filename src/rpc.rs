//! RPC surface for the registry: `getmappingid` and `getmappingname`.
//!
//! Params arrive as a positional JSON array and replies are one-element JSON
//! arrays, matching the shape existing wallet tooling already parses:
//!
//! ```text
//! getmappingid   ["teams", "Alpha"] -> [{"mapping-id": 0, "exists": false, "mapping-index": "teams"}]
//! getmappingname ["teams", 0]       -> [{"mapping-name": "Alpha", "exists": true, "mapping-index": "teams"}]
//! ```
//!
//! `exists` on `getmappingid` reports whether the name was mapped before the
//! call; `false` tells the caller a mapping transaction still has to be
//! broadcast for the new id.

use crate::error::{RegistryError, StoreError};
use crate::mapping::Registry;
use crate::store::MappingStore;
use anyhow::{Context, Result, anyhow, bail};
use serde::Serialize;
use serde_json::Value;

const INVALID_INDEX_MESSAGE: &str = "No mapping exist for the mapping index you provided.";
const NO_INDEX_MESSAGE: &str = "No mapping saved for the mapping type you provided.";
const NOT_FOUND_MESSAGE: &str =
    "Currently no mapping name exists for the mapping name you provided.";

/// Attempts `dispatch_retrying` makes before surfacing a write conflict.
pub const MAX_WRITE_ATTEMPTS: usize = 16;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RpcMethod {
    GetMappingId,
    GetMappingName,
}

impl RpcMethod {
    pub const ALL: [RpcMethod; 2] = [RpcMethod::GetMappingId, RpcMethod::GetMappingName];

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "getmappingid" => Some(RpcMethod::GetMappingId),
            "getmappingname" => Some(RpcMethod::GetMappingName),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            RpcMethod::GetMappingId => "getmappingid",
            RpcMethod::GetMappingName => "getmappingname",
        }
    }

    pub fn help(self) -> &'static str {
        match self {
            RpcMethod::GetMappingId => {
                "getmappingid \"mapping-index\" \"name\"\n\
\nGet a mapping ID from the specified mapping index, creating one if the name is new.\n\
\nResult:\n\
[\n\
  {\n\
    \"mapping-id\": n,          (numeric) The mapping id.\n\
    \"exists\": true|false,     (boolean) Whether the mapping already existed\n\
    \"mapping-index\": \"xxx\"    (string) The index that was searched.\n\
  }\n\
]\n\
\nExamples:\n\
> mapreg getmappingid teams \"Alpha\"\n"
            }
            RpcMethod::GetMappingName => {
                "getmappingname \"mapping-index\" id\n\
\nGet a mapping string name from the specified mapping index.\n\
\nResult:\n\
[\n\
  {\n\
    \"mapping-name\": \"xxx\",    (string) The mapping name.\n\
    \"exists\": true,           (boolean) Always true on success\n\
    \"mapping-index\": \"xxx\"    (string) The index that was searched.\n\
  }\n\
]\n\
\nExamples:\n\
> mapreg getmappingname teams 0\n"
            }
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct MappingIdReply {
    #[serde(rename = "mapping-id")]
    pub id: u32,
    pub exists: bool,
    #[serde(rename = "mapping-index")]
    pub mapping_index: String,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct MappingNameReply {
    #[serde(rename = "mapping-name")]
    pub name: String,
    pub exists: bool,
    #[serde(rename = "mapping-index")]
    pub mapping_index: String,
}

pub fn get_mapping_id<S: MappingStore>(
    registry: &Registry<S>,
    mapping_index: &str,
    name: &str,
) -> Result<MappingIdReply> {
    let resolution = registry
        .resolve_or_allocate(mapping_index, name)
        .map_err(render_error)?;
    Ok(MappingIdReply {
        id: resolution.id,
        exists: resolution.existed(),
        mapping_index: resolution.category_name,
    })
}

pub fn get_mapping_name<S: MappingStore>(
    registry: &Registry<S>,
    mapping_index: &str,
    id: u32,
) -> Result<MappingNameReply> {
    let name = registry
        .resolve_name(mapping_index, id)
        .map_err(render_error)?;
    Ok(MappingNameReply {
        name,
        exists: true,
        mapping_index: mapping_index.to_string(),
    })
}

/// Run one RPC call. `help` with an optional method name returns help text.
pub fn dispatch<S: MappingStore>(
    registry: &Registry<S>,
    method: &str,
    params: &Value,
) -> Result<Value> {
    if method == "help" {
        return Ok(Value::String(help_text(params)));
    }

    let Some(rpc) = RpcMethod::from_name(method) else {
        bail!("Method not found: {method}");
    };

    let args = params.as_array().map(Vec::as_slice).unwrap_or_default();
    if args.len() < 2 {
        bail!("{}", rpc.help());
    }
    let mapping_index = param_str(args, 0, "mapping-index")?;

    let reply = match rpc {
        RpcMethod::GetMappingId => {
            let name = param_str(args, 1, "name")?;
            serde_json::to_value(get_mapping_id(registry, mapping_index, name)?)?
        }
        RpcMethod::GetMappingName => {
            let id = param_id(&args[1])?;
            serde_json::to_value(get_mapping_name(registry, mapping_index, id)?)?
        }
    };
    Ok(Value::Array(vec![reply]))
}

/// `dispatch`, re-run from scratch while the store rejects the write because
/// another writer took the computed id first. Each retry re-reads the index.
/// Any other failure, or the last conflict, is returned unchanged.
pub fn dispatch_retrying<S: MappingStore>(
    registry: &Registry<S>,
    method: &str,
    params: &Value,
    max_attempts: usize,
) -> Result<Value> {
    let mut attempt = 1;
    loop {
        match dispatch(registry, method, params) {
            Err(err) if attempt < max_attempts && is_write_conflict(&err) => {
                tracing::debug!(method, attempt, "mapping write lost a race, retrying");
                attempt += 1;
            }
            outcome => return outcome,
        }
    }
}

fn is_write_conflict(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<RegistryError>(),
        Some(RegistryError::Store(StoreError::Conflict { .. }))
    )
}

fn help_text(params: &Value) -> String {
    let requested = params
        .as_array()
        .and_then(|args| args.first())
        .and_then(Value::as_str)
        .and_then(RpcMethod::from_name);
    match requested {
        Some(rpc) => rpc.help().to_string(),
        None => RpcMethod::ALL
            .iter()
            .map(|rpc| rpc.help().lines().next().unwrap_or(rpc.name()))
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

fn param_str<'a>(args: &'a [Value], idx: usize, label: &str) -> Result<&'a str> {
    args.get(idx)
        .and_then(Value::as_str)
        .with_context(|| format!("parameter {} ({label}) must be a string", idx + 1))
}

/// Ids may come as JSON numbers or as decimal strings (CLI callers pass text).
fn param_id(value: &Value) -> Result<u32> {
    let parsed = match value {
        Value::Number(num) => num.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(text) => text.trim().parse::<u32>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| {
        anyhow!("invalid mapping id {value}; expected an integer in 0..=4294967295")
    })
}

/// Attach the user-facing message while keeping the typed error as the source.
fn render_error(err: RegistryError) -> anyhow::Error {
    let message = match &err {
        RegistryError::InvalidCategory(_) => Some(INVALID_INDEX_MESSAGE),
        RegistryError::NoIndexForCategory(_) => Some(NO_INDEX_MESSAGE),
        RegistryError::NotFound { .. } => Some(NOT_FOUND_MESSAGE),
        _ => None,
    };
    match message {
        Some(message) => anyhow::Error::new(err).context(message),
        None => anyhow::Error::new(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::CategoryTag;
    use crate::mapping::{CategoryIndex, MappingEntry};
    use crate::store::MemoryStore;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn registry() -> Registry<MemoryStore> {
        Registry::new(MemoryStore::new())
    }

    /// Rejects the first `conflicts` writes as if another writer won the id.
    struct RacingStore {
        inner: MemoryStore,
        conflicts: AtomicUsize,
        writes: AtomicUsize,
    }

    impl RacingStore {
        fn losing(conflicts: usize) -> Self {
            Self {
                inner: MemoryStore::new(),
                conflicts: AtomicUsize::new(conflicts),
                writes: AtomicUsize::new(0),
            }
        }
    }

    impl MappingStore for RacingStore {
        fn read(&self, category: CategoryTag) -> Result<Option<CategoryIndex>, StoreError> {
            self.inner.read(category)
        }

        fn write(&self, entry: &MappingEntry) -> Result<(), StoreError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            let left = self.conflicts.load(Ordering::SeqCst);
            if left > 0 {
                self.conflicts.store(left - 1, Ordering::SeqCst);
                return Err(StoreError::Conflict {
                    category: entry.category,
                    id: entry.id,
                });
            }
            self.inner.write(entry)
        }
    }

    #[test]
    fn retrying_dispatch_recovers_from_lost_races() {
        let registry = Registry::new(RacingStore::losing(2));
        let reply =
            dispatch_retrying(&registry, "getmappingid", &json!(["teams", "Alpha"]), 3).unwrap();
        assert_eq!(
            reply,
            json!([{"mapping-id": 0, "exists": false, "mapping-index": "teams"}])
        );
        assert_eq!(registry.store().writes.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn retrying_dispatch_gives_up_after_max_attempts() {
        let registry = Registry::new(RacingStore::losing(5));
        let err = dispatch_retrying(&registry, "getmappingid", &json!(["teams", "Alpha"]), 2)
            .unwrap_err();
        assert!(is_write_conflict(&err), "{err:#}");
        assert_eq!(registry.store().writes.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn retrying_dispatch_does_not_retry_other_failures() {
        let registry = Registry::new(RacingStore::losing(0));
        let err = dispatch_retrying(&registry, "getmappingname", &json!(["teams", 0]), 5)
            .unwrap_err();
        assert_eq!(err.to_string(), NO_INDEX_MESSAGE);
        assert_eq!(registry.store().writes.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn getmappingid_reports_exists_flag() {
        let registry = registry();
        let first = dispatch(&registry, "getmappingid", &json!(["teams", "Alpha"])).unwrap();
        assert_eq!(
            first,
            json!([{"mapping-id": 0, "exists": false, "mapping-index": "teams"}])
        );
        let second = dispatch(&registry, "getmappingid", &json!(["teams", "Alpha"])).unwrap();
        assert_eq!(
            second,
            json!([{"mapping-id": 0, "exists": true, "mapping-index": "teams"}])
        );
    }

    #[test]
    fn getmappingname_accepts_numeric_and_string_ids() {
        let registry = registry();
        dispatch(&registry, "getmappingid", &json!(["sports", "Soccer"])).unwrap();
        let expected =
            json!([{"mapping-name": "Soccer", "exists": true, "mapping-index": "sports"}]);
        assert_eq!(
            dispatch(&registry, "getmappingname", &json!(["sports", 0])).unwrap(),
            expected
        );
        assert_eq!(
            dispatch(&registry, "getmappingname", &json!(["sports", "0"])).unwrap(),
            expected
        );
    }

    #[test]
    fn errors_carry_wallet_messages_and_typed_source() {
        let registry = registry();

        let err = dispatch(&registry, "getmappingname", &json!(["teams", 0])).unwrap_err();
        assert_eq!(err.to_string(), NO_INDEX_MESSAGE);
        assert!(matches!(
            err.downcast_ref::<RegistryError>(),
            Some(RegistryError::NoIndexForCategory(_))
        ));

        dispatch(&registry, "getmappingid", &json!(["teams", "Alpha"])).unwrap();
        let err = dispatch(&registry, "getmappingname", &json!(["teams", 99])).unwrap_err();
        assert_eq!(err.to_string(), NOT_FOUND_MESSAGE);

        let err =
            dispatch(&registry, "getmappingid", &json!(["unknownCategory", "x"])).unwrap_err();
        assert_eq!(err.to_string(), INVALID_INDEX_MESSAGE);
        assert!(matches!(
            err.downcast_ref::<RegistryError>(),
            Some(RegistryError::InvalidCategory(_))
        ));
    }

    #[test]
    fn short_params_return_help() {
        let registry = registry();
        let err = dispatch(&registry, "getmappingid", &json!(["teams"])).unwrap_err();
        assert!(err.to_string().starts_with("getmappingid"));
        let err = dispatch(&registry, "getmappingname", &Value::Null).unwrap_err();
        assert!(err.to_string().starts_with("getmappingname"));
    }

    #[test]
    fn bad_params_are_rejected() {
        let registry = registry();
        assert!(dispatch(&registry, "getmappingid", &json!([3, "x"])).is_err());
        assert!(dispatch(&registry, "getmappingname", &json!(["teams", -1])).is_err());
        assert!(dispatch(&registry, "getmappingname", &json!(["teams", "abc"])).is_err());
        assert!(dispatch(&registry, "getmappingname", &json!(["teams", 4294967296u64])).is_err());
        let err = dispatch(&registry, "nosuchmethod", &json!([])).unwrap_err();
        assert!(err.to_string().contains("Method not found"));
    }

    #[test]
    fn help_lists_methods_or_details_one() {
        let registry = registry();
        let all = dispatch(&registry, "help", &json!([])).unwrap();
        let text = all.as_str().unwrap();
        assert!(text.contains("getmappingid"));
        assert!(text.contains("getmappingname"));

        let one = dispatch(&registry, "help", &json!(["getmappingname"])).unwrap();
        assert!(one.as_str().unwrap().contains("\"mapping-name\""));
    }
}
