//! Metadata reads: merging asset attributes with stored entries.

use crate::asset::{AssetSnapshot, PROTECTED_FIELDS};
use crate::permissions::PermFormat;
use crate::value::{EntryValue, MetadataEntry};
use crate::{AssetId, Result};
use serde_json::{Map, Value};

/// Key that always resolves to the asset's own external id.
pub const ID_KEY: &str = "id";

/// Caller options for reads.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReadOptions {
    pub perm_format: PermFormat,
    /// Return references literally instead of redirecting.
    pub raw: bool,
}

/// Result of a selective read.
#[derive(Clone, Debug, PartialEq)]
pub enum ReadOutcome {
    /// A single reference was dereferenced; follow it to the target asset.
    Redirect(AssetId),
    /// Nothing requested resolved to a value.
    NotFound,
    /// Exactly one value resolved; it is returned unwrapped.
    Value(Value),
    /// Two or more values resolved.
    Object(Map<String, Value>),
}

/// Everything known about an asset: protected fields overlaid with stored entries.
pub fn read_all(
    snapshot: &AssetSnapshot,
    entries: Vec<MetadataEntry>,
    perm_format: PermFormat,
) -> Result<Map<String, Value>> {
    let mut out = Map::new();
    for field in PROTECTED_FIELDS {
        if let Some(value) = snapshot.protected_value(field, perm_format)? {
            out.insert(field.to_string(), value);
        }
    }
    for entry in entries {
        out.insert(entry.key, Value::String(entry.value.render()));
    }
    Ok(out)
}

/// Resolve `keys` against the fetched `entries` and the asset snapshot.
///
/// `entries` must contain only rows whose key is in `keys`.
pub fn read_some(
    snapshot: &AssetSnapshot,
    keys: &[String],
    entries: Vec<MetadataEntry>,
    options: ReadOptions,
) -> Result<ReadOutcome> {
    if keys.len() == 1
        && entries.len() == 1
        && !options.raw
        && let EntryValue::Reference(target) = &entries[0].value
    {
        return Ok(ReadOutcome::Redirect(*target));
    }

    let mut out = Map::new();
    for entry in entries {
        out.insert(entry.key, Value::String(entry.value.render()));
    }
    for key in keys {
        if let Some(value) = snapshot.protected_value(key, options.perm_format)? {
            out.insert(key.clone(), value);
        } else if key == ID_KEY {
            out.insert(ID_KEY.to_string(), Value::String(snapshot.id.to_hex()));
        }
    }

    let outcome = match out.len() {
        0 => ReadOutcome::NotFound,
        1 => match out.into_iter().next() {
            Some((_, value)) => ReadOutcome::Value(value),
            None => ReadOutcome::NotFound,
        },
        _ => ReadOutcome::Object(out),
    };
    Ok(outcome)
}
