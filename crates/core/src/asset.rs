//! Asset identifiers and intrinsic asset attributes.

use crate::permissions::{PermFormat, Permissions};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Attribute names derived from the asset record.
///
/// These are never stored as metadata rows and cannot be changed through
/// metadata mutation.
pub const PROTECTED_FIELDS: [&str; 7] = [
    "type",
    "permissions",
    "user_name",
    "group_name",
    "created",
    "last_modified",
    "size",
];

/// Whether `key` names one of the protected asset attributes.
pub fn is_protected(key: &str) -> bool {
    PROTECTED_FIELDS.contains(&key)
}

/// A 32-bit asset identifier.
///
/// Externally an asset id is always an 8-digit, zero-padded, lowercase hex string.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetId(u32);

impl AssetId {
    /// Number of hex digits in the external representation.
    pub const HEX_LEN: usize = 8;

    /// Wrap a raw integer id.
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Parse the external hex representation (exactly 8 hex digits, any case).
    pub fn parse(hex: &str) -> crate::Result<Self> {
        if hex.len() != Self::HEX_LEN || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(crate::Error::InvalidAssetId(format!(
                "expected {} hex digits, got {hex:?}",
                Self::HEX_LEN
            )));
        }
        u32::from_str_radix(hex, 16)
            .map(Self)
            .map_err(|e| crate::Error::InvalidAssetId(format!("{hex:?}: {e}")))
    }

    /// Get the raw integer id.
    pub const fn get(self) -> u32 {
        self.0
    }

    /// The canonical external representation.
    pub fn to_hex(self) -> String {
        format!("{:08x}", self.0)
    }
}

impl From<u32> for AssetId {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

impl TryFrom<i64> for AssetId {
    type Error = crate::Error;

    fn try_from(raw: i64) -> crate::Result<Self> {
        u32::try_from(raw)
            .map(Self)
            .map_err(|_| crate::Error::InvalidAssetId(format!("{raw} is out of range")))
    }
}

impl From<AssetId> for i64 {
    fn from(id: AssetId) -> Self {
        i64::from(id.0)
    }
}

impl fmt::Debug for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AssetId({self})")
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.0)
    }
}

/// Permission action requested against an asset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    Read,
    Write,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of the intrinsic attributes of an asset, as seen by the gate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssetSnapshot {
    pub id: AssetId,
    pub asset_type: String,
    pub permissions: Permissions,
    pub user_name: String,
    pub group_name: String,
    pub created: OffsetDateTime,
    pub last_modified: OffsetDateTime,
    pub size: i64,
}

impl AssetSnapshot {
    /// Render one protected field, or `None` if `field` is not protected.
    pub fn protected_value(&self, field: &str, format: PermFormat) -> crate::Result<Option<Value>> {
        let value = match field {
            "type" => Value::String(self.asset_type.clone()),
            "permissions" => match format {
                PermFormat::Octal => Value::String(self.permissions.to_octal()),
                PermFormat::Json => serde_json::to_value(self.permissions.unpack())
                    .map_err(|e| crate::Error::Serialization(e.to_string()))?,
            },
            "user_name" => Value::String(self.user_name.clone()),
            "group_name" => Value::String(self.group_name.clone()),
            "created" => Value::String(format_timestamp(self.created)?),
            "last_modified" => Value::String(format_timestamp(self.last_modified)?),
            "size" => Value::from(self.size),
            _ => return Ok(None),
        };
        Ok(Some(value))
    }
}

fn format_timestamp(ts: OffsetDateTime) -> crate::Result<String> {
    ts.format(&Rfc3339)
        .map_err(|e| crate::Error::Serialization(format!("failed to format timestamp: {e}")))
}

/// Outcome of a permission check against an existing asset.
#[derive(Clone, Debug)]
pub struct PermissionCheck {
    /// Whether the principal may perform the requested action.
    pub permitted: bool,
    /// Protected-field values of the asset.
    pub asset: AssetSnapshot,
}
