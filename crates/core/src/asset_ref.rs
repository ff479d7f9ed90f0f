//! The `asset:XXXXXXXX` string form of a cross-asset reference.

use crate::asset::AssetId;

/// Prefix marking a metadata value as a reference to another asset.
pub const PREFIX: &str = "asset:";

/// Encode a reference as `asset:` followed by 8 lowercase hex digits.
pub fn encode(target: AssetId) -> String {
    format!("{PREFIX}{target}")
}

/// Decode a reference, or `None` if `value` is not exactly `asset:` + 8 hex digits.
pub fn decode(value: &str) -> Option<AssetId> {
    let hex = value.strip_prefix(PREFIX)?;
    AssetId::parse(hex).ok()
}
