//! Database models mapping to the metadata schema.

use crate::error::{MetadataError, MetadataResult};
use sqlx::FromRow;
use time::OffsetDateTime;
use trove_core::{AssetId, AssetSnapshot, EntryValue, MetadataEntry, Permissions};
use uuid::Uuid;

// =============================================================================
// Assets
// =============================================================================

/// Asset record. Source of truth for the protected fields.
#[derive(Debug, Clone, FromRow)]
pub struct AssetRow {
    pub id: i64,
    pub asset_type: String,
    pub permissions: i64,
    pub user_name: String,
    pub group_name: String,
    pub created: OffsetDateTime,
    pub last_modified: OffsetDateTime,
    pub size: i64,
}

impl AssetRow {
    /// Convert to the domain snapshot, validating id and mask ranges.
    pub fn into_snapshot(self) -> MetadataResult<AssetSnapshot> {
        let bits = u16::try_from(self.permissions).map_err(|_| {
            MetadataError::Corrupt(trove_core::Error::InvalidPermissions(format!(
                "asset {} has mask {}",
                self.id, self.permissions
            )))
        })?;
        Ok(AssetSnapshot {
            id: AssetId::try_from(self.id)?,
            asset_type: self.asset_type,
            permissions: Permissions::new(bits)?,
            user_name: self.user_name,
            group_name: self.group_name,
            created: self.created,
            last_modified: self.last_modified,
            size: self.size,
        })
    }
}

// =============================================================================
// Metadata entries
// =============================================================================

/// Metadata row. Exactly one of `value` and `target_id` is set.
#[derive(Debug, Clone, FromRow)]
pub struct MetadataRow {
    pub asset_id: i64,
    pub key: String,
    pub value: Option<String>,
    pub target_id: Option<i64>,
}

impl TryFrom<MetadataRow> for MetadataEntry {
    type Error = MetadataError;

    fn try_from(row: MetadataRow) -> MetadataResult<Self> {
        let value = match (row.value, row.target_id) {
            (Some(text), None) => EntryValue::Text(text),
            (None, Some(target)) => EntryValue::Reference(AssetId::try_from(target)?),
            _ => {
                return Err(MetadataError::Internal(format!(
                    "metadata row ({}, {:?}) must hold exactly one of value and target",
                    row.asset_id, row.key
                )));
            }
        };
        Ok(MetadataEntry {
            key: row.key,
            value,
        })
    }
}

// =============================================================================
// Tokens
// =============================================================================

/// Bearer token record. The token itself is never stored, only its hash.
#[derive(Debug, Clone, FromRow)]
pub struct TokenRow {
    pub token_id: Uuid,
    pub token_hash: String,
    pub user_name: String,
    pub created_at: OffsetDateTime,
    pub revoked_at: Option<OffsetDateTime>,
    pub last_used_at: Option<OffsetDateTime>,
    pub description: Option<String>,
}

impl TokenRow {
    /// Whether the token may still be used.
    pub fn is_active(&self) -> bool {
        self.revoked_at.is_none()
    }
}
