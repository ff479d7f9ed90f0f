//! Asset repository.
//!
//! Assets are owned by the wider asset system; the service only reads them.
//! Creation and group membership exist for provisioning and fixtures.

use crate::error::MetadataResult;
use crate::models::AssetRow;
use async_trait::async_trait;
use trove_core::AssetId;

/// Repository for asset records and group membership.
#[async_trait]
pub trait AssetRepo: Send + Sync {
    /// Create an asset record.
    async fn create_asset(&self, asset: &AssetRow) -> MetadataResult<()>;

    /// Get an asset record by id.
    async fn get_asset(&self, id: AssetId) -> MetadataResult<Option<AssetRow>>;

    /// Add a user to a group. Adding an existing member is a no-op.
    async fn add_group_member(&self, group_name: &str, user_name: &str) -> MetadataResult<()>;

    /// Check whether a user belongs to a group.
    async fn is_group_member(&self, group_name: &str, user_name: &str) -> MetadataResult<bool>;
}
