//! Metadata entry repository.

use crate::error::MetadataResult;
use async_trait::async_trait;
use trove_core::{AssetId, MetadataEntry, ReconcilePlan};

/// Repository for per-asset metadata entries.
#[async_trait]
pub trait MetadataRepo: Send + Sync {
    /// Get every entry stored for an asset.
    async fn get_all_metadata(&self, asset_id: AssetId) -> MetadataResult<Vec<MetadataEntry>>;

    /// Get the entries for the given keys. Missing keys are simply absent.
    async fn get_metadata(
        &self,
        asset_id: AssetId,
        keys: &[String],
    ) -> MetadataResult<Vec<MetadataEntry>>;

    /// Apply a reconcile plan atomically: upserts first, then deletes.
    async fn apply_metadata_plan(&self, plan: &ReconcilePlan) -> MetadataResult<()>;

    /// Remove every entry for an asset. Returns the number of rows removed.
    async fn clear_metadata(&self, asset_id: AssetId) -> MetadataResult<u64>;

    /// Remove one entry. Returns the number of rows removed (0 or 1).
    async fn delete_metadata_key(&self, asset_id: AssetId, key: &str) -> MetadataResult<u64>;
}
