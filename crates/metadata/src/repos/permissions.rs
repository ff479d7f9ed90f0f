//! Permission gate.

use crate::error::MetadataResult;
use async_trait::async_trait;
use trove_core::{Action, AssetId, PermissionCheck};

/// Decides whether a principal may act on an asset.
#[async_trait]
pub trait PermissionGate: Send + Sync {
    /// Check `action` on asset `id` for `principal` (`None` for anonymous).
    ///
    /// Returns `Ok(None)` when the asset does not exist. Otherwise the result
    /// carries the decision together with the asset's protected fields.
    async fn has_perm(
        &self,
        id: AssetId,
        principal: Option<&str>,
        action: Action,
    ) -> MetadataResult<Option<PermissionCheck>>;
}
