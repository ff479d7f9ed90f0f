//! Shared handler helpers.

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use trove_core::{Action, AssetId, AssetSnapshot};
use trove_metadata::MetadataError;

/// Parse the `{id}` path segment (exactly 8 hex digits).
///
/// A malformed id cannot name an asset, so it answers like a missing one.
pub fn parse_asset_id(raw: &str) -> ApiResult<AssetId> {
    AssetId::parse(raw).map_err(|e| {
        tracing::debug!(raw_id = %raw, error = %e, "unparseable asset id");
        ApiError::NotFound("No asset with this ID".to_string())
    })
}

/// Consult the permission gate for `action` on asset `id`.
///
/// Denials answer 401 for anonymous callers and 403 for authenticated ones;
/// a missing asset answers 404. On success the asset's protected fields are
/// returned for the reader.
pub async fn authorize(
    state: &AppState,
    id: AssetId,
    principal: Option<&str>,
    action: Action,
) -> ApiResult<AssetSnapshot> {
    let check = state
        .gate
        .has_perm(id, principal, action)
        .await
        .map_err(|e| {
            tracing::error!(asset_id = %id, %action, error = %e, "permission check failed");
            ApiError::Internal("permission check failed".to_string())
        })?;

    let Some(check) = check else {
        return Err(ApiError::NotFound("No asset with this ID".to_string()));
    };

    if check.permitted {
        return Ok(check.asset);
    }

    let message = match (action, principal.is_some()) {
        (Action::Read, true) => "Asset does not allow unprivileged access",
        (Action::Read, false) => "Asset does not allow anonymous access",
        (Action::Write, true) => "Asset does not allow unprivileged writes",
        (Action::Write, false) => "Asset does not allow anonymous writes",
    };
    tracing::debug!(asset_id = %id, %action, principal = principal.unwrap_or("-"), "denied");

    if principal.is_some() {
        Err(ApiError::Forbidden(message.to_string()))
    } else {
        Err(ApiError::Unauthorized(message.to_string()))
    }
}

/// Log a store failure and convert it into an API error.
pub fn store_failure(id: AssetId, operation: &'static str, error: MetadataError) -> ApiError {
    tracing::error!(asset_id = %id, operation, error = %error, "metadata store failure");
    ApiError::Metadata(error)
}

/// Log a failure to render an asset's fields and convert it into a 500.
pub fn render_failure(id: AssetId, error: trove_core::Error) -> ApiError {
    tracing::error!(asset_id = %id, error = %error, "failed to render metadata");
    ApiError::Internal("failed to render metadata".to_string())
}
