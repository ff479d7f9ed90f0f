//! Per-asset metadata endpoints.
//!
//! Every handler validates the asset id, consults the permission gate and
//! only then touches the store. Reads merge stored entries with the asset's
//! protected fields; writes go through the reconciler so protected fields can
//! never be stored as entries.

use crate::auth::principal;
use crate::error::{ApiError, ApiResult};
use crate::handlers::common::{authorize, parse_asset_id, render_failure, store_failure};
use crate::metrics::{self, observe};
use crate::state::AppState;
use axum::Json;
use axum::extract::{Path, Query, Request, State};
use axum::http::header::{CONTENT_TYPE, LOCATION};
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::Value;
use trove_core::{
    Action, AssetId, MetadataValue, PermFormat, ReadOptions, ReadOutcome, ReconcilePlan,
    is_protected, read_all, read_some, reconcile, reconcile_json,
};

/// Separator between keys in the `{fields}` segment.
const FIELD_SEPARATOR: char = '+';

/// Query parameters accepted by the read endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct MetaQuery {
    /// `json` renders permissions as a structure instead of an octal string.
    #[serde(rename = "permFormat")]
    pub perm_format: Option<String>,
    /// Present (and not `0`/`false`) to return references literally.
    pub raw: Option<String>,
}

impl MetaQuery {
    fn perm_format(&self) -> PermFormat {
        PermFormat::from_query(self.perm_format.as_deref())
    }

    fn raw(&self) -> bool {
        matches!(self.raw.as_deref(), Some(v) if v != "0" && !v.eq_ignore_ascii_case("false"))
    }
}

/// GET /v1/assets/{id}/meta - All protected fields plus every stored entry.
pub async fn get_all_metadata(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    Query(query): Query<MetaQuery>,
    req: Request,
) -> ApiResult<Response> {
    observe("read_all", async move {
        let id = parse_asset_id(&raw_id)?;
        let principal = principal(&req);
        let snapshot = authorize(&state, id, principal.as_deref(), Action::Read).await?;

        let entries = state
            .metadata
            .get_all_metadata(id)
            .await
            .map_err(|e| store_failure(id, "get_all_metadata", e))?;

        let out = read_all(&snapshot, entries, query.perm_format())
            .map_err(|e| render_failure(id, e))?;
        Ok(Json(Value::Object(out)).into_response())
    })
    .await
}

/// GET /v1/assets/{id}/meta/{fields} - Selected keys, joined by `+`.
///
/// A single key holding an asset reference redirects to the same key on the
/// referenced asset unless `raw` is given.
pub async fn get_some_metadata(
    State(state): State<AppState>,
    Path((raw_id, fields)): Path<(String, String)>,
    Query(query): Query<MetaQuery>,
    req: Request,
) -> ApiResult<Response> {
    observe("read_some", async move {
        let id = parse_asset_id(&raw_id)?;
        let keys = split_fields(&fields);

        let principal = principal(&req);
        let snapshot = authorize(&state, id, principal.as_deref(), Action::Read).await?;

        let entries = state
            .metadata
            .get_metadata(id, &keys)
            .await
            .map_err(|e| store_failure(id, "get_metadata", e))?;

        let options = ReadOptions {
            perm_format: query.perm_format(),
            raw: query.raw(),
        };

        let outcome =
            read_some(&snapshot, &keys, entries, options).map_err(|e| render_failure(id, e))?;
        let response = match outcome {
            ReadOutcome::Redirect(target) => {
                metrics::METADATA_REDIRECTS.inc();
                let location = redirect_location(req.uri(), target);
                tracing::debug!(asset_id = %id, target = %target, %location, "redirecting");
                (StatusCode::FOUND, [(LOCATION, location)]).into_response()
            }
            ReadOutcome::NotFound => {
                return Err(ApiError::NotFound(
                    "No metadata for this asset by that name".to_string(),
                ));
            }
            ReadOutcome::Value(Value::String(text)) => (
                StatusCode::OK,
                [(CONTENT_TYPE, "text/plain; charset=utf-8")],
                text,
            )
                .into_response(),
            ReadOutcome::Value(value) => Json(value).into_response(),
            ReadOutcome::Object(out) => Json(Value::Object(out)).into_response(),
        };
        Ok(response)
    })
    .await
}

/// PUT /v1/assets/{id}/meta - Overlay a JSON object onto the stored entries.
///
/// Keys absent from the body are untouched; `null` clears a key.
pub async fn put_all_metadata(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    req: Request,
) -> ApiResult<Response> {
    observe("write_all", async move {
        let id = parse_asset_id(&raw_id)?;
        let principal = principal(&req);

        let bytes = axum::body::to_bytes(req.into_body(), state.config.server.max_body_size)
            .await
            .map_err(|e| ApiError::BadRequest(format!("failed to read body: {e}")))?;
        let proposed = match serde_json::from_slice::<Value>(&bytes) {
            Ok(Value::Object(map)) => map,
            Ok(_) => {
                return Err(ApiError::BadRequest(
                    "Request body must be a JSON object".to_string(),
                ));
            }
            Err(_) => {
                return Err(ApiError::BadRequest(
                    "Request body is malformed JSON".to_string(),
                ));
            }
        };

        authorize(&state, id, principal.as_deref(), Action::Write).await?;

        apply_plan(&state, reconcile_json(id, proposed)).await?;
        Ok(StatusCode::OK.into_response())
    })
    .await
}

/// PUT /v1/assets/{id}/meta/{field} - Set one key from the raw request body.
pub async fn put_some_metadata(
    State(state): State<AppState>,
    Path((raw_id, field)): Path<(String, String)>,
    req: Request,
) -> ApiResult<Response> {
    observe("write_some", async move {
        let id = parse_asset_id(&raw_id)?;
        if is_protected(&field) {
            return Err(ApiError::Forbidden(
                "Cannot directly modify protected field".to_string(),
            ));
        }
        let principal = principal(&req);

        let bytes = axum::body::to_bytes(req.into_body(), state.config.server.max_body_size)
            .await
            .map_err(|e| ApiError::BadRequest(format!("failed to read body: {e}")))?;
        if bytes.is_empty() {
            return Err(ApiError::BadRequest(
                "New metadata value not specified".to_string(),
            ));
        }
        let text = String::from_utf8(bytes.to_vec())
            .map_err(|_| ApiError::BadRequest("metadata value must be UTF-8 text".to_string()))?;

        authorize(&state, id, principal.as_deref(), Action::Write).await?;

        let plan = reconcile(id, [(field, MetadataValue::from_text(text))]);
        apply_plan(&state, plan).await?;
        Ok(StatusCode::OK.into_response())
    })
    .await
}

/// DELETE /v1/assets/{id}/meta - Remove every stored entry. Idempotent.
pub async fn delete_all_metadata(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    req: Request,
) -> ApiResult<Response> {
    observe("delete_all", async move {
        let id = parse_asset_id(&raw_id)?;
        let principal = principal(&req);
        authorize(&state, id, principal.as_deref(), Action::Write).await?;

        let removed = state
            .metadata
            .clear_metadata(id)
            .await
            .map_err(|e| store_failure(id, "clear_metadata", e))?;
        metrics::METADATA_ROWS_DELETED.inc_by(removed);

        tracing::info!(asset_id = %id, removed, "cleared metadata");
        Ok(StatusCode::NO_CONTENT.into_response())
    })
    .await
}

/// DELETE /v1/assets/{id}/meta/{field} - Remove one key.
pub async fn delete_some_metadata(
    State(state): State<AppState>,
    Path((raw_id, field)): Path<(String, String)>,
    req: Request,
) -> ApiResult<Response> {
    observe("delete_some", async move {
        let id = parse_asset_id(&raw_id)?;
        if is_protected(&field) {
            return Err(ApiError::Forbidden("Cannot clear protected field".to_string()));
        }
        let principal = principal(&req);
        authorize(&state, id, principal.as_deref(), Action::Write).await?;

        let removed = state
            .metadata
            .delete_metadata_key(id, &field)
            .await
            .map_err(|e| store_failure(id, "delete_metadata_key", e))?;
        if removed == 0 {
            return Err(ApiError::NotFound(
                "No metadata for this asset with that name".to_string(),
            ));
        }
        metrics::METADATA_ROWS_DELETED.inc_by(removed);

        Ok(StatusCode::NO_CONTENT.into_response())
    })
    .await
}

async fn apply_plan(state: &AppState, plan: ReconcilePlan) -> ApiResult<()> {
    if plan.is_empty() {
        return Ok(());
    }

    let id = plan.asset_id;
    state
        .metadata
        .apply_metadata_plan(&plan)
        .await
        .map_err(|e| store_failure(id, "apply_metadata_plan", e))?;
    metrics::METADATA_ROWS_WRITTEN.inc_by(plan.upserts.len() as u64);

    tracing::info!(
        asset_id = %id,
        upserts = plan.upserts.len(),
        deletes = plan.deletes.len(),
        "metadata updated"
    );
    Ok(())
}

/// Requested keys, empty segments included: `a+` asks for two keys.
fn split_fields(fields: &str) -> Vec<String> {
    fields.split(FIELD_SEPARATOR).map(str::to_string).collect()
}

/// Location for a dereferenced read: the request path with the asset id
/// segment (the one before `/meta/`) replaced by `target`.
pub fn redirect_location(uri: &Uri, target: AssetId) -> String {
    let path = uri.path();
    let location = match path.rfind("/meta/") {
        Some(meta_at) => {
            let head = &path[..meta_at];
            let prefix = head.rfind('/').map_or("/", |slash| &head[..=slash]);
            format!("{prefix}{}{}", target.to_hex(), &path[meta_at..])
        }
        None => path.to_string(),
    };

    match uri.query() {
        Some(query) => format!("{location}?{query}"),
        None => location,
    }
}
