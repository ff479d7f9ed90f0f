//! Test fixtures for assets and tokens.

use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicU64, Ordering};
use time::OffsetDateTime;
use trove_metadata::MetadataStore;
use trove_metadata::models::{AssetRow, TokenRow};
use uuid::Uuid;

/// Owner of every fixture asset.
pub const OWNER: &str = "alice";
/// Group of every fixture asset.
pub const GROUP: &str = "artists";
/// A member of `GROUP` (see `seed_group`).
pub const MEMBER: &str = "bob";
/// A user with no relation to the fixture assets.
pub const STRANGER: &str = "mallory";

static TOKEN_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Compute SHA-256 hash of data as hex string.
#[allow(dead_code)]
pub fn sha256_hash(data: &[u8]) -> String {
    Sha256::digest(data)
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// Asset row owned by `OWNER` in `GROUP`.
#[allow(dead_code)]
pub fn asset_row(id: u32, permissions: u16) -> AssetRow {
    let created = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
    AssetRow {
        id: i64::from(id),
        asset_type: "model".to_string(),
        permissions: i64::from(permissions),
        user_name: OWNER.to_string(),
        group_name: GROUP.to_string(),
        created,
        last_modified: created,
        size: 1024,
    }
}

/// Insert a fixture asset.
#[allow(dead_code)]
pub async fn create_asset(store: &dyn MetadataStore, id: u32, permissions: u16) {
    store
        .create_asset(&asset_row(id, permissions))
        .await
        .expect("Failed to create asset");
}

/// Add `MEMBER` to `GROUP`.
#[allow(dead_code)]
pub async fn seed_group(store: &dyn MetadataStore) {
    store
        .add_group_member(GROUP, MEMBER)
        .await
        .expect("Failed to add group member");
}

fn token_row(user_name: &str, raw_token: &str) -> TokenRow {
    TokenRow {
        token_id: Uuid::new_v4(),
        token_hash: sha256_hash(raw_token.as_bytes()),
        user_name: user_name.to_string(),
        created_at: OffsetDateTime::now_utc(),
        revoked_at: None,
        last_used_at: None,
        description: Some("Test Token".to_string()),
    }
}

/// Create a token for `user_name` and return the raw token value.
#[allow(dead_code)]
pub async fn create_token(store: &dyn MetadataStore, user_name: &str) -> String {
    let counter = TOKEN_COUNTER.fetch_add(1, Ordering::Relaxed);
    let raw_token = format!("test-token-{counter}-{}", Uuid::new_v4());
    store
        .create_token(&token_row(user_name, &raw_token))
        .await
        .expect("Failed to create token");
    raw_token
}

/// Create a token for `user_name`, revoke it, and return the raw value.
#[allow(dead_code)]
pub async fn create_revoked_token(store: &dyn MetadataStore, user_name: &str) -> String {
    let raw_token = format!("revoked-{}", Uuid::new_v4());
    let row = token_row(user_name, &raw_token);
    store
        .create_token(&row)
        .await
        .expect("Failed to create token");
    store
        .revoke_token(row.token_id, OffsetDateTime::now_utc())
        .await
        .expect("Failed to revoke token");
    raw_token
}
