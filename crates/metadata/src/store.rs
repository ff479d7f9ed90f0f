//! Metadata store trait and the SQLite implementation.

use crate::error::{MetadataError, MetadataResult};
use crate::repos::{AssetRepo, MetadataRepo, PermissionGate, TokenRepo};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// SQLite caps bound parameters per statement at 999 on older builds.
const BATCH_SIZE: usize = 900;

const IN_MEMORY: &str = ":memory:";

/// Combined metadata store trait.
#[async_trait]
pub trait MetadataStore:
    MetadataRepo + AssetRepo + TokenRepo + PermissionGate + Send + Sync
{
    /// Run database migrations.
    async fn migrate(&self) -> MetadataResult<()>;

    /// Check database connectivity and health.
    async fn health_check(&self) -> MetadataResult<()>;
}

/// SQLite-based metadata store.
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    /// Create a new SQLite store and apply the schema.
    ///
    /// A path of `:memory:` opens a private in-memory database that lives as
    /// long as the store.
    pub async fn new(
        path: impl AsRef<Path>,
        query_timeout_secs: Option<u64>,
    ) -> MetadataResult<Self> {
        let path = path.as_ref();
        let in_memory = path.as_os_str() == IN_MEMORY;

        if !in_memory && let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}?mode=rwc", path.display()))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .foreign_keys(true)
            // Prevent transient "database is locked" errors under concurrent access.
            .busy_timeout(Duration::from_secs(5));

        let mut pool_opts = SqlitePoolOptions::new()
            // SQLite permits limited write concurrency; a single connection avoids
            // persistent "database is locked" failures under axum concurrency.
            .max_connections(1);
        if in_memory {
            // The database disappears with its connection.
            pool_opts = pool_opts
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }
        let pool = pool_opts.connect_with(opts).await?;

        let store = Self { pool };
        store.migrate().await?;

        if let Some(query_timeout_secs) = query_timeout_secs {
            tracing::warn!(
                query_timeout_secs,
                "SQLite query timeout is advisory only; SQLite lacks statement cancellation \
                 and long queries may exceed it"
            );
        }

        Ok(store)
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}

#[async_trait]
impl MetadataStore for SqliteStore {
    async fn migrate(&self) -> MetadataResult<()> {
        sqlx::query(SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }

    async fn health_check(&self) -> MetadataResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

// Implement all the repository traits for SqliteStore
mod sqlite_impl {
    use super::*;
    use crate::models::*;
    use time::OffsetDateTime;
    use trove_core::permissions::PermissionClass;
    use trove_core::{Action, AssetId, MetadataEntry, PermissionCheck, ReconcilePlan};
    use uuid::Uuid;

    fn placeholders(n: usize) -> String {
        vec!["?"; n].join(", ")
    }

    #[async_trait]
    impl MetadataRepo for SqliteStore {
        async fn get_all_metadata(&self, asset_id: AssetId) -> MetadataResult<Vec<MetadataEntry>> {
            let rows = sqlx::query_as::<_, MetadataRow>(
                "SELECT asset_id, key, value, target_id FROM metadata WHERE asset_id = ? ORDER BY key",
            )
            .bind(i64::from(asset_id))
            .fetch_all(&self.pool)
            .await?;

            rows.into_iter().map(MetadataEntry::try_from).collect()
        }

        async fn get_metadata(
            &self,
            asset_id: AssetId,
            keys: &[String],
        ) -> MetadataResult<Vec<MetadataEntry>> {
            let mut entries = Vec::new();

            for batch in keys.chunks(BATCH_SIZE) {
                let query = format!(
                    "SELECT asset_id, key, value, target_id FROM metadata \
                     WHERE asset_id = ? AND key IN ({}) ORDER BY key",
                    placeholders(batch.len())
                );

                let mut query_builder =
                    sqlx::query_as::<_, MetadataRow>(&query).bind(i64::from(asset_id));
                for key in batch {
                    query_builder = query_builder.bind(key);
                }

                for row in query_builder.fetch_all(&self.pool).await? {
                    entries.push(MetadataEntry::try_from(row)?);
                }
            }

            Ok(entries)
        }

        async fn apply_metadata_plan(&self, plan: &ReconcilePlan) -> MetadataResult<()> {
            if plan.is_empty() {
                return Ok(());
            }

            let mut tx = self.pool.begin().await?;

            for upsert in &plan.upserts {
                sqlx::query(
                    r#"
                    INSERT INTO metadata (asset_id, key, value, target_id)
                    VALUES (?, ?, ?, ?)
                    ON CONFLICT(asset_id, key) DO UPDATE SET
                        value = excluded.value,
                        target_id = excluded.target_id
                    "#,
                )
                .bind(i64::from(upsert.asset_id))
                .bind(&upsert.key)
                .bind(upsert.value.text())
                .bind(upsert.value.reference().map(i64::from))
                .execute(&mut *tx)
                .await?;
            }

            for batch in plan.deletes.chunks(BATCH_SIZE) {
                let query = format!(
                    "DELETE FROM metadata WHERE asset_id = ? AND key IN ({})",
                    placeholders(batch.len())
                );
                let mut query_builder = sqlx::query(&query).bind(i64::from(plan.asset_id));
                for key in batch {
                    query_builder = query_builder.bind(key);
                }
                query_builder.execute(&mut *tx).await?;
            }

            tx.commit().await?;

            tracing::debug!(
                asset_id = %plan.asset_id,
                upserts = plan.upserts.len(),
                deletes = plan.deletes.len(),
                "applied metadata plan"
            );
            Ok(())
        }

        async fn clear_metadata(&self, asset_id: AssetId) -> MetadataResult<u64> {
            let result = sqlx::query("DELETE FROM metadata WHERE asset_id = ?")
                .bind(i64::from(asset_id))
                .execute(&self.pool)
                .await?;
            Ok(result.rows_affected())
        }

        async fn delete_metadata_key(&self, asset_id: AssetId, key: &str) -> MetadataResult<u64> {
            let result = sqlx::query("DELETE FROM metadata WHERE asset_id = ? AND key = ?")
                .bind(i64::from(asset_id))
                .bind(key)
                .execute(&self.pool)
                .await?;
            Ok(result.rows_affected())
        }
    }

    #[async_trait]
    impl AssetRepo for SqliteStore {
        async fn create_asset(&self, asset: &AssetRow) -> MetadataResult<()> {
            let result = sqlx::query(
                r#"
                INSERT INTO assets (
                    id, asset_type, permissions, user_name, group_name,
                    created, last_modified, size
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(id) DO NOTHING
                "#,
            )
            .bind(asset.id)
            .bind(&asset.asset_type)
            .bind(asset.permissions)
            .bind(&asset.user_name)
            .bind(&asset.group_name)
            .bind(asset.created)
            .bind(asset.last_modified)
            .bind(asset.size)
            .execute(&self.pool)
            .await?;

            if result.rows_affected() == 0 {
                return Err(MetadataError::AlreadyExists(format!("asset {:08x}", asset.id)));
            }
            Ok(())
        }

        async fn get_asset(&self, id: AssetId) -> MetadataResult<Option<AssetRow>> {
            let row = sqlx::query_as::<_, AssetRow>("SELECT * FROM assets WHERE id = ?")
                .bind(i64::from(id))
                .fetch_optional(&self.pool)
                .await?;
            Ok(row)
        }

        async fn add_group_member(&self, group_name: &str, user_name: &str) -> MetadataResult<()> {
            sqlx::query(
                "INSERT INTO group_members (group_name, user_name) VALUES (?, ?) \
                 ON CONFLICT(group_name, user_name) DO NOTHING",
            )
            .bind(group_name)
            .bind(user_name)
            .execute(&self.pool)
            .await?;
            Ok(())
        }

        async fn is_group_member(&self, group_name: &str, user_name: &str) -> MetadataResult<bool> {
            let exists: bool = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM group_members WHERE group_name = ? AND user_name = ?)",
            )
            .bind(group_name)
            .bind(user_name)
            .fetch_one(&self.pool)
            .await?;
            Ok(exists)
        }
    }

    #[async_trait]
    impl PermissionGate for SqliteStore {
        async fn has_perm(
            &self,
            id: AssetId,
            principal: Option<&str>,
            action: Action,
        ) -> MetadataResult<Option<PermissionCheck>> {
            let Some(row) = self.get_asset(id).await? else {
                return Ok(None);
            };
            let asset = row.into_snapshot()?;

            let class = match principal {
                Some(user) if user == asset.user_name => PermissionClass::User,
                Some(user) => {
                    if self.is_group_member(&asset.group_name, user).await? {
                        PermissionClass::Group
                    } else {
                        PermissionClass::Other
                    }
                }
                None => PermissionClass::Other,
            };
            let permitted = asset.permissions.allows(class, action);

            tracing::debug!(
                asset_id = %id,
                principal = principal.unwrap_or("-"),
                %action,
                ?class,
                permitted,
                "permission check"
            );

            Ok(Some(PermissionCheck { permitted, asset }))
        }
    }

    #[async_trait]
    impl TokenRepo for SqliteStore {
        async fn create_token(&self, token: &TokenRow) -> MetadataResult<()> {
            sqlx::query(
                r#"
                INSERT INTO tokens (
                    token_id, token_hash, user_name, created_at,
                    revoked_at, last_used_at, description
                ) VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(token.token_id)
            .bind(&token.token_hash)
            .bind(&token.user_name)
            .bind(token.created_at)
            .bind(token.revoked_at)
            .bind(token.last_used_at)
            .bind(&token.description)
            .execute(&self.pool)
            .await?;
            Ok(())
        }

        async fn get_token_by_hash(&self, token_hash: &str) -> MetadataResult<Option<TokenRow>> {
            let row = sqlx::query_as::<_, TokenRow>("SELECT * FROM tokens WHERE token_hash = ?")
                .bind(token_hash)
                .fetch_optional(&self.pool)
                .await?;
            Ok(row)
        }

        async fn touch_token(&self, token_id: Uuid, used_at: OffsetDateTime) -> MetadataResult<()> {
            sqlx::query("UPDATE tokens SET last_used_at = ? WHERE token_id = ?")
                .bind(used_at)
                .bind(token_id)
                .execute(&self.pool)
                .await?;
            Ok(())
        }

        async fn revoke_token(
            &self,
            token_id: Uuid,
            revoked_at: OffsetDateTime,
        ) -> MetadataResult<()> {
            let result = sqlx::query("UPDATE tokens SET revoked_at = ? WHERE token_id = ?")
                .bind(revoked_at)
                .bind(token_id)
                .execute(&self.pool)
                .await?;
            if result.rows_affected() == 0 {
                return Err(MetadataError::NotFound(format!("token {token_id}")));
            }
            Ok(())
        }
    }
}

const SCHEMA_SQL: &str = r#"
-- Assets (owned by the asset system; read-only to the metadata service)
CREATE TABLE IF NOT EXISTS assets (
    id INTEGER PRIMARY KEY CHECK (id >= 0 AND id <= 4294967295),
    asset_type TEXT NOT NULL,
    permissions INTEGER NOT NULL CHECK (permissions >= 0 AND permissions <= 511),
    user_name TEXT NOT NULL,
    group_name TEXT NOT NULL,
    created TEXT NOT NULL,
    last_modified TEXT NOT NULL,
    size INTEGER NOT NULL DEFAULT 0
);

-- Group membership consulted by the permission gate
CREATE TABLE IF NOT EXISTS group_members (
    group_name TEXT NOT NULL,
    user_name TEXT NOT NULL,
    PRIMARY KEY (group_name, user_name)
);

-- Per-asset metadata entries: exactly one of value / target_id
CREATE TABLE IF NOT EXISTS metadata (
    asset_id INTEGER NOT NULL REFERENCES assets(id) ON DELETE CASCADE,
    key TEXT NOT NULL,
    value TEXT,
    target_id INTEGER,
    PRIMARY KEY (asset_id, key),
    CHECK ((value IS NULL) <> (target_id IS NULL))
);

-- Bearer tokens
CREATE TABLE IF NOT EXISTS tokens (
    token_id BLOB PRIMARY KEY,
    token_hash TEXT NOT NULL UNIQUE,
    user_name TEXT NOT NULL,
    created_at TEXT NOT NULL,
    revoked_at TEXT,
    last_used_at TEXT,
    description TEXT
);
CREATE INDEX IF NOT EXISTS idx_tokens_hash ON tokens(token_hash);
"#;
