//! In-memory metadata store and permission gate with failure injection.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use time::OffsetDateTime;
use trove_core::permissions::PermissionClass;
use trove_core::{Action, AssetId, EntryValue, MetadataEntry, PermissionCheck, ReconcilePlan};
use trove_metadata::models::{AssetRow, TokenRow};
use trove_metadata::{
    AssetRepo, MetadataError, MetadataRepo, MetadataResult, MetadataStore, PermissionGate,
    TokenRepo,
};
use uuid::Uuid;

#[derive(Default)]
struct Inner {
    assets: HashMap<i64, AssetRow>,
    members: HashSet<(String, String)>,
    entries: BTreeMap<(AssetId, String), EntryValue>,
    tokens: HashMap<String, TokenRow>,
}

/// Fake store. Flip the `fail_*` switches to simulate collaborator outages.
#[allow(dead_code)]
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    /// `has_perm` returns an error.
    pub fail_gate: AtomicBool,
    /// Every metadata mutation returns an error.
    pub fail_writes: AtomicBool,
    /// Every metadata read returns an error.
    pub fail_reads: AtomicBool,
}

#[allow(dead_code)]
impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_gate(&self, fail: bool) {
        self.fail_gate.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Number of stored entries across all assets.
    pub fn entry_count(&self) -> usize {
        self.inner.lock().unwrap().entries.len()
    }

    fn check(flag: &AtomicBool, what: &str) -> MetadataResult<()> {
        if flag.load(Ordering::SeqCst) {
            Err(MetadataError::Internal(format!("injected {what} failure")))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl MetadataRepo for MemoryStore {
    async fn get_all_metadata(&self, asset_id: AssetId) -> MetadataResult<Vec<MetadataEntry>> {
        Self::check(&self.fail_reads, "read")?;
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .entries
            .iter()
            .filter(|((id, _), _)| *id == asset_id)
            .map(|((_, key), value)| MetadataEntry {
                key: key.clone(),
                value: value.clone(),
            })
            .collect())
    }

    async fn get_metadata(
        &self,
        asset_id: AssetId,
        keys: &[String],
    ) -> MetadataResult<Vec<MetadataEntry>> {
        let all = self.get_all_metadata(asset_id).await?;
        Ok(all.into_iter().filter(|e| keys.contains(&e.key)).collect())
    }

    async fn apply_metadata_plan(&self, plan: &ReconcilePlan) -> MetadataResult<()> {
        Self::check(&self.fail_writes, "write")?;
        let mut inner = self.inner.lock().unwrap();
        for upsert in &plan.upserts {
            inner
                .entries
                .insert((upsert.asset_id, upsert.key.clone()), upsert.value.clone());
        }
        for key in &plan.deletes {
            inner.entries.remove(&(plan.asset_id, key.clone()));
        }
        Ok(())
    }

    async fn clear_metadata(&self, asset_id: AssetId) -> MetadataResult<u64> {
        Self::check(&self.fail_writes, "write")?;
        let mut inner = self.inner.lock().unwrap();
        let before = inner.entries.len();
        inner.entries.retain(|(id, _), _| *id != asset_id);
        Ok((before - inner.entries.len()) as u64)
    }

    async fn delete_metadata_key(&self, asset_id: AssetId, key: &str) -> MetadataResult<u64> {
        Self::check(&self.fail_writes, "write")?;
        let mut inner = self.inner.lock().unwrap();
        Ok(inner
            .entries
            .remove(&(asset_id, key.to_string()))
            .map_or(0, |_| 1))
    }
}

#[async_trait]
impl AssetRepo for MemoryStore {
    async fn create_asset(&self, asset: &AssetRow) -> MetadataResult<()> {
        let mut inner = self.inner.lock().unwrap();
        if inner.assets.contains_key(&asset.id) {
            return Err(MetadataError::AlreadyExists(format!("asset {}", asset.id)));
        }
        inner.assets.insert(asset.id, asset.clone());
        Ok(())
    }

    async fn get_asset(&self, id: AssetId) -> MetadataResult<Option<AssetRow>> {
        Ok(self.inner.lock().unwrap().assets.get(&i64::from(id)).cloned())
    }

    async fn add_group_member(&self, group_name: &str, user_name: &str) -> MetadataResult<()> {
        self.inner
            .lock()
            .unwrap()
            .members
            .insert((group_name.to_string(), user_name.to_string()));
        Ok(())
    }

    async fn is_group_member(&self, group_name: &str, user_name: &str) -> MetadataResult<bool> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .members
            .contains(&(group_name.to_string(), user_name.to_string())))
    }
}

#[async_trait]
impl PermissionGate for MemoryStore {
    async fn has_perm(
        &self,
        id: AssetId,
        principal: Option<&str>,
        action: Action,
    ) -> MetadataResult<Option<PermissionCheck>> {
        Self::check(&self.fail_gate, "gate")?;
        let Some(row) = self.get_asset(id).await? else {
            return Ok(None);
        };
        let asset = row.into_snapshot()?;

        let class = match principal {
            Some(user) if user == asset.user_name => PermissionClass::User,
            Some(user) if self.is_group_member(&asset.group_name, user).await? => {
                PermissionClass::Group
            }
            _ => PermissionClass::Other,
        };
        let permitted = asset.permissions.allows(class, action);
        Ok(Some(PermissionCheck { permitted, asset }))
    }
}

#[async_trait]
impl TokenRepo for MemoryStore {
    async fn create_token(&self, token: &TokenRow) -> MetadataResult<()> {
        self.inner
            .lock()
            .unwrap()
            .tokens
            .insert(token.token_hash.clone(), token.clone());
        Ok(())
    }

    async fn get_token_by_hash(&self, token_hash: &str) -> MetadataResult<Option<TokenRow>> {
        Ok(self.inner.lock().unwrap().tokens.get(token_hash).cloned())
    }

    async fn touch_token(&self, token_id: Uuid, used_at: OffsetDateTime) -> MetadataResult<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(token) = inner.tokens.values_mut().find(|t| t.token_id == token_id) {
            token.last_used_at = Some(used_at);
        }
        Ok(())
    }

    async fn revoke_token(&self, token_id: Uuid, revoked_at: OffsetDateTime) -> MetadataResult<()> {
        let mut inner = self.inner.lock().unwrap();
        match inner.tokens.values_mut().find(|t| t.token_id == token_id) {
            Some(token) => {
                token.revoked_at = Some(revoked_at);
                Ok(())
            }
            None => Err(MetadataError::NotFound(format!("token {token_id}"))),
        }
    }
}

#[async_trait]
impl MetadataStore for MemoryStore {
    async fn migrate(&self) -> MetadataResult<()> {
        Ok(())
    }

    async fn health_check(&self) -> MetadataResult<()> {
        Self::check(&self.fail_reads, "health")
    }
}
