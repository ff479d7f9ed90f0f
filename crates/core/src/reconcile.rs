//! Reconciliation of a proposed key/value mapping into store operations.

use crate::asset::{AssetId, is_protected};
use crate::value::{EntryValue, MetadataValue};
use serde_json::{Map, Value};

/// One insert-or-replace row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MetadataUpsert {
    pub asset_id: AssetId,
    pub key: String,
    pub value: EntryValue,
}

/// Store operations produced for a single mutation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReconcilePlan {
    pub asset_id: AssetId,
    pub upserts: Vec<MetadataUpsert>,
    pub deletes: Vec<String>,
}

impl ReconcilePlan {
    /// A plan with nothing to do is a successful no-op.
    pub fn is_empty(&self) -> bool {
        self.upserts.is_empty() && self.deletes.is_empty()
    }
}

/// Build the plan for `proposed` against `asset_id`.
///
/// Protected keys are dropped silently. `Null` values become deletes, every
/// other value becomes an upsert. Keys not mentioned are left untouched.
pub fn reconcile<I, K>(asset_id: AssetId, proposed: I) -> ReconcilePlan
where
    I: IntoIterator<Item = (K, MetadataValue)>,
    K: Into<String>,
{
    let mut plan = ReconcilePlan {
        asset_id,
        upserts: Vec::new(),
        deletes: Vec::new(),
    };

    for (key, value) in proposed {
        let key = key.into();
        if is_protected(&key) {
            continue;
        }

        let value = match value {
            MetadataValue::Null => {
                plan.deletes.push(key);
                continue;
            }
            MetadataValue::Reference(target) => EntryValue::Reference(target),
            MetadataValue::Text(text) => EntryValue::Text(text),
        };
        plan.upserts.push(MetadataUpsert {
            asset_id,
            key,
            value,
        });
    }

    plan
}

/// Build the plan for a whole-object JSON write.
pub fn reconcile_json(asset_id: AssetId, proposed: Map<String, Value>) -> ReconcilePlan {
    reconcile(
        asset_id,
        proposed
            .into_iter()
            .map(|(key, value)| (key, MetadataValue::from_json(value))),
    )
}
