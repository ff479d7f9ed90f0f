//! Core domain types and shared logic for the Trove asset metadata service.
//!
//! This crate defines the data model used by the store and the HTTP layer:
//! - Asset identifiers and the protected-field snapshot
//! - Permission bitmasks and their structured rendering
//! - The `asset:XXXXXXXX` reference codec
//! - Metadata values and the write reconciler
//! - The metadata reader (merging, shaping and the redirect rule)

pub mod asset;
pub mod asset_ref;
pub mod config;
pub mod error;
pub mod permissions;
pub mod read;
pub mod reconcile;
pub mod value;

pub use asset::{Action, AssetId, AssetSnapshot, PROTECTED_FIELDS, PermissionCheck, is_protected};
pub use error::{Error, Result};
pub use permissions::{PermFormat, Permissions};
pub use read::{ReadOptions, ReadOutcome, read_all, read_some};
pub use reconcile::{MetadataUpsert, ReconcilePlan, reconcile, reconcile_json};
pub use value::{EntryValue, MetadataEntry, MetadataValue};
