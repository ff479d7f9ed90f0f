//! Metadata store abstraction and implementations for Trove.
//!
//! This crate provides the persistence side of the service:
//! - Per-asset metadata entries (text values and asset references)
//! - Asset records and group membership
//! - The permission gate over asset permission masks
//! - Bearer tokens mapping to principals

pub mod error;
pub mod models;
pub mod repos;
pub mod store;

pub use error::{MetadataError, MetadataResult};
pub use repos::{AssetRepo, MetadataRepo, PermissionGate, TokenRepo};
pub use store::{MetadataStore, SqliteStore};

use std::sync::Arc;
use trove_core::config::MetadataConfig;

/// Create a metadata store from configuration.
pub async fn from_config(config: &MetadataConfig) -> MetadataResult<Arc<SqliteStore>> {
    config.validate().map_err(MetadataError::Config)?;
    let store = SqliteStore::new(&config.path, config.query_timeout_secs).await?;
    Ok(Arc::new(store))
}
