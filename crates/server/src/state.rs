//! Application state shared across handlers.

use std::sync::Arc;
use trove_core::config::AppConfig;
use trove_metadata::{MetadataStore, PermissionGate};

/// Application state.
///
/// The permission gate is injected separately from the metadata store so a
/// deployment can consult an external authority while keeping entries local.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub metadata: Arc<dyn MetadataStore>,
    pub gate: Arc<dyn PermissionGate>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        metadata: Arc<dyn MetadataStore>,
        gate: Arc<dyn PermissionGate>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            metadata,
            gate,
        }
    }

    /// Build state where one store serves as both metadata store and gate.
    pub fn with_store<S>(config: AppConfig, store: Arc<S>) -> Self
    where
        S: MetadataStore + 'static,
    {
        let gate: Arc<dyn PermissionGate> = store.clone();
        Self::new(config, store, gate)
    }
}
