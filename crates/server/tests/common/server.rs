//! Server test utilities.

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Request, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;
use trove_core::config::{AppConfig, MetadataConfig};
use trove_metadata::{MetadataStore, PermissionGate, SqliteStore};
use trove_server::{AppState, create_router};

/// A test server wrapper with all dependencies.
/// Note: #[allow(dead_code)] because each test file compiles common/ separately.
#[allow(dead_code)]
pub struct TestServer {
    pub router: axum::Router,
    pub state: AppState,
    _temp_dir: TempDir,
}

/// A buffered response.
#[allow(dead_code)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

#[allow(dead_code)]
impl TestResponse {
    /// Body parsed as JSON (`Null` when empty or not JSON).
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap_or(Value::Null)
    }

    /// Body as UTF-8 text.
    pub fn text(&self) -> String {
        String::from_utf8(self.body.to_vec()).expect("response body is not UTF-8")
    }

    /// A header value as a string.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

#[allow(dead_code)]
impl TestServer {
    /// Create a new test server backed by an on-disk SQLite store.
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Create a test server with custom config modifications.
    pub async fn with_config<F>(modifier: F) -> Self
    where
        F: FnOnce(&mut AppConfig),
    {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("metadata.db");

        let store = Arc::new(
            SqliteStore::new(&db_path, None)
                .await
                .expect("Failed to create metadata store"),
        );

        let mut config = AppConfig::for_testing();
        config.metadata = MetadataConfig {
            path: db_path,
            query_timeout_secs: None,
        };
        modifier(&mut config);

        let state = AppState::with_store(config, store);
        let router = create_router(state.clone());

        Self {
            router,
            state,
            _temp_dir: temp_dir,
        }
    }

    /// Create a test server from explicit collaborators (e.g. the in-memory fake).
    pub fn with_parts(metadata: Arc<dyn MetadataStore>, gate: Arc<dyn PermissionGate>) -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let state = AppState::new(AppConfig::for_testing(), metadata, gate);
        let router = create_router(state.clone());

        Self {
            router,
            state,
            _temp_dir: temp_dir,
        }
    }

    /// Get access to the underlying metadata store.
    pub fn metadata(&self) -> Arc<dyn MetadataStore> {
        self.state.metadata.clone()
    }

    /// Send a request through the router.
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        body: impl Into<Body>,
        token: Option<&str>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }

        let request = builder.body(body.into()).unwrap();
        let response = self.router.clone().oneshot(request).await.unwrap();

        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// GET without a body.
    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request("GET", uri, Body::empty(), token).await
    }

    /// PUT a JSON document.
    pub async fn put_json(&self, uri: &str, value: &Value, token: Option<&str>) -> TestResponse {
        self.request("PUT", uri, serde_json::to_vec(value).unwrap(), token)
            .await
    }

    /// PUT a raw text body.
    pub async fn put_text(&self, uri: &str, text: &str, token: Option<&str>) -> TestResponse {
        self.request("PUT", uri, text.to_string(), token).await
    }

    /// DELETE without a body.
    pub async fn delete(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request("DELETE", uri, Body::empty(), token).await
    }
}
