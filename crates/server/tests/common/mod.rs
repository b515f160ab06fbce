//! Common test utilities.

use stash_core::config::AppConfig;
use stash_kv::{KvStore, MemoryBackend};
use stash_server::{AppState, create_router};
use std::sync::Arc;
use tempfile::TempDir;

/// A test server wrapper with all dependencies.
/// Note: #[allow(dead_code)] because each test file compiles common/ separately.
#[allow(dead_code)]
pub struct TestServer {
    pub router: axum::Router,
    pub state: AppState,
    /// Direct handle to the backing map so tests can simulate eviction
    /// and corruption.
    pub kv: Arc<MemoryBackend>,
    _temp_dir: TempDir,
}

#[allow(dead_code)]
impl TestServer {
    /// Create a test server over a fresh memory backend, with a small
    /// chunk size so small uploads still span multiple chunks.
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Create a test server with custom config modifications.
    pub async fn with_config<F>(modifier: F) -> Self
    where
        F: FnOnce(&mut AppConfig),
    {
        stash_server::metrics::register_metrics();

        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let uploads_dir = temp_dir.path().join("uploads");
        std::fs::create_dir_all(&uploads_dir).expect("Failed to create uploads directory");

        let mut config = AppConfig::for_testing();
        config.server.uploads_dir = uploads_dir;
        config.server.chunk_size = 8;
        modifier(&mut config);

        let kv = Arc::new(MemoryBackend::new());
        let kv_dyn: Arc<dyn KvStore> = kv.clone();

        let state = AppState::new(config, kv_dyn);
        let router = create_router(state.clone());

        Self {
            router,
            state,
            kv,
            _temp_dir: temp_dir,
        }
    }
}

/// Build a multipart/form-data body with a single "file" part.
/// Returns (content-type header value, body bytes).
#[allow(dead_code)]
pub fn multipart_body(filename: &str, data: &[u8]) -> (String, Vec<u8>) {
    let boundary = "test-boundary-7MA4YWxk";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    (format!("multipart/form-data; boundary={boundary}"), body)
}
