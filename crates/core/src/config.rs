//! Configuration types shared across crates.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Server configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Directory for staging uploads on disk before chunking.
    #[serde(default = "default_uploads_dir")]
    pub uploads_dir: PathBuf,
    /// Minimum accepted file size in bytes.
    #[serde(default)]
    pub min_file_bytes: u64,
    /// Maximum accepted file size in bytes.
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,
    /// Chunk size in bytes. Must stay under the backend's maximum value
    /// size minus protocol overhead.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: u64,
    /// Enable the /metrics endpoint for Prometheus scraping (default: true).
    #[serde(default = "default_metrics_enabled")]
    pub metrics_enabled: bool,
}

fn default_bind() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_uploads_dir() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_max_file_bytes() -> u64 {
    50 * 1024 * 1024
}

fn default_chunk_size() -> u64 {
    crate::DEFAULT_CHUNK_SIZE
}

fn default_metrics_enabled() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            uploads_dir: default_uploads_dir(),
            min_file_bytes: 0,
            max_file_bytes: default_max_file_bytes(),
            chunk_size: default_chunk_size(),
            metrics_enabled: default_metrics_enabled(),
        }
    }
}

impl ServerConfig {
    /// Validate server configuration invariants.
    pub fn validate(&self) -> Result<(), String> {
        if self.chunk_size < crate::MIN_CHUNK_SIZE || self.chunk_size > crate::MAX_CHUNK_SIZE {
            return Err(format!(
                "server.chunk_size {} must be between {} and {}",
                self.chunk_size,
                crate::MIN_CHUNK_SIZE,
                crate::MAX_CHUNK_SIZE
            ));
        }
        if self.min_file_bytes > self.max_file_bytes {
            return Err(format!(
                "server.min_file_bytes {} exceeds server.max_file_bytes {}",
                self.min_file_bytes, self.max_file_bytes
            ));
        }
        Ok(())
    }
}

/// Key-value backend configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BackendConfig {
    /// memcached over TCP.
    Memcached {
        /// Server host.
        host: String,
        /// Server port.
        #[serde(default = "default_memcached_port")]
        port: u16,
        /// Per-operation timeout in milliseconds.
        #[serde(default = "default_timeout_ms")]
        timeout_ms: u64,
        /// Maximum pooled connections.
        #[serde(default = "default_pool_size")]
        pool_size: usize,
    },
    /// Volatile in-process map. For tests and development only; contents
    /// do not survive the process.
    Memory,
}

fn default_memcached_port() -> u16 {
    11211
}

fn default_timeout_ms() -> u64 {
    2000
}

fn default_pool_size() -> usize {
    8
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self::Memcached {
            host: "localhost".to_string(),
            port: default_memcached_port(),
            timeout_ms: default_timeout_ms(),
            pool_size: default_pool_size(),
        }
    }
}

impl BackendConfig {
    /// Validate backend configuration invariants.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            BackendConfig::Memcached {
                host,
                timeout_ms,
                pool_size,
                ..
            } => {
                if host.is_empty() {
                    return Err("backend.host cannot be empty".to_string());
                }
                if *timeout_ms == 0 {
                    return Err("backend.timeout_ms cannot be 0".to_string());
                }
                if *pool_size == 0 {
                    return Err("backend.pool_size cannot be 0".to_string());
                }
                Ok(())
            }
            BackendConfig::Memory => Ok(()),
        }
    }
}

/// Complete application configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Key-value backend configuration.
    #[serde(default)]
    pub backend: BackendConfig,
}

impl AppConfig {
    /// Validate the whole configuration, failing on the first error.
    pub fn validate(&self) -> Result<(), String> {
        self.server.validate()?;
        self.backend.validate()
    }

    /// Create a test configuration with sensible defaults.
    ///
    /// **For testing only.** Uses the in-process memory backend.
    pub fn for_testing() -> Self {
        Self {
            server: ServerConfig::default(),
            backend: BackendConfig::Memory,
        }
    }
}
