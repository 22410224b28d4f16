//! Shared fixtures for integration tests

#![allow(dead_code)]

pub mod server;

pub use server::{Hits, mock_curseforge_project, mock_modrinth_project};

use std::path::Path;
use std::time::Duration;

use tempfile::TempDir;

use modcompat::config::{CacheBackend, Config};
use modcompat::provider::ProviderRegistry;

pub const TEST_API_KEY: &str = "test-api-key";

/// Config pointing both providers at `server_url`, with no real waiting
pub fn test_config(server_url: &str, cache_dir: &Path, backend: CacheBackend) -> Config {
    let mut config = Config::default();
    config.http.timeout = Duration::from_secs(5);
    config.http.max_attempts = 1;
    config.http.retry_delay = Duration::ZERO;
    config.cache.backend = backend;
    config.cache.dir = cache_dir.to_path_buf();
    config.curseforge.api_key = Some(TEST_API_KEY.to_string());
    config.curseforge.base_url = server_url.to_string();
    config.curseforge.page_delay = Duration::ZERO;
    config.modrinth.base_url = server_url.to_string();
    config.modrinth.page_delay = Duration::ZERO;
    config
}

/// Registry backed by a fresh cache directory; keep the `TempDir` alive
pub fn create_test_registry(server_url: &str, backend: CacheBackend) -> (TempDir, ProviderRegistry) {
    let temp_dir = TempDir::new().unwrap();
    let config = test_config(server_url, temp_dir.path(), backend);
    let registry = ProviderRegistry::from_config(&config).unwrap();
    (temp_dir, registry)
}
