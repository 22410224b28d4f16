//! Host-based dispatch from a project URL to its provider adapter

use std::sync::Arc;

use reqwest::Url;
use tracing::{info, warn};

use crate::config::{CacheBackend, CacheConfig, Config};
use crate::provider::adapter::ModProvider;
use crate::provider::cache::PageCache;
use crate::provider::error::{CacheError, ProviderError};
use crate::provider::providers::{CurseForgeProvider, ModrinthProvider};
use crate::provider::store::PageStore;
use crate::provider::stores::{FsPageStore, SqlitePageStore};
use crate::provider::types::{ProjectRecord, ProviderKind};

/// File name of the SQLite page store inside the cache directory
pub const SQLITE_FILE_NAME: &str = "pages.db";

/// Open the page store selected by `config.backend`
pub fn open_store(config: &CacheConfig) -> Result<Arc<dyn PageStore>, CacheError> {
    Ok(match config.backend {
        CacheBackend::Fs => Arc::new(FsPageStore::new(&config.dir)),
        CacheBackend::Sqlite => Arc::new(SqlitePageStore::new(&config.dir.join(SQLITE_FILE_NAME))?),
    })
}

/// Parse `input` and identify its provider.
///
/// Only `http`/`https` URLs whose host is one of the supported platforms (or
/// a subdomain of one) are accepted.
pub fn parse_mod_url(input: &str) -> Result<(Url, ProviderKind), ProviderError> {
    let unsupported = || ProviderError::UnsupportedUrl(input.to_string());

    let url = Url::parse(input.trim()).map_err(|_| unsupported())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(unsupported());
    }

    let kind = url
        .host_str()
        .and_then(ProviderKind::from_host)
        .ok_or_else(unsupported)?;

    Ok((url, kind))
}

/// Owns one adapter per provider plus the page cache they share
pub struct ProviderRegistry {
    curseforge: Option<CurseForgeProvider>,
    modrinth: ModrinthProvider,
    cache: PageCache,
}

impl ProviderRegistry {
    /// Build adapters and the configured page store.
    ///
    /// A missing CurseForge key disables that provider only.
    pub fn from_config(config: &Config) -> Result<Self, ProviderError> {
        let cache = PageCache::new(open_store(&config.cache)?);
        Self::with_cache(config, cache)
    }

    pub fn with_cache(config: &Config, cache: PageCache) -> Result<Self, ProviderError> {
        let curseforge = match CurseForgeProvider::new(config, cache.clone()) {
            Ok(provider) => Some(provider),
            Err(ProviderError::MissingApiKey(_)) => {
                warn!("CF_API_KEY is not set, CurseForge URLs will be rejected");
                None
            }
            Err(e) => return Err(e),
        };

        Ok(Self {
            curseforge,
            modrinth: ModrinthProvider::new(config, cache.clone())?,
            cache,
        })
    }

    /// Whether an adapter for `kind` is available
    pub fn supports(&self, kind: ProviderKind) -> bool {
        match kind {
            ProviderKind::CurseForge => self.curseforge.is_some(),
            ProviderKind::Modrinth => true,
        }
    }

    /// Fetch and normalize the project behind `url`.
    ///
    /// Unresolvable input fails before any network call.
    pub async fn get_mod_data(&self, url: &str) -> Result<ProjectRecord, ProviderError> {
        let (parsed, kind) = parse_mod_url(url)?;
        let source_url = url.trim();
        info!("Fetching {} data for {}", kind.display_name(), source_url);

        let record = match kind {
            ProviderKind::CurseForge => {
                let provider = self
                    .curseforge
                    .as_ref()
                    .ok_or(ProviderError::MissingApiKey(kind))?;
                provider.fetch_project(source_url, &parsed).await?
            }
            ProviderKind::Modrinth => self.modrinth.fetch_project(source_url, &parsed).await?,
        };

        info!(
            "{}: {} version/loader pairs",
            record.name,
            record.versions.len()
        );
        Ok(record)
    }

    /// Remove every cached page
    pub fn clear_cache(&self) -> Result<(), CacheError> {
        info!("Clearing page cache");
        self.cache.clear()
    }
}
