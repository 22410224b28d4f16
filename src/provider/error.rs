use std::path::PathBuf;

use thiserror::Error;

use crate::provider::types::ProviderKind;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to (de)serialize cached page: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Cache lock poisoned")]
    LockPoisoned,
}

impl CacheError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CacheError::Io {
            path: path.into(),
            source,
        }
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("API key is not a valid header value")]
    InvalidApiKey,

    #[error("Invalid request URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Failed to fetch {url} after {attempts} retries: {last_error}")]
    RetriesExhausted {
        url: String,
        attempts: u32,
        last_error: String,
    },
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Unsupported provider in URL: {0}")]
    UnsupportedUrl(String),

    #[error("Could not extract a project slug from URL: {0}")]
    InvalidSlug(String),

    #[error("{} is unavailable: API key not configured", .0.display_name())]
    MissingApiKey(ProviderKind),

    #[error("Mod '{slug}' not found on {}", .provider.display_name())]
    NotFound { provider: ProviderKind, slug: String },

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Pagination aborted on {} at page {page} after {failures} consecutive failures: {source}", .provider.display_name())]
    Pagination {
        provider: ProviderKind,
        page: usize,
        failures: usize,
        #[source]
        source: FetchError,
    },

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}
