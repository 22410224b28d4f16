//! Storage abstraction for cached upstream pages

#[cfg(test)]
use mockall::automock;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::provider::cache::PageKey;
use crate::provider::error::CacheError;

/// A cached page together with its write time
#[derive(Debug, Clone, PartialEq)]
pub struct StoredPage {
    pub body: Value,
    pub created_at: DateTime<Utc>,
}

/// Key-value store for upstream response pages.
///
/// Implementations store the payload verbatim and replace an existing page
/// wholesale; freshness is decided by the caller from `created_at`.
#[cfg_attr(test, automock)]
pub trait PageStore: Send + Sync {
    /// Load the page stored under `key`, if any
    fn load(&self, key: &PageKey) -> Result<Option<StoredPage>, CacheError>;

    /// Store `body` under `key`, replacing any previous page
    fn store(&self, key: &PageKey, body: &Value) -> Result<(), CacheError>;

    /// Remove every cached page
    fn clear(&self) -> Result<(), CacheError>;
}
