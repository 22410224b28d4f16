//! TTL-based page cache in front of a [`PageStore`]

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeDelta, Utc};
use serde_json::Value;
use tracing::debug;

use crate::provider::error::CacheError;
use crate::provider::store::{PageStore, StoredPage};
use crate::provider::types::ProviderKind;

/// Identity of one cached upstream page
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageKey {
    pub provider: ProviderKind,
    pub slug: String,
    pub project_id: String,
    pub page: usize,
}

impl PageKey {
    pub fn new(
        provider: ProviderKind,
        slug: impl Into<String>,
        project_id: impl Into<String>,
        page: usize,
    ) -> Self {
        Self {
            provider,
            slug: slug.into(),
            project_id: project_id.into(),
            page,
        }
    }

    pub fn safe_slug(&self) -> String {
        sanitize_component(&self.slug)
    }

    pub fn safe_project_id(&self) -> String {
        sanitize_component(&self.project_id)
    }
}

impl std::fmt::Display for PageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}_{}/page-{}",
            self.provider,
            self.safe_slug(),
            self.safe_project_id(),
            self.page
        )
    }
}

/// Replace every character other than ASCII alphanumerics, `.`, `_` and `-`
/// with `_`, so a key component can never contain a path separator.
pub fn sanitize_component(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Page body plus whether it came from the cache or the network
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched {
    pub body: Value,
    pub from_cache: bool,
}

#[derive(Clone)]
pub struct PageCache {
    store: Arc<dyn PageStore>,
}

impl PageCache {
    pub fn new(store: Arc<dyn PageStore>) -> Self {
        Self { store }
    }

    /// Return the page at `key` if it is younger than `ttl`, otherwise run
    /// `fetch`, persist its result and return it.
    ///
    /// An error from `fetch` is returned untouched and nothing is written.
    pub async fn get_or_fetch<F, Fut, E>(
        &self,
        key: &PageKey,
        ttl: Duration,
        fetch: F,
    ) -> Result<Fetched, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, E>>,
        E: From<CacheError>,
    {
        if let Some(page) = self.store.load(key)?
            && is_fresh(&page, ttl)
        {
            debug!("Cache hit for {}", key);
            return Ok(Fetched {
                body: page.body,
                from_cache: true,
            });
        }

        debug!("Cache miss for {}", key);
        let body = fetch().await?;
        self.store.store(key, &body)?;

        Ok(Fetched {
            body,
            from_cache: false,
        })
    }

    pub fn clear(&self) -> Result<(), CacheError> {
        self.store.clear()
    }
}

fn is_fresh(page: &StoredPage, ttl: Duration) -> bool {
    let Ok(ttl) = TimeDelta::from_std(ttl) else {
        return true;
    };
    Utc::now().signed_duration_since(page.created_at) < ttl
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::store::MockPageStore;
    use rstest::rstest;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const DAY: Duration = Duration::from_secs(24 * 60 * 60);

    fn key() -> PageKey {
        PageKey::new(ProviderKind::Modrinth, "sodium", "AANobbMI", 0)
    }

    #[rstest]
    #[case("sodium", "sodium")]
    #[case("../../etc/passwd", ".._.._etc_passwd")]
    #[case("my mod!", "my_mod_")]
    #[case("a\\b", "a_b")]
    #[case("v1.2_rc-3", "v1.2_rc-3")]
    #[case("caf\u{e9}", "caf_")]
    fn sanitize_component_replaces_unsafe_characters(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(sanitize_component(raw), expected);
    }

    #[test]
    fn page_key_display_uses_sanitized_components() {
        let key = PageKey::new(ProviderKind::CurseForge, "my/mod", "238222", 3);
        assert_eq!(key.to_string(), "curseforge/my_mod_238222/page-3");
    }

    #[tokio::test]
    async fn get_or_fetch_returns_fresh_page_without_fetching() {
        let mut store = MockPageStore::new();
        store.expect_load().returning(|_| {
            Ok(Some(StoredPage {
                body: json!({"cached": true}),
                created_at: Utc::now() - TimeDelta::hours(1),
            }))
        });
        store.expect_store().never();

        let calls = AtomicUsize::new(0);
        let counter = &calls;
        let cache = PageCache::new(Arc::new(store));
        let result = cache
            .get_or_fetch(&key(), DAY, || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, CacheError>(Value::Null)
            })
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(
            result,
            Fetched {
                body: json!({"cached": true}),
                from_cache: true
            }
        );
    }

    #[tokio::test]
    async fn get_or_fetch_refetches_stale_page() {
        let mut store = MockPageStore::new();
        store.expect_load().returning(|_| {
            Ok(Some(StoredPage {
                body: json!({"cached": true}),
                created_at: Utc::now() - TimeDelta::hours(25),
            }))
        });
        store
            .expect_store()
            .withf(|_, body| body == &json!({"fresh": true}))
            .times(1)
            .returning(|_, _| Ok(()));

        let cache = PageCache::new(Arc::new(store));
        let result = cache
            .get_or_fetch(&key(), DAY, || async {
                Ok::<_, CacheError>(json!({"fresh": true}))
            })
            .await
            .unwrap();

        assert!(!result.from_cache);
        assert_eq!(result.body, json!({"fresh": true}));
    }

    #[tokio::test]
    async fn get_or_fetch_does_not_store_when_fetch_fails() {
        let mut store = MockPageStore::new();
        store.expect_load().returning(|_| Ok(None));
        store.expect_store().never();

        let cache = PageCache::new(Arc::new(store));
        let result = cache
            .get_or_fetch(&key(), DAY, || async { Err::<Value, _>(CacheError::LockPoisoned) })
            .await;

        assert!(matches!(result, Err(CacheError::LockPoisoned)));
    }

    #[tokio::test]
    async fn get_or_fetch_propagates_load_errors() {
        let mut store = MockPageStore::new();
        store
            .expect_load()
            .returning(|_| Err(CacheError::LockPoisoned));

        let calls = AtomicUsize::new(0);
        let counter = &calls;
        let cache = PageCache::new(Arc::new(store));
        let result = cache
            .get_or_fetch(&key(), DAY, || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, CacheError>(Value::Null)
            })
            .await;

        assert!(matches!(result, Err(CacheError::LockPoisoned)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
