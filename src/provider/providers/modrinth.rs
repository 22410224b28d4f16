//! Modrinth API adapter

use std::collections::BTreeSet;
use std::time::Duration;

use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::config::{Config, ModrinthConfig};
use crate::provider::adapter::{ModProvider, RawRelease};
use crate::provider::cache::{PageCache, PageKey};
use crate::provider::error::ProviderError;
use crate::provider::http::FetchClient;
use crate::provider::loader::{Loader, classify_declared};
use crate::provider::types::{ProjectRef, ProviderKind};

#[derive(Debug, Deserialize)]
struct ProjectResponse {
    id: String,
    title: Option<String>,
    name: Option<String>,
}

/// One version entry of a Modrinth project
#[derive(Debug, Clone, Deserialize)]
pub struct ModrinthVersion {
    #[serde(default)]
    pub game_versions: Vec<String>,
    /// Loader names as declared by the uploader
    #[serde(default)]
    pub loaders: Vec<String>,
}

impl RawRelease for ModrinthVersion {
    fn game_versions(&self) -> &[String] {
        &self.game_versions
    }
}

/// Adapter for `api.modrinth.com`
pub struct ModrinthProvider {
    http: FetchClient,
    cache: PageCache,
    ttl: Duration,
    settings: ModrinthConfig,
}

impl ModrinthProvider {
    pub fn new(config: &Config, cache: PageCache) -> Result<Self, ProviderError> {
        Ok(Self {
            http: FetchClient::new(&config.http)?,
            cache,
            ttl: config.cache.ttl,
            settings: config.modrinth.clone(),
        })
    }
}

/// Versions endpoints answer with a bare array; some mirrors wrap it in `data`
fn parse_versions(body: Value) -> Result<Vec<ModrinthVersion>, ProviderError> {
    let items = match body {
        Value::Object(mut map) => map.remove("data").unwrap_or(Value::Array(Vec::new())),
        other => other,
    };
    serde_json::from_value(items).map_err(|e| {
        warn!("Failed to parse Modrinth versions page: {}", e);
        ProviderError::InvalidResponse(e.to_string())
    })
}

#[async_trait::async_trait]
impl ModProvider for ModrinthProvider {
    type Release = ModrinthVersion;

    fn kind(&self) -> ProviderKind {
        ProviderKind::Modrinth
    }

    fn resolve_slug(&self, url: &Url) -> Result<String, ProviderError> {
        url.path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ProviderError::InvalidSlug(url.to_string()))
    }

    async fn resolve_project(&self, slug: &str) -> Result<ProjectRef, ProviderError> {
        let url = format!("{}/project/{}", self.settings.base_url, slug);
        let body = self.http.fetch(&url, &[]).await?;

        let project: ProjectResponse = serde_json::from_value(body).map_err(|e| {
            warn!("Failed to parse Modrinth project response: {}", e);
            ProviderError::InvalidResponse(e.to_string())
        })?;

        let name = project
            .title
            .or(project.name)
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| slug.to_string());

        Ok(ProjectRef {
            slug: slug.to_string(),
            project_id: project.id,
            name,
        })
    }

    async fn fetch_all_releases(
        &self,
        project: &ProjectRef,
    ) -> Result<Vec<ModrinthVersion>, ProviderError> {
        let url = format!("{}/project/{}/version", self.settings.base_url, project.slug);
        let page_size = self.settings.page_size;
        let mut releases = Vec::new();
        let mut previous: Option<Value> = None;
        let mut page = 0;

        loop {
            if page >= self.settings.max_pages {
                warn!(
                    "Stopping Modrinth pagination of {} after {} pages",
                    project.slug, page
                );
                break;
            }

            let key = PageKey::new(self.kind(), &project.slug, &project.project_id, page);
            let params = [
                ("offset", (page * page_size).to_string()),
                ("limit", page_size.to_string()),
            ];

            let fetched = self
                .cache
                .get_or_fetch(&key, self.ttl, || async {
                    self.http
                        .fetch(&url, &params)
                        .await
                        .map_err(ProviderError::from)
                })
                .await
                .map_err(|e| match e {
                    ProviderError::Fetch(source) => ProviderError::Pagination {
                        provider: ProviderKind::Modrinth,
                        page,
                        failures: 1,
                        source,
                    },
                    other => other,
                })?;

            // Same body as the previous page: upstream ignored `offset`
            if previous.as_ref() == Some(&fetched.body) {
                debug!("Modrinth page {} of {} repeats page {}", page, project.slug, page - 1);
                break;
            }

            let versions = parse_versions(fetched.body.clone())?;
            let count = versions.len();
            debug!("Modrinth page {} of {}: {} versions", page, project.slug, count);

            if count == 0 {
                break;
            }
            releases.extend(versions);
            if count < page_size {
                break;
            }
            if count > page_size {
                warn!(
                    "Modrinth returned {} versions for a page of {}, stopping",
                    count, page_size
                );
                break;
            }

            previous = Some(fetched.body);
            page += 1;
            if !fetched.from_cache {
                sleep(self.settings.page_delay).await;
            }
        }

        Ok(releases)
    }

    fn classify(&self, release: &ModrinthVersion) -> BTreeSet<Loader> {
        classify_declared(&release.loaders)
    }
}
