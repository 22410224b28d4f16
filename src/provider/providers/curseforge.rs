//! CurseForge API adapter

use std::collections::BTreeSet;
use std::time::Duration;

use percent_encoding::percent_decode_str;
use reqwest::Url;
use serde::Deserialize;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::{CURSEFORGE_GAME_ID, Config, CurseForgeConfig};
use crate::provider::adapter::{ModProvider, RawRelease};
use crate::provider::cache::{PageCache, PageKey};
use crate::provider::error::ProviderError;
use crate::provider::http::FetchClient;
use crate::provider::loader::{Loader, classify_inferred};
use crate::provider::types::{ProjectRef, ProviderKind};

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchHit {
    id: u64,
    #[serde(default)]
    name: String,
    #[serde(default)]
    download_count: f64,
}

#[derive(Debug, Deserialize)]
struct FilesPage {
    #[serde(default)]
    data: Vec<CurseForgeFile>,
}

/// One file entry of a CurseForge project
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurseForgeFile {
    /// Mixed list of game versions, loader names and other tags
    #[serde(default)]
    pub game_versions: Vec<String>,
    #[serde(default)]
    pub file_name: String,
}

impl RawRelease for CurseForgeFile {
    fn game_versions(&self) -> &[String] {
        &self.game_versions
    }
}

/// Adapter for `api.curseforge.com`, authenticated with `x-api-key`
pub struct CurseForgeProvider {
    http: FetchClient,
    cache: PageCache,
    ttl: Duration,
    settings: CurseForgeConfig,
}

impl CurseForgeProvider {
    /// Fails with [`ProviderError::MissingApiKey`] when no key is configured
    pub fn new(config: &Config, cache: PageCache) -> Result<Self, ProviderError> {
        let api_key = config
            .curseforge
            .api_key
            .as_deref()
            .ok_or(ProviderError::MissingApiKey(ProviderKind::CurseForge))?;

        Ok(Self {
            http: FetchClient::with_api_key(&config.http, api_key)?,
            cache,
            ttl: config.cache.ttl,
            settings: config.curseforge.clone(),
        })
    }

    fn files_url(&self, project_id: &str) -> String {
        format!("{}/mods/{}/files", self.settings.base_url, project_id)
    }
}

#[async_trait::async_trait]
impl ModProvider for CurseForgeProvider {
    type Release = CurseForgeFile;

    fn kind(&self) -> ProviderKind {
        ProviderKind::CurseForge
    }

    fn resolve_slug(&self, url: &Url) -> Result<String, ProviderError> {
        let segment = url
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
            .unwrap_or_default();

        let decoded = percent_decode_str(segment).decode_utf8_lossy();
        let slug: String = decoded.chars().filter(char::is_ascii).collect();
        let slug = slug.trim_matches(|c: char| c.is_whitespace() || c == '/');

        if slug.is_empty() {
            return Err(ProviderError::InvalidSlug(url.to_string()));
        }
        Ok(slug.to_string())
    }

    async fn resolve_project(&self, slug: &str) -> Result<ProjectRef, ProviderError> {
        let url = format!("{}/mods/search", self.settings.base_url);
        let params = [
            ("gameId", CURSEFORGE_GAME_ID.to_string()),
            ("slug", slug.to_string()),
        ];
        let body = self.http.fetch(&url, &params).await?;

        let response: SearchResponse = serde_json::from_value(body).map_err(|e| {
            warn!("Failed to parse CurseForge search response: {}", e);
            ProviderError::InvalidResponse(e.to_string())
        })?;

        // Search may return several projects; the most downloaded one wins
        let best = response
            .data
            .into_iter()
            .max_by(|a, b| {
                a.download_count
                    .total_cmp(&b.download_count)
                    .then_with(|| a.name.cmp(&b.name))
            })
            .ok_or_else(|| ProviderError::NotFound {
                provider: ProviderKind::CurseForge,
                slug: slug.to_string(),
            })?;

        info!("Matched CurseForge mod '{}' (id {})", best.name, best.id);

        Ok(ProjectRef {
            slug: slug.to_string(),
            project_id: best.id.to_string(),
            name: best.name,
        })
    }

    async fn fetch_all_releases(
        &self,
        project: &ProjectRef,
    ) -> Result<Vec<CurseForgeFile>, ProviderError> {
        let url = self.files_url(&project.project_id);
        let page_size = self.settings.page_size;
        let mut releases = Vec::new();
        let mut page = 0;
        let mut failures = 0;

        loop {
            let key = PageKey::new(self.kind(), &project.slug, &project.project_id, page);
            let params = [
                ("index", (page * page_size).to_string()),
                ("pageSize", page_size.to_string()),
            ];

            let result = self
                .cache
                .get_or_fetch(&key, self.ttl, || async {
                    self.http
                        .fetch(&url, &params)
                        .await
                        .map_err(ProviderError::from)
                })
                .await;

            let fetched = match result {
                Ok(fetched) => {
                    failures = 0;
                    fetched
                }
                Err(ProviderError::Fetch(e)) => {
                    failures += 1;
                    if failures >= self.settings.max_page_failures {
                        return Err(ProviderError::Pagination {
                            provider: self.kind(),
                            page,
                            failures,
                            source: e,
                        });
                    }
                    warn!(
                        "Skipping CurseForge page {} of {} ({}/{} failures): {}",
                        page, project.slug, failures, self.settings.max_page_failures, e
                    );
                    page += 1;
                    sleep(self.settings.page_delay).await;
                    continue;
                }
                Err(e) => return Err(e),
            };

            let files: FilesPage = serde_json::from_value(fetched.body)
                .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

            let count = files.data.len();
            debug!("CurseForge page {} of {}: {} files", page, project.slug, count);
            if count == 0 {
                break;
            }
            releases.extend(files.data);
            if count < page_size {
                break;
            }

            page += 1;
            if !fetched.from_cache {
                sleep(self.settings.page_delay).await;
            }
        }

        Ok(releases)
    }

    fn classify(&self, release: &CurseForgeFile) -> BTreeSet<Loader> {
        classify_inferred(&release.game_versions, &release.file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::stores::FsPageStore;
    use crate::provider::types::VersionPair;
    use mockito::{Matcher, Server};
    use rstest::rstest;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn provider(server_url: &str, dir: &TempDir) -> CurseForgeProvider {
        let mut config = Config::default();
        config.http.max_attempts = 1;
        config.http.retry_delay = Duration::ZERO;
        config.curseforge.api_key = Some("test-key".to_string());
        config.curseforge.base_url = server_url.to_string();
        config.curseforge.page_size = 2;
        config.curseforge.page_delay = Duration::ZERO;

        let cache = PageCache::new(Arc::new(FsPageStore::new(dir.path())));
        CurseForgeProvider::new(&config, cache).unwrap()
    }

    fn page_query(index: usize) -> Matcher {
        Matcher::AllOf(vec![
            Matcher::UrlEncoded("index".into(), index.to_string()),
            Matcher::UrlEncoded("pageSize".into(), "2".into()),
        ])
    }

    #[test]
    fn new_requires_api_key() {
        let dir = TempDir::new().unwrap();
        let cache = PageCache::new(Arc::new(FsPageStore::new(dir.path())));

        let result = CurseForgeProvider::new(&Config::default(), cache);

        assert!(matches!(
            result,
            Err(ProviderError::MissingApiKey(ProviderKind::CurseForge))
        ));
    }

    #[rstest]
    #[case("https://www.curseforge.com/minecraft/mc-mods/jei", "jei")]
    #[case("https://www.curseforge.com/minecraft/mc-mods/jei/", "jei")]
    #[case("https://www.curseforge.com/minecraft/mc-mods/caf%C3%A9-mod", "caf-mod")]
    #[case("https://www.curseforge.com/minecraft/mc-mods/my%20mod%20", "my mod")]
    #[case("https://www.curseforge.com/minecraft/mc-mods/%09jei%0A", "jei")]
    #[case("https://www.curseforge.com/minecraft/mc-mods/jei%2F", "jei")]
    fn resolve_slug_takes_last_segment(#[case] input: &str, #[case] expected: &str) {
        let dir = TempDir::new().unwrap();
        let provider = provider("http://127.0.0.1:1", &dir);

        let slug = provider.resolve_slug(&Url::parse(input).unwrap()).unwrap();

        assert_eq!(slug, expected);
    }

    #[test]
    fn resolve_slug_rejects_empty_path() {
        let dir = TempDir::new().unwrap();
        let provider = provider("http://127.0.0.1:1", &dir);

        let result = provider.resolve_slug(&Url::parse("https://www.curseforge.com/").unwrap());

        assert!(matches!(result, Err(ProviderError::InvalidSlug(_))));
    }

    #[rstest]
    #[case(r#"[{"id": 1, "name": "Small", "downloadCount": 100}, {"id": 2, "name": "Big", "downloadCount": 500}]"#)]
    #[case(r#"[{"id": 2, "name": "Big", "downloadCount": 500}, {"id": 1, "name": "Small", "downloadCount": 100}]"#)]
    #[tokio::test]
    async fn resolve_project_picks_most_downloaded_match(#[case] hits: &str) {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/mods/search")
            .match_header("x-api-key", "test-key")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("gameId".into(), "432".into()),
                Matcher::UrlEncoded("slug".into(), "examplemod".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(format!(r#"{{"data": {}}}"#, hits))
            .create_async()
            .await;

        let dir = TempDir::new().unwrap();
        let project = provider(&server.url(), &dir)
            .resolve_project("examplemod")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(project.project_id, "2");
        assert_eq!(project.name, "Big");
        assert_eq!(project.slug, "examplemod");
    }

    #[tokio::test]
    async fn resolve_project_returns_not_found_for_empty_search() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/mods/search")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"data": []}"#)
            .create_async()
            .await;

        let dir = TempDir::new().unwrap();
        let result = provider(&server.url(), &dir)
            .resolve_project("missing")
            .await;

        mock.assert_async().await;
        assert!(matches!(result, Err(ProviderError::NotFound { .. })));
    }

    #[tokio::test]
    async fn fetch_all_releases_follows_pages_until_short_page() {
        let mut server = Server::new_async().await;
        let first = server
            .mock("GET", "/mods/7/files")
            .match_query(page_query(0))
            .with_status(200)
            .with_body(
                r#"{"data": [
                    {"gameVersions": ["1.20.1", "Forge"], "fileName": "a.jar"},
                    {"gameVersions": ["1.20.1", "Fabric"], "fileName": "b.jar"}
                ]}"#,
            )
            .create_async()
            .await;
        let second = server
            .mock("GET", "/mods/7/files")
            .match_query(page_query(2))
            .with_status(200)
            .with_body(r#"{"data": [{"gameVersions": ["1.19.4"], "fileName": "c-forge.jar"}]}"#)
            .create_async()
            .await;

        let dir = TempDir::new().unwrap();
        let project = ProjectRef {
            slug: "examplemod".to_string(),
            project_id: "7".to_string(),
            name: "Example".to_string(),
        };
        let releases = provider(&server.url(), &dir)
            .fetch_all_releases(&project)
            .await
            .unwrap();

        first.assert_async().await;
        second.assert_async().await;
        let names: Vec<&str> = releases.iter().map(|r| r.file_name.as_str()).collect();
        assert_eq!(names, vec!["a.jar", "b.jar", "c-forge.jar"]);
    }

    #[tokio::test]
    async fn fetch_all_releases_tolerates_isolated_page_failures() {
        let mut server = Server::new_async().await;
        let failing = server
            .mock("GET", "/mods/7/files")
            .match_query(Matcher::AnyOf(vec![
                Matcher::UrlEncoded("index".into(), "0".into()),
                Matcher::UrlEncoded("index".into(), "2".into()),
            ]))
            .with_status(500)
            .expect(2)
            .create_async()
            .await;
        let last = server
            .mock("GET", "/mods/7/files")
            .match_query(page_query(4))
            .with_status(200)
            .with_body(r#"{"data": [{"gameVersions": ["1.18.2", "Forge"], "fileName": "x.jar"}]}"#)
            .create_async()
            .await;

        let dir = TempDir::new().unwrap();
        let project = ProjectRef {
            slug: "examplemod".to_string(),
            project_id: "7".to_string(),
            name: "Example".to_string(),
        };
        let releases = provider(&server.url(), &dir)
            .fetch_all_releases(&project)
            .await
            .unwrap();

        failing.assert_async().await;
        last.assert_async().await;
        assert_eq!(releases.len(), 1);
        assert_eq!(releases[0].file_name, "x.jar");
    }

    #[tokio::test]
    async fn fetch_all_releases_aborts_after_consecutive_failures() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/mods/7/files")
            .match_query(Matcher::Any)
            .with_status(500)
            .expect(3)
            .create_async()
            .await;

        let dir = TempDir::new().unwrap();
        let project = ProjectRef {
            slug: "examplemod".to_string(),
            project_id: "7".to_string(),
            name: "Example".to_string(),
        };
        let result = provider(&server.url(), &dir)
            .fetch_all_releases(&project)
            .await;

        mock.assert_async().await;
        assert!(matches!(
            result,
            Err(ProviderError::Pagination {
                provider: ProviderKind::CurseForge,
                page: 2,
                failures: 3,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn fetch_project_reuses_cached_pages() {
        let mut server = Server::new_async().await;
        let search = server
            .mock("GET", "/mods/search")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"data": [{"id": 7, "name": "Example Mod", "downloadCount": 10}]}"#)
            .expect(2)
            .create_async()
            .await;
        let files = server
            .mock("GET", "/mods/7/files")
            .match_query(page_query(0))
            .with_status(200)
            .with_body(
                r#"{"data": [{"gameVersions": ["1.20.1", "NeoForge", "Forge"], "fileName": "example.jar"}]}"#,
            )
            .expect(1)
            .create_async()
            .await;

        let dir = TempDir::new().unwrap();
        let provider = provider(&server.url(), &dir);
        let input = "https://www.curseforge.com/minecraft/mc-mods/examplemod";
        let url = Url::parse(input).unwrap();

        let first = provider.fetch_project(input, &url).await.unwrap();
        let second = provider.fetch_project(input, &url).await.unwrap();

        search.assert_async().await;
        files.assert_async().await;
        assert_eq!(first, second);
        assert_eq!(first.name, "Example Mod");
        assert_eq!(
            first.versions,
            vec![
                VersionPair::new("1.20.1", Loader::Forge),
                VersionPair::new("1.20.1", Loader::NeoForge),
            ]
        );
        assert!(dir
            .path()
            .join("curseforge/examplemod_7/page-0.json")
            .exists());
    }
}
