//! Mock upstream endpoints

use mockito::{Matcher, Mock, ServerGuard};
use serde_json::{Value, json};

use super::TEST_API_KEY;

/// Expected request counts for a mocked project
#[derive(Debug, Clone, Copy)]
pub struct Hits {
    /// Project lookups (search or project endpoint); never cached
    pub lookups: usize,
    /// Requests for the first releases page
    pub pages: usize,
}

impl Hits {
    pub const ONCE: Hits = Hits {
        lookups: 1,
        pages: 1,
    };
}

/// Mock the project lookup and a single versions page for a Modrinth slug
pub async fn mock_modrinth_project(
    server: &mut ServerGuard,
    slug: &str,
    project_id: &str,
    title: &str,
    versions: Value,
    hits: Hits,
) -> (Mock, Mock) {
    let project = server
        .mock("GET", format!("/project/{}", slug).as_str())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"id": project_id, "slug": slug, "title": title}).to_string())
        .expect(hits.lookups)
        .create_async()
        .await;

    let pages = server
        .mock("GET", format!("/project/{}/version", slug).as_str())
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("offset".into(), "0".into()),
            Matcher::UrlEncoded("limit".into(), "100".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(versions.to_string())
        .expect(hits.pages)
        .create_async()
        .await;

    (project, pages)
}

/// Mock the slug search and a single files page for a CurseForge project
pub async fn mock_curseforge_project(
    server: &mut ServerGuard,
    slug: &str,
    project_id: u64,
    name: &str,
    files: Value,
    hits: Hits,
) -> (Mock, Mock) {
    let search = server
        .mock("GET", "/mods/search")
        .match_header("x-api-key", TEST_API_KEY)
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("gameId".into(), "432".into()),
            Matcher::UrlEncoded("slug".into(), slug.into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({"data": [{"id": project_id, "name": name, "downloadCount": 1000}]}).to_string(),
        )
        .expect(hits.lookups)
        .create_async()
        .await;

    let pages = server
        .mock("GET", format!("/mods/{}/files", project_id).as_str())
        .match_header("x-api-key", TEST_API_KEY)
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("index".into(), "0".into()),
            Matcher::UrlEncoded("pageSize".into(), "50".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"data": files}).to_string())
        .expect(hits.pages)
        .create_async()
        .await;

    (search, pages)
}
