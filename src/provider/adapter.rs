//! Capability interface shared by the provider adapters

use std::collections::BTreeSet;

use reqwest::Url;

use crate::provider::error::ProviderError;
use crate::provider::loader::Loader;
use crate::provider::record::build_record;
use crate::provider::types::{ProjectRecord, ProjectRef, ProviderKind};

/// Common view of one upstream release, whatever its raw shape
pub trait RawRelease {
    /// Game version tags exactly as reported upstream
    fn game_versions(&self) -> &[String];
}

/// Trait implemented by each supported content platform
#[async_trait::async_trait]
pub trait ModProvider: Send + Sync {
    /// Provider-specific release shape
    type Release: RawRelease + Send;

    /// Returns the platform this adapter handles
    fn kind(&self) -> ProviderKind;

    /// Extract the project slug from a user-supplied URL
    fn resolve_slug(&self, url: &Url) -> Result<String, ProviderError>;

    /// Resolve a slug to the provider-native project id and display name
    async fn resolve_project(&self, slug: &str) -> Result<ProjectRef, ProviderError>;

    /// Collect every release of a project, page by page, through the cache
    async fn fetch_all_releases(
        &self,
        project: &ProjectRef,
    ) -> Result<Vec<Self::Release>, ProviderError>;

    /// Loader tags for one release
    fn classify(&self, release: &Self::Release) -> BTreeSet<Loader>;

    /// Run the full pipeline for one URL.
    ///
    /// `source_url` is the input exactly as the caller supplied it, `url` its
    /// parsed form.
    async fn fetch_project(
        &self,
        source_url: &str,
        url: &Url,
    ) -> Result<ProjectRecord, ProviderError> {
        let slug = self.resolve_slug(url)?;
        let project = self.resolve_project(&slug).await?;
        let releases = self.fetch_all_releases(&project).await?;

        Ok(build_record(
            self.kind(),
            source_url,
            project,
            releases
                .iter()
                .map(|release| (release.game_versions(), self.classify(release))),
        ))
    }
}
