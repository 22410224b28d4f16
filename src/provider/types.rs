//! Common types shared by the provider adapters

use serde::Serialize;

use crate::provider::loader::Loader;

/// Content platform hosting a mod
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// CurseForge (requires an API key)
    CurseForge,
    /// Modrinth (anonymous access)
    Modrinth,
}

impl ProviderKind {
    /// Returns the string representation used in cache keys and output
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::CurseForge => "curseforge",
            ProviderKind::Modrinth => "modrinth",
        }
    }

    /// Human-readable platform name
    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderKind::CurseForge => "CurseForge",
            ProviderKind::Modrinth => "Modrinth",
        }
    }

    /// Detect the provider from a URL host.
    ///
    /// Matches the bare domain and any subdomain (`www.curseforge.com`,
    /// `legacy.curseforge.com`), never a lookalike such as `notmodrinth.com`.
    pub fn from_host(host: &str) -> Option<Self> {
        let host = host.trim_end_matches('.').to_ascii_lowercase();
        let matches = |domain: &str| host == domain || host.ends_with(&format!(".{domain}"));

        if matches("curseforge.com") {
            Some(ProviderKind::CurseForge)
        } else if matches("modrinth.com") {
            Some(ProviderKind::Modrinth)
        } else {
            None
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A project resolved from a slug
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectRef {
    /// Slug extracted from the input URL
    pub slug: String,
    /// Provider-native identifier
    pub project_id: String,
    /// Display name
    pub name: String,
}

/// One supported (game version, loader) combination
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct VersionPair {
    pub game_version: String,
    pub loader: Loader,
}

impl VersionPair {
    pub fn new(game_version: impl Into<String>, loader: Loader) -> Self {
        Self {
            game_version: game_version.into(),
            loader,
        }
    }
}

/// Normalized result of fetching a project from either provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectRecord {
    pub provider: ProviderKind,
    pub project_id: String,
    pub slug: String,
    pub name: String,
    pub source_url: String,
    /// Unique pairs, newest game version first, then by loader name
    pub versions: Vec<VersionPair>,
}
