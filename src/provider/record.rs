//! Reconciliation of raw releases into a normalized [`ProjectRecord`]

use std::collections::{BTreeSet, HashSet};

use tracing::debug;

use crate::provider::loader::Loader;
use crate::provider::types::{ProjectRecord, ProjectRef, ProviderKind, VersionPair};
use crate::provider::version_key::version_key;

/// Only game versions in this family are reported
pub const GAME_VERSION_PREFIX: &str = "1.";

/// Build a record from `(game versions, loader tags)` per release.
///
/// Every game version starting with `1.` is combined with every loader tag of
/// its release; duplicates across releases and pages collapse into one pair.
pub fn build_record<'a, I>(
    provider: ProviderKind,
    source_url: &str,
    project: ProjectRef,
    releases: I,
) -> ProjectRecord
where
    I: IntoIterator<Item = (&'a [String], BTreeSet<Loader>)>,
{
    let mut pairs = HashSet::new();

    for (game_versions, loaders) in releases {
        let game_versions: Vec<&String> = game_versions
            .iter()
            .filter(|v| v.starts_with(GAME_VERSION_PREFIX))
            .collect();

        if loaders.len() > 1 && !game_versions.is_empty() {
            debug!(
                "Multi-loader release detected: {:?} -> {:?}",
                game_versions, loaders
            );
        }

        for version in &game_versions {
            for loader in &loaders {
                pairs.insert(VersionPair::new(version.as_str(), loader.clone()));
            }
        }
    }

    let versions = sort_pairs(pairs);
    debug!(
        "Collected {} unique version/loader pairs for {}",
        versions.len(),
        project.name
    );

    ProjectRecord {
        provider,
        project_id: project.project_id,
        slug: project.slug,
        name: project.name,
        source_url: source_url.to_string(),
        versions,
    }
}

/// Newest game version first, then loader name, then the raw version string
pub fn sort_pairs(pairs: impl IntoIterator<Item = VersionPair>) -> Vec<VersionPair> {
    let mut keyed: Vec<_> = pairs
        .into_iter()
        .map(|pair| (version_key(&pair.game_version), pair))
        .collect();

    keyed.sort_by(|(a_key, a), (b_key, b)| {
        b_key
            .cmp(a_key)
            .then_with(|| a.loader.as_str().cmp(b.loader.as_str()))
            .then_with(|| a.game_version.cmp(&b.game_version))
    });

    keyed.into_iter().map(|(_, pair)| pair).collect()
}
