//! Cross-mod compatibility summary and pair filters

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;

use crate::provider::loader::Loader;
use crate::provider::types::{ProjectRecord, VersionPair};
use crate::provider::version_key::{find_newest, version_key};

/// Share of mods a pair must reach to be reported as the majority choice
pub const MAJORITY_THRESHOLD: f64 = 0.5;

/// Outcome of comparing the pair sets of several mods
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Compatibility {
    NoMods,
    /// Newest version supported by every mod, one entry per loader
    AllCompatible { pairs: Vec<VersionPair> },
    Majority {
        pair: VersionPair,
        count: usize,
        total: usize,
    },
    NoCommonDenominator,
}

impl std::fmt::Display for Compatibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Compatibility::NoMods => write!(f, "No mods provided"),
            Compatibility::AllCompatible { pairs } => {
                let targets: Vec<String> = pairs
                    .iter()
                    .map(|p| format!("{} {}", p.loader, p.game_version))
                    .collect();
                write!(f, "All your mods are compatible with {}", targets.join(" & "))
            }
            Compatibility::Majority { pair, count, total } => write!(
                f,
                "Most of your mods share: {} {} ({}/{})",
                pair.loader, pair.game_version, count, total
            ),
            Compatibility::NoCommonDenominator => write!(f, "No common denominator found"),
        }
    }
}

/// Fold loader spellings onto the known loaders ("neo" anything is NeoForge)
pub fn normalize_loader(loader: &Loader) -> Loader {
    let Loader::Other(name) = loader else {
        return loader.clone();
    };

    let lower = name.to_lowercase();
    if lower.contains("neo") {
        Loader::NeoForge
    } else if lower.contains("forge") {
        Loader::Forge
    } else if lower.contains("fabric") {
        Loader::Fabric
    } else if lower.contains("quilt") {
        Loader::Quilt
    } else {
        loader.clone()
    }
}

fn normalized_pairs(record: &ProjectRecord) -> HashSet<VersionPair> {
    record
        .versions
        .iter()
        .map(|p| VersionPair::new(p.game_version.as_str(), normalize_loader(&p.loader)))
        .collect()
}

pub fn summarize(records: &[ProjectRecord]) -> Compatibility {
    let Some((first, rest)) = records.split_first() else {
        return Compatibility::NoMods;
    };

    let sets: Vec<HashSet<VersionPair>> = rest.iter().map(normalized_pairs).collect();
    let common: Vec<VersionPair> = normalized_pairs(first)
        .into_iter()
        .filter(|pair| sets.iter().all(|s| s.contains(pair)))
        .collect();

    if !common.is_empty() {
        let mut by_loader: BTreeMap<&Loader, Vec<&str>> = BTreeMap::new();
        for pair in &common {
            by_loader
                .entry(&pair.loader)
                .or_default()
                .push(pair.game_version.as_str());
        }

        let mut pairs: Vec<VersionPair> = by_loader
            .into_iter()
            .filter_map(|(loader, versions)| {
                find_newest(versions).map(|v| VersionPair::new(v, loader.clone()))
            })
            .collect();
        pairs.sort_by(|a, b| a.loader.as_str().cmp(b.loader.as_str()));
        return Compatibility::AllCompatible { pairs };
    }

    let mut counts: HashMap<VersionPair, usize> = HashMap::new();
    for pair in std::iter::once(normalized_pairs(first))
        .chain(sets)
        .flatten()
    {
        *counts.entry(pair).or_default() += 1;
    }

    let total = records.len();
    let top = counts.into_iter().max_by(|(a, a_count), (b, b_count)| {
        a_count
            .cmp(b_count)
            .then_with(|| version_key(&a.game_version).cmp(&version_key(&b.game_version)))
            .then_with(|| b.loader.as_str().cmp(a.loader.as_str()))
    });

    match top {
        Some((pair, count)) if count as f64 / total as f64 >= MAJORITY_THRESHOLD => {
            Compatibility::Majority { pair, count, total }
        }
        _ => Compatibility::NoCommonDenominator,
    }
}

/// Restricts pairs to one game version and/or one loader
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    pub version: Option<String>,
    pub loader: Option<Loader>,
}

impl Filter {
    pub fn new(version: Option<String>, loader: Option<&str>) -> Self {
        Self {
            version: version.filter(|v| !v.trim().is_empty()),
            loader: loader
                .filter(|l| !l.trim().is_empty())
                .map(|l| normalize_loader(&Loader::from_declared(l))),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.version.is_none() && self.loader.is_none()
    }

    pub fn matches(&self, pair: &VersionPair) -> bool {
        let version_ok = self
            .version
            .as_deref()
            .is_none_or(|v| pair.game_version == v);
        let loader_ok = self
            .loader
            .as_ref()
            .is_none_or(|l| normalize_loader(&pair.loader) == *l);
        version_ok && loader_ok
    }

    pub fn apply(&self, record: &ProjectRecord) -> ProjectRecord {
        ProjectRecord {
            versions: record
                .versions
                .iter()
                .filter(|p| self.matches(p))
                .cloned()
                .collect(),
            ..record.clone()
        }
    }
}
