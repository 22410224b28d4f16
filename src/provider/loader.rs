//! Mod loader tags and the heuristics that infer them from release metadata

use std::collections::BTreeSet;

use serde::{Serialize, Serializer};

/// Mod-loading framework a release targets
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Loader {
    Forge,
    NeoForge,
    Fabric,
    Quilt,
    /// Nothing in the release metadata identified a loader
    Unknown,
    /// A declared loader outside the known four (e.g. "Liteloader"), title-cased
    Other(String),
}

impl Loader {
    pub fn as_str(&self) -> &str {
        match self {
            Loader::Forge => "Forge",
            Loader::NeoForge => "NeoForge",
            Loader::Fabric => "Fabric",
            Loader::Quilt => "Quilt",
            Loader::Unknown => "Unknown",
            Loader::Other(name) => name,
        }
    }

    /// Build a tag from an explicitly declared loader name.
    ///
    /// Known loaders map onto their variant regardless of case, anything else
    /// is title-cased ("liteloader" -> "Liteloader").
    pub fn from_declared(name: &str) -> Self {
        let lower = name.trim().to_lowercase();
        match lower.as_str() {
            "forge" => Loader::Forge,
            "neoforge" | "neo-forge" => Loader::NeoForge,
            "fabric" => Loader::Fabric,
            "quilt" => Loader::Quilt,
            "" | "unknown" => Loader::Unknown,
            _ => Loader::Other(title_case(&lower)),
        }
    }
}

impl std::fmt::Display for Loader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Loader {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

fn title_case(lower: &str) -> String {
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Tags for a release that declares its loaders explicitly
pub fn classify_declared<S: AsRef<str>>(loaders: &[S]) -> BTreeSet<Loader> {
    loaders
        .iter()
        .map(|name| Loader::from_declared(name.as_ref()))
        .collect()
}

/// Tags for a release without a structured loader field.
///
/// Version-tag tokens are scanned first and may yield several loaders at once.
/// Only when no token matched is the file name consulted, where the first hit
/// in the order NeoForge > Fabric > Quilt > Forge wins. Falls back to
/// `Unknown` so every release produces at least one tag.
pub fn classify_inferred<S: AsRef<str>>(tokens: &[S], file_name: &str) -> BTreeSet<Loader> {
    let mut detected = BTreeSet::new();

    for token in tokens {
        let token = token.as_ref().to_lowercase();
        if mentions_neoforge(&token) {
            detected.insert(Loader::NeoForge);
        }
        if token.contains("fabric") {
            detected.insert(Loader::Fabric);
        }
        if token.contains("quilt") {
            detected.insert(Loader::Quilt);
        }
        if mentions_plain_forge(&token) {
            detected.insert(Loader::Forge);
        }
    }

    if detected.is_empty()
        && let Some(loader) = loader_from_file_name(&file_name.to_lowercase())
    {
        detected.insert(loader);
    }

    if detected.is_empty() {
        detected.insert(Loader::Unknown);
    }

    detected
}

fn loader_from_file_name(file_name: &str) -> Option<Loader> {
    if mentions_neoforge(file_name) {
        Some(Loader::NeoForge)
    } else if file_name.contains("fabric") {
        Some(Loader::Fabric)
    } else if file_name.contains("quilt") {
        Some(Loader::Quilt)
    } else if mentions_plain_forge(file_name) {
        Some(Loader::Forge)
    } else {
        None
    }
}

fn mentions_neoforge(text: &str) -> bool {
    text.contains("neoforge") || text.contains("neo-forge")
}

/// "forge" appearing anywhere other than inside "neoforge" / "neo-forge"
fn mentions_plain_forge(text: &str) -> bool {
    text.replace("neoforge", "")
        .replace("neo-forge", "")
        .contains("forge")
}
