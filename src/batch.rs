//! Per-URL analysis over a bounded number of concurrent requests

use std::collections::HashSet;

use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{info, warn};

use crate::provider::registry::ProviderRegistry;
use crate::provider::types::ProjectRecord;

/// Result for one input URL
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AnalysisOutcome {
    Ok(ProjectRecord),
    Failed { url: String, error: String },
}

impl AnalysisOutcome {
    pub fn record(&self) -> Option<&ProjectRecord> {
        match self {
            AnalysisOutcome::Ok(record) => Some(record),
            AnalysisOutcome::Failed { .. } => None,
        }
    }
}

/// Trimmed, non-empty URLs in input order with repeats removed
pub fn distinct_urls<I, S>(urls: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    urls.into_iter()
        .map(|u| u.as_ref().trim().to_string())
        .filter(|u| !u.is_empty() && seen.insert(u.clone()))
        .collect()
}

/// Analyze every distinct URL, at most `concurrency` at a time.
///
/// Outcomes come back in input order. A failing URL yields
/// [`AnalysisOutcome::Failed`] and never stops the others; unsupported URLs
/// fail without touching the network.
pub async fn analyze_all<I, S>(
    registry: &ProviderRegistry,
    urls: I,
    concurrency: usize,
) -> Vec<AnalysisOutcome>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let urls = distinct_urls(urls);
    info!("Analyzing {} mod URLs", urls.len());

    stream::iter(urls)
        .map(|url| async move {
            match registry.get_mod_data(&url).await {
                Ok(record) => AnalysisOutcome::Ok(record),
                Err(e) => {
                    warn!("Failed to analyze {}: {}", url, e);
                    AnalysisOutcome::Failed {
                        url,
                        error: e.to_string(),
                    }
                }
            }
        })
        .buffered(concurrency.max(1))
        .collect()
        .await
}
