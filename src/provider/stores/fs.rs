//! Filesystem page store: one pretty-printed JSON document per page

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::provider::cache::PageKey;
use crate::provider::error::CacheError;
use crate::provider::store::{PageStore, StoredPage};

/// Stores pages at `<root>/<provider>/<slug>_<project_id>/page-<n>.json`.
///
/// The file modification time is the page's `created_at`.
pub struct FsPageStore {
    root: PathBuf,
}

impl FsPageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Location of the page file for `key`.
    ///
    /// Every component is sanitized and the project folder always contains
    /// `_`, so the path never resolves to `.`/`..` or leaves `root`.
    pub fn page_path(&self, key: &PageKey) -> PathBuf {
        self.root
            .join(key.provider.as_str())
            .join(format!("{}_{}", key.safe_slug(), key.safe_project_id()))
            .join(format!("page-{}.json", key.page))
    }
}

impl PageStore for FsPageStore {
    fn load(&self, key: &PageKey) -> Result<Option<StoredPage>, CacheError> {
        let path = self.page_path(key);

        let metadata = match fs::metadata(&path) {
            Ok(m) => m,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CacheError::io(path, e)),
        };
        let modified = metadata
            .modified()
            .map_err(|e| CacheError::io(&path, e))?;

        let content = fs::read_to_string(&path).map_err(|e| CacheError::io(&path, e))?;
        let body = serde_json::from_str(&content)?;

        Ok(Some(StoredPage {
            body,
            created_at: DateTime::<Utc>::from(modified),
        }))
    }

    fn store(&self, key: &PageKey, body: &Value) -> Result<(), CacheError> {
        let path = self.page_path(key);
        let Some(dir) = path.parent() else {
            return Err(CacheError::io(
                &path,
                std::io::Error::new(ErrorKind::InvalidInput, "page path has no parent"),
            ));
        };
        fs::create_dir_all(dir).map_err(|e| CacheError::io(dir, e))?;

        let json = serde_json::to_vec_pretty(body)?;

        // Written to a sibling temp file and renamed, so readers never see a half page
        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| CacheError::io(dir, e))?;
        if let Err(e) = tmp.write_all(&json).and_then(|_| tmp.flush()) {
            return Err(CacheError::io(tmp.path(), e));
        }
        tmp.persist(&path)
            .map_err(|e| CacheError::io(&path, e.error))?;

        debug!("Stored page {} at {:?}", key, path);
        Ok(())
    }

    fn clear(&self) -> Result<(), CacheError> {
        match fs::remove_dir_all(&self.root) {
            Ok(()) => {
                info!("Cleared page cache at {:?}", self.root);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CacheError::io(&self.root, e)),
        }
    }
}
