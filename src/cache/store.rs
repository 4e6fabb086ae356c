use std::io::Write as _;
use std::path::{Path, PathBuf};

use crate::foundation::error::{BoilError, BoilResult};

/// File extension of cached artifacts.
pub const ARTIFACT_EXT: &str = "gif";

/// A live cache entry as seen at lookup time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CachedEntry {
    /// Artifact file.
    pub path: PathBuf,
    /// Artifact size in bytes.
    pub size_bytes: u64,
}

/// Identity of one cached artifact: who it is for and which source image produced it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    subject: String,
    fingerprint: String,
}

impl CacheKey {
    /// Validate and build a key.
    ///
    /// Subject ids may contain ASCII letters, digits and `-`; fingerprints may also contain `_`.
    /// Subject ids never contain `_`, so `<subject>_` is an unambiguous file-name prefix.
    pub fn new(subject: impl Into<String>, fingerprint: impl Into<String>) -> BoilResult<Self> {
        let subject = subject.into();
        let fingerprint = fingerprint.into();
        validate_subject(&subject)?;
        if fingerprint.is_empty()
            || !fingerprint
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(BoilError::validation(format!(
                "invalid content fingerprint '{fingerprint}'"
            )));
        }
        Ok(Self {
            subject,
            fingerprint,
        })
    }

    /// Subject id.
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Content fingerprint.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Deterministic file name, `<subject>_<fingerprint>.gif`.
    pub fn file_name(&self) -> String {
        format!("{}_{}.{ARTIFACT_EXT}", self.subject, self.fingerprint)
    }
}

pub(crate) fn validate_subject(subject: &str) -> BoilResult<()> {
    if subject.is_empty()
        || !subject
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
    {
        return Err(BoilError::validation(format!(
            "invalid subject id '{subject}'"
        )));
    }
    Ok(())
}

/// Directory-backed artifact cache holding at most one entry per subject.
///
/// There is no index file: the directory listing filtered by `<subject>_` is the index. No
/// locking is done; concurrent writers for one subject may both write, and the last purge
/// leaves a single entry.
#[derive(Clone, Debug)]
pub struct CacheStore {
    root: PathBuf,
}

impl CacheStore {
    /// Open (creating if needed) a cache rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> BoilResult<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|e| {
            BoilError::cache_io(format!(
                "failed to create cache directory '{}': {e}",
                root.display()
            ))
        })?;
        Ok(Self { root })
    }

    /// Cache directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where the artifact for `key` lives (whether or not it exists).
    pub fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.root.join(key.file_name())
    }

    /// Path of the cached artifact for `key`, if present.
    pub fn get_cached(&self, key: &CacheKey) -> Option<PathBuf> {
        self.cached_entry(key).map(|entry| entry.path)
    }

    /// Path and size of the cached artifact for `key`, both taken from one metadata read.
    pub fn cached_entry(&self, key: &CacheKey) -> Option<CachedEntry> {
        let path = self.path_for(key);
        match std::fs::metadata(&path) {
            Ok(meta) if meta.is_file() => Some(CachedEntry {
                path,
                size_bytes: meta.len(),
            }),
            _ => None,
        }
    }

    /// Persist `bytes` under `key`, then delete every other entry of the same subject.
    ///
    /// The write goes through a temporary file in the cache directory and a rename, so readers
    /// never see a partial artifact. Purge failures are logged and ignored.
    pub fn put_cached(&self, key: &CacheKey, bytes: &[u8]) -> BoilResult<PathBuf> {
        let path = self.path_for(key);

        let mut tmp = tempfile::Builder::new()
            .prefix(".tmp-")
            .tempfile_in(&self.root)
            .map_err(|e| BoilError::cache_io(format!("failed to create cache temp file: {e}")))?;
        tmp.write_all(bytes)
            .and_then(|()| tmp.flush())
            .map_err(|e| BoilError::cache_io(format!("failed to write cache entry: {e}")))?;
        tmp.persist(&path).map_err(|e| {
            BoilError::cache_io(format!(
                "failed to move cache entry into place at '{}': {}",
                path.display(),
                e.error
            ))
        })?;
        tracing::info!(path = %path.display(), bytes = bytes.len(), "saved to cache");

        self.purge_stale(key);
        Ok(path)
    }

    /// Live entries for `subject`, sorted by path.
    pub fn entries_for(&self, subject: &str) -> BoilResult<Vec<PathBuf>> {
        validate_subject(subject)?;
        let prefix = format!("{subject}_");
        let suffix = format!(".{ARTIFACT_EXT}");

        let dir = std::fs::read_dir(&self.root).map_err(|e| {
            BoilError::cache_io(format!(
                "failed to list cache directory '{}': {e}",
                self.root.display()
            ))
        })?;

        let mut out = Vec::new();
        for entry in dir {
            let entry = entry
                .map_err(|e| BoilError::cache_io(format!("failed to read cache entry: {e}")))?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if name.starts_with(&prefix) && name.ends_with(&suffix) {
                out.push(entry.path());
            }
        }
        out.sort();
        Ok(out)
    }

    fn purge_stale(&self, keep: &CacheKey) {
        let keep_path = self.path_for(keep);
        let entries = match self.entries_for(keep.subject()) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(error = %e, "failed to scan for stale cache entries");
                return;
            }
        };
        for old in entries.into_iter().filter(|p| *p != keep_path) {
            match std::fs::remove_file(&old) {
                Ok(()) => tracing::info!(path = %old.display(), "removed old cache entry"),
                Err(e) => tracing::warn!(
                    path = %old.display(),
                    error = %e,
                    "failed to remove old cache entry"
                ),
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/cache/store.rs"]
mod tests;
