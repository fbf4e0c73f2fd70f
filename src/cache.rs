//! Advisory result cache keyed by a content fingerprint of the scanned
//! snapshot.
//!
//! A record stores the full [`InferenceResult`] as JSON together with the
//! fingerprint and a format version. Any mismatch, corruption or I/O
//! failure degrades to a cache miss; writes go through a temp file and a
//! rename so concurrent invocations never observe a partial record.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use crate::models::InferenceResult;

/// Bumped when the record layout changes incompatibly; older records are
/// treated as misses.
const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct CacheRecord {
    format_version: u32,
    fingerprint: String,
    result: InferenceResult,
}

/// Stable hash over the full scanned snapshot content: every file's
/// relative path and bytes, in walk order. Prunes the same directories as
/// the detector so the two stay in agreement about what "the snapshot" is.
pub fn fingerprint(root: &Path) -> Result<String> {
    let mut hasher = Sha256::new();

    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !crate::detector::pruned(e));

    for entry in walker {
        let entry = entry.context("walking repository for fingerprint")?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(root)
            .unwrap_or(entry.path())
            .to_string_lossy()
            .replace('\\', "/");
        hasher.update(rel.as_bytes());
        hasher.update([0u8]);
        match fs::read(entry.path()) {
            Ok(bytes) => hasher.update(&bytes),
            Err(err) => debug!("unreadable during fingerprint: {}: {}", rel, err),
        }
        hasher.update([0u8]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

pub struct ResultCache {
    dir: PathBuf,
}

impl ResultCache {
    /// Cache under the platform cache directory, falling back to the
    /// system temp dir.
    pub fn open() -> Self {
        let dir = dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("depforge");
        Self { dir }
    }

    pub fn with_dir(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Look up a cached result. Every failure mode is a miss.
    pub fn get(&self, fingerprint: &str) -> Option<InferenceResult> {
        let path = self.record_path(fingerprint);
        let content = fs::read_to_string(&path).ok()?;
        let record: CacheRecord = match serde_json::from_str(&content) {
            Ok(record) => record,
            Err(err) => {
                warn!("corrupt cache record {}: {}", path.display(), err);
                return None;
            }
        };
        if record.format_version != FORMAT_VERSION || record.fingerprint != fingerprint {
            return None;
        }
        Some(record.result)
    }

    /// Store a result. Best-effort: failures are logged and swallowed so
    /// cache trouble never fails a scan.
    pub fn put(&self, fingerprint: &str, result: &InferenceResult) {
        if let Err(err) = self.try_put(fingerprint, result) {
            warn!("failed to write cache record: {}", err);
        }
    }

    fn try_put(&self, fingerprint: &str, result: &InferenceResult) -> Result<()> {
        fs::create_dir_all(&self.dir)?;

        let record = CacheRecord {
            format_version: FORMAT_VERSION,
            fingerprint: fingerprint.to_string(),
            result: result.clone(),
        };

        // Write-temp-then-rename keeps concurrent readers off partial
        // records.
        let tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        serde_json::to_writer(tmp.as_file(), &record)?;
        tmp.persist(self.record_path(fingerprint))?;
        Ok(())
    }

    fn record_path(&self, fingerprint: &str) -> PathBuf {
        self.dir.join(format!("{}.json", fingerprint))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DependencyMap, Ecosystem, InferenceResult, VersionSpec};
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn sample_result() -> InferenceResult {
        let mut dependencies = DependencyMap::new();
        dependencies.insert("numpy".to_string(), VersionSpec::Pinned("1.24.0".to_string()));
        InferenceResult {
            primary: Ecosystem::Python,
            dependencies,
            per_subdirectory: BTreeMap::new(),
            hidden: vec!["scipy".to_string()],
            conflicts: Vec::new(),
            insights: Vec::new(),
        }
    }

    #[test]
    fn test_put_get_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let cache = ResultCache::with_dir(tmp.path().join("cache"));
        let result = sample_result();

        cache.put("abc123", &result);
        let cached = cache.get("abc123").unwrap();

        assert_eq!(cached, result);
    }

    #[test]
    fn test_miss_on_unknown_fingerprint() {
        let tmp = TempDir::new().unwrap();
        let cache = ResultCache::with_dir(tmp.path().to_path_buf());
        assert!(cache.get("nope").is_none());
    }

    #[test]
    fn test_corrupt_record_is_a_miss() {
        let tmp = TempDir::new().unwrap();
        let cache = ResultCache::with_dir(tmp.path().to_path_buf());
        std::fs::write(tmp.path().join("bad.json"), "{not json").unwrap();
        assert!(cache.get("bad").is_none());
    }

    #[test]
    fn test_fingerprint_mismatch_is_a_miss() {
        let tmp = TempDir::new().unwrap();
        let cache = ResultCache::with_dir(tmp.path().to_path_buf());
        cache.put("first", &sample_result());

        // Rename the record under a different key: stale content must not
        // be served.
        std::fs::rename(
            tmp.path().join("first.json"),
            tmp.path().join("second.json"),
        )
        .unwrap();
        assert!(cache.get("second").is_none());
    }

    #[test]
    fn test_fingerprint_stability_and_invalidation() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("app.py"), "import numpy\n").unwrap();

        let first = fingerprint(tmp.path()).unwrap();
        let second = fingerprint(tmp.path()).unwrap();
        assert_eq!(first, second);

        std::fs::write(tmp.path().join("app.py"), "import pandas\n").unwrap();
        let third = fingerprint(tmp.path()).unwrap();
        assert_ne!(first, third);
    }

    #[test]
    fn test_fingerprint_ignores_pruned_directories() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("app.py"), "import numpy\n").unwrap();
        let before = fingerprint(tmp.path()).unwrap();

        let git = tmp.path().join(".git");
        std::fs::create_dir(&git).unwrap();
        std::fs::write(git.join("HEAD"), "ref: refs/heads/main\n").unwrap();

        let after = fingerprint(tmp.path()).unwrap();
        assert_eq!(before, after);
    }
}
