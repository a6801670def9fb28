use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result};
use tracing::debug;

use super::{Bucket, CacheError, CachedData};

/// Directory under the cache root holding one JSON file per bucket
const BUCKETS_DIR: &str = "buckets";

/// File naming the bucket label currently serving requests
const ACTIVE_FILE: &str = "ACTIVE";

/// Persistence for cache buckets.
///
/// `commit` replaces a bucket atomically from the caller's point of view:
/// readers see either the previous contents or the new ones.
pub trait CacheStorage: Send + Sync {
    /// Labels of every stored bucket
    fn labels(&self) -> Result<Vec<String>>;

    fn load(&self, label: &str) -> Result<Option<CachedData<Bucket>>>;

    fn commit(&self, bucket: &Bucket) -> Result<()>;

    /// Returns true if a bucket was removed
    fn delete(&self, label: &str) -> Result<bool>;

    fn active_label(&self) -> Result<Option<String>>;

    fn set_active_label(&self, label: &str) -> Result<()>;
}

/// Labels become file names, so keep them to a conservative character set.
pub fn validate_label(label: &str) -> Result<(), CacheError> {
    let valid = !label.is_empty()
        && label.len() <= 64
        && label
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
        && label != "."
        && label != "..";
    if valid {
        Ok(())
    } else {
        Err(CacheError::InvalidLabel(label.to_string()))
    }
}

// ============================================================================
// Disk storage
// ============================================================================

pub struct DiskStorage {
    cache_dir: PathBuf,
}

impl DiskStorage {
    pub fn new(cache_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(cache_dir.join(BUCKETS_DIR))
            .with_context(|| format!("Failed to create cache directory {}", cache_dir.display()))?;
        Ok(Self { cache_dir })
    }

    fn bucket_path(&self, label: &str) -> PathBuf {
        self.cache_dir.join(BUCKETS_DIR).join(format!("{}.json", label))
    }

    fn active_path(&self) -> PathBuf {
        self.cache_dir.join(ACTIVE_FILE)
    }
}

impl CacheStorage for DiskStorage {
    fn labels(&self) -> Result<Vec<String>> {
        let dir = self.cache_dir.join(BUCKETS_DIR);
        let mut labels = Vec::new();
        for entry in std::fs::read_dir(&dir)
            .with_context(|| format!("Failed to list {}", dir.display()))?
        {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                labels.push(stem.to_string());
            }
        }
        labels.sort();
        Ok(labels)
    }

    fn load(&self, label: &str) -> Result<Option<CachedData<Bucket>>> {
        validate_label(label)?;
        let path = self.bucket_path(label);
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read cache bucket: {}", label))?;

        let cached: CachedData<Bucket> = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse cache bucket: {}", label))?;

        Ok(Some(cached))
    }

    fn commit(&self, bucket: &Bucket) -> Result<()> {
        validate_label(&bucket.label)?;
        let cached = CachedData::new(bucket);
        let path = self.bucket_path(&bucket.label);
        // Write to a sibling file and rename so a crash never leaves a partial bucket
        let tmp = path.with_extension("json.tmp");
        let contents = serde_json::to_string(&cached)?;
        std::fs::write(&tmp, contents)
            .with_context(|| format!("Failed to write cache bucket: {}", bucket.label))?;
        std::fs::rename(&tmp, &path)
            .with_context(|| format!("Failed to commit cache bucket: {}", bucket.label))?;
        debug!(label = %bucket.label, entries = bucket.len(), "Committed bucket to disk");
        Ok(())
    }

    fn delete(&self, label: &str) -> Result<bool> {
        validate_label(label)?;
        let path = self.bucket_path(label);
        if !path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(&path)
            .with_context(|| format!("Failed to delete cache bucket: {}", label))?;
        Ok(true)
    }

    fn active_label(&self) -> Result<Option<String>> {
        let path = self.active_path();
        if !path.exists() {
            return Ok(None);
        }
        let label = std::fs::read_to_string(&path).context("Failed to read active cache label")?;
        let label = label.trim();
        Ok((!label.is_empty()).then(|| label.to_string()))
    }

    fn set_active_label(&self, label: &str) -> Result<()> {
        validate_label(label)?;
        std::fs::write(self.active_path(), label).context("Failed to write active cache label")?;
        Ok(())
    }
}

// ============================================================================
// Memory storage
// ============================================================================

#[derive(Default)]
pub struct MemoryStorage {
    buckets: Mutex<HashMap<String, CachedData<Bucket>>>,
    active: Mutex<Option<String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn buckets(&self) -> MutexGuard<'_, HashMap<String, CachedData<Bucket>>> {
        self.buckets.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn active(&self) -> MutexGuard<'_, Option<String>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CacheStorage for MemoryStorage {
    fn labels(&self) -> Result<Vec<String>> {
        let mut labels: Vec<String> = self.buckets().keys().cloned().collect();
        labels.sort();
        Ok(labels)
    }

    fn load(&self, label: &str) -> Result<Option<CachedData<Bucket>>> {
        Ok(self.buckets().get(label).cloned())
    }

    fn commit(&self, bucket: &Bucket) -> Result<()> {
        self.buckets()
            .insert(bucket.label.clone(), CachedData::new(bucket.clone()));
        Ok(())
    }

    fn delete(&self, label: &str) -> Result<bool> {
        Ok(self.buckets().remove(label).is_some())
    }

    fn active_label(&self) -> Result<Option<String>> {
        Ok(self.active().clone())
    }

    fn set_active_label(&self, label: &str) -> Result<()> {
        *self.active() = Some(label.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Request, Response};

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "darkkokan-storage-{}-{}",
            name,
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    fn sample_bucket(label: &str) -> Bucket {
        let mut bucket = Bucket::new(label);
        bucket.put(&Request::get("/index.html"), Response::new(200, "<html></html>"));
        bucket
    }

    #[test]
    fn test_validate_label() {
        assert!(validate_label("v1").is_ok());
        assert!(validate_label("v2.0-beta_1").is_ok());
        assert!(validate_label("").is_err());
        assert!(validate_label("..").is_err());
        assert!(validate_label("../etc").is_err());
        assert!(validate_label("a/b").is_err());
    }

    #[test]
    fn test_disk_storage_commit_load_delete() {
        let dir = scratch_dir("roundtrip");
        let storage = DiskStorage::new(dir.clone()).expect("create storage");

        assert!(storage.load("v1").expect("load").is_none());
        storage.commit(&sample_bucket("v1")).expect("commit");
        storage.commit(&sample_bucket("v2")).expect("commit");

        assert_eq!(storage.labels().expect("labels"), vec!["v1", "v2"]);
        let loaded = storage.load("v1").expect("load").expect("bucket present");
        assert_eq!(loaded.data, sample_bucket("v1"));

        assert!(storage.delete("v1").expect("delete"));
        assert!(!storage.delete("v1").expect("delete again"));
        assert_eq!(storage.labels().expect("labels"), vec!["v2"]);

        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_disk_storage_active_label() {
        let dir = scratch_dir("active");
        let storage = DiskStorage::new(dir.clone()).expect("create storage");

        assert_eq!(storage.active_label().expect("read"), None);
        storage.set_active_label("v3").expect("write");
        assert_eq!(storage.active_label().expect("read"), Some("v3".to_string()));
        assert!(storage.set_active_label("../v3").is_err());

        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_disk_storage_ignores_stray_files() {
        let dir = scratch_dir("stray");
        let storage = DiskStorage::new(dir.clone()).expect("create storage");
        std::fs::write(dir.join(BUCKETS_DIR).join("notes.txt"), "x").expect("write stray");
        storage.commit(&sample_bucket("v1")).expect("commit");

        assert_eq!(storage.labels().expect("labels"), vec!["v1"]);

        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_memory_storage_roundtrip() {
        let storage = MemoryStorage::new();
        storage.commit(&sample_bucket("v1")).expect("commit");
        assert_eq!(storage.labels().expect("labels"), vec!["v1"]);
        assert!(storage.delete("v1").expect("delete"));
        assert!(storage.labels().expect("labels").is_empty());
    }
}
