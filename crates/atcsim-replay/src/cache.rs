//! On-disk cache of ingested datasets.
//!
//! Entries are JSON files named after a hash of their key. The key is also
//! stored inside the entry and compared on load, so a hash collision or a
//! stale file is a miss rather than a different time slice.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::Result;
use crate::ingest::{IngestOptions, ReplayDataset};
use crate::source::{ReplayRequest, SourceType};

/// Everything that determines the content of an ingested dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheKey {
    pub source_type: SourceType,
    /// Canonical dataset path when resolvable.
    pub dataset: String,
    pub start_time: f64,
    pub resample_secs: Option<f64>,
}

impl CacheKey {
    pub fn new(request: &ReplayRequest, options: &IngestOptions) -> Self {
        let dataset = fs::canonicalize(&request.dataset).unwrap_or_else(|_| request.dataset.clone());
        Self {
            source_type: request.source_type,
            dataset: dataset.to_string_lossy().into_owned(),
            start_time: request.start_time,
            resample_secs: options.resample_secs,
        }
    }

    /// First 16 hex digits of a SHA-256 over the key fields. Stable across
    /// builds and platforms.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.source_type.to_string().as_bytes());
        hasher.update([0]);
        hasher.update(self.dataset.as_bytes());
        hasher.update([0]);
        hasher.update(self.start_time.to_bits().to_le_bytes());
        match self.resample_secs {
            Some(cadence) => {
                hasher.update([1]);
                hasher.update(cadence.to_bits().to_le_bytes());
            }
            None => hasher.update([0]),
        }
        let full = format!("{:x}", hasher.finalize());
        full[..16].to_string()
    }

    /// `<dataset name>-<source>-<digest>.json`
    pub fn file_name(&self) -> String {

        let stem: String = Path::new(&self.dataset)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        format!("{stem}-{}-{}.json", self.source_type, self.digest())
    }
}

#[derive(Serialize, Deserialize)]
struct CacheEntry {
    key: CacheKey,
    dataset: ReplayDataset,
}

#[derive(Debug, Clone)]
pub struct ReplayCache {
    dir: PathBuf,
}

impl ReplayCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(key.file_name())
    }

    /// Cached dataset for `key`, or `None` on any miss.
    pub fn load(&self, key: &CacheKey) -> Option<ReplayDataset> {
        let path = self.path_for(key);
        let text = fs::read_to_string(&path).ok()?;
        match serde_json::from_str::<CacheEntry>(&text) {
            Ok(entry) if entry.key == *key => Some(entry.dataset),
            Ok(_) => {
                debug!(path = %path.display(), "replay cache key mismatch");
                None
            }
            Err(e) => {
                debug!(path = %path.display(), error = %e, "unreadable replay cache entry");
                None
            }
        }
    }

    /// Write an entry, replacing any previous one atomically.
    pub fn store(&self, key: &CacheKey, dataset: &ReplayDataset) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");

        let entry = CacheEntry {
            key: key.clone(),
            dataset: dataset.clone(),
        };
        fs::write(&tmp, serde_json::to_vec(&entry)?)?;
        fs::rename(&tmp, &path)?;
        Ok(path)
    }
}
