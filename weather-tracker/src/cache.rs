use common::errors::AppError;
use common::http_client::RawDocument;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument, warn};
use utoipa::ToSchema;

use crate::location::CACHE_FILE_EXTENSION;

/// Documents at or below this size are treated as truncated.
pub const MIN_DOCUMENT_BYTES: u64 = 100;

/// Default freshness window: 20 minutes.
pub const DEFAULT_TTL_SECONDS: u64 = 20 * 60;

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Outcome of a bulk clear
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct ClearReport {
    pub removed: usize,
    pub failed: usize,
}

#[derive(Debug, Clone)]
pub struct CacheStore {
    dir: PathBuf,
    ttl: Duration,
}

impl CacheStore {
    pub fn with_ttl(dir: impl Into<PathBuf>, ttl_seconds: u64) -> Self {
        Self {
            dir: dir.into(),
            ttl: Duration::from_secs(ttl_seconds),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }

    /// Return the stored document if it exists, is younger than the
    /// freshness window, is longer than [`MIN_DOCUMENT_BYTES`] and looks
    /// like a JSON object. Every other outcome is `None`.
    #[instrument(skip(self), fields(cache_key = %key))]
    pub async fn read(&self, key: &str) -> Option<RawDocument> {
        let path = self.path_for(key);

        let metadata = match fs::metadata(&path).await {
            Ok(m) if m.is_file() => m,
            Ok(_) => {
                debug!("Cache slot is not a file");
                return None;
            }
            Err(_) => {
                debug!("Cache miss");
                return None;
            }
        };

        let modified = metadata.modified().ok()?;
        // A modification time in the future counts as brand new.
        let age = SystemTime::now()
            .duration_since(modified)
            .unwrap_or(Duration::ZERO);
        if age >= self.ttl {
            debug!(age_secs = age.as_secs(), "Cache entry stale");
            return None;
        }

        if metadata.len() <= MIN_DOCUMENT_BYTES {
            debug!(bytes = metadata.len(), "Cache entry too small");
            return None;
        }

        let text = match fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) => {
                debug!(error = %e, "Cache entry unreadable");
                return None;
            }
        };

        if !looks_like_json(&text) {
            debug!("Cache entry failed structural check");
            return None;
        }

        debug!(age_secs = age.as_secs(), "Cache hit");
        Some(text)
    }

    /// Persist `text` under `key`. The document is written to a temporary
    /// file, synced, then renamed over the slot, so readers see either the
    /// old document or the complete new one.
    #[instrument(skip(self, text), fields(cache_key = %key, bytes = text.len()))]
    pub async fn write(&self, key: &str, text: &str) -> Result<(), AppError> {
        fs::create_dir_all(&self.dir).await.map_err(|e| {
            AppError::cache(format!(
                "Failed to create cache directory {}: {}",
                self.dir.display(),
                e
            ))
        })?;

        let temp_path = self.dir.join(format!(
            ".{}.{}.{}.tmp",
            key,
            std::process::id(),
            TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));

        if let Err(e) = write_synced(&temp_path, text).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(AppError::cache(format!("Failed to write {}: {}", key, e)));
        }

        if let Err(e) = fs::rename(&temp_path, self.path_for(key)).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(AppError::cache(format!("Failed to replace {}: {}", key, e)));
        }

        info!("Wrote forecast to cache");
        Ok(())
    }

    /// Delete every cache file in the directory. Other files are left
    /// alone, and a failed delete does not stop the rest.
    #[instrument(skip(self), fields(dir = %self.dir.display()))]
    pub async fn clear_all(&self) -> ClearReport {
        let mut report = ClearReport::default();

        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) => {
                debug!(error = %e, "Cache directory not readable, nothing to clear");
                return report;
            }
        };

        let mut paths = Vec::new();
        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "Failed to list cache directory");
                    report.failed += 1;
                    break;
                }
            };

            let path = entry.path();
            let is_file = entry.file_type().await.map(|t| t.is_file()).unwrap_or(false);
            if is_file && is_cache_file(&path) {
                paths.push(path);
            }
        }

        remove_entries(paths, &mut report).await;

        info!(removed = report.removed, failed = report.failed, "Cache cleared");
        report
    }
}

/// Delete each path, counting failures without stopping.
async fn remove_entries(paths: impl IntoIterator<Item = PathBuf>, report: &mut ClearReport) {
    for path in paths {
        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!(file = %path.display(), "Deleted cache file");
                report.removed += 1;
            }
            Err(e) => {
                warn!(file = %path.display(), error = %e, "Failed to delete cache file");
                report.failed += 1;
            }
        }
    }
}

async fn write_synced(path: &Path, text: &str) -> std::io::Result<()> {
    let mut file = fs::File::create(path).await?;
    file.write_all(text.as_bytes()).await?;
    file.sync_all().await
}

fn is_cache_file(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(CACHE_FILE_EXTENSION)
}

/// Cheap sniff: the first non-blank line opens a JSON object.
pub fn looks_like_json(text: &str) -> bool {
    text.trim_start().starts_with('{')
}
