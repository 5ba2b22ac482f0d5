//! Repository Acquirer: resolves a validated Git URL to a local directory tree, streaming
//! byte-level download progress and file-count extraction progress through caller-supplied
//! callbacks, with cache integration and path-traversal-safe ZIP extraction.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures_util::StreamExt;
use scanner_core::CoreError;
use tokio::fs::File as TokioFile;
use tokio::io::AsyncWriteExt;

use crate::cache::Cache;
use crate::url::{rewrite_to_zip_url, validate_git_url};

/// Callback invoked with the cumulative byte count after each chunk is read from the download
/// stream.
pub type DownloadProgressFn = dyn Fn(u64) + Send + Sync;
/// Callback invoked with `(entries_materialized, total_entries)` after each archive entry is
/// extracted.
pub type ExtractProgressFn = dyn Fn(u64, u64) + Send + Sync;

/// Resolves Git URLs to local directory trees. Downloads go through a per-instance
/// `reqwest::Client` so connection pooling is shared across repositories in the same group scan.
pub struct Acquirer {
    client: reqwest::Client,
    cache: Arc<Cache>,
    work_root: PathBuf,
}

impl Acquirer {
    #[must_use]
    pub fn new(cache: Arc<Cache>, work_root: PathBuf) -> Self {
        Self {
            client: reqwest::Client::new(),
            cache,
            work_root,
        }
    }

    /// Resolve `url` to a local directory. On a cache hit, returns the cached path without invoking
    /// either callback.
    pub async fn acquire(
        &self,
        url: &str,
        on_download_bytes: &DownloadProgressFn,
        on_extracted: &ExtractProgressFn,
    ) -> Result<PathBuf, CoreError> {
        validate_git_url(url).map_err(|e| CoreError::invalid_url(e.to_string()))?;

        if let Some(cached) = self.cache.get(url) {
            if cached.is_dir() {
                tracing::debug!(url, path = %cached.display(), "cache hit");
                return Ok(cached);
            }
        }

        let zip_url = rewrite_to_zip_url(url);
        let dest_dir = self.work_root.join(Self::slug_for(url));
        tokio::fs::create_dir_all(&dest_dir)
            .await
            .map_err(|e| CoreError::from_io_error(&e))?;

        tracing::info!(url, zip_url, "acquiring repository");
        let archive_path = dest_dir.with_extension("zip");
        self.download(&zip_url, &archive_path, on_download_bytes)
            .await?;
        self.extract(&archive_path, &dest_dir, on_extracted).await?;
        let _ = tokio::fs::remove_file(&archive_path).await;

        self.cache.insert(url.to_string(), dest_dir.clone());
        Ok(dest_dir)
    }

    /// Remove `path` if it is not currently cache-resident. Called by the Worker regardless of scan
    /// outcome.
    pub async fn cleanup(&self, path: &Path) -> Result<(), CoreError> {
        if self.cache.contains_path(path) {
            return Ok(());
        }
        if path.exists() {
            tokio::fs::remove_dir_all(path)
                .await
                .map_err(|e| CoreError::from_io_error(&e))?;
        }
        Ok(())
    }

    /// True iff `path` contains at least one regular file.
    #[must_use]
    pub fn validate_tree(path: &Path) -> bool {
        fn has_file(dir: &Path) -> bool {
            let Ok(entries) = std::fs::read_dir(dir) else {
                return false;
            };
            for entry in entries.flatten() {
                let Ok(file_type) = entry.file_type() else {
                    continue;
                };
                if file_type.is_file() {
                    return true;
                }
                if file_type.is_dir() && has_file(&entry.path()) {
                    return true;
                }
            }
            false
        }
        path.is_dir() && has_file(path)
    }

    async fn download(
        &self,
        url: &str,
        dest: &Path,
        on_bytes: &DownloadProgressFn,
    ) -> Result<(), CoreError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| CoreError::acquisition(format!("download_error: {e}")))?;

        if !response.status().is_success() {
            return Err(CoreError::acquisition(format!(
                "download_error: HTTP {}",
                response.status()
            )));
        }

        let mut file = TokioFile::create(dest)
            .await
            .map_err(|e| CoreError::from_io_error(&e))?;

        let mut downloaded: u64 = 0;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| CoreError::acquisition(format!("download_error: {e}")))?;
            file.write_all(&chunk)
                .await
                .map_err(|e| CoreError::from_io_error(&e))?;
            downloaded += chunk.len() as u64;
            on_bytes(downloaded);
        }
        file.flush().await.map_err(|e| CoreError::from_io_error(&e))?;
        Ok(())
    }

    async fn extract(
        &self,
        archive_path: &Path,
        dest_dir: &Path,
        on_extracted: &ExtractProgressFn,
    ) -> Result<(), CoreError> {
        let archive_path = archive_path.to_path_buf();
        let dest_dir = dest_dir.to_path_buf();

        // zip::ZipArchive is a blocking, synchronous API; run it on a
        // blocking thread and forward progress through a channel so the
        // caller still gets incremental callbacks.
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<(u64, u64)>();
        let extract_task = tokio::task::spawn_blocking(move || {
            extract_zip_blocking(&archive_path, &dest_dir, &tx)
        });

        while let Some((i, n)) = rx.recv().await {
            on_extracted(i, n);
        }

        extract_task
            .await
            .map_err(|e| CoreError::acquisition(format!("acquisition_error: {e}")))?
    }

    fn slug_for(url: &str) -> String {
        let digest = url
            .bytes()
            .fold(0xcbf2_9ce4_8422_2325u64, |hash, b| {
                (hash ^ u64::from(b)).wrapping_mul(0x100_0000_01b3)
            });
        format!("{digest:016x}")
    }
}

fn extract_zip_blocking(
    archive_path: &Path,
    dest_dir: &Path,
    progress: &tokio::sync::mpsc::UnboundedSender<(u64, u64)>,
) -> Result<(), CoreError> {
    let file = std::fs::File::open(archive_path).map_err(|e| CoreError::from_io_error(&e))?;
    let mut archive =
        zip::ZipArchive::new(file).map_err(|e| CoreError::acquisition(format!("acquisition_error: {e}")))?;

    let total = archive.len() as u64;
    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| CoreError::acquisition(format!("acquisition_error: {e}")))?;

        let Some(relative) = entry.enclosed_name() else {
            return Err(CoreError::acquisition(
                "acquisition_error: archive entry resolves outside the target directory"
                    .to_string(),
            ));
        };

        let out_path = dest_dir.join(relative);
        if entry.is_dir() {
            std::fs::create_dir_all(&out_path).map_err(|e| CoreError::from_io_error(&e))?;
        } else {
            if let Some(parent) = out_path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| CoreError::from_io_error(&e))?;
            }
            let mut out_file =
                std::fs::File::create(&out_path).map_err(|e| CoreError::from_io_error(&e))?;
            let mut buf = [0u8; 8192];
            loop {
                let n = entry.read(&mut buf).map_err(|e| CoreError::from_io_error(&e))?;
                if n == 0 {
                    break;
                }
                std::io::Write::write_all(&mut out_file, &buf[..n])
                    .map_err(|e| CoreError::from_io_error(&e))?;
            }
        }

        let _ = progress.send((i as u64 + 1, total));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn validate_tree_rejects_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!Acquirer::validate_tree(dir.path()));
    }

    #[test]
    fn validate_tree_accepts_nested_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub/a.txt"), b"hi").unwrap();
        assert!(Acquirer::validate_tree(dir.path()));
    }

    #[tokio::test]
    async fn cleanup_leaves_cache_resident_paths_alone() {
        let cache = Arc::new(Cache::new(10, Duration::from_secs(60)));
        let dir = tempfile::tempdir().unwrap();
        let kept = dir.path().join("kept");
        std::fs::create_dir_all(&kept).unwrap();
        cache.insert("https://example.com/a/b".to_string(), kept.clone());

        let acquirer = Acquirer::new(Arc::clone(&cache), dir.path().to_path_buf());
        acquirer.cleanup(&kept).await.unwrap();
        assert!(kept.exists());
    }
}
