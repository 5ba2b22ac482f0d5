//! Atomic JSON status-file writes. Serialize to bytes -> write to `<path>.tmp` -> flush -> rename
//! `<path>.tmp` to `<path>`. Rename is atomic on the same filesystem, which is what lets
//! independent Worker processes and the Controller share the filesystem as an IPC substrate without
//! a lock.

use serde::Serialize;
use std::io;
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::CoreError;

/// Write `value` as 2-space-indented UTF-8 JSON to `path`, atomically.
pub async fn write_json_atomic<T: Serialize + Sync>(path: &Path, value: &T) -> Result<(), CoreError> {
    let bytes = serde_json::to_vec_pretty(value).map_err(|e| CoreError::internal(e.to_string()))?;
    write_bytes_atomic(path, &bytes).await
}

async fn write_bytes_atomic(path: &Path, bytes: &[u8]) -> Result<(), CoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| CoreError::from_io_error(&e))?;
    }

    let tmp_path = tmp_path_for(path);
    let mut file = fs::File::create(&tmp_path)
        .await
        .map_err(|e| CoreError::from_io_error(&e))?;
    file.write_all(bytes)
        .await
        .map_err(|e| CoreError::from_io_error(&e))?;
    file.flush().await.map_err(|e| CoreError::from_io_error(&e))?;
    drop(file);

    fs::rename(&tmp_path, path)
        .await
        .map_err(|e| CoreError::from_io_error(&e))?;
    Ok(())
}

fn tmp_path_for(path: &Path) -> std::path::PathBuf {
    let mut os = path.as_os_str().to_owned();
    os.push(".tmp");
    std::path::PathBuf::from(os)
}

/// Read and parse a JSON status file. Returns `Ok(None)` if it does not exist.
pub async fn read_json_opt<T: serde::de::DeserializeOwned>(
    path: &Path,
) -> Result<Option<T>, CoreError> {
    match fs::read(path).await {
        Ok(bytes) => {
            let value = serde_json::from_slice(&bytes).map_err(|e| CoreError::internal(e.to_string()))?;
            Ok(Some(value))
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(CoreError::from_io_error(&e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::tempdir;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Sample {
        value: u32,
    }

    #[tokio::test]
    async fn write_then_read_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("status.json");
        write_json_atomic(&path, &Sample { value: 42 }).await.unwrap();

        let read: Option<Sample> = read_json_opt(&path).await.unwrap();
        assert_eq!(read, Some(Sample { value: 42 }));
        assert!(!tmp_path_for(&path).exists());
    }

    #[tokio::test]
    async fn overwrite_replaces_contents_atomically() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("status.json");
        write_json_atomic(&path, &Sample { value: 1 }).await.unwrap();
        write_json_atomic(&path, &Sample { value: 2 }).await.unwrap();

        let read: Option<Sample> = read_json_opt(&path).await.unwrap();
        assert_eq!(read, Some(Sample { value: 2 }));
    }

    #[tokio::test]
    async fn missing_file_returns_none() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.json");
        let read: Option<Sample> = read_json_opt(&path).await.unwrap();
        assert_eq!(read, None);
    }
}
