//! JSON snapshot persistence.
//!
//! Writes go to a sibling `*.tmp` file that is then renamed over the
//! target, so a reader never sees a half-written snapshot.

use std::path::{Path, PathBuf};

use sda_core::snapshot::EntitySnapshot;
use serde::Serialize;

use crate::error::WorkerError;

/// Read and validate the snapshot at `path`.
pub async fn load_snapshot(path: &Path) -> Result<EntitySnapshot, WorkerError> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| WorkerError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    let snapshot: EntitySnapshot = serde_json::from_str(&raw).map_err(|source| WorkerError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    snapshot.validate()?;
    Ok(snapshot)
}

pub async fn save_snapshot(path: &Path, snapshot: &EntitySnapshot) -> Result<(), WorkerError> {
    write_json_atomic(path, snapshot).await
}

/// Serialize `value` as pretty JSON and atomically replace `path` with it.
pub async fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), WorkerError> {
    let body = serde_json::to_vec_pretty(value).map_err(|source| WorkerError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    let tmp = temp_path(path);
    tokio::fs::write(&tmp, &body)
        .await
        .map_err(|source| WorkerError::Io {
            path: tmp.clone(),
            source,
        })?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|source| WorkerError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    tracing::debug!(path = %path.display(), bytes = body.len(), "JSON written");
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}
