//! # Two-Tier Persistence
//!
//! The unload state of a project is saved as two independent JSON documents in the
//! project's state directory:
//!
//! | File | Contents |
//! |------|----------|
//! | [`LOADED_MODULES_FILE`] | Whether the engine was ever activated, plus the auto-managed loaded names |
//! | [`UNLOADED_MODULES_FILE`] | One [`UnloadedModuleEntity`] per unloaded module |
//!
//! The two documents never mention the same module. Each is written to a temporary
//! sibling first and then renamed into place, so a crash leaves either the old or the new
//! document behind. Missing files read back as an empty, inert project.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::model::UnloadedModuleEntity;

pub const LOADED_MODULES_FILE: &str = "loaded-modules.json";
pub const UNLOADED_MODULES_FILE: &str = "unloaded-modules.json";

/// Errors raised while reading or writing snapshots.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed snapshot {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// The loaded-tier document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadedModulesDocument {
    #[serde(default)]
    pub activated: bool,
    #[serde(default)]
    pub loaded_modules: BTreeSet<String>,
}

/// Both tiers as read from (or about to be written to) disk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistedProject {
    pub loaded: LoadedModulesDocument,
    pub unloaded: Vec<UnloadedModuleEntity>,
}

/// Reads and writes [`PersistedProject`]s under one directory.
#[derive(Debug, Clone)]
pub struct SnapshotStorage {
    dir: PathBuf,
}

impl SnapshotStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub async fn load(&self) -> Result<PersistedProject, StorageError> {
        let loaded: LoadedModulesDocument = read_json(&self.dir.join(LOADED_MODULES_FILE)).await?;
        let unloaded: Vec<UnloadedModuleEntity> =
            read_json(&self.dir.join(UNLOADED_MODULES_FILE)).await?;
        debug!(
            dir = %self.dir.display(),
            activated = loaded.activated,
            loaded = loaded.loaded_modules.len(),
            unloaded = unloaded.len(),
            "Snapshot loaded"
        );
        Ok(PersistedProject { loaded, unloaded })
    }

    pub async fn save(&self, project: &PersistedProject) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| StorageError::Io {
                path: self.dir.clone(),
                source,
            })?;
        write_json(&self.dir.join(LOADED_MODULES_FILE), &project.loaded).await?;
        write_json(&self.dir.join(UNLOADED_MODULES_FILE), &project.unloaded).await?;
        info!(
            dir = %self.dir.display(),
            loaded = project.loaded.loaded_modules.len(),
            unloaded = project.unloaded.len(),
            "Snapshot saved"
        );
        Ok(())
    }
}

async fn read_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T, StorageError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => return Ok(T::default()),
        Err(source) => {
            return Err(StorageError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    serde_json::from_slice(&bytes).map_err(|source| StorageError::Json {
        path: path.to_path_buf(),
        source,
    })
}

async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StorageError> {
    let bytes = serde_json::to_vec_pretty(value).map_err(|source| StorageError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, bytes)
        .await
        .map_err(|source| StorageError::Io {
            path: tmp.clone(),
            source,
        })?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|source| StorageError::Io {
            path: path.to_path_buf(),
            source,
        })
}
