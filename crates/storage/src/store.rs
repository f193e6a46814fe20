// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Path-safe filesystem primitives under a project root.

use crate::error::StorageError;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::UNIX_EPOCH;

/// Size and modification time of an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArtifactStat {
    pub size_bytes: u64,
    pub modified_at_ms: u64,
}

/// Typed read/write access to the project directory tree.
///
/// Every operation takes a project-relative path and resolves it under the
/// base directory; paths that would escape the base fail with
/// [`StorageError::PathEscape`] before any I/O. Writes to the same resolved
/// path are serialized; writes to different paths are not.
pub struct ArtifactStore {
    base: PathBuf,
    write_locks: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl ArtifactStore {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into(), write_locks: Mutex::new(HashMap::new()) }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Resolve a project-relative path, rejecting absolute paths and any
    /// component that could climb out of the base (`..`, root, prefixes).
    pub fn resolve(&self, rel: impl AsRef<Path>) -> Result<PathBuf, StorageError> {
        let rel = rel.as_ref();
        if rel.is_absolute() {
            return Err(StorageError::PathEscape { path: rel.display().to_string() });
        }
        let mut out = self.base.clone();
        for component in rel.components() {
            match component {
                Component::Normal(part) => out.push(part),
                Component::CurDir => {}
                _ => {
                    return Err(StorageError::PathEscape { path: rel.display().to_string() });
                }
            }
        }
        Ok(out)
    }

    /// Serialize `value` as pretty JSON at `rel`, creating parent directories.
    pub fn save_json(&self, rel: &str, value: &impl Serialize) -> Result<(), StorageError> {
        let path = self.resolve(rel)?;
        let bytes = serde_json::to_vec_pretty(value)
            .map_err(|source| StorageError::Json { path: rel.to_string(), source })?;

        let lock = self.write_lock_for(&path);
        let _guard = lock.lock();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|source| StorageError::Io { path: rel.to_string(), source })?;
        }
        std::fs::write(&path, bytes)
            .map_err(|source| StorageError::Io { path: rel.to_string(), source })
    }

    /// Read and deserialize JSON from `rel`.
    pub fn read_json<T: DeserializeOwned>(&self, rel: &str) -> Result<T, StorageError> {
        let path = self.resolve(rel)?;
        let bytes = std::fs::read(&path).map_err(|source| self.io_error(rel, source))?;
        serde_json::from_slice(&bytes)
            .map_err(|source| StorageError::Json { path: rel.to_string(), source })
    }

    /// Delete the artifact at `rel`. Deleting a missing file succeeds.
    pub fn delete(&self, rel: &str) -> Result<(), StorageError> {
        let path = self.resolve(rel)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Io { path: rel.to_string(), source }),
        }
    }

    pub fn exists(&self, rel: &str) -> Result<bool, StorageError> {
        Ok(self.resolve(rel)?.exists())
    }

    /// Entry names directly under `rel_dir`, sorted. A missing directory
    /// lists as empty.
    pub fn list(&self, rel_dir: &str) -> Result<Vec<String>, StorageError> {
        let dir = self.resolve(rel_dir)?;
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(StorageError::Io { path: rel_dir.to_string(), source }),
        };
        let mut names = Vec::new();
        for entry in entries {
            let entry =
                entry.map_err(|source| StorageError::Io { path: rel_dir.to_string(), source })?;
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }

    pub fn stat(&self, rel: &str) -> Result<ArtifactStat, StorageError> {
        let path = self.resolve(rel)?;
        let meta = std::fs::metadata(&path).map_err(|source| self.io_error(rel, source))?;
        let modified_at_ms = meta
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Ok(ArtifactStat { size_bytes: meta.len(), modified_at_ms })
    }

    fn write_lock_for(&self, path: &Path) -> Arc<Mutex<()>> {
        Arc::clone(
            self.write_locks
                .lock()
                .entry(path.to_path_buf())
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        )
    }

    fn io_error(&self, rel: &str, source: std::io::Error) -> StorageError {
        if source.kind() == std::io::ErrorKind::NotFound {
            StorageError::NotFound { path: rel.to_string() }
        } else {
            StorageError::Io { path: rel.to_string(), source }
        }
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
