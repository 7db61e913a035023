//! Pluggable storage backend for job inputs/outputs (spec §4.H), grounded on
//! `app/utils/s3_utils.py`'s minimal `fetch`/`upload` surface. The database
//! and the actual S3/object-store backend are out of scope for this CORE;
//! [`LocalFsStorage`] exists so the worker pipeline has something real to
//! drive against in tests and single-node deployments.

use async_trait::async_trait;
use mediaforge_core::Error;
use std::path::{Path, PathBuf};

/// Where a piece of media actually lives: either already on local disk, or
/// behind a `scheme://bucket/key`-shaped remote location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Local(PathBuf),
    Remote(String),
}

impl Location {
    pub fn remote(location: impl Into<String>) -> Self {
        Self::Remote(location.into())
    }
}

/// Backend reachability/identity snapshot, grounded on `StorageService`'s
/// per-backend `get_status()` used by the admin `/storage` endpoint.
#[derive(Debug, Clone, serde::Serialize)]
pub struct StorageStatus {
    pub healthy: bool,
    pub backend_type: &'static str,
    pub detail: Option<String>,
}

/// Backend-agnostic get/put surface a worker uses without knowing whether
/// it's talking to local disk or a remote object store.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Ensures the content at `location` is available as a local path,
    /// downloading it first if necessary, and returns that path.
    async fn get(&self, location: &Location) -> Result<PathBuf, Error>;

    /// Copies/uploads the local file at `local_path` to `location`.
    async fn put(&self, local_path: &Path, location: &Location) -> Result<(), Error>;

    /// Copies/uploads an entire local directory tree to `location`, used
    /// for multi-file outputs like HLS/DASH stream segments.
    async fn put_tree(&self, local_dir: &Path, location: &Location) -> Result<(), Error>;

    /// Removes the content at `location`, used by the admin cleanup sweep
    /// (grounded on `StorageService.backends[...].delete`). A location that
    /// is already absent is not an error.
    async fn delete(&self, location: &Location) -> Result<(), Error>;

    /// Reachability probe used by the admin storage-status surface; never
    /// returns `Err`; an unreachable backend reports `healthy: false`
    /// rather than failing the probe itself.
    async fn status(&self) -> StorageStatus;
}

/// A storage backend rooted at a local directory. Remote locations are
/// resolved relative to that root rather than actually reaching a network
/// object store; this is the backend single-node deployments and tests
/// use; a real object-store backend implements the same trait out of tree.
pub struct LocalFsStorage {
    root: PathBuf,
}

impl LocalFsStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, location: &Location) -> PathBuf {
        match location {
            Location::Local(path) => path.clone(),
            Location::Remote(key) => self.root.join(key.trim_start_matches('/')),
        }
    }
}

#[async_trait]
impl Storage for LocalFsStorage {
    async fn get(&self, location: &Location) -> Result<PathBuf, Error> {
        let path = self.resolve(location);
        if !tokio::fs::try_exists(&path)
            .await
            .map_err(|e| Error::storage(format!("failed checking {}: {e}", path.display())))?
        {
            return Err(Error::storage(format!("not found: {}", path.display())));
        }
        Ok(path)
    }

    async fn put(&self, local_path: &Path, location: &Location) -> Result<(), Error> {
        let dest = self.resolve(location);
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::storage(format!("failed creating {}: {e}", parent.display())))?;
        }
        tokio::fs::copy(local_path, &dest)
            .await
            .map_err(|e| Error::storage(format!("failed copying to {}: {e}", dest.display())))?;
        Ok(())
    }

    async fn put_tree(&self, local_dir: &Path, location: &Location) -> Result<(), Error> {
        let dest_root = self.resolve(location);
        tokio::fs::create_dir_all(&dest_root)
            .await
            .map_err(|e| Error::storage(format!("failed creating {}: {e}", dest_root.display())))?;

        let mut stack = vec![local_dir.to_path_buf()];
        while let Some(dir) = stack.pop() {
            let mut entries = tokio::fs::read_dir(&dir)
                .await
                .map_err(|e| Error::storage(format!("failed reading {}: {e}", dir.display())))?;
            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| Error::storage(format!("failed iterating {}: {e}", dir.display())))?
            {
                let path = entry.path();
                let relative = path.strip_prefix(local_dir).expect("entry is under local_dir");
                let dest = dest_root.join(relative);
                if path.is_dir() {
                    tokio::fs::create_dir_all(&dest)
                        .await
                        .map_err(|e| Error::storage(format!("failed creating {}: {e}", dest.display())))?;
                    stack.push(path);
                } else {
                    if let Some(parent) = dest.parent() {
                        tokio::fs::create_dir_all(parent)
                            .await
                            .map_err(|e| Error::storage(format!("failed creating {}: {e}", parent.display())))?;
                    }
                    tokio::fs::copy(&path, &dest)
                        .await
                        .map_err(|e| Error::storage(format!("failed copying to {}: {e}", dest.display())))?;
                }
            }
        }
        Ok(())
    }

    async fn delete(&self, location: &Location) -> Result<(), Error> {
        let path = self.resolve(location);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::storage(format!("failed deleting {}: {e}", path.display()))),
        }
    }

    async fn status(&self) -> StorageStatus {
        match tokio::fs::try_exists(&self.root).await {
            Ok(true) => StorageStatus { healthy: true, backend_type: "local_fs", detail: None },
            Ok(false) => StorageStatus {
                healthy: false,
                backend_type: "local_fs",
                detail: Some(format!("root does not exist: {}", self.root.display())),
            },
            Err(e) => StorageStatus { healthy: false, backend_type: "local_fs", detail: Some(e.to_string()) },
        }
    }
}
