//! Scoped per-job temporary workspace, grounded on
//! `ResourceManager.create_temp_directory` / `cleanup_temp_resources`
//! (spec §4.H "create a scoped temporary workspace" / "guaranteed cleanup
//! on all exit paths").
//!
//! Unlike the original's tracked-list-plus-explicit-cleanup-call, this ties
//! the directory's lifetime to the `Workspace` value itself: `Drop` removes
//! it, so every exit path (success, error, panic unwind) cleans up without
//! a `finally` block.

use mediaforge_core::Error;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn new() -> Result<Self, Error> {
        let dir = tempfile::Builder::new()
            .prefix("mediaforge_")
            .tempdir()
            .map_err(|e| Error::internal(format!("failed to create workspace: {e}")))?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn join(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workspace_directory_exists_while_alive() {
        let workspace = Workspace::new().unwrap();
        assert!(workspace.path().exists());
    }

    #[test]
    fn workspace_directory_is_removed_on_drop() {
        let workspace = Workspace::new().unwrap();
        let path = workspace.path().to_path_buf();
        drop(workspace);
        assert!(!path.exists());
    }

    #[test]
    fn join_returns_path_under_workspace_root() {
        let workspace = Workspace::new().unwrap();
        let joined = workspace.join("input.mp4");
        assert_eq!(joined.parent().unwrap(), workspace.path());
    }
}
