//! Per-session workspace management
//!
//! Every evaluation session gets its own directory under the configured
//! root, named with a random collision-resistant suffix so concurrent
//! sessions can never observe each other. The directory is removed on
//! every exit path: explicitly via `destroy`, or by the scoped `TempDir`
//! guard if the session unwinds before getting there. Repeated teardown
//! is safe.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tokio::fs;
use tracing::{debug, warn};

use crate::error::{EngineError, Result};
use crate::stores::TestCase;

/// Isolated working directory for one evaluation session
pub struct Workspace {
    dir: Option<TempDir>,
    path: PathBuf,
}

impl Workspace {
    /// Allocate a fresh workspace under `root`
    pub async fn create(root: &Path) -> Result<Self> {
        fs::create_dir_all(root)
            .await
            .map_err(|source| EngineError::WorkspaceCreate {
                root: root.to_path_buf(),
                source,
            })?;

        let dir = tempfile::Builder::new()
            .prefix("eval-")
            .tempdir_in(root)
            .map_err(|source| EngineError::WorkspaceCreate {
                root: root.to_path_buf(),
                source,
            })?;

        let path = dir.path().to_path_buf();
        debug!("Created workspace at {:?}", path);

        Ok(Self {
            dir: Some(dir),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Copy the submission source and materialize every test fixture.
    ///
    /// The source lands under the language's canonical file name; each test
    /// case's input becomes `input_{index}.txt`, consumed as stdin by the
    /// sandbox unit. Expected outputs stay in memory with the caller.
    pub async fn populate(
        &self,
        source_path: &Path,
        source_file_name: &str,
        test_cases: &[TestCase],
    ) -> Result<()> {
        let populate_err = |source| EngineError::WorkspacePopulate {
            path: self.path.clone(),
            source,
        };

        fs::copy(source_path, self.path.join(source_file_name))
            .await
            .map_err(populate_err)?;

        for tc in test_cases {
            fs::write(self.input_path(tc.index), &tc.input)
                .await
                .map_err(|source| EngineError::WorkspacePopulate {
                    path: self.path.clone(),
                    source,
                })?;
        }

        Ok(())
    }

    /// Path of the stdin fixture for a test case index
    pub fn input_path(&self, index: u32) -> PathBuf {
        self.path.join(format!("input_{}.txt", index))
    }

    /// Recursively remove the workspace. Idempotent: destroying a
    /// workspace that is already gone is not an error.
    pub async fn destroy(mut self) {
        if let Some(dir) = self.dir.take() {
            let path = dir.keep();
            match fs::remove_dir_all(&path).await {
                Ok(()) => debug!("Destroyed workspace at {:?}", path),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!("Failed to destroy workspace at {:?}: {}", path, e),
            }
        }
    }
}
