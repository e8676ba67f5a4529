//! Staging directories for multi-step transfers
//!
//! Each acquisition creates a fresh, uniquely named directory under the
//! staging root. Creation uses `create_dir`, which fails on an existing
//! name, so a collision is retried with a new name instead of silently
//! sharing a directory with a concurrent transfer.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{Error, Result};

const STAGING_PREFIX: &str = "ufs-staging-";
const MAX_ATTEMPTS: usize = 16;

/// Source of staging directory names
pub trait NameSource: Send + Sync + fmt::Debug {
    fn next_name(&self) -> String;
}

/// Random v4 UUID names
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomNames;

impl NameSource for RandomNames {
    fn next_name(&self) -> String {
        uuid::Uuid::new_v4().simple().to_string()
    }
}

/// Factory for staging directories
#[derive(Debug, Clone)]
pub struct StagingArea {
    root: PathBuf,
    names: Arc<dyn NameSource>,
}

impl StagingArea {
    /// Stage under `root`, which is created on first use
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            names: Arc::new(RandomNames),
        }
    }

    /// Stage under the system temp directory
    pub fn system() -> Self {
        Self::new(std::env::temp_dir())
    }

    /// Replace the name source
    pub fn with_names(mut self, names: Arc<dyn NameSource>) -> Self {
        self.names = names;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create a new, empty staging directory
    pub async fn acquire(&self) -> Result<StagingDir> {
        tokio::fs::create_dir_all(&self.root).await?;

        for _ in 0..MAX_ATTEMPTS {
            let path = self
                .root
                .join(format!("{STAGING_PREFIX}{}", self.names.next_name()));
            match tokio::fs::create_dir(&path).await {
                Ok(()) => {
                    debug!(path = %path.display(), "Acquired staging directory");
                    return Ok(StagingDir {
                        path,
                        released: false,
                    });
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    debug!(path = %path.display(), "Staging name taken, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(Error::General(format!(
            "Could not allocate a staging directory under {} after {MAX_ATTEMPTS} attempts",
            self.root.display()
        )))
    }
}

impl Default for StagingArea {
    fn default() -> Self {
        Self::system()
    }
}

/// An acquired staging directory
///
/// Call [`StagingDir::release`] to remove it and observe failures. A guard
/// dropped without release (early return, panic, cancelled future) removes
/// the directory synchronously and logs any failure.
#[derive(Debug)]
pub struct StagingDir {
    path: PathBuf,
    released: bool,
}

impl StagingDir {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the directory and everything in it
    pub async fn release(mut self) -> Result<()> {
        self.released = true;
        match tokio::fs::remove_dir_all(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl Drop for StagingDir {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = std::fs::remove_dir_all(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %self.path.display(), error = %e, "Failed to remove staging directory");
            }
        }
    }
}
