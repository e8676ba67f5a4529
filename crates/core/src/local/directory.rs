use std::io;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use super::walk::{self, TreeStats};
use super::{LocalFile, io_error, run_blocking};
use crate::entity::absent;
use crate::error::{Error, Result};
use crate::path::{self, SEPARATOR};
use crate::resolver::Context;

/// A directory on the local filesystem; the path always ends with `/`
#[derive(Debug, Clone)]
pub struct LocalDirectory {
    path: String,
    ctx: Arc<Context>,
}

impl LocalDirectory {
    pub(crate) fn new(path: String, ctx: Arc<Context>) -> Self {
        Self { path, ctx }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn as_path(&self) -> &Path {
        Path::new(&self.path)
    }

    pub fn basename(&self) -> &str {
        path::basename(&self.path)
    }

    pub(crate) fn context(&self) -> &Arc<Context> {
        &self.ctx
    }

    pub fn join_as_file(&self, parts: &[&str]) -> Result<LocalFile> {
        let relative = path::join_segments(parts)?;
        Ok(LocalFile::new(
            format!("{}{relative}", self.path),
            self.ctx.clone(),
        ))
    }

    pub fn join_as_directory(&self, parts: &[&str]) -> Result<LocalDirectory> {
        let relative = path::join_segments(parts)?;
        Ok(LocalDirectory::new(
            format!("{}{relative}/", self.path),
            self.ctx.clone(),
        ))
    }

    /// The same location without the trailing separator
    pub fn as_prefix(&self) -> Result<LocalDirectoryPrefix> {
        let trimmed = self.path.trim_end_matches(SEPARATOR);
        if trimmed.is_empty() {
            return Err(Error::InvalidPath(
                "The filesystem root cannot be addressed as a prefix".into(),
            ));
        }
        Ok(LocalDirectoryPrefix::new(
            trimmed.to_string(),
            self.ctx.clone(),
        ))
    }

    pub async fn exists(&self) -> Result<bool> {
        match tokio::fs::metadata(&self.path).await {
            Ok(meta) => Ok(meta.is_dir()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(io_error(e, &self.path)),
        }
    }

    pub async fn create(&self, parents: bool, exist_ok: bool) -> Result<()> {
        if self.exists().await? {
            return if exist_ok {
                Ok(())
            } else {
                Err(Error::AlreadyExists(self.path.clone()))
            };
        }

        let created = if parents {
            tokio::fs::create_dir_all(&self.path).await
        } else {
            tokio::fs::create_dir(&self.path).await
        };
        match created {
            Ok(()) => {
                debug!(path = %self.path, "Created local directory");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists && exist_ok => Ok(()),
            Err(e) => Err(io_error(e, &self.path)),
        }
    }

    /// Absolute paths of the files below this directory, sorted
    ///
    /// A positive `limit` caps the traversal before sorting, so with
    /// `recursive` the result is some `limit` files rather than the
    /// lexicographically first ones.
    pub async fn list_files(&self, recursive: bool, limit: Option<usize>) -> Result<Vec<String>> {
        self.ctx.ensure_active()?;
        let root = self.path.clone();
        run_blocking(move || walk::walk_file_paths(Path::new(&root), recursive, limit)).await
    }

    pub async fn list_file_objects(
        &self,
        recursive: bool,
        limit: Option<usize>,
    ) -> Result<Vec<LocalFile>> {
        Ok(self
            .list_files(recursive, limit)
            .await?
            .into_iter()
            .map(|path| LocalFile::new(path, self.ctx.clone()))
            .collect())
    }

    pub async fn file_count(&self) -> Result<u64> {
        Ok(self.stats().await?.files)
    }

    /// Total size in bytes of every file below this directory
    pub async fn size(&self) -> Result<u64> {
        Ok(self.stats().await?.bytes)
    }

    /// Delete the directory and everything below it
    ///
    /// With `dry_run` every path that would be removed is logged and
    /// returned, children before parents. A real removal returns the
    /// directory itself.
    pub async fn remove(&self, missing_ok: bool, dry_run: bool) -> Result<Vec<String>> {
        if !self.exists().await? {
            return absent(&self.path, missing_ok);
        }

        if dry_run {
            let root = self.path.clone();
            let mut paths = run_blocking(move || walk::walk_all_contents_first(Path::new(&root))).await?;
            paths.push(self.path.clone());
            for path in &paths {
                info!(path = %path, "Dry run: would remove");
            }
            return Ok(paths);
        }

        match tokio::fs::remove_dir_all(&self.path).await {
            Ok(()) => {
                info!(path = %self.path, "Removed local directory");
                Ok(vec![self.path.clone()])
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => absent(&self.path, missing_ok),
            Err(e) => Err(io_error(e, &self.path)),
        }
    }

    async fn stats(&self) -> Result<TreeStats> {
        self.ctx.ensure_active()?;
        let root = self.path.clone();
        run_blocking(move || walk::tree_stats(Path::new(&root))).await
    }
}

impl std::fmt::Display for LocalDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.path)
    }
}

/// A local directory addressed without its trailing separator
///
/// The filesystem has no key-prefix matching, so every operation behaves
/// exactly as on the directory of the same name.
#[derive(Debug, Clone)]
pub struct LocalDirectoryPrefix {
    path: String,
    ctx: Arc<Context>,
}

impl LocalDirectoryPrefix {
    pub(crate) fn new(path: String, ctx: Arc<Context>) -> Self {
        Self { path, ctx }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn basename(&self) -> &str {
        path::basename(&self.path)
    }

    pub fn as_directory(&self) -> LocalDirectory {
        LocalDirectory::new(format!("{}/", self.path), self.ctx.clone())
    }

    pub async fn exists(&self) -> Result<bool> {
        self.as_directory().exists().await
    }

    pub async fn list_files(&self, recursive: bool, limit: Option<usize>) -> Result<Vec<String>> {
        self.as_directory().list_files(recursive, limit).await
    }

    pub async fn list_file_objects(
        &self,
        recursive: bool,
        limit: Option<usize>,
    ) -> Result<Vec<LocalFile>> {
        self.as_directory().list_file_objects(recursive, limit).await
    }

    pub async fn file_count(&self) -> Result<u64> {
        self.as_directory().file_count().await
    }

    pub async fn size(&self) -> Result<u64> {
        self.as_directory().size().await
    }

    pub async fn remove(&self, missing_ok: bool, dry_run: bool) -> Result<Vec<String>> {
        self.as_directory().remove(missing_ok, dry_run).await
    }
}

impl std::fmt::Display for LocalDirectoryPrefix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.path)
    }
}
