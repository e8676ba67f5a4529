use std::sync::Arc;

use super::{ObjectBackend, ObjectFile};
use crate::error::{Error, Result};
use crate::path::{self, ObjectPath, SEPARATOR};
use crate::resolver::Context;

/// A `/`-terminated key prefix treated as a directory
///
/// With `keep_directories_logical` (the default) such a directory always
/// exists and `create` is a no-op; otherwise existence means at least one
/// key under the prefix, and creation is unsupported.
#[derive(Debug, Clone)]
pub struct ObjectDirectory {
    location: ObjectPath,
    path: String,
    backend: ObjectBackend,
}

impl ObjectDirectory {
    pub(crate) fn new(location: ObjectPath, backend: ObjectBackend) -> Self {
        let path = location.to_full_path();
        Self {
            location,
            path,
            backend,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn location(&self) -> &ObjectPath {
        &self.location
    }

    /// Last key segment, or the bucket name at the bucket root
    pub fn basename(&self) -> &str {
        if self.location.key.is_empty() {
            &self.location.bucket
        } else {
            self.location.basename()
        }
    }

    pub(crate) fn context(&self) -> &Arc<Context> {
        self.backend.ctx()
    }

    fn logical(&self) -> bool {
        self.backend.ctx().settings.keep_directories_logical
    }

    pub fn join_as_file(&self, parts: &[&str]) -> Result<ObjectFile> {
        let relative = path::join_segments(parts)?;
        Ok(ObjectFile::new(
            self.location.join(&relative),
            self.backend.clone(),
        ))
    }

    pub fn join_as_directory(&self, parts: &[&str]) -> Result<ObjectDirectory> {
        let relative = path::join_segments(parts)?;
        Ok(ObjectDirectory::new(
            self.location.join(&format!("{relative}/")),
            self.backend.clone(),
        ))
    }

    pub fn as_prefix(&self) -> ObjectDirectoryPrefix {
        let key = self.location.key.trim_end_matches(SEPARATOR).to_string();
        ObjectDirectoryPrefix::new(self.location.with_key(key), self.backend.clone())
    }

    pub async fn exists(&self) -> Result<bool> {
        if self.logical() {
            return Ok(true);
        }
        self.has_objects().await
    }

    /// Whether any object is stored under this directory
    pub async fn has_objects(&self) -> Result<bool> {
        self.backend.has_objects(&self.location).await
    }

    pub async fn create(&self, _parents: bool, _exist_ok: bool) -> Result<()> {
        if self.logical() {
            return Ok(());
        }
        Err(Error::Unsupported(format!(
            "creating materialized directory '{}' in an object store",
            self.path
        )))
    }

    /// Full paths of the objects below this directory, in store order
    pub async fn list_files(&self, recursive: bool, limit: Option<usize>) -> Result<Vec<String>> {
        self.backend.list_paths(&self.location, recursive, limit).await
    }

    pub async fn list_file_objects(
        &self,
        recursive: bool,
        limit: Option<usize>,
    ) -> Result<Vec<ObjectFile>> {
        self.backend
            .list_entities(&self.location, recursive, limit)
            .await
    }

    pub async fn file_count(&self) -> Result<u64> {
        Ok(self.backend.stats(&self.location).await?.0)
    }

    pub async fn size(&self) -> Result<u64> {
        Ok(self.backend.stats(&self.location).await?.1)
    }

    /// Delete every object below this directory in batched requests
    ///
    /// Fails with `Error::PartialDelete` if any batch was not fully
    /// deleted; the other batches are still applied.
    pub async fn remove(&self, missing_ok: bool, dry_run: bool) -> Result<Vec<String>> {
        self.backend
            .remove_under(&self.location, self.logical(), missing_ok, dry_run)
            .await
    }
}

impl std::fmt::Display for ObjectDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.path)
    }
}

/// A raw key prefix without the trailing separator
///
/// Matches every key that starts with it, so `s3://bkt/data` covers both
/// `data/x.csv` and `data.csv`. It exists only while some key matches.
#[derive(Debug, Clone)]
pub struct ObjectDirectoryPrefix {
    location: ObjectPath,
    path: String,
    backend: ObjectBackend,
}

impl ObjectDirectoryPrefix {
    pub(crate) fn new(location: ObjectPath, backend: ObjectBackend) -> Self {
        let path = location.to_full_path();
        Self {
            location,
            path,
            backend,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn location(&self) -> &ObjectPath {
        &self.location
    }

    pub fn basename(&self) -> &str {
        if self.location.key.is_empty() {
            &self.location.bucket
        } else {
            self.location.basename()
        }
    }

    /// The directory obtained by appending `/`
    pub fn as_directory(&self) -> ObjectDirectory {
        let key = if self.location.key.is_empty() {
            String::new()
        } else {
            format!("{}/", self.location.key)
        };
        ObjectDirectory::new(self.location.with_key(key), self.backend.clone())
    }

    pub async fn exists(&self) -> Result<bool> {
        self.backend.has_objects(&self.location).await
    }

    pub async fn list_files(&self, recursive: bool, limit: Option<usize>) -> Result<Vec<String>> {
        self.backend.list_paths(&self.location, recursive, limit).await
    }

    pub async fn list_file_objects(
        &self,
        recursive: bool,
        limit: Option<usize>,
    ) -> Result<Vec<ObjectFile>> {
        self.backend
            .list_entities(&self.location, recursive, limit)
            .await
    }

    pub async fn file_count(&self) -> Result<u64> {
        Ok(self.backend.stats(&self.location).await?.0)
    }

    pub async fn size(&self) -> Result<u64> {
        Ok(self.backend.stats(&self.location).await?.1)
    }

    pub async fn remove(&self, missing_ok: bool, dry_run: bool) -> Result<Vec<String>> {
        self.backend
            .remove_under(&self.location, false, missing_ok, dry_run)
            .await
    }
}

impl std::fmt::Display for ObjectDirectoryPrefix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.path)
    }
}
