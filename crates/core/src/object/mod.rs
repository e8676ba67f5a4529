//! Object-store backend
//!
//! Keys are flat; directories are emulated with `/`-terminated prefixes.
//! Bucket and key are split once, when the resolver builds the entity.

mod delete;
mod directory;
mod file;
mod listing;

use std::fmt;
use std::sync::Arc;

use tracing::info;

pub use delete::{DeleteReport, remove_many};
pub use directory::{ObjectDirectory, ObjectDirectoryPrefix};
pub use file::ObjectFile;

use crate::entity::absent;
use crate::error::Result;
use crate::path::ObjectPath;
use crate::resolver::Context;
use crate::traits::{ObjectInfo, ObjectStore};

/// Store handle and settings shared by the object entities
#[derive(Clone)]
pub(crate) struct ObjectBackend {
    store: Arc<dyn ObjectStore>,
    ctx: Arc<Context>,
}

impl fmt::Debug for ObjectBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectBackend").finish_non_exhaustive()
    }
}

impl ObjectBackend {
    pub(crate) fn new(store: Arc<dyn ObjectStore>, ctx: Arc<Context>) -> Self {
        Self { store, ctx }
    }

    pub(crate) fn store(&self) -> &dyn ObjectStore {
        self.store.as_ref()
    }

    pub(crate) fn ctx(&self) -> &Arc<Context> {
        &self.ctx
    }

    pub(crate) async fn list(
        &self,
        prefix: &ObjectPath,
        recursive: bool,
        limit: Option<usize>,
    ) -> Result<Vec<ObjectInfo>> {
        listing::list_objects(
            self.store(),
            prefix,
            recursive,
            limit,
            self.ctx.settings.list_page_size,
            &self.ctx.cancel,
        )
        .await
    }

    /// Whether at least one object key starts with the prefix
    pub(crate) async fn has_objects(&self, prefix: &ObjectPath) -> Result<bool> {
        Ok(!self.list(prefix, true, Some(1)).await?.is_empty())
    }

    pub(crate) async fn list_paths(
        &self,
        prefix: &ObjectPath,
        recursive: bool,
        limit: Option<usize>,
    ) -> Result<Vec<String>> {
        Ok(self
            .list(prefix, recursive, limit)
            .await?
            .into_iter()
            .map(|item| prefix.with_key(item.key).to_full_path())
            .collect())
    }

    pub(crate) async fn list_entities(
        &self,
        prefix: &ObjectPath,
        recursive: bool,
        limit: Option<usize>,
    ) -> Result<Vec<ObjectFile>> {
        Ok(self
            .list(prefix, recursive, limit)
            .await?
            .into_iter()
            .map(|item| ObjectFile::new(prefix.with_key(item.key), self.clone()))
            .collect())
    }

    /// Object count and total bytes under the prefix
    pub(crate) async fn stats(&self, prefix: &ObjectPath) -> Result<(u64, u64)> {
        let items = self.list(prefix, true, None).await?;
        let bytes = items.iter().map(ObjectInfo::size).sum();
        Ok((items.len() as u64, bytes))
    }

    /// Delete every object under the prefix
    ///
    /// An empty prefix counts as missing unless `logical` says the
    /// directory exists regardless of its contents.
    pub(crate) async fn remove_under(
        &self,
        prefix: &ObjectPath,
        logical: bool,
        missing_ok: bool,
        dry_run: bool,
    ) -> Result<Vec<String>> {
        let keys: Vec<String> = self
            .list(prefix, true, None)
            .await?
            .into_iter()
            .map(|item| item.key)
            .collect();

        if keys.is_empty() {
            return if logical {
                Ok(Vec::new())
            } else {
                absent(&prefix.to_full_path(), missing_ok)
            };
        }

        if dry_run {
            let paths: Vec<String> = keys
                .iter()
                .map(|key| prefix.with_key(key.as_str()).to_full_path())
                .collect();
            for path in &paths {
                info!(path = %path, "Dry run: would remove");
            }
            return Ok(paths);
        }

        let deleted = remove_many(
            self.store(),
            &prefix.bucket,
            keys,
            &self.ctx.settings,
            &self.ctx.cancel,
        )
        .await?
        .into_result()?;

        info!(prefix = %prefix, deleted = deleted.len(), "Removed objects");
        Ok(deleted
            .into_iter()
            .map(|key| prefix.with_key(key).to_full_path())
            .collect())
    }
}
