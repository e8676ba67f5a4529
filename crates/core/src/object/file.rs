use tracing::{debug, info};

use super::{ObjectBackend, ObjectDirectory};
use crate::checksum::{self, ChecksumAlgorithm};
use crate::entity::{WriteMode, absent};
use crate::error::{Error, Result};
use crate::path::ObjectPath;
use crate::traits::{ObjectInfo, ObjectStore};

/// A single object addressed by bucket and key
#[derive(Debug, Clone)]
pub struct ObjectFile {
    location: ObjectPath,
    path: String,
    backend: ObjectBackend,
}

impl ObjectFile {
    pub(crate) fn new(location: ObjectPath, backend: ObjectBackend) -> Self {
        let path = location.to_full_path();
        Self {
            location,
            path,
            backend,
        }
    }

    /// Full path with the canonical scheme
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn location(&self) -> &ObjectPath {
        &self.location
    }

    pub fn basename(&self) -> &str {
        self.location.basename()
    }

    /// Directory holding this object
    pub fn parent(&self) -> ObjectDirectory {
        let parent = self
            .location
            .parent()
            .unwrap_or_else(|| self.location.with_key(""));
        ObjectDirectory::new(parent, self.backend.clone())
    }

    pub(crate) fn store(&self) -> &dyn ObjectStore {
        self.backend.store()
    }

    /// Object metadata
    ///
    /// Tries HEAD first. Only when HEAD is rejected as access-denied does it
    /// fall back to a GET, reading the reported length and dropping the
    /// body. Every other failure, not-found included, is returned unchanged.
    pub async fn metadata(&self) -> Result<ObjectInfo> {
        match self.store().head_object(&self.location).await {
            Err(Error::AccessDenied(reason)) => {
                debug!(path = %self.path, %reason, "HEAD denied, falling back to GET");
                self.store().fetch_object_info(&self.location).await
            }
            other => other,
        }
    }

    /// Whether the object exists; only not-found maps to `false`
    pub async fn exists(&self) -> Result<bool> {
        match self.metadata().await {
            Ok(_) => Ok(true),
            Err(Error::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub async fn size(&self) -> Result<u64> {
        Ok(self.metadata().await?.size())
    }

    pub async fn read_bytes(&self) -> Result<Vec<u8>> {
        self.store().get_object(&self.location).await
    }

    pub async fn read_text(&self) -> Result<String> {
        String::from_utf8(self.read_bytes().await?)
            .map_err(|_| Error::General(format!("'{}' is not valid UTF-8", self.path)))
    }

    /// Replace the object's content
    ///
    /// Objects are immutable, so `WriteMode::Append` is unsupported.
    pub async fn write_bytes(&self, data: &[u8], mode: WriteMode) -> Result<()> {
        if mode == WriteMode::Append {
            return Err(Error::Unsupported(format!(
                "appending to object '{}'",
                self.path
            )));
        }
        let info = self.store().put_object(&self.location, data.to_vec()).await?;
        debug!(path = %self.path, bytes = info.size(), "Wrote object");
        Ok(())
    }

    /// Create an empty object if none exists
    ///
    /// An existing object is left untouched; the store has no way to bump
    /// its modification time without rewriting it.
    pub async fn touch(&self, exist_ok: bool) -> Result<()> {
        if self.exists().await? {
            return if exist_ok {
                Ok(())
            } else {
                Err(Error::AlreadyExists(self.path.clone()))
            };
        }
        self.store().put_object(&self.location, Vec::new()).await?;
        Ok(())
    }

    /// Delete the object
    ///
    /// A single-object delete succeeds on a missing key, so existence is
    /// checked first whenever the caller needs to know.
    pub async fn remove(&self, missing_ok: bool, dry_run: bool) -> Result<Vec<String>> {
        if (dry_run || !missing_ok) && !self.exists().await? {
            return absent(&self.path, missing_ok);
        }

        if dry_run {
            info!(path = %self.path, "Dry run: would remove");
            return Ok(vec![self.path.clone()]);
        }

        self.store().delete_object(&self.location).await?;
        debug!(path = %self.path, "Removed object");
        Ok(vec![self.path.clone()])
    }

    pub async fn checksum(&self, algorithm: ChecksumAlgorithm) -> Result<String> {
        let data = self.read_bytes().await?;
        Ok(checksum::digest(algorithm, &data))
    }
}

impl std::fmt::Display for ObjectFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.path)
    }
}
