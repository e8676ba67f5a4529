//! Path resolver
//!
//! The only way to obtain entities. The scheme picks the backend: a leading
//! `/` is local, `s3://` or `s3a://` is the object store, anything else is
//! rejected rather than defaulted.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::StorageSettings;
use crate::entity::{Directory, DirectoryPrefix, Entity, File};
use crate::error::{Error, Result};
use crate::local::{LocalDirectory, LocalDirectoryPrefix, LocalFile};
use crate::object::{ObjectBackend, ObjectDirectory, ObjectDirectoryPrefix, ObjectFile};
use crate::path::{ObjectPath, Role, Scheme, normalize_local, role_of, scheme_of};
use crate::traits::ObjectStore;
use crate::transfer::StagingArea;

/// Settings and shared handles every entity carries
#[derive(Debug, Clone)]
pub(crate) struct Context {
    pub(crate) settings: StorageSettings,
    pub(crate) staging: StagingArea,
    pub(crate) cancel: CancellationToken,
}

impl Context {
    /// Fail with `Error::Cancelled` once the token has fired
    pub(crate) fn ensure_active(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Builds entities from path strings
#[derive(Clone)]
pub struct Resolver {
    ctx: Arc<Context>,
    store: Option<Arc<dyn ObjectStore>>,
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("settings", &self.ctx.settings)
            .field("object_store", &self.store.is_some())
            .finish()
    }
}

impl Resolver {
    /// Create a resolver for local paths only
    ///
    /// Object-store paths fail with `Error::Unsupported` until a store is
    /// attached with [`Resolver::with_object_store`].
    pub fn new(settings: StorageSettings) -> Result<Self> {
        settings.validate()?;
        let staging = settings
            .staging_dir
            .clone()
            .map(StagingArea::new)
            .unwrap_or_default();
        Ok(Self {
            ctx: Arc::new(Context {
                settings,
                staging,
                cancel: CancellationToken::new(),
            }),
            store: None,
        })
    }

    pub fn with_object_store(mut self, store: Arc<dyn ObjectStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Replace the staging area used by archive pipelines
    pub fn with_staging(mut self, staging: StagingArea) -> Self {
        Arc::make_mut(&mut self.ctx).staging = staging;
        self
    }

    /// Share an externally owned cancellation token
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        Arc::make_mut(&mut self.ctx).cancel = cancel;
        self
    }

    /// Token that cancels every recursive operation started from this resolver
    pub fn cancellation_token(&self) -> CancellationToken {
        self.ctx.cancel.clone()
    }

    pub fn settings(&self) -> &StorageSettings {
        &self.ctx.settings
    }

    pub fn to_file(&self, path: &str) -> Result<File> {
        match scheme_of(path)? {
            Scheme::Local => Ok(File::Local(LocalFile::new(
                normalize_local(path, Role::File)?,
                self.ctx.clone(),
            ))),
            Scheme::Object(_) => {
                let location = self.object_path(path, Role::File)?;
                Ok(File::Object(ObjectFile::new(location, self.backend(path)?)))
            }
        }
    }

    /// Resolve `path` as a directory, appending `/` when missing
    pub fn to_directory(&self, path: &str) -> Result<Directory> {
        match scheme_of(path)? {
            Scheme::Local => Ok(Directory::Local(LocalDirectory::new(
                normalize_local(path, Role::Directory)?,
                self.ctx.clone(),
            ))),
            Scheme::Object(_) => {
                let location = self.object_path(path, Role::Directory)?;
                Ok(Directory::Object(ObjectDirectory::new(
                    location,
                    self.backend(path)?,
                )))
            }
        }
    }

    /// Resolve `path` as a directory prefix, stripping any trailing `/`
    pub fn to_directory_prefix(&self, path: &str) -> Result<DirectoryPrefix> {
        match scheme_of(path)? {
            Scheme::Local => Ok(DirectoryPrefix::Local(LocalDirectoryPrefix::new(
                normalize_local(path, Role::DirectoryPrefix)?,
                self.ctx.clone(),
            ))),
            Scheme::Object(_) => {
                let location = self.object_path(path, Role::DirectoryPrefix)?;
                Ok(DirectoryPrefix::Object(ObjectDirectoryPrefix::new(
                    location,
                    self.backend(path)?,
                )))
            }
        }
    }

    /// Resolve by trailing separator: `/`-terminated paths and bare buckets
    /// are directories, everything else a file
    pub fn resolve(&self, path: &str) -> Result<Entity> {
        let entity = match role_of(path) {
            Role::Directory => Entity::Directory(self.to_directory(path)?),
            _ if is_bucket_root(path) => Entity::Directory(self.to_directory(path)?),
            _ => Entity::File(self.to_file(path)?),
        };
        debug!(path, role = ?entity.role(), "Resolved path");
        Ok(entity)
    }

    fn object_path(&self, path: &str, role: Role) -> Result<ObjectPath> {
        ObjectPath::parse(path, self.ctx.settings.protocol, role)
    }

    fn backend(&self, path: &str) -> Result<ObjectBackend> {
        let store = self.store.clone().ok_or_else(|| {
            Error::Unsupported(format!(
                "'{path}' addresses an object store, but none is configured"
            ))
        })?;
        Ok(ObjectBackend::new(store, self.ctx.clone()))
    }
}

fn is_bucket_root(path: &str) -> bool {
    crate::path::Protocol::strip(path.trim())
        .is_some_and(|(_, rest)| !rest.is_empty() && !rest.contains(crate::path::SEPARATOR))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::path::Protocol;

    fn resolver() -> Resolver {
        Resolver::new(StorageSettings::default())
            .unwrap()
            .with_object_store(Arc::new(MemoryStore::new()))
    }

    #[test]
    fn test_scheme_selects_backend() {
        let r = resolver();
        assert!(matches!(r.to_file("/tmp/a.txt").unwrap(), File::Local(_)));
        assert!(matches!(r.to_file("s3://bkt/a.txt").unwrap(), File::Object(_)));
        assert!(matches!(r.to_file("s3a://bkt/a.txt").unwrap(), File::Object(_)));
        assert!(matches!(
            r.to_file("gs://bkt/a.txt"),
            Err(Error::UnrecognizedScheme(_))
        ));
        assert!(matches!(
            r.to_directory("tmp/dir"),
            Err(Error::UnrecognizedScheme(_))
        ));
    }

    #[test]
    fn test_role_conventions() {
        let r = resolver();
        assert_eq!(r.to_directory("/tmp/src").unwrap().path(), "/tmp/src/");
        assert_eq!(r.to_directory_prefix("/tmp/src/").unwrap().path(), "/tmp/src");
        assert_eq!(r.to_directory("s3://bkt/data").unwrap().path(), "s3://bkt/data/");
        assert_eq!(
            r.to_directory_prefix("s3://bkt/data/").unwrap().path(),
            "s3://bkt/data"
        );
        assert!(matches!(r.to_file("/tmp/dir/"), Err(Error::InvalidPath(_))));
        assert!(matches!(r.to_file("s3://bkt/dir/"), Err(Error::InvalidPath(_))));
    }

    #[test]
    fn test_object_paths_use_canonical_protocol() {
        let settings = StorageSettings {
            protocol: Protocol::S3a,
            ..Default::default()
        };
        let r = Resolver::new(settings)
            .unwrap()
            .with_object_store(Arc::new(MemoryStore::new()));
        assert_eq!(r.to_file("s3://bkt/k").unwrap().path(), "s3a://bkt/k");
        assert_eq!(r.to_file("s3a://bkt/k").unwrap().to_string(), "s3a://bkt/k");
    }

    #[test]
    fn test_object_path_without_store_is_unsupported() {
        let r = Resolver::new(StorageSettings::default()).unwrap();
        assert!(matches!(
            r.to_file("s3://bkt/a.txt"),
            Err(Error::Unsupported(_))
        ));
        // validation still runs first
        assert!(matches!(
            r.to_file("s3://bkt/dir/"),
            Err(Error::InvalidPath(_))
        ));
    }

    #[test]
    fn test_resolve_by_trailing_separator() {
        let r = resolver();
        assert_eq!(r.resolve("/tmp/a.txt").unwrap().role(), Role::File);
        assert_eq!(r.resolve("/tmp/dir/").unwrap().role(), Role::Directory);
        assert_eq!(r.resolve("s3://bkt/data/").unwrap().role(), Role::Directory);
        assert_eq!(r.resolve("s3://bkt").unwrap().role(), Role::Directory);
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let settings = StorageSettings {
            concurrency: 0,
            ..Default::default()
        };
        assert!(matches!(Resolver::new(settings), Err(Error::Config(_))));
    }

    #[test]
    fn test_cancellation_token_is_shared() {
        let token = CancellationToken::new();
        let r = resolver().with_cancellation(token.clone());
        token.cancel();
        assert!(r.cancellation_token().is_cancelled());
    }
}
