//! Local filesystem backend

mod directory;
mod file;
pub(crate) mod walk;

use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

pub use directory::{LocalDirectory, LocalDirectoryPrefix};
pub use file::LocalFile;

use crate::error::{Error, Result};

/// Hidden sibling of `dst` that a write lands in before the final rename
pub(crate) fn partial_path(dst: &Path) -> PathBuf {
    let name = dst
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    dst.with_file_name(format!(".{name}.{}.partial", uuid::Uuid::new_v4().simple()))
}

/// Produce `dst` by writing a temporary sibling and renaming it into place
///
/// Missing parent directories are created first. On failure the temporary
/// file is removed and `dst` is left untouched.
pub(crate) async fn write_atomically<F, Fut, T>(dst: &Path, write: F) -> Result<T>
where
    F: FnOnce(PathBuf) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    if let Some(parent) = dst.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let partial = partial_path(dst);
    let result = match write(partial.clone()).await {
        Ok(value) => tokio::fs::rename(&partial, dst)
            .await
            .map(|()| value)
            .map_err(Error::from),
        Err(e) => Err(e),
    };

    if result.is_err() {
        if let Err(e) = tokio::fs::remove_file(&partial).await {
            if e.kind() != io::ErrorKind::NotFound {
                debug!(path = %partial.display(), error = %e, "Failed to remove partial file");
            }
        }
    }
    result
}

/// Run blocking filesystem work on the blocking pool
pub(crate) async fn run_blocking<F, T>(work: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| Error::General(format!("Blocking task failed: {e}")))?
}

/// Classify an I/O failure on `path`
pub(crate) fn io_error(err: io::Error, path: &str) -> Error {
    match err.kind() {
        io::ErrorKind::NotFound => Error::NotFound(path.to_string()),
        io::ErrorKind::PermissionDenied => Error::AccessDenied(path.to_string()),
        io::ErrorKind::AlreadyExists => Error::AlreadyExists(path.to_string()),
        _ => Error::Io(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_atomically_renames_into_place() {
        let dir = tempfile::tempdir().unwrap();
        let dst = dir.path().join("nested/out.txt");
        write_atomically(&dst, |partial| async move {
            tokio::fs::write(&partial, b"done").await?;
            Ok(())
        })
        .await
        .unwrap();

        assert_eq!(std::fs::read(&dst).unwrap(), b"done");
        assert_eq!(std::fs::read_dir(dir.path().join("nested")).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_write_atomically_leaves_nothing_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let dst = dir.path().join("out.txt");
        let result: Result<()> = write_atomically(&dst, |partial| async move {
            tokio::fs::write(&partial, b"half").await?;
            Err(Error::Network("connection reset".into()))
        })
        .await;

        assert!(matches!(result, Err(Error::Network(_))));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_io_error_classification() {
        let err = io_error(io::Error::from(io::ErrorKind::NotFound), "/tmp/x");
        assert!(err.is_not_found());
        let err = io_error(io::Error::from(io::ErrorKind::PermissionDenied), "/tmp/x");
        assert!(err.is_access_denied());
        let err = io_error(io::Error::other("disk on fire"), "/tmp/x");
        assert!(matches!(err, Error::Io(_)));
    }
}
