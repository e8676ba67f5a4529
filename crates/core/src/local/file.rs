use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::SystemTime;

use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use super::{LocalDirectory, io_error, run_blocking};
use crate::checksum::{self, ChecksumAlgorithm};
use crate::entity::{WriteMode, absent};
use crate::error::{Error, Result};
use crate::path;
use crate::resolver::Context;

/// A regular file on the local filesystem
#[derive(Debug, Clone)]
pub struct LocalFile {
    path: String,
    ctx: Arc<Context>,
}

impl LocalFile {
    pub(crate) fn new(path: String, ctx: Arc<Context>) -> Self {
        Self { path, ctx }
    }

    /// Absolute path
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn as_path(&self) -> &Path {
        Path::new(&self.path)
    }

    pub fn basename(&self) -> &str {
        path::basename(&self.path)
    }

    /// Directory holding this file
    pub fn parent(&self) -> LocalDirectory {
        let end = self.path.rfind(path::SEPARATOR).map_or(0, |pos| pos + 1);
        LocalDirectory::new(self.path[..end].to_string(), self.ctx.clone())
    }

    /// Whether a regular file exists at this path
    pub async fn exists(&self) -> Result<bool> {
        match tokio::fs::metadata(&self.path).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(io_error(e, &self.path)),
        }
    }

    pub async fn size(&self) -> Result<u64> {
        let meta = tokio::fs::metadata(&self.path)
            .await
            .map_err(|e| io_error(e, &self.path))?;
        if !meta.is_file() {
            return Err(Error::InvalidPath(format!(
                "'{}' is not a regular file",
                self.path
            )));
        }
        Ok(meta.len())
    }

    pub async fn read_bytes(&self) -> Result<Vec<u8>> {
        tokio::fs::read(&self.path)
            .await
            .map_err(|e| io_error(e, &self.path))
    }

    pub async fn read_text(&self) -> Result<String> {
        String::from_utf8(self.read_bytes().await?)
            .map_err(|_| Error::General(format!("'{}' is not valid UTF-8", self.path)))
    }

    pub async fn write_bytes(&self, data: &[u8], mode: WriteMode) -> Result<()> {
        let mut options = tokio::fs::OpenOptions::new();
        options.create(true);
        match mode {
            WriteMode::Append => {
                options.append(true);
            }
            WriteMode::Write | WriteMode::Overwrite => {
                options.write(true).truncate(true);
            }
        }

        let mut file = options
            .open(&self.path)
            .await
            .map_err(|e| io_error(e, &self.path))?;
        file.write_all(data).await?;
        file.flush().await?;

        debug!(path = %self.path, bytes = data.len(), ?mode, "Wrote local file");
        Ok(())
    }

    /// Create the file if missing, otherwise bump its modification time
    pub async fn touch(&self, exist_ok: bool) -> Result<()> {
        let path = self.path.clone();
        run_blocking(move || {
            let mut options = std::fs::OpenOptions::new();
            options.append(true);
            if exist_ok {
                options.create(true);
            } else {
                options.create_new(true);
            }
            let file = options.open(&path).map_err(|e| io_error(e, &path))?;
            file.set_modified(SystemTime::now())?;
            Ok(())
        })
        .await
    }

    /// Delete the file
    ///
    /// With `dry_run` nothing is deleted; the path that would be removed is
    /// logged and returned.
    pub async fn remove(&self, missing_ok: bool, dry_run: bool) -> Result<Vec<String>> {
        if dry_run {
            if !self.exists().await? {
                return absent(&self.path, missing_ok);
            }
            info!(path = %self.path, "Dry run: would remove");
            return Ok(vec![self.path.clone()]);
        }

        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                debug!(path = %self.path, "Removed local file");
                Ok(vec![self.path.clone()])
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => absent(&self.path, missing_ok),
            Err(e) => Err(io_error(e, &self.path)),
        }
    }

    pub async fn checksum(&self, algorithm: ChecksumAlgorithm) -> Result<String> {
        let path = self.path.clone();
        run_blocking(move || {
            checksum::digest_file(algorithm, Path::new(&path)).map_err(|e| match e {
                Error::Io(io) => io_error(io, &path),
                other => other,
            })
        })
        .await
    }
}

impl std::fmt::Display for LocalFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.path)
    }
}
