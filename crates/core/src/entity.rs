//! Backend-agnostic entities
//!
//! Each entity is a sum over the local and object-store variants; every
//! operation matches on the variant. Entities hold no cached view of the
//! content they address, so each query goes back to the backend.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::archive::ArchiveFormat;
use crate::checksum::ChecksumAlgorithm;
use crate::error::{Error, Result};
use crate::local::{LocalDirectory, LocalDirectoryPrefix, LocalFile};
use crate::object::{ObjectDirectory, ObjectDirectoryPrefix, ObjectFile};
use crate::path::Role;
use crate::resolver::Context;
use crate::transfer;

/// How `write_bytes` treats existing content
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    /// Truncate and write
    #[default]
    Write,
    /// Same as `Write`
    Overwrite,
    /// Append to existing content (local files only)
    Append,
}

/// Result for removing something that is not there
pub(crate) fn absent(path: &str, missing_ok: bool) -> Result<Vec<String>> {
    if missing_ok {
        Ok(Vec::new())
    } else {
        Err(Error::NotFound(path.to_string()))
    }
}

/// A single file on either backend
#[derive(Debug, Clone)]
pub enum File {
    Local(LocalFile),
    Object(ObjectFile),
}

impl File {
    pub fn path(&self) -> &str {
        match self {
            File::Local(f) => f.path(),
            File::Object(f) => f.path(),
        }
    }

    pub fn basename(&self) -> &str {
        match self {
            File::Local(f) => f.basename(),
            File::Object(f) => f.basename(),
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, File::Local(_))
    }

    /// Directory holding this file
    pub fn parent(&self) -> Directory {
        match self {
            File::Local(f) => Directory::Local(f.parent()),
            File::Object(f) => Directory::Object(f.parent()),
        }
    }

    pub async fn exists(&self) -> Result<bool> {
        match self {
            File::Local(f) => f.exists().await,
            File::Object(f) => f.exists().await,
        }
    }

    pub async fn size(&self) -> Result<u64> {
        match self {
            File::Local(f) => f.size().await,
            File::Object(f) => f.size().await,
        }
    }

    pub async fn read_bytes(&self) -> Result<Vec<u8>> {
        match self {
            File::Local(f) => f.read_bytes().await,
            File::Object(f) => f.read_bytes().await,
        }
    }

    pub async fn read_text(&self) -> Result<String> {
        match self {
            File::Local(f) => f.read_text().await,
            File::Object(f) => f.read_text().await,
        }
    }

    pub async fn write_bytes(&self, data: &[u8], mode: WriteMode) -> Result<()> {
        match self {
            File::Local(f) => f.write_bytes(data, mode).await,
            File::Object(f) => f.write_bytes(data, mode).await,
        }
    }

    pub async fn write_text(&self, text: &str, mode: WriteMode) -> Result<()> {
        self.write_bytes(text.as_bytes(), mode).await
    }

    pub async fn touch(&self, exist_ok: bool) -> Result<()> {
        match self {
            File::Local(f) => f.touch(exist_ok).await,
            File::Object(f) => f.touch(exist_ok).await,
        }
    }

    pub async fn remove(&self, missing_ok: bool, dry_run: bool) -> Result<Vec<String>> {
        match self {
            File::Local(f) => f.remove(missing_ok, dry_run).await,
            File::Object(f) => f.remove(missing_ok, dry_run).await,
        }
    }

    /// Lowercase hex digest of the content
    pub async fn checksum(&self, algorithm: ChecksumAlgorithm) -> Result<String> {
        match self {
            File::Local(f) => f.checksum(algorithm).await,
            File::Object(f) => f.checksum(algorithm).await,
        }
    }

    /// Copy this file's content to `dst`, on either backend
    pub async fn duplicate(&self, dst: &File) -> Result<()> {
        transfer::copy_file(self, dst).await
    }

    /// Copy this file into `dst` under its own basename
    pub async fn copy_to(&self, dst: &Directory) -> Result<File> {
        let target = dst.join_as_file(&[self.basename()])?;
        self.duplicate(&target).await?;
        Ok(target)
    }
}

impl fmt::Display for File {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// A directory on either backend; the path always ends with `/`
#[derive(Debug, Clone)]
pub enum Directory {
    Local(LocalDirectory),
    Object(ObjectDirectory),
}

impl Directory {
    pub fn path(&self) -> &str {
        match self {
            Directory::Local(d) => d.path(),
            Directory::Object(d) => d.path(),
        }
    }

    pub fn basename(&self) -> &str {
        match self {
            Directory::Local(d) => d.basename(),
            Directory::Object(d) => d.basename(),
        }
    }

    pub(crate) fn context(&self) -> &std::sync::Arc<Context> {
        match self {
            Directory::Local(d) => d.context(),
            Directory::Object(d) => d.context(),
        }
    }

    /// File entity for a path below this directory
    pub fn join_as_file(&self, parts: &[&str]) -> Result<File> {
        match self {
            Directory::Local(d) => d.join_as_file(parts).map(File::Local),
            Directory::Object(d) => d.join_as_file(parts).map(File::Object),
        }
    }

    /// Directory entity for a path below this directory
    pub fn join_as_directory(&self, parts: &[&str]) -> Result<Directory> {
        match self {
            Directory::Local(d) => d.join_as_directory(parts).map(Directory::Local),
            Directory::Object(d) => d.join_as_directory(parts).map(Directory::Object),
        }
    }

    pub fn as_prefix(&self) -> Result<DirectoryPrefix> {
        match self {
            Directory::Local(d) => d.as_prefix().map(DirectoryPrefix::Local),
            Directory::Object(d) => Ok(DirectoryPrefix::Object(d.as_prefix())),
        }
    }

    pub async fn exists(&self) -> Result<bool> {
        match self {
            Directory::Local(d) => d.exists().await,
            Directory::Object(d) => d.exists().await,
        }
    }

    pub async fn create(&self, parents: bool, exist_ok: bool) -> Result<()> {
        match self {
            Directory::Local(d) => d.create(parents, exist_ok).await,
            Directory::Object(d) => d.create(parents, exist_ok).await,
        }
    }

    /// Paths of the files below this directory
    ///
    /// Local results are sorted; a positive `limit` caps the walk before
    /// the sort, so a capped recursive listing is not guaranteed to be the
    /// lexicographically first `limit` files. Object-store results come in
    /// the store's own key order and stop as soon as `limit` is reached.
    pub async fn list_files(&self, recursive: bool, limit: Option<usize>) -> Result<Vec<String>> {
        match self {
            Directory::Local(d) => d.list_files(recursive, limit).await,
            Directory::Object(d) => d.list_files(recursive, limit).await,
        }
    }

    /// Same listing as [`Directory::list_files`], as file entities
    pub async fn list_file_objects(&self, recursive: bool, limit: Option<usize>) -> Result<Vec<File>> {
        Ok(match self {
            Directory::Local(d) => d
                .list_file_objects(recursive, limit)
                .await?
                .into_iter()
                .map(File::Local)
                .collect(),
            Directory::Object(d) => d
                .list_file_objects(recursive, limit)
                .await?
                .into_iter()
                .map(File::Object)
                .collect(),
        })
    }

    pub async fn file_count(&self) -> Result<u64> {
        match self {
            Directory::Local(d) => d.file_count().await,
            Directory::Object(d) => d.file_count().await,
        }
    }

    pub async fn size(&self) -> Result<u64> {
        match self {
            Directory::Local(d) => d.size().await,
            Directory::Object(d) => d.size().await,
        }
    }

    pub async fn remove(&self, missing_ok: bool, dry_run: bool) -> Result<Vec<String>> {
        match self {
            Directory::Local(d) => d.remove(missing_ok, dry_run).await,
            Directory::Object(d) => d.remove(missing_ok, dry_run).await,
        }
    }

    /// Whether copying into this directory would merge with existing content
    ///
    /// Logical object directories always "exist", so for them this checks
    /// for stored keys instead.
    pub(crate) async fn occupied(&self) -> Result<bool> {
        match self {
            Directory::Local(d) => d.exists().await,
            Directory::Object(d) => d.has_objects().await,
        }
    }

    /// Copy the subtree to `dst/<basename>`, returning that directory
    ///
    /// Without `dir_exist_ok` an existing destination fails with
    /// `Error::AlreadyExists` before anything is copied.
    pub async fn copy_to(&self, dst: &Directory, dir_exist_ok: bool) -> Result<Directory> {
        let target = dst.join_as_directory(&[self.basename()])?;
        self.duplicate(&target, dir_exist_ok).await?;
        Ok(target)
    }

    /// Copy the contents of this directory directly into `dst`
    ///
    /// Returns the number of files copied.
    pub async fn duplicate(&self, dst: &Directory, dir_exist_ok: bool) -> Result<usize> {
        if !dir_exist_ok && dst.occupied().await? {
            return Err(Error::AlreadyExists(dst.path().to_string()));
        }

        // a failed listing must leave the destination untouched
        let files = self.list_file_objects(true, None).await?;
        if let Directory::Local(local) = dst {
            local.create(true, true).await?;
        }
        transfer::sync_files(files, self.path(), dst, self.context()).await
    }

    /// Archive the subtree into `dst`, returning the number of entries
    ///
    /// The destination extension must match `format`; that is checked
    /// before any I/O.
    pub async fn archive_to(&self, dst: &File, format: ArchiveFormat) -> Result<usize> {
        transfer::archive_directory(self, dst, format).await
    }

    pub async fn zip_to(&self, dst: &File) -> Result<usize> {
        self.archive_to(dst, ArchiveFormat::Zip).await
    }

    pub async fn tar_gz_to(&self, dst: &File) -> Result<usize> {
        self.archive_to(dst, ArchiveFormat::GzTar).await
    }
}

impl fmt::Display for Directory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// A directory addressed without its trailing separator
///
/// Enumeration, counting and deletion use the prefix as given; copies and
/// archives operate on the directory of the same name.
#[derive(Debug, Clone)]
pub enum DirectoryPrefix {
    Local(LocalDirectoryPrefix),
    Object(ObjectDirectoryPrefix),
}

impl DirectoryPrefix {
    pub fn path(&self) -> &str {
        match self {
            DirectoryPrefix::Local(p) => p.path(),
            DirectoryPrefix::Object(p) => p.path(),
        }
    }

    pub fn basename(&self) -> &str {
        match self {
            DirectoryPrefix::Local(p) => p.basename(),
            DirectoryPrefix::Object(p) => p.basename(),
        }
    }

    pub fn as_directory(&self) -> Directory {
        match self {
            DirectoryPrefix::Local(p) => Directory::Local(p.as_directory()),
            DirectoryPrefix::Object(p) => Directory::Object(p.as_directory()),
        }
    }

    pub async fn exists(&self) -> Result<bool> {
        match self {
            DirectoryPrefix::Local(p) => p.exists().await,
            DirectoryPrefix::Object(p) => p.exists().await,
        }
    }

    pub async fn list_files(&self, recursive: bool, limit: Option<usize>) -> Result<Vec<String>> {
        match self {
            DirectoryPrefix::Local(p) => p.list_files(recursive, limit).await,
            DirectoryPrefix::Object(p) => p.list_files(recursive, limit).await,
        }
    }

    pub async fn list_file_objects(&self, recursive: bool, limit: Option<usize>) -> Result<Vec<File>> {
        Ok(match self {
            DirectoryPrefix::Local(p) => p
                .list_file_objects(recursive, limit)
                .await?
                .into_iter()
                .map(File::Local)
                .collect(),
            DirectoryPrefix::Object(p) => p
                .list_file_objects(recursive, limit)
                .await?
                .into_iter()
                .map(File::Object)
                .collect(),
        })
    }

    pub async fn file_count(&self) -> Result<u64> {
        match self {
            DirectoryPrefix::Local(p) => p.file_count().await,
            DirectoryPrefix::Object(p) => p.file_count().await,
        }
    }

    pub async fn size(&self) -> Result<u64> {
        match self {
            DirectoryPrefix::Local(p) => p.size().await,
            DirectoryPrefix::Object(p) => p.size().await,
        }
    }

    pub async fn remove(&self, missing_ok: bool, dry_run: bool) -> Result<Vec<String>> {
        match self {
            DirectoryPrefix::Local(p) => p.remove(missing_ok, dry_run).await,
            DirectoryPrefix::Object(p) => p.remove(missing_ok, dry_run).await,
        }
    }

    pub async fn copy_to(&self, dst: &Directory, dir_exist_ok: bool) -> Result<Directory> {
        self.as_directory().copy_to(dst, dir_exist_ok).await
    }

    pub async fn archive_to(&self, dst: &File, format: ArchiveFormat) -> Result<usize> {
        self.as_directory().archive_to(dst, format).await
    }

    pub async fn zip_to(&self, dst: &File) -> Result<usize> {
        self.archive_to(dst, ArchiveFormat::Zip).await
    }

    pub async fn tar_gz_to(&self, dst: &File) -> Result<usize> {
        self.archive_to(dst, ArchiveFormat::GzTar).await
    }
}

impl fmt::Display for DirectoryPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Any resolved entity
#[derive(Debug, Clone)]
pub enum Entity {
    File(File),
    Directory(Directory),
    DirectoryPrefix(DirectoryPrefix),
}

impl Entity {
    pub fn path(&self) -> &str {
        match self {
            Entity::File(f) => f.path(),
            Entity::Directory(d) => d.path(),
            Entity::DirectoryPrefix(p) => p.path(),
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Entity::File(_) => Role::File,
            Entity::Directory(_) => Role::Directory,
            Entity::DirectoryPrefix(_) => Role::DirectoryPrefix,
        }
    }

    pub async fn exists(&self) -> Result<bool> {
        match self {
            Entity::File(f) => f.exists().await,
            Entity::Directory(d) => d.exists().await,
            Entity::DirectoryPrefix(p) => p.exists().await,
        }
    }

    pub async fn remove(&self, missing_ok: bool, dry_run: bool) -> Result<Vec<String>> {
        match self {
            Entity::File(f) => f.remove(missing_ok, dry_run).await,
            Entity::Directory(d) => d.remove(missing_ok, dry_run).await,
            Entity::DirectoryPrefix(p) => p.remove(missing_ok, dry_run).await,
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}
