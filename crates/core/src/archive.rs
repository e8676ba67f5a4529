//! Archive formats and encoders
//!
//! Entries hold regular files only, named relative to the archived
//! directory (`a.txt`, `sub/b.txt`). Encoding is blocking; callers run it
//! on the blocking pool.

use std::fs::File;
use std::io;
use std::path::Path;

use flate2::Compression;
use flate2::write::GzEncoder;
use serde::{Deserialize, Serialize};
use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

use crate::error::{Error, Result};
use crate::local::walk;

/// Supported archive formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveFormat {
    Zip,
    GzTar,
}

impl ArchiveFormat {
    /// Format identifier as accepted by [`std::str::FromStr`]
    pub const fn name(self) -> &'static str {
        match self {
            ArchiveFormat::Zip => "zip",
            ArchiveFormat::GzTar => "gztar",
        }
    }

    /// Extension the destination must carry
    pub const fn extension(self) -> &'static str {
        match self {
            ArchiveFormat::Zip => ".zip",
            ArchiveFormat::GzTar => ".tar.gz",
        }
    }

    /// Reject a destination whose extension does not match the format
    ///
    /// Runs before any I/O so a mismatch never leaves partial output.
    pub fn validate_destination(self, destination: &str) -> Result<()> {
        if destination.ends_with(self.extension()) {
            Ok(())
        } else {
            Err(Error::FormatMismatch {
                format: self.name().to_string(),
                expected: self.extension().to_string(),
                path: destination.to_string(),
            })
        }
    }

    /// Guess the format from a destination extension
    pub fn from_destination(destination: &str) -> Option<Self> {
        [ArchiveFormat::Zip, ArchiveFormat::GzTar]
            .into_iter()
            .find(|format| destination.ends_with(format.extension()))
    }
}

impl std::fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for ArchiveFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "zip" => Ok(ArchiveFormat::Zip),
            "gztar" => Ok(ArchiveFormat::GzTar),
            other => Err(Error::Unsupported(format!(
                "archive format '{other}' (expected zip or gztar)"
            ))),
        }
    }
}

/// Encode every file below `src` into a new archive at `dst` (blocking)
///
/// Returns the number of entries written.
pub fn encode_directory(src: &Path, dst: &Path, format: ArchiveFormat) -> Result<usize> {
    let files = walk::walk_files(src, true, None)?;
    let entries = files
        .iter()
        .map(|path| {
            let relative = path
                .strip_prefix(src)
                .map_err(|_| Error::InvalidPath(format!("{} is not below {}", path.display(), src.display())))?;
            let name = walk::path_string(relative.to_path_buf())?;
            Ok((path.as_path(), name.replace(std::path::MAIN_SEPARATOR, "/")))
        })
        .collect::<Result<Vec<_>>>()?;

    let out = File::create(dst)?;
    match format {
        ArchiveFormat::Zip => write_zip(out, &entries)?,
        ArchiveFormat::GzTar => write_tar_gz(out, &entries)?,
    }
    Ok(entries.len())
}

fn write_zip(out: File, entries: &[(&Path, String)]) -> Result<()> {
    let mut zip = zip::ZipWriter::new(out);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for (path, name) in entries {
        zip.start_file(name.as_str(), options).map_err(archive_error)?;
        let mut input = File::open(path)?;
        io::copy(&mut input, &mut zip)?;
    }

    zip.finish().map_err(archive_error)?;
    Ok(())
}

fn write_tar_gz(out: File, entries: &[(&Path, String)]) -> Result<()> {
    let encoder = GzEncoder::new(out, Compression::default());
    let mut builder = tar::Builder::new(encoder);
    builder.follow_symlinks(true);

    for (path, name) in entries {
        builder.append_path_with_name(path, name)?;
    }

    builder.into_inner()?.finish()?;
    Ok(())
}

fn archive_error(err: zip::result::ZipError) -> Error {
    Error::Archive(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::io::Read;

    fn sample_tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("src/sub")).unwrap();
        std::fs::create_dir_all(dir.path().join("src/empty")).unwrap();
        std::fs::write(dir.path().join("src/a.txt"), b"alpha").unwrap();
        std::fs::write(dir.path().join("src/sub/b.txt"), b"beta").unwrap();
        dir
    }

    #[test]
    fn test_validate_destination() {
        assert!(ArchiveFormat::Zip.validate_destination("/tmp/out.zip").is_ok());
        assert!(ArchiveFormat::GzTar.validate_destination("s3://b/out.tar.gz").is_ok());
        assert!(matches!(
            ArchiveFormat::GzTar.validate_destination("/tmp/out.zip"),
            Err(Error::FormatMismatch { .. })
        ));
        assert!(ArchiveFormat::Zip.validate_destination("/tmp/out.tgz").is_err());
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("zip".parse::<ArchiveFormat>().unwrap(), ArchiveFormat::Zip);
        assert_eq!("gztar".parse::<ArchiveFormat>().unwrap(), ArchiveFormat::GzTar);
        assert!("rar".parse::<ArchiveFormat>().is_err());
        assert_eq!(
            ArchiveFormat::from_destination("x.tar.gz"),
            Some(ArchiveFormat::GzTar)
        );
        assert_eq!(ArchiveFormat::from_destination("x.tar"), None);
    }

    #[test]
    fn test_zip_holds_relative_file_entries() {
        let dir = sample_tree();
        let dst = dir.path().join("out.zip");
        let count = encode_directory(&dir.path().join("src"), &dst, ArchiveFormat::Zip).unwrap();
        assert_eq!(count, 2);

        let mut archive = zip::ZipArchive::new(File::open(&dst).unwrap()).unwrap();
        let mut contents = BTreeMap::new();
        for i in 0..archive.len() {
            let mut entry = archive.by_index(i).unwrap();
            let mut body = String::new();
            entry.read_to_string(&mut body).unwrap();
            contents.insert(entry.name().to_string(), body);
        }
        assert_eq!(
            contents,
            BTreeMap::from([
                ("a.txt".to_string(), "alpha".to_string()),
                ("sub/b.txt".to_string(), "beta".to_string()),
            ])
        );
    }

    #[test]
    fn test_tar_gz_holds_relative_file_entries() {
        let dir = sample_tree();
        let dst = dir.path().join("out.tar.gz");
        encode_directory(&dir.path().join("src"), &dst, ArchiveFormat::GzTar).unwrap();

        let decoder = flate2::read::GzDecoder::new(File::open(&dst).unwrap());
        let mut archive = tar::Archive::new(decoder);
        let mut contents = BTreeMap::new();
        for entry in archive.entries().unwrap() {
            let mut entry = entry.unwrap();
            let name = entry.path().unwrap().display().to_string();
            let mut body = String::new();
            entry.read_to_string(&mut body).unwrap();
            contents.insert(name, body);
        }
        assert_eq!(contents.len(), 2);
        assert_eq!(contents["a.txt"], "alpha");
        assert_eq!(contents["sub/b.txt"], "beta");
    }

    #[test]
    fn test_empty_directory_produces_empty_archive() {
        let dir = sample_tree();
        let dst = dir.path().join("empty.zip");
        let count =
            encode_directory(&dir.path().join("src/empty"), &dst, ArchiveFormat::Zip).unwrap();
        assert_eq!(count, 0);
        let archive = zip::ZipArchive::new(File::open(&dst).unwrap()).unwrap();
        assert_eq!(archive.len(), 0);
    }
}
