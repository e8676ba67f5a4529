//! Path parsing and normalization
//!
//! Two path syntaxes are recognized:
//! - `/abs/path` for the local filesystem (`/abs/path/` for a directory)
//! - `s3://bucket/key` or `s3a://bucket/key` for the object store
//!   (`s3://bucket/prefix/` for a directory)
//!
//! The trailing separator decides the role: a file never ends with `/`, a
//! directory always does, and a directory prefix never does.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Path separator shared by both backends
pub const SEPARATOR: char = '/';

/// Object-store URL scheme
///
/// Both spellings address the same store; object entities rewrite every
/// path to the one configured as canonical.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Protocol {
    #[default]
    #[serde(rename = "s3://")]
    S3,
    #[serde(rename = "s3a://")]
    S3a,
}

impl Protocol {
    /// The URL prefix including `://`
    pub const fn prefix(self) -> &'static str {
        match self {
            Protocol::S3 => "s3://",
            Protocol::S3a => "s3a://",
        }
    }

    /// Split a recognized protocol prefix off `path`
    pub fn strip(path: &str) -> Option<(Protocol, &str)> {
        if let Some(rest) = path.strip_prefix(Protocol::S3.prefix()) {
            Some((Protocol::S3, rest))
        } else {
            path.strip_prefix(Protocol::S3a.prefix())
                .map(|rest| (Protocol::S3a, rest))
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

impl std::str::FromStr for Protocol {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim_end_matches("//").trim_end_matches(':') {
            "s3" => Ok(Protocol::S3),
            "s3a" => Ok(Protocol::S3a),
            _ => Err(Error::UnrecognizedScheme(s.to_string())),
        }
    }
}

/// Backend addressed by a path string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Local,
    Object(Protocol),
}

/// Role a path plays, fixed by its trailing separator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    File,
    Directory,
    DirectoryPrefix,
}

/// Determine which backend a path addresses
///
/// A leading `/` selects the local backend, `s3://` or `s3a://` the object
/// store. Anything else is rejected; there is no default backend.
pub fn scheme_of(path: &str) -> Result<Scheme> {
    let path = path.trim();
    if path.is_empty() {
        return Err(Error::InvalidPath("Path cannot be empty".into()));
    }
    if path.starts_with(SEPARATOR) {
        return Ok(Scheme::Local);
    }
    match Protocol::strip(path) {
        Some((protocol, _)) => Ok(Scheme::Object(protocol)),
        None => Err(Error::UnrecognizedScheme(path.to_string())),
    }
}

/// Infer the role from the trailing separator
pub fn role_of(path: &str) -> Role {
    if path.trim().ends_with(SEPARATOR) {
        Role::Directory
    } else {
        Role::File
    }
}

/// Normalize a local path for the given role
///
/// Files must not end with `/`; directories gain one; prefixes lose it.
pub fn normalize_local(path: &str, role: Role) -> Result<String> {
    let path = path.trim();
    if !path.starts_with(SEPARATOR) {
        return Err(Error::InvalidPath(format!(
            "'{path}' is not an absolute local path"
        )));
    }
    check_segments(path)?;

    match role {
        Role::File => {
            if path.ends_with(SEPARATOR) {
                return Err(Error::InvalidPath(format!(
                    "'{path}' ends with '/' and cannot address a file"
                )));
            }
            Ok(path.to_string())
        }
        Role::Directory => Ok(with_trailing_separator(path)),
        Role::DirectoryPrefix => {
            let trimmed = path.trim_end_matches(SEPARATOR);
            if trimmed.is_empty() {
                return Err(Error::InvalidPath(
                    "The filesystem root cannot be addressed as a prefix".into(),
                ));
            }
            Ok(trimmed.to_string())
        }
    }
}

/// A parsed object-store location
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectPath {
    /// Canonical protocol
    pub protocol: Protocol,
    /// Bucket name
    pub bucket: String,
    /// Object key or key prefix (empty for bucket root)
    pub key: String,
}

impl ObjectPath {
    /// Create a new ObjectPath
    pub fn new(protocol: Protocol, bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            protocol,
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Parse and normalize an object-store path for the given role,
    /// rewriting its protocol to `canonical`
    pub fn parse(path: &str, canonical: Protocol, role: Role) -> Result<Self> {
        let path = path.trim();
        let (_, rest) = Protocol::strip(path)
            .ok_or_else(|| Error::UnrecognizedScheme(path.to_string()))?;

        let (bucket, key) = match rest.split_once(SEPARATOR) {
            Some((bucket, key)) => (bucket, key),
            None => (rest, ""),
        };

        if bucket.is_empty() {
            return Err(Error::InvalidPath(format!(
                "'{path}' has an empty bucket name"
            )));
        }
        check_segments(key)?;

        let key = match role {
            Role::File => {
                if key.is_empty() || key.ends_with(SEPARATOR) {
                    return Err(Error::InvalidPath(format!(
                        "'{path}' does not name an object key"
                    )));
                }
                key.to_string()
            }
            Role::Directory if key.is_empty() => String::new(),
            Role::Directory => with_trailing_separator(key),
            Role::DirectoryPrefix => key.trim_end_matches(SEPARATOR).to_string(),
        };

        Ok(Self::new(canonical, bucket, key))
    }

    /// Whether the key has directory semantics
    pub fn is_dir(&self) -> bool {
        self.key.is_empty() || self.key.ends_with(SEPARATOR)
    }

    /// Get the full path as a string (`scheme://bucket/key`)
    pub fn to_full_path(&self) -> String {
        format!("{}{}/{}", self.protocol.prefix(), self.bucket, self.key)
    }

    /// Last path segment of the key, ignoring a trailing separator
    pub fn basename(&self) -> &str {
        basename(&self.key)
    }

    /// Get the parent directory (one level up)
    pub fn parent(&self) -> Option<Self> {
        if self.key.is_empty() {
            return None;
        }
        let key = self.key.trim_end_matches(SEPARATOR);
        let parent_key = match key.rfind(SEPARATOR) {
            Some(pos) => format!("{}/", &key[..pos]),
            None => String::new(),
        };
        Some(Self::new(self.protocol, self.bucket.clone(), parent_key))
    }

    /// Join a child path below this key
    pub fn join(&self, child: &str) -> Self {
        let base = self.key.trim_end_matches(SEPARATOR);
        let key = if base.is_empty() {
            child.to_string()
        } else {
            format!("{base}/{child}")
        };
        Self::new(self.protocol, self.bucket.clone(), key)
    }

    /// Same location with a different bucket-relative key
    pub fn with_key(&self, key: impl Into<String>) -> Self {
        Self::new(self.protocol, self.bucket.clone(), key)
    }
}

impl fmt::Display for ObjectPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_full_path())
    }
}

/// Join path segments into a relative path, validating each component
///
/// Segments may themselves contain separators (`"sub/b.txt"`); leading and
/// trailing separators are dropped.
pub fn join_segments(parts: &[&str]) -> Result<String> {
    let joined = parts
        .iter()
        .map(|p| p.trim_matches(SEPARATOR))
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("/");

    if joined.is_empty() {
        return Err(Error::InvalidPath("Cannot join an empty path".into()));
    }
    check_segments(&joined)?;
    Ok(joined)
}

/// Path of `path` relative to the directory `root`, by string-prefix stripping
///
/// `root` is expected in directory form (trailing separator) or prefix form;
/// both yield a relative path without a leading separator.
pub fn relative_to<'a>(root: &str, path: &'a str) -> Result<&'a str> {
    let root = root.trim_end_matches(SEPARATOR);
    path.strip_prefix(root)
        .and_then(|rest| {
            if root.is_empty() {
                Some(rest.trim_start_matches(SEPARATOR))
            } else {
                rest.strip_prefix(SEPARATOR)
            }
        })
        .filter(|rest| !rest.is_empty())
        .ok_or_else(|| Error::InvalidPath(format!("'{path}' is not below '{root}'")))
}

/// Last segment of a path, ignoring a trailing separator
pub fn basename(path: &str) -> &str {
    let trimmed = path.trim_end_matches(SEPARATOR);
    trimmed.rsplit(SEPARATOR).next().unwrap_or(trimmed)
}

fn with_trailing_separator(path: &str) -> String {
    if path.ends_with(SEPARATOR) {
        path.to_string()
    } else {
        format!("{path}/")
    }
}

fn check_segments(path: &str) -> Result<()> {
    if path.split(SEPARATOR).any(|seg| seg == "..") {
        return Err(Error::InvalidPath(format!(
            "'{path}' contains a parent-directory segment"
        )));
    }
    Ok(())
}
