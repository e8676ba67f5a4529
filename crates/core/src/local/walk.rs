//! Directory traversal
//!
//! Symbolic links are followed; a link that points back into its own
//! ancestry surfaces as `Error::SymlinkLoop` instead of recursing forever.
//! Dangling links are skipped.
//! Siblings are visited in file-name order so a capped walk is
//! deterministic.

use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::{DirEntry, WalkDir};

use crate::error::{Error, Result};

/// Totals for a directory tree
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct TreeStats {
    pub files: u64,
    pub bytes: u64,
}

/// Collect regular files below `root`
///
/// A positive `limit` caps the walk itself: the first `limit` files in
/// traversal order are kept, then sorted. That is not the lexicographically
/// first `limit` paths of the whole tree. Zero means no cap.
pub(crate) fn walk_files(root: &Path, recursive: bool, limit: Option<usize>) -> Result<Vec<PathBuf>> {
    let limit = limit.filter(|&n| n > 0);
    let mut files = Vec::new();

    for entry in entries(root, recursive) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        files.push(entry.into_path());
        if limit.is_some_and(|limit| files.len() >= limit) {
            break;
        }
    }

    Ok(files)
}

/// Like [`walk_files`] but as sorted absolute path strings
pub(crate) fn walk_file_paths(
    root: &Path,
    recursive: bool,
    limit: Option<usize>,
) -> Result<Vec<String>> {
    let mut paths = walk_files(root, recursive, limit)?
        .into_iter()
        .map(path_string)
        .collect::<Result<Vec<_>>>()?;
    paths.sort();
    Ok(paths)
}

/// Count files and sum their sizes below `root`
pub(crate) fn tree_stats(root: &Path) -> Result<TreeStats> {
    let mut stats = TreeStats::default();
    for entry in entries(root, true) {
        let entry = entry?;
        if entry.file_type().is_file() {
            stats.files += 1;
            stats.bytes += entry.metadata().map_err(walk_error)?.len();
        }
    }
    Ok(stats)
}

/// Every entry below `root`, children before their parents
pub(crate) fn walk_all_contents_first(root: &Path) -> Result<Vec<String>> {
    WalkDir::new(root)
        .min_depth(1)
        .follow_links(false)
        .contents_first(true)
        .sort_by_file_name()
        .into_iter()
        .map(|entry| {
            let entry = entry.map_err(walk_error)?;
            path_string(entry.into_path())
        })
        .collect()
}

pub(crate) fn path_string(path: PathBuf) -> Result<String> {
    path.into_os_string()
        .into_string()
        .map_err(|raw| Error::InvalidPath(format!("{} is not valid UTF-8", raw.to_string_lossy())))
}

fn walker(root: &Path, recursive: bool) -> walkdir::IntoIter {
    let mut walk = WalkDir::new(root)
        .min_depth(1)
        .follow_links(true)
        .sort_by_file_name();
    if !recursive {
        walk = walk.max_depth(1);
    }
    walk.into_iter()
}

fn entries(root: &Path, recursive: bool) -> impl Iterator<Item = Result<DirEntry>> {
    walker(root, recursive).filter_map(|entry| match entry {
        Ok(entry) => Some(Ok(entry)),
        Err(err) if is_dangling_link(&err) => {
            debug!(path = ?err.path(), "Skipping dangling symlink");
            None
        }
        Err(err) => Some(Err(walk_error(err))),
    })
}

/// A link below the root whose target is gone
fn is_dangling_link(err: &walkdir::Error) -> bool {
    if err.depth() == 0 {
        return false;
    }
    let missing = err
        .io_error()
        .is_some_and(|io| io.kind() == std::io::ErrorKind::NotFound);
    missing
        && err
            .path()
            .and_then(|p| std::fs::symlink_metadata(p).ok())
            .is_some_and(|meta| meta.file_type().is_symlink())
}

fn walk_error(err: walkdir::Error) -> Error {
    let path = err
        .path()
        .map(|p| p.display().to_string())
        .unwrap_or_default();

    if err.loop_ancestor().is_some() {
        return Error::SymlinkLoop(path);
    }

    match err.into_io_error() {
        Some(io) if io.kind() == std::io::ErrorKind::NotFound => Error::NotFound(path),
        Some(io) if io.kind() == std::io::ErrorKind::PermissionDenied => Error::AccessDenied(path),
        Some(io) => Error::Io(io),
        None => Error::General(format!("Failed to walk {path}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("sub/deep")).unwrap();
        fs::write(dir.path().join("b.txt"), b"bb").unwrap();
        fs::write(dir.path().join("a.txt"), b"a").unwrap();
        fs::write(dir.path().join("sub/c.txt"), b"ccc").unwrap();
        fs::write(dir.path().join("sub/deep/d.txt"), b"dddd").unwrap();
        dir
    }

    #[test]
    fn test_recursive_walk_is_sorted_and_files_only() {
        let dir = tree();
        let root = dir.path().display().to_string();
        let paths = walk_file_paths(dir.path(), true, None).unwrap();
        assert_eq!(
            paths,
            vec![
                format!("{root}/a.txt"),
                format!("{root}/b.txt"),
                format!("{root}/sub/c.txt"),
                format!("{root}/sub/deep/d.txt"),
            ]
        );
    }

    #[test]
    fn test_shallow_walk_skips_subdirectories() {
        let dir = tree();
        let paths = walk_file_paths(dir.path(), false, None).unwrap();
        assert_eq!(paths.len(), 2);
    }

    #[test]
    fn test_limit_caps_walk() {
        let dir = tree();
        assert_eq!(walk_files(dir.path(), true, Some(3)).unwrap().len(), 3);
        assert_eq!(walk_files(dir.path(), true, Some(0)).unwrap().len(), 4);
    }

    #[test]
    fn test_tree_stats() {
        let dir = tree();
        assert_eq!(
            tree_stats(dir.path()).unwrap(),
            TreeStats { files: 4, bytes: 10 }
        );
    }

    #[test]
    fn test_missing_root_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            walk_files(&missing, true, None),
            Err(Error::NotFound(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_loop_is_reported() {
        let dir = tree();
        std::os::unix::fs::symlink(dir.path(), dir.path().join("sub/back")).unwrap();
        assert!(matches!(
            walk_files(dir.path(), true, None),
            Err(Error::SymlinkLoop(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_symlink_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), b"alpha").unwrap();
        std::os::unix::fs::symlink(dir.path().join("gone"), dir.path().join("stale")).unwrap();

        let paths = walk_file_paths(dir.path(), true, None).unwrap();
        assert_eq!(paths, vec![format!("{}/a.txt", dir.path().display())]);
        assert_eq!(
            tree_stats(dir.path()).unwrap(),
            TreeStats { files: 1, bytes: 5 }
        );
    }

    #[test]
    fn test_contents_first_lists_children_before_parent() {
        let dir = tree();
        let entries = walk_all_contents_first(dir.path()).unwrap();
        let child = entries.iter().position(|p| p.ends_with("deep/d.txt")).unwrap();
        let parent = entries.iter().position(|p| p.ends_with("sub/deep")).unwrap();
        assert!(child < parent);
        assert_eq!(entries.len(), 6);
    }
}
