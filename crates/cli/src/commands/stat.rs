//! stat command - Show existence, size and file count
//!
//! Paths ending in `/` are reported as directories, everything else as files.

use clap::Args;
use serde::Serialize;
use std::fmt;

use super::{Session, fail};
use crate::exit_code::ExitCode;
use crate::output::Formatter;
use ufs_core::{Entity, Error, Result};

/// Show file or directory statistics
#[derive(Args, Debug)]
pub struct StatArgs {
    /// File or directory path
    pub path: String,
}

#[derive(Debug, Serialize)]
struct StatOutput {
    path: String,
    kind: &'static str,
    exists: bool,
    size_bytes: u64,
    size_human: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    file_count: Option<u64>,
}

impl fmt::Display for StatOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Path   : {}", self.path)?;
        writeln!(f, "Kind   : {}", self.kind)?;
        write!(f, "Size   : {} ({} bytes)", self.size_human, self.size_bytes)?;
        if let Some(count) = self.file_count {
            write!(f, "\nFiles  : {count}")?;
        }
        Ok(())
    }
}

/// Execute the stat command
pub async fn execute(args: StatArgs, session: &Session, formatter: &Formatter) -> ExitCode {
    let resolver = match session.resolver(&[&args.path]).await {
        Ok(r) => r,
        Err(e) => return fail(formatter, "Failed to set up storage", &e),
    };

    let entity = match resolver.resolve(&args.path) {
        Ok(entity) => entity,
        Err(e) => return fail(formatter, "Invalid path", &e),
    };

    match stat(&entity).await {
        Ok(output) => {
            formatter.output(&output);
            ExitCode::Success
        }
        Err(e) => fail(formatter, &format!("Failed to stat {}", entity.path()), &e),
    }
}

async fn stat(entity: &Entity) -> Result<StatOutput> {
    if !entity.exists().await? {
        return Err(Error::NotFound(entity.path().to_string()));
    }

    let (kind, size_bytes, file_count) = match entity {
        Entity::File(file) => ("file", file.size().await?, None),
        Entity::Directory(dir) => ("directory", dir.size().await?, Some(dir.file_count().await?)),
        Entity::DirectoryPrefix(prefix) => (
            "prefix",
            prefix.size().await?,
            Some(prefix.file_count().await?),
        ),
    };

    Ok(StatOutput {
        path: entity.path().to_string(),
        kind,
        exists: true,
        size_bytes,
        size_human: humansize::format_size(size_bytes, humansize::BINARY),
        file_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ufs_core::{Resolver, StorageSettings};

    #[tokio::test]
    async fn test_stat_local_directory_and_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), b"hello").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub/b.txt"), b"!").unwrap();
        let resolver = Resolver::new(StorageSettings::default()).unwrap();

        let root = format!("{}/", dir.path().display());
        let output = stat(&resolver.resolve(&root).unwrap()).await.unwrap();
        assert_eq!(output.kind, "directory");
        assert_eq!(output.size_bytes, 6);
        assert_eq!(output.file_count, Some(2));

        let file = format!("{root}a.txt");
        let output = stat(&resolver.resolve(&file).unwrap()).await.unwrap();
        assert_eq!(output.kind, "file");
        assert_eq!(output.size_bytes, 5);
        assert!(output.to_string().contains("5 bytes"));
    }

    #[tokio::test]
    async fn test_stat_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = Resolver::new(StorageSettings::default()).unwrap();
        let missing = format!("{}/missing.txt", dir.path().display());
        let result = stat(&resolver.resolve(&missing).unwrap()).await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }
}
