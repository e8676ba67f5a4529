//! archive command - Pack a directory into an archive
//!
//! The format comes from `--format` or, when omitted, from the destination
//! extension (`.zip` or `.tar.gz`). Object-store sources and destinations
//! are staged through a temporary local directory.

use clap::Args;
use serde::Serialize;

use super::{Session, fail};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, ProgressBar};
use ufs_core::{ArchiveFormat, Error, Resolver, Result};

/// Archive a directory
#[derive(Args, Debug)]
pub struct ArchiveArgs {
    /// Directory to archive
    pub source: String,

    /// Archive file to create
    pub target: String,

    /// Archive format: zip or gztar
    #[arg(long)]
    pub format: Option<ArchiveFormat>,

    /// Treat the source as a raw prefix rather than a directory
    #[arg(long)]
    pub prefix: bool,
}

#[derive(Debug, Serialize)]
struct ArchiveOutput {
    status: &'static str,
    source: String,
    target: String,
    format: ArchiveFormat,
    entries: usize,
}

/// Execute the archive command
pub async fn execute(args: ArchiveArgs, session: &Session, formatter: &Formatter) -> ExitCode {
    let resolver = match session.resolver(&[&args.source, &args.target]).await {
        Ok(r) => r,
        Err(e) => return fail(formatter, "Failed to set up storage", &e),
    };

    let spinner = ProgressBar::spinner(
        formatter.config(),
        &format!("Archiving {} into {}", args.source, args.target),
    );
    let result = archive(&resolver, &args).await;
    spinner.finish_and_clear();

    match result {
        Ok(output) => {
            if formatter.is_json() {
                formatter.json(&output);
            } else {
                formatter.success(&format!(
                    "Archived {} file(s) from {} into {} ({})",
                    output.entries, output.source, output.target, output.format
                ));
            }
            ExitCode::Success
        }
        Err(e) => fail(formatter, &format!("Failed to archive {}", args.source), &e),
    }
}

/// Pick the format from the flag, else from the destination extension
fn format_for(args: &ArchiveArgs) -> Result<ArchiveFormat> {
    match args.format {
        Some(format) => Ok(format),
        None => ArchiveFormat::from_destination(&args.target).ok_or_else(|| {
            Error::InvalidPath(format!(
                "cannot infer an archive format from '{}' (use --format)",
                args.target
            ))
        }),
    }
}

async fn archive(resolver: &Resolver, args: &ArchiveArgs) -> Result<ArchiveOutput> {
    let format = format_for(args)?;
    let dst = resolver.to_file(&args.target)?;

    let (source, entries) = if args.prefix {
        let src = resolver.to_directory_prefix(&args.source)?;
        (src.path().to_string(), src.archive_to(&dst, format).await?)
    } else {
        let src = resolver.to_directory(&args.source)?;
        (src.path().to_string(), src.archive_to(&dst, format).await?)
    };

    Ok(ArchiveOutput {
        status: "success",
        source,
        target: dst.path().to_string(),
        format,
        entries,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ufs_core::StorageSettings;

    fn args(source: String, target: String, format: Option<ArchiveFormat>) -> ArchiveArgs {
        ArchiveArgs {
            source,
            target,
            format,
            prefix: false,
        }
    }

    #[test]
    fn test_format_inferred_from_extension() {
        let a = args("/src/".into(), "/out/a.tar.gz".into(), None);
        assert_eq!(format_for(&a).unwrap(), ArchiveFormat::GzTar);
        let a = args("/src/".into(), "/out/a.zip".into(), None);
        assert_eq!(format_for(&a).unwrap(), ArchiveFormat::Zip);
        let a = args("/src/".into(), "/out/a.rar".into(), None);
        assert!(matches!(format_for(&a), Err(Error::InvalidPath(_))));
    }

    #[tokio::test]
    async fn test_explicit_format_must_match_extension() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), b"alpha").unwrap();
        let resolver = Resolver::new(StorageSettings::default()).unwrap();
        let target = format!("{}/out.zip", dir.path().display());

        let mismatched = args(
            format!("{}/", dir.path().display()),
            target.clone(),
            Some(ArchiveFormat::GzTar),
        );
        assert!(matches!(
            archive(&resolver, &mismatched).await,
            Err(Error::FormatMismatch { .. })
        ));

        let inferred = args(format!("{}/", dir.path().display()), target, None);
        let output = archive(&resolver, &inferred).await.unwrap();
        assert_eq!(output.entries, 1);
        assert_eq!(output.format, ArchiveFormat::Zip);
    }
}
