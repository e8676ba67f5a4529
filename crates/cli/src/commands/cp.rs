//! cp command - Copy files and directories
//!
//! Copies between any pair of backends: local to local, local to S3,
//! S3 to local, and S3 to S3.

use clap::Args;
use serde::Serialize;

use super::{Session, fail};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, ProgressBar};
use ufs_core::{Resolver, Result};

/// Copy files or directories
#[derive(Args, Debug)]
pub struct CpArgs {
    /// Source path
    pub source: String,

    /// Destination path; a trailing `/` copies into that directory
    pub target: String,

    /// Copy a directory tree
    #[arg(short, long)]
    pub recursive: bool,

    /// With -r, copy the directory's contents rather than the directory itself
    #[arg(long, requires = "recursive")]
    pub contents: bool,

    /// With -r, merge into a destination that already exists
    #[arg(long, requires = "recursive")]
    pub dir_exist_ok: bool,
}

#[derive(Debug, Serialize)]
struct CpOutput {
    status: &'static str,
    source: String,
    target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    files: Option<usize>,
}

/// Execute the cp command
pub async fn execute(args: CpArgs, session: &Session, formatter: &Formatter) -> ExitCode {
    let resolver = match session.resolver(&[&args.source, &args.target]).await {
        Ok(r) => r,
        Err(e) => return fail(formatter, "Failed to set up storage", &e),
    };

    let spinner = ProgressBar::spinner(
        formatter.config(),
        &format!("Copying {} to {}", args.source, args.target),
    );
    let result = copy(&resolver, &args).await;
    spinner.finish_and_clear();

    match result {
        Ok(output) => {
            if formatter.is_json() {
                formatter.json(&output);
            } else {
                let detail = output
                    .files
                    .map(|n| format!(" ({n} file(s))"))
                    .unwrap_or_default();
                formatter.success(&format!(
                    "Copied {} to {}{detail}",
                    output.source, output.target
                ));
            }
            ExitCode::Success
        }
        Err(e) => fail(
            formatter,
            &format!("Failed to copy {} to {}", args.source, args.target),
            &e,
        ),
    }
}

async fn copy(resolver: &Resolver, args: &CpArgs) -> Result<CpOutput> {
    if args.recursive {
        let src = resolver.to_directory(&args.source)?;
        let dst = resolver.to_directory(&args.target)?;
        let (target, files) = if args.contents {
            let files = src.duplicate(&dst, args.dir_exist_ok).await?;
            (dst.path().to_string(), Some(files))
        } else {
            let copied = src.copy_to(&dst, args.dir_exist_ok).await?;
            let files = copied.file_count().await?;
            (copied.path().to_string(), Some(files as usize))
        };
        return Ok(CpOutput {
            status: "success",
            source: src.path().to_string(),
            target,
            files,
        });
    }

    let src = resolver.to_file(&args.source)?;
    let target = if args.target.ends_with('/') {
        let dir = resolver.to_directory(&args.target)?;
        src.copy_to(&dir).await?
    } else {
        let dst = resolver.to_file(&args.target)?;
        src.duplicate(&dst).await?;
        dst
    };

    Ok(CpOutput {
        status: "success",
        source: src.path().to_string(),
        target: target.path().to_string(),
        files: None,
    })
}
