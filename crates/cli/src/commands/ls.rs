//! ls command - List files
//!
//! A path ending in `/` (or a bare bucket) is listed as a directory; any
//! other path is treated as a prefix, which on the object store also
//! matches sibling keys such as `data.csv` for `s3://bkt/data`.

use clap::Args;
use serde::Serialize;

use super::{Session, fail};
use crate::exit_code::ExitCode;
use crate::output::Formatter;
use ufs_core::{Entity, Resolver, Result};

/// List files under a directory or prefix
#[derive(Args, Debug)]
pub struct LsArgs {
    /// Directory (trailing `/`) or prefix to list
    pub path: String,

    /// List recursively
    #[arg(short, long)]
    pub recursive: bool,

    /// Return at most N paths
    #[arg(long, value_name = "N")]
    pub limit: Option<usize>,

    /// Summarize output (show totals only)
    #[arg(long)]
    pub summarize: bool,
}

/// Output structure for ls command (JSON format)
#[derive(Debug, Serialize)]
struct LsOutput {
    path: String,
    files: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<Summary>,
}

#[derive(Debug, Serialize)]
struct Summary {
    total_files: u64,
    total_size_bytes: u64,
    total_size_human: String,
}

/// Execute the ls command
pub async fn execute(args: LsArgs, session: &Session, formatter: &Formatter) -> ExitCode {
    let resolver = match session.resolver(&[&args.path]).await {
        Ok(r) => r,
        Err(e) => return fail(formatter, "Failed to set up storage", &e),
    };

    match list(&resolver, &args).await {
        Ok(output) => {
            print(&output, &args, formatter);
            ExitCode::Success
        }
        Err(e) => fail(formatter, &format!("Failed to list {}", args.path), &e),
    }
}

async fn list(resolver: &Resolver, args: &LsArgs) -> Result<LsOutput> {
    let (path, files, summary) = match resolver.resolve(&args.path)? {
        Entity::Directory(dir) => {
            let files = dir.list_files(args.recursive, args.limit).await?;
            let summary = if args.summarize {
                Some(summary(dir.file_count().await?, dir.size().await?))
            } else {
                None
            };
            (dir.path().to_string(), files, summary)
        }
        _ => {
            let prefix = resolver.to_directory_prefix(&args.path)?;
            let files = prefix.list_files(args.recursive, args.limit).await?;
            let summary = if args.summarize {
                Some(summary(prefix.file_count().await?, prefix.size().await?))
            } else {
                None
            };
            (prefix.path().to_string(), files, summary)
        }
    };

    Ok(LsOutput {
        path,
        files,
        summary,
    })
}

fn summary(total_files: u64, total_size_bytes: u64) -> Summary {
    Summary {
        total_files,
        total_size_bytes,
        total_size_human: humansize::format_size(total_size_bytes, humansize::BINARY),
    }
}

fn print(output: &LsOutput, args: &LsArgs, formatter: &Formatter) {
    if formatter.is_json() {
        formatter.json(output);
        return;
    }

    if !args.summarize {
        for file in &output.files {
            formatter.println(file);
        }
    }
    if let Some(summary) = &output.summary {
        formatter.println(&format!(
            "Total: {} file(s), {}",
            summary.total_files, summary.total_size_human
        ));
    }
}
