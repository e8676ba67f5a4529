//! rm command - Remove files and directories
//!
//! Directories (paths ending in `/`) need `-r`. On the object store a
//! recursive removal is issued as batched bulk deletes; a batch that fails
//! is reported without stopping the others.

use clap::Args;
use serde::Serialize;

use super::{Session, fail};
use crate::exit_code::ExitCode;
use crate::output::Formatter;
use ufs_core::{Entity, Error, Resolver, Result};

/// Remove files or directories
#[derive(Args, Debug)]
pub struct RmArgs {
    /// Path(s) to remove
    #[arg(required = true)]
    pub paths: Vec<String>,

    /// Remove directories and everything below them
    #[arg(short, long)]
    pub recursive: bool,

    /// Treat each path as a raw prefix (implies -r)
    #[arg(long)]
    pub prefix: bool,

    /// Do not fail when a path does not exist
    #[arg(short = 'f', long)]
    pub missing_ok: bool,

    /// Only show what would be removed
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Serialize)]
struct RmOutput {
    status: &'static str,
    dry_run: bool,
    removed: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    failed: Vec<String>,
    total: usize,
}

/// Execute the rm command
pub async fn execute(args: RmArgs, session: &Session, formatter: &Formatter) -> ExitCode {
    let paths: Vec<&str> = args.paths.iter().map(String::as_str).collect();
    let resolver = match session.resolver(&paths).await {
        Ok(r) => r,
        Err(e) => return fail(formatter, "Failed to set up storage", &e),
    };

    let mut removed = Vec::new();
    let mut failed = Vec::new();
    let mut exit = ExitCode::Success;

    for path in &args.paths {
        match remove(&resolver, path, &args).await {
            Ok(paths) => {
                if !formatter.is_json() {
                    let verb = if args.dry_run { "Would remove" } else { "Removed" };
                    for p in &paths {
                        formatter.println(&format!("{verb}: {p}"));
                    }
                }
                removed.extend(paths);
            }
            Err(e) => {
                exit = fail(formatter, &format!("Failed to remove {path}"), &e);
                failed.push(path.clone());
                // stop on errors that will repeat for every remaining path
                if matches!(e, Error::Cancelled | Error::AccessDenied(_) | Error::Config(_)) {
                    break;
                }
            }
        }
    }

    if formatter.is_json() {
        formatter.json(&RmOutput {
            status: if failed.is_empty() { "success" } else { "partial" },
            dry_run: args.dry_run,
            total: removed.len(),
            removed,
            failed,
        });
    } else if !args.dry_run && failed.is_empty() && !removed.is_empty() {
        formatter.success(&format!("Removed {} path(s).", removed.len()));
    }

    exit
}

async fn remove(resolver: &Resolver, path: &str, args: &RmArgs) -> Result<Vec<String>> {
    if args.prefix {
        let prefix = resolver.to_directory_prefix(path)?;
        return prefix.remove(args.missing_ok, args.dry_run).await;
    }

    let entity = resolver.resolve(path)?;
    if matches!(entity, Entity::Directory(_)) && !args.recursive {
        return Err(Error::InvalidPath(format!(
            "'{path}' is a directory (use -r to remove it)"
        )));
    }
    entity.remove(args.missing_ok, args.dry_run).await
}
