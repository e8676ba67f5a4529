//! put command - Write stdin to a file
//!
//! Reads all of stdin and stores it at the target path. Useful for piping
//! output from other commands into either backend.

use clap::Args;
use serde::Serialize;
use tokio::io::AsyncReadExt;

use super::{Session, fail};
use crate::exit_code::ExitCode;
use crate::output::Formatter;
use ufs_core::WriteMode;

/// Write stdin to a file
#[derive(Args, Debug)]
pub struct PutArgs {
    /// Destination file path
    pub target: String,

    /// Append instead of replacing (local files only)
    #[arg(long)]
    pub append: bool,
}

#[derive(Debug, Serialize)]
struct PutOutput {
    status: &'static str,
    target: String,
    size_bytes: usize,
    size_human: String,
    mode: WriteMode,
}

/// Execute the put command
pub async fn execute(args: PutArgs, session: &Session, formatter: &Formatter) -> ExitCode {
    let resolver = match session.resolver(&[&args.target]).await {
        Ok(r) => r,
        Err(e) => return fail(formatter, "Failed to set up storage", &e),
    };

    let file = match resolver.to_file(&args.target) {
        Ok(f) => f,
        Err(e) => return fail(formatter, "Invalid path", &e),
    };

    let mut data = Vec::new();
    if let Err(e) = tokio::io::stdin().read_to_end(&mut data).await {
        formatter.error(&format!("Failed to read from stdin: {e}"));
        return ExitCode::GeneralError;
    }

    let mode = if args.append {
        WriteMode::Append
    } else {
        WriteMode::Write
    };

    if let Err(e) = file.write_bytes(&data, mode).await {
        return fail(formatter, &format!("Failed to write {file}"), &e);
    }

    let size_human = humansize::format_size(data.len(), humansize::BINARY);
    if formatter.is_json() {
        formatter.json(&PutOutput {
            status: "success",
            target: file.path().to_string(),
            size_bytes: data.len(),
            size_human,
            mode,
        });
    } else {
        formatter.success(&format!("Wrote {size_human} to {file}"));
    }
    ExitCode::Success
}
