//! checksum command - Print a file's digest
//!
//! Output matches `sha256sum`/`md5sum`: the hex digest, two spaces, the path.

use clap::Args;
use serde::Serialize;
use std::fmt;

use super::{Session, fail};
use crate::exit_code::ExitCode;
use crate::output::Formatter;
use ufs_core::ChecksumAlgorithm;

/// Compute a file checksum
#[derive(Args, Debug)]
pub struct ChecksumArgs {
    /// File path
    pub path: String,

    /// Digest algorithm: sha256 or md5
    #[arg(long, short, default_value = "sha256")]
    pub algorithm: ChecksumAlgorithm,
}

#[derive(Debug, Serialize)]
struct ChecksumOutput {
    path: String,
    algorithm: ChecksumAlgorithm,
    checksum: String,
}

impl fmt::Display for ChecksumOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}  {}", self.checksum, self.path)
    }
}

/// Execute the checksum command
pub async fn execute(args: ChecksumArgs, session: &Session, formatter: &Formatter) -> ExitCode {
    let resolver = match session.resolver(&[&args.path]).await {
        Ok(r) => r,
        Err(e) => return fail(formatter, "Failed to set up storage", &e),
    };

    let file = match resolver.to_file(&args.path) {
        Ok(f) => f,
        Err(e) => return fail(formatter, "Invalid path", &e),
    };

    match file.checksum(args.algorithm).await {
        Ok(checksum) => {
            formatter.output(&ChecksumOutput {
                path: file.path().to_string(),
                algorithm: args.algorithm,
                checksum,
            });
            ExitCode::Success
        }
        Err(e) => fail(formatter, &format!("Failed to checksum {file}"), &e),
    }
}
