//! cat command - Display file contents
//!
//! Outputs the entire content of a local file or object to stdout.

use clap::Args;
use std::io::{self, Write};

use super::{Session, fail};
use crate::exit_code::ExitCode;
use crate::output::Formatter;

/// Display file contents
#[derive(Args, Debug)]
pub struct CatArgs {
    /// File path (`/local/path` or `s3://bucket/key`)
    pub path: String,
}

/// Execute the cat command
pub async fn execute(args: CatArgs, session: &Session, formatter: &Formatter) -> ExitCode {
    let resolver = match session.resolver(&[&args.path]).await {
        Ok(r) => r,
        Err(e) => return fail(formatter, "Failed to set up storage", &e),
    };

    let file = match resolver.to_file(&args.path) {
        Ok(f) => f,
        Err(e) => return fail(formatter, "Invalid path", &e),
    };

    match file.read_bytes().await {
        Ok(data) => {
            // Write directly to stdout (not through formatter to preserve binary data)
            let mut stdout = io::stdout().lock();
            if let Err(e) = stdout.write_all(&data).and_then(|()| stdout.flush()) {
                formatter.error(&format!("Failed to write to stdout: {e}"));
                return ExitCode::GeneralError;
            }
            ExitCode::Success
        }
        Err(e) => fail(formatter, &format!("Failed to read {file}"), &e),
    }
}
