//! ufs - one file model over local disks and S3
//!
//! A command-line interface over the ufs storage library. Local paths and
//! `s3://` / `s3a://` paths can be mixed freely in every command.

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use ufs_cli::commands::{self, Cli};
use ufs_core::CancellationToken;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // --debug wins over RUST_LOG; logs go to stderr so stdout stays clean
    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling outstanding requests");
            on_interrupt.cancel();
        }
    });

    let exit_code = commands::execute(cli, cancel).await;

    std::process::exit(exit_code.as_i32());
}
