//! CLI command definitions and execution
//!
//! Every command resolves its paths through one [`Session`], which carries
//! the loaded configuration and the cancellation token wired to Ctrl-C.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use ufs_core::{CancellationToken, Config, ConfigManager, Error, Protocol, Resolver};
use ufs_s3::S3Client;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

mod archive;
mod cat;
mod checksum;
mod completions;
mod cp;
mod ls;
mod put;
mod rm;
mod stat;

/// ufs - one file model over local disks and S3
///
/// Paths starting with `/` are local; `s3://` and `s3a://` paths address
/// the object store configured in the `[s3]` section.
#[derive(Parser, Debug)]
#[command(name = "ufs")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format: human-readable or JSON
    #[arg(long, global = true, default_value = "false")]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true, default_value = "false")]
    pub no_color: bool,

    /// Disable progress spinner
    #[arg(long, global = true, default_value = "false")]
    pub no_progress: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, default_value = "false")]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long, global = true, default_value = "false")]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the files under a directory or prefix
    Ls(ls::LsArgs),

    /// Print a file's contents
    Cat(cat::CatArgs),

    /// Write stdin to a file
    Put(put::PutArgs),

    /// Show existence, size and file count
    Stat(stat::StatArgs),

    /// Copy files or directories across backends
    Cp(cp::CpArgs),

    /// Remove files or directories
    Rm(rm::RmArgs),

    /// Pack a directory into a zip or gztar archive
    Archive(archive::ArchiveArgs),

    /// Print a file's checksum
    Checksum(checksum::ChecksumArgs),

    /// Generate shell completion scripts
    Completions(completions::CompletionsArgs),
}

/// Loaded configuration plus the process-wide cancellation token
#[derive(Debug)]
pub struct Session {
    config: Config,
    cancel: CancellationToken,
}

impl Session {
    pub fn new(config: Config, cancel: CancellationToken) -> Self {
        Self { config, cancel }
    }

    /// Build a resolver for `paths`
    ///
    /// The S3 client is only created when one of the paths addresses the
    /// object store, so local-only commands never touch AWS configuration.
    pub async fn resolver(&self, paths: &[&str]) -> ufs_core::Result<Resolver> {
        let mut resolver =
            Resolver::new(self.config.storage.clone())?.with_cancellation(self.cancel.clone());
        if paths.iter().any(|p| Protocol::strip(p.trim()).is_some()) {
            let client = S3Client::new(&self.config.s3).await?;
            resolver = resolver.with_object_store(Arc::new(client));
        }
        Ok(resolver)
    }
}

/// Report `err` and pick the matching exit code
pub(crate) fn fail(formatter: &Formatter, context: &str, err: &Error) -> ExitCode {
    formatter.error(&format!("{context}: {err}"));
    ExitCode::from(err)
}

/// Execute the CLI command and return an exit code
pub async fn execute(cli: Cli, cancel: CancellationToken) -> ExitCode {
    let flags = OutputConfig {
        json: cli.json,
        no_color: cli.no_color,
        no_progress: cli.no_progress,
        quiet: cli.quiet,
    };

    if let Commands::Completions(args) = cli.command {
        return completions::execute(args);
    }

    let config = match ConfigManager::new().and_then(|manager| manager.load()) {
        Ok(config) => config,
        Err(e) => return fail(&Formatter::new(flags), "Failed to load configuration", &e),
    };
    let formatter = Formatter::new(flags.with_defaults(&config.defaults));
    let session = Session::new(config, cancel);

    match cli.command {
        Commands::Ls(args) => ls::execute(args, &session, &formatter).await,
        Commands::Cat(args) => cat::execute(args, &session, &formatter).await,
        Commands::Put(args) => put::execute(args, &session, &formatter).await,
        Commands::Stat(args) => stat::execute(args, &session, &formatter).await,
        Commands::Cp(args) => cp::execute(args, &session, &formatter).await,
        Commands::Rm(args) => rm::execute(args, &session, &formatter).await,
        Commands::Archive(args) => archive::execute(args, &session, &formatter).await,
        Commands::Checksum(args) => checksum::execute(args, &session, &formatter).await,
        Commands::Completions(args) => completions::execute(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["ufs", "ls", "/tmp/", "--json", "-r"]).unwrap();
        assert!(cli.json);
        assert!(matches!(cli.command, Commands::Ls(ref args) if args.recursive));
    }

    #[tokio::test]
    async fn test_local_paths_need_no_object_store() {
        let session = Session::new(Config::default(), CancellationToken::new());
        let resolver = session.resolver(&["/tmp/a", "/tmp/b/"]).await.unwrap();
        assert!(matches!(
            resolver.to_file("s3://bkt/k"),
            Err(Error::Unsupported(_))
        ));
    }
}
