//! BundleFlow CLI - inspect and maintain a local bundle cache
//!
//! This binary wraps the parts of the BundleFlow library that make sense
//! without a host bundle runtime: planning a sync against the remote
//! catalog, inspecting local state and clearing the cache.

mod commands;
mod error;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use console::style;

use bundleflow::logging::init_logging;

use crate::commands::hash::HashArg;
use crate::error::CliError;

#[derive(Debug, Parser)]
#[command(name = "bundleflow", version, about = "Inspect and maintain a local bundle cache")]
struct Cli {
    /// Config file (defaults to the per-user config.ini)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Also write logs to daily files in this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show configured paths, persisted version and local bundle hashes
    Status,
    /// Fetch the remote catalog and print what a sync would download
    Plan,
    /// Print the bundle name derived from an asset path
    Name {
        /// Asset path, e.g. Assets/AssetBundles/Characters/Hero.prefab
        asset_path: String,
    },
    /// Print the content hash of a file
    Hash {
        file: PathBuf,
        /// Digest algorithm
        #[arg(long, value_enum, default_value_t = HashArg::Md5)]
        algorithm: HashArg,
    },
    /// Delete everything in the local bundle directory
    Clear,
}

fn run(cli: Cli) -> Result<(), CliError> {
    let _guard = init_logging(cli.log_dir.as_deref(), cli.verbose)?;

    let config_path = cli.config.as_deref();
    match cli.command {
        Command::Status => commands::status::run(&commands::load_config(config_path)?),
        Command::Plan => commands::plan::run(&commands::load_config(config_path)?),
        Command::Clear => commands::clear::run(&commands::load_config(config_path)?),
        Command::Name { asset_path } => {
            commands::name::run(&asset_path);
            Ok(())
        }
        Command::Hash { file, algorithm } => commands::hash::run(&file, algorithm.into()),
    }
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("error:").red().bold(), e);
            ExitCode::FAILURE
        }
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
        let cli = Cli::try_parse_from(["bundleflow", "status", "--config", "x.ini", "-v"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("x.ini")));
        assert!(matches!(cli.command, Command::Status));
    }

    #[test]
    fn test_hash_defaults_to_md5() {
        let cli = Cli::try_parse_from(["bundleflow", "hash", "a.bundle"]).unwrap();
        match cli.command {
            Command::Hash { algorithm, .. } => assert_eq!(algorithm, HashArg::Md5),
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
