//! `hash` command.

use std::path::Path;

use clap::ValueEnum;
use bundleflow::local::{calculate_file_hash, HashAlgorithm};

use crate::error::CliError;

/// Digest selection for CLI arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum HashArg {
    /// MD5 (what catalogs carry)
    Md5,
    /// SHA-256
    Sha256,
}

impl From<HashArg> for HashAlgorithm {
    fn from(arg: HashArg) -> Self {
        match arg {
            HashArg::Md5 => HashAlgorithm::Md5,
            HashArg::Sha256 => HashAlgorithm::Sha256,
        }
    }
}

/// Print the hash of `file` in `sha256sum` style.
pub fn run(file: &Path, algorithm: HashAlgorithm) -> Result<(), CliError> {
    let hash = calculate_file_hash(file, algorithm).map_err(|source| CliError::Io {
        path: file.to_path_buf(),
        source,
    })?;
    println!("{}  {}", hash, file.display());
    Ok(())
}
