//! Content hashing for locally cached bundle files.
//!
//! Catalog hashes are lowercase hex digests of the published bundle bytes.
//! The producer writes MD5 digests; SHA-256 is available for catalogs that
//! opt into it.

use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use md5::Md5;
use sha2::{Digest, Sha256};

/// Buffer size for reading files during hashing (64KB).
const BUFFER_SIZE: usize = 64 * 1024;

/// Digest algorithm used for bundle content hashes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HashAlgorithm {
    /// MD5, as written by the bundle producer.
    #[default]
    Md5,
    /// SHA-256.
    Sha256,
}

impl HashAlgorithm {
    /// Canonical lowercase name.
    pub fn name(&self) -> &'static str {
        match self {
            HashAlgorithm::Md5 => "md5",
            HashAlgorithm::Sha256 => "sha256",
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "md5" => Ok(HashAlgorithm::Md5),
            "sha256" | "sha-256" => Ok(HashAlgorithm::Sha256),
            other => Err(format!("unknown hash algorithm: {}", other)),
        }
    }
}

/// Calculate the content hash of a file.
///
/// # Returns
///
/// The lowercase hexadecimal digest of the file contents.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn calculate_file_hash(path: &Path, algorithm: HashAlgorithm) -> std::io::Result<String> {
    match algorithm {
        HashAlgorithm::Md5 => {
            let mut hasher = Md5::new();
            read_chunks(path, |chunk| hasher.update(chunk))?;
            Ok(format!("{:x}", hasher.finalize()))
        }
        HashAlgorithm::Sha256 => {
            let mut hasher = Sha256::new();
            read_chunks(path, |chunk| hasher.update(chunk))?;
            Ok(format!("{:x}", hasher.finalize()))
        }
    }
}

/// Calculate the content hash of an in-memory buffer.
pub fn calculate_bytes_hash(bytes: &[u8], algorithm: HashAlgorithm) -> String {
    match algorithm {
        HashAlgorithm::Md5 => format!("{:x}", Md5::digest(bytes)),
        HashAlgorithm::Sha256 => format!("{:x}", Sha256::digest(bytes)),
    }
}

fn read_chunks(path: &Path, mut on_chunk: impl FnMut(&[u8])) -> std::io::Result<()> {
    let mut file = File::open(path)?;
    let mut buffer = vec![0u8; BUFFER_SIZE];

    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            return Ok(());
        }
        on_chunk(&buffer[..bytes_read]);
    }
}
