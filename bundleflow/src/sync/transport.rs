//! Abstract byte transport used to fetch the catalog and bundle files.
//!
//! The sync engine never talks to the network or filesystem directly for
//! remote data; it goes through a [`Transport`]. Two implementations are
//! provided:
//!
//! - [`FileTransport`] - copies from a local source directory
//! - [`HttpTransport`] - downloads over HTTP(S) with `reqwest`

use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncWriteExt, BufWriter};

/// Boxed future type for dyn-compatible async methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Default timeout for HTTP requests in seconds.
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 300;

/// Buffer size for writing downloaded bundles (64KB).
const WRITE_BUFFER_SIZE: usize = 64 * 1024;

/// Errors reported by a transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Reading from the source failed.
    #[error("failed to read {location}: {source}")]
    Read { location: String, source: io::Error },

    /// Writing the destination file failed.
    #[error("failed to write {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },

    /// The remote answered with a non-success status.
    #[error("{location} returned HTTP status {status}")]
    Status { location: String, status: u16 },

    /// The request itself failed (connection, TLS, protocol).
    #[error("request to {location} failed: {reason}")]
    Request { location: String, reason: String },
}

/// Fetches remote resources addressed by a location string.
///
/// # Dyn Compatibility
///
/// Methods return [`BoxFuture`] so the engine can hold an
/// `Arc<dyn Transport>`.
pub trait Transport: Send + Sync {
    /// Fetch `location` and write its bytes to `destination`.
    ///
    /// Returns the number of bytes written. The destination file may be left
    /// partially written on failure.
    fn fetch<'a>(
        &'a self,
        location: &'a str,
        destination: &'a Path,
    ) -> BoxFuture<'a, Result<u64, TransportError>>;

    /// Read `location` fully into memory.
    fn read<'a>(&'a self, location: &'a str) -> BoxFuture<'a, Result<Vec<u8>, TransportError>>;
}

/// Build the location of a resource under a source root.
///
/// # Examples
///
/// ```
/// use bundleflow::sync::join_location;
///
/// assert_eq!(
///     join_location("https://cdn.example.com/ab/", "a.bundle"),
///     "https://cdn.example.com/ab/a.bundle"
/// );
/// assert_eq!(join_location("/data/ab", "a.bundle"), "/data/ab/a.bundle");
/// ```
pub fn join_location(root: &str, name: &str) -> String {
    if root.is_empty() {
        return name.to_string();
    }
    format!("{}/{}", root.trim_end_matches(['/', '\\']), name)
}

/// Whether a location is an HTTP(S) URL.
pub fn is_http_location(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

async fn write_destination(destination: &Path, bytes: &[u8]) -> Result<u64, TransportError> {
    let write_err = |source| TransportError::Write {
        path: destination.to_path_buf(),
        source,
    };

    if let Some(parent) = destination.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }
    tokio::fs::write(destination, bytes).await.map_err(write_err)?;
    Ok(bytes.len() as u64)
}

/// Transport over the local filesystem.
///
/// Locations are plain file paths.
#[derive(Debug, Clone, Default)]
pub struct FileTransport;

impl FileTransport {
    /// Create a new file transport.
    pub fn new() -> Self {
        Self
    }
}

impl Transport for FileTransport {
    fn fetch<'a>(
        &'a self,
        location: &'a str,
        destination: &'a Path,
    ) -> BoxFuture<'a, Result<u64, TransportError>> {
        Box::pin(async move {
            let bytes = self.read(location).await?;
            write_destination(destination, &bytes).await
        })
    }

    fn read<'a>(&'a self, location: &'a str) -> BoxFuture<'a, Result<Vec<u8>, TransportError>> {
        Box::pin(async move {
            tokio::fs::read(location)
                .await
                .map_err(|source| TransportError::Read {
                    location: location.to_string(),
                    source,
                })
        })
    }
}

/// Transport over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create an HTTP transport with the default request timeout.
    pub fn new() -> Result<Self, TransportError> {
        Self::with_timeout(Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS))
    }

    /// Create an HTTP transport with a custom request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Request {
                location: String::new(),
                reason: format!("failed to create HTTP client: {}", e),
            })?;

        Ok(Self { client })
    }

    async fn send(&self, location: &str) -> Result<reqwest::Response, TransportError> {
        let response = self
            .client
            .get(location)
            .send()
            .await
            .map_err(|e| request_error(location, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                location: location.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    /// Stream the response body to `destination` through a buffered writer.
    async fn download(&self, location: &str, destination: &Path) -> Result<u64, TransportError> {
        let mut response = self.send(location).await?;

        let write_err = |source| TransportError::Write {
            path: destination.to_path_buf(),
            source,
        };
        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
        }
        let file = tokio::fs::File::create(destination)
            .await
            .map_err(write_err)?;
        let mut writer = BufWriter::with_capacity(WRITE_BUFFER_SIZE, file);

        let mut written = 0u64;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| request_error(location, e))?
        {
            writer.write_all(&chunk).await.map_err(write_err)?;
            written += chunk.len() as u64;
        }
        writer.flush().await.map_err(write_err)?;

        Ok(written)
    }
}

fn request_error(location: &str, e: reqwest::Error) -> TransportError {
    TransportError::Request {
        location: location.to_string(),
        reason: e.to_string(),
    }
}

impl Transport for HttpTransport {
    fn fetch<'a>(
        &'a self,
        location: &'a str,
        destination: &'a Path,
    ) -> BoxFuture<'a, Result<u64, TransportError>> {
        Box::pin(self.download(location, destination))
    }

    fn read<'a>(&'a self, location: &'a str) -> BoxFuture<'a, Result<Vec<u8>, TransportError>> {
        Box::pin(async move {
            let response = self.send(location).await?;
            let bytes = response
                .bytes()
                .await
                .map_err(|e| request_error(location, e))?;
            Ok(bytes.to_vec())
        })
    }
}
