//! Streaming audio downloads.
//!
//! The fetcher takes an absolute resource URL and a destination path, streams
//! the response body to disk chunk by chunk, and surfaces every failure mode
//! as one [`FetchError`]. It never retries and never buffers a whole file in
//! memory. An existing destination file is truncated — rerunning with the
//! same index and title overwrites, which is the accepted behavior.

use std::path::{Path, PathBuf};

use futures::StreamExt;
use reqwest::Client;
use thiserror::Error;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, instrument};
use url::Url;

/// Errors that can occur while downloading one audio file.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The resource URL is malformed or could not be made absolute.
    #[error("invalid resource URL: {url}")]
    InvalidUrl {
        /// The offending URL string.
        url: String,
    },

    /// Network-level failure (DNS, connection, TLS, mid-stream drop).
    #[error("network error downloading {url}: {source}")]
    Network {
        /// The URL that failed to download.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// The transfer exceeded the client's request timeout.
    #[error("timeout downloading {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// The server answered with a non-success status.
    #[error("HTTP {status} downloading {url}")]
    Status {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// Creating, writing, or flushing the destination file failed.
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The destination path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl FetchError {
    fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::Timeout { url: url.into() }
        } else {
            Self::Network {
                url: url.into(),
                source,
            }
        }
    }

    fn status(url: impl Into<String>, status: u16) -> Self {
        Self::Status {
            url: url.into(),
            status,
        }
    }

    fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Resolve a possibly-relative audio source against its article URL.
///
/// Absolute sources pass through untouched; relative ones are joined against
/// the article the way a browser would resolve them.
///
/// # Errors
///
/// Returns [`FetchError::InvalidUrl`] when neither interpretation yields a
/// valid absolute URL.
pub fn absolutize(article_url: &str, audio_src: &str) -> Result<String, FetchError> {
    if let Ok(absolute) = Url::parse(audio_src) {
        return Ok(absolute.to_string());
    }
    let base = Url::parse(article_url).map_err(|_| FetchError::invalid_url(article_url))?;
    base.join(audio_src)
        .map(|resolved| resolved.to_string())
        .map_err(|_| FetchError::invalid_url(audio_src))
}

/// Download `url` into `dest`, streaming the body to disk.
///
/// The parent directory of `dest` must already exist; the batch loop creates
/// it once before any download starts. Each call owns its destination file
/// handle exclusively, so any number of fetches may run concurrently.
///
/// # Returns
///
/// The number of bytes written after a successful flush.
///
/// # Errors
///
/// Returns [`FetchError`] on an invalid URL, any network or status failure,
/// or a local write failure. No retry is attempted.
#[instrument(level = "debug", skip_all, fields(url = %url, dest = %dest.display()))]
pub async fn fetch(client: &Client, url: &str, dest: &Path) -> Result<u64, FetchError> {
    if Url::parse(url).is_err() {
        return Err(FetchError::invalid_url(url));
    }

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| FetchError::network(url, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::status(url, status.as_u16()));
    }

    let file = File::create(dest)
        .await
        .map_err(|e| FetchError::io(dest, e))?;
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| FetchError::network(url, e))?;
        writer
            .write_all(&chunk)
            .await
            .map_err(|e| FetchError::io(dest, e))?;
        bytes_written += chunk.len() as u64;
    }

    writer.flush().await.map_err(|e| FetchError::io(dest, e))?;
    debug!(bytes = bytes_written, "download complete");

    Ok(bytes_written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_absolutize_passes_absolute_through() {
        let resolved = absolutize(
            "https://news.example.com/the-world-ahead/2026/story",
            "https://cdn.example.com/audio/story.mp3",
        )
        .unwrap();
        assert_eq!(resolved, "https://cdn.example.com/audio/story.mp3");
    }

    #[test]
    fn test_absolutize_joins_relative_against_article() {
        let resolved = absolutize(
            "https://news.example.com/the-world-ahead/2026/story",
            "/media/story.mp3",
        )
        .unwrap();
        assert_eq!(resolved, "https://news.example.com/media/story.mp3");
    }

    #[test]
    fn test_absolutize_rejects_garbage_base() {
        let result = absolutize("not a url", "also relative");
        assert!(matches!(result, Err(FetchError::InvalidUrl { .. })));
    }

    #[tokio::test]
    async fn test_fetch_streams_bytes_to_disk() {
        let server = MockServer::start().await;
        let body = vec![0xABu8; 256 * 1024];
        Mock::given(method("GET"))
            .and(path("/audio/story.mp3"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("0-story.mp3");
        let client = Client::new();

        let written = fetch(&client, &format!("{}/audio/story.mp3", server.uri()), &dest)
            .await
            .unwrap();

        assert_eq!(written, body.len() as u64);
        assert_eq!(std::fs::read(&dest).unwrap(), body);
    }

    #[tokio::test]
    async fn test_fetch_truncates_existing_destination() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/audio/short.mp3"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"new".to_vec()))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("3-short.mp3");
        std::fs::write(&dest, b"much longer stale content").unwrap();

        let client = Client::new();
        fetch(&client, &format!("{}/audio/short.mp3", server.uri()), &dest)
            .await
            .unwrap();

        assert_eq!(std::fs::read(&dest).unwrap(), b"new");
    }

    #[tokio::test]
    async fn test_fetch_non_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/audio/missing.mp3"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("1-missing.mp3");
        let client = Client::new();

        let result = fetch(&client, &format!("{}/audio/missing.mp3", server.uri()), &dest).await;

        match result {
            Err(FetchError::Status { status: 404, .. }) => {}
            other => panic!("expected 404 status error, got: {other:?}"),
        }
        assert!(!dest.exists(), "no file should be created before a 2xx response");
    }

    #[tokio::test]
    async fn test_fetch_invalid_url() {
        let dir = TempDir::new().unwrap();
        let client = Client::new();

        let result = fetch(&client, "not-a-valid-url", &dir.path().join("x.mp3")).await;
        assert!(matches!(result, Err(FetchError::InvalidUrl { .. })));
    }

    #[tokio::test]
    async fn test_fetch_write_failure_surfaces_io_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/audio/a.mp3"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"audio".to_vec()))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        // Destination parent does not exist: File::create must fail.
        let dest = dir.path().join("no-such-subdir").join("0-a.mp3");
        let client = Client::new();

        let result = fetch(&client, &format!("{}/audio/a.mp3", server.uri()), &dest).await;
        assert!(matches!(result, Err(FetchError::Io { .. })));
    }
}
