//! Byte fetchers for speaker embeddings.

use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::{Result, ShellError};

/// Fetches the raw bytes stored at `url`.
#[async_trait]
pub trait EmbeddingFetcher: Send + Sync {
    async fn fetch_bytes(&self, url: &str) -> Result<Bytes>;
}

/// Fetches over HTTP(S).
#[cfg(feature = "http")]
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

#[cfg(feature = "http")]
impl HttpFetcher {
    /// A fetcher without a request timeout.
    pub fn new() -> Result<Self> {
        Self::with_timeout(None)
    }

    pub fn with_timeout(timeout: Option<std::time::Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ShellError::Configuration(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[cfg(feature = "http")]
#[async_trait]
impl EmbeddingFetcher for HttpFetcher {
    async fn fetch_bytes(&self, url: &str) -> Result<Bytes> {
        log::debug!("GET {url}");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| ShellError::load(url, e))?;
        response.bytes().await.map_err(|e| ShellError::load(url, e))
    }
}

/// Reads from the local filesystem.
///
/// Accepts plain paths and `file://` urls. Relative paths resolve against
/// `root` when one is set.
#[derive(Debug, Clone, Default)]
pub struct FileFetcher {
    root: Option<PathBuf>,
}

impl FileFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    fn resolve(&self, url: &str) -> PathBuf {
        let path = PathBuf::from(url.strip_prefix("file://").unwrap_or(url));
        match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path,
        }
    }
}

#[async_trait]
impl EmbeddingFetcher for FileFetcher {
    async fn fetch_bytes(&self, url: &str) -> Result<Bytes> {
        let path = self.resolve(url);
        log::debug!("Reading {}", path.display());
        tokio::fs::read(&path)
            .await
            .map(Bytes::from)
            .map_err(|e| ShellError::load(path.display().to_string(), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_urls_and_relative_paths_resolve_under_root() {
        let fetcher = FileFetcher::with_root("/voices");
        assert_eq!(fetcher.resolve("file://a.bin"), PathBuf::from("/voices/a.bin"));
        assert_eq!(fetcher.resolve("b.bin"), PathBuf::from("/voices/b.bin"));
        assert_eq!(fetcher.resolve("/abs/c.bin"), PathBuf::from("/abs/c.bin"));
        assert_eq!(FileFetcher::new().resolve("file:///x/d.bin"), PathBuf::from("/x/d.bin"));
    }

    #[tokio::test]
    async fn missing_file_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = FileFetcher::with_root(dir.path());
        let err = fetcher.fetch_bytes("nope.bin").await.unwrap_err();
        assert!(matches!(err, ShellError::ResourceLoad { .. }));
    }

    #[tokio::test]
    async fn reads_file_contents() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("v.bin"), [1u8, 2, 3]).unwrap();
        let fetcher = FileFetcher::with_root(dir.path());
        let bytes = fetcher.fetch_bytes("v.bin").await.unwrap();
        assert_eq!(&bytes[..], &[1, 2, 3]);
    }
}
