use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::debug;

pub const POSTER_FILE_NAME: &str = "folder.jpg";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("download timed out: {0}")]
    Timeout(String),
    #[error("server returned HTTP {0}")]
    Status(u16),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout(e.to_string())
        } else if let Some(status) = e.status() {
            Self::Status(status.as_u16())
        } else {
            Self::Transport(e.to_string())
        }
    }
}

/// Source of image bytes.
#[async_trait::async_trait]
pub trait ImageDownloader: Send + Sync {
    async fn download(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Downloads images over HTTP with a per-request timeout.
pub struct HttpDownloader {
    client: reqwest::Client,
}

impl HttpDownloader {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Transport(format!("build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl ImageDownloader for HttpDownloader {
    async fn download(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        debug!(url = %url, "downloading poster");
        let resp = self.client.get(url).send().await?.error_for_status()?;
        Ok(resp.bytes().await?.to_vec())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchStatus {
    /// New bytes were written to this path.
    Saved(PathBuf),
    /// A poster already exists here and overwriting is disabled.
    Skipped(PathBuf),
}

/// Downloads a poster into a media folder as `folder.jpg`.
pub struct PosterFetcher {
    downloader: Arc<dyn ImageDownloader>,
}

impl PosterFetcher {
    pub fn new(downloader: Arc<dyn ImageDownloader>) -> Self {
        Self { downloader }
    }

    /// Fetch `url` into `folder`.
    ///
    /// An existing poster (any file at the poster path, even an empty one) is
    /// left alone without touching the network unless `overwrite` is set.
    pub async fn fetch(
        &self,
        url: &str,
        folder: &Path,
        overwrite: bool,
    ) -> Result<FetchStatus, FetchError> {
        let poster_path = folder.join(POSTER_FILE_NAME);
        if !overwrite && tokio::fs::try_exists(&poster_path).await? {
            return Ok(FetchStatus::Skipped(poster_path));
        }

        let bytes = self.downloader.download(url).await?;
        atomic_write(&poster_path, &bytes).await?;
        Ok(FetchStatus::Saved(poster_path))
    }
}

/// Write to a temporary sibling, sync, then rename over `path`.
async fn atomic_write(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| POSTER_FILE_NAME.to_string());
    let tmp_path = path.with_file_name(format!(
        ".{file_name}.{}.tmp",
        uuid::Uuid::new_v4().simple()
    ));

    let result: std::io::Result<()> = async {
        let mut file = tokio::fs::File::create(&tmp_path).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);
        tokio::fs::rename(&tmp_path, path).await
    }
    .await;

    if result.is_err() {
        let _ = tokio::fs::remove_file(&tmp_path).await;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeDownloader;

    fn fetcher(downloader: &Arc<FakeDownloader>) -> PosterFetcher {
        PosterFetcher::new(downloader.clone())
    }

    fn tmp_files(dir: &Path) -> usize {
        std::fs::read_dir(dir)
            .unwrap()
            .flatten()
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .count()
    }

    #[tokio::test]
    async fn saves_downloaded_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let downloader = Arc::new(FakeDownloader::default().with_image("http://img/a.jpg", b"jpeg"));

        let status = fetcher(&downloader)
            .fetch("http://img/a.jpg", dir.path(), false)
            .await
            .unwrap();

        let expected = dir.path().join(POSTER_FILE_NAME);
        assert_eq!(status, FetchStatus::Saved(expected.clone()));
        assert_eq!(std::fs::read(expected).unwrap(), b"jpeg");
        assert_eq!(tmp_files(dir.path()), 0);
    }

    #[tokio::test]
    async fn existing_poster_is_skipped_without_download() {
        let dir = tempfile::tempdir().unwrap();
        let poster = dir.path().join(POSTER_FILE_NAME);
        std::fs::write(&poster, b"").unwrap();
        let downloader = Arc::new(FakeDownloader::default().with_image("http://img/a.jpg", b"new"));

        let status = fetcher(&downloader)
            .fetch("http://img/a.jpg", dir.path(), false)
            .await
            .unwrap();

        assert_eq!(status, FetchStatus::Skipped(poster.clone()));
        assert_eq!(downloader.calls(), 0);
        assert_eq!(std::fs::read(poster).unwrap(), b"");
    }

    #[tokio::test]
    async fn overwrite_replaces_existing_poster() {
        let dir = tempfile::tempdir().unwrap();
        let poster = dir.path().join(POSTER_FILE_NAME);
        std::fs::write(&poster, b"old").unwrap();
        let downloader = Arc::new(FakeDownloader::default().with_image("http://img/a.jpg", b"new"));

        let status = fetcher(&downloader)
            .fetch("http://img/a.jpg", dir.path(), true)
            .await
            .unwrap();

        assert_eq!(status, FetchStatus::Saved(poster.clone()));
        assert_eq!(std::fs::read(poster).unwrap(), b"new");
    }

    #[tokio::test]
    async fn failed_download_leaves_existing_poster_intact() {
        let dir = tempfile::tempdir().unwrap();
        let poster = dir.path().join(POSTER_FILE_NAME);
        std::fs::write(&poster, b"old").unwrap();
        let downloader = Arc::new(FakeDownloader::default());

        let result = fetcher(&downloader)
            .fetch("http://img/missing.jpg", dir.path(), true)
            .await;

        assert!(matches!(result, Err(FetchError::Status(404))));
        assert_eq!(downloader.calls(), 1);
        assert_eq!(std::fs::read(poster).unwrap(), b"old");
        assert_eq!(tmp_files(dir.path()), 0);
    }

    #[tokio::test]
    async fn write_failure_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("gone");
        let downloader = Arc::new(FakeDownloader::default().with_image("http://img/a.jpg", b"jpeg"));

        let result = fetcher(&downloader)
            .fetch("http://img/a.jpg", &missing, false)
            .await;

        assert!(matches!(result, Err(FetchError::Io(_))));
    }
}
