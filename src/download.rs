//! Download capability.
//!
//! The export dialog never touches the filesystem or the transfer itself; it
//! hands a URL to a [`Downloader`] provided by the host environment.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use thiserror::Error;
use tokio::io::AsyncWriteExt;

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("download failed with status {status}")]
    Status { status: u16 },
    #[error("transfer failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("could not write file: {0}")]
    Io(#[from] std::io::Error),
}

/// Fetches a URL to a local file.
#[async_trait]
pub trait Downloader: Send + Sync {
    async fn fetch(&self, url: &str, dest: &Path) -> Result<PathBuf, DownloadError>;
}

/// Streaming HTTP downloader.
pub struct HttpDownloader {
    http: Client,
    credentials: Option<(String, Option<String>)>,
}

impl HttpDownloader {
    pub fn new(credentials: Option<(String, Option<String>)>) -> Self {
        Self {
            http: Client::new(),
            credentials,
        }
    }
}

#[async_trait]
impl Downloader for HttpDownloader {
    async fn fetch(&self, url: &str, dest: &Path) -> Result<PathBuf, DownloadError> {
        let mut request = self.http.get(url);
        if let Some((user, password)) = &self.credentials {
            request = request.basic_auth(user, password.as_deref());
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::Status {
                status: status.as_u16(),
            });
        }

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::File::create(dest).await?;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            file.write_all(&chunk?).await?;
        }
        file.flush().await?;

        tracing::info!(path = %dest.display(), "Export written");
        Ok(dest.to_path_buf())
    }
}

/// Timestamped file name for an export.
pub fn export_file_name() -> String {
    format!(
        "policies-{}.json",
        chrono::Local::now().format("%Y%m%d-%H%M%S")
    )
}

/// Where exports land when no output directory is configured.
pub fn default_output_dir() -> PathBuf {
    dirs::download_dir().unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn export_file_name_is_json() {
        let name = export_file_name();
        assert!(name.starts_with("policies-"));
        assert!(name.ends_with(".json"));
    }
}
