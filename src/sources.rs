use crate::utils::error::{EtlError, Result};
use crate::utils::validation::validate_url;
use futures_util::StreamExt;
use reqwest::{Client, Response};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use url::Url;

/// Where a feed lives: a local file, or an http(s) URL fetched before parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedSource {
    Local(PathBuf),
    Remote(Url),
}

impl FeedSource {
    pub fn parse(source: &str) -> Result<Self> {
        if source.contains("://") {
            validate_url("feed source", source)?;
            let url = Url::parse(source).map_err(|e| EtlError::InvalidConfigValueError {
                field: "feed source".to_string(),
                value: source.to_string(),
                reason: e.to_string(),
            })?;
            Ok(FeedSource::Remote(url))
        } else {
            Ok(FeedSource::Local(PathBuf::from(source)))
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, FeedSource::Remote(_))
    }

    /// Path of a readable local copy of the feed.
    pub async fn resolve(&self, fetcher: &FeedFetcher) -> Result<PathBuf> {
        match self {
            FeedSource::Local(path) => Ok(path.clone()),
            FeedSource::Remote(url) => fetcher.download(url).await,
        }
    }
}

impl std::fmt::Display for FeedSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeedSource::Local(path) => write!(f, "{}", path.display()),
            FeedSource::Remote(url) => write!(f, "{}", url),
        }
    }
}

/// Downloads remote feeds into a cache directory.
#[derive(Debug, Clone)]
pub struct FeedFetcher {
    client: Client,
    cache_dir: PathBuf,
}

impl FeedFetcher {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            client: Client::new(),
            cache_dir: cache_dir.into(),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    fn cache_path(&self, url: &Url) -> PathBuf {
        let file_name = url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|name| !name.is_empty())
            .unwrap_or("feed");
        self.cache_dir.join(file_name)
    }

    pub async fn download(&self, url: &Url) -> Result<PathBuf> {
        tracing::debug!("Downloading feed from: {}", url);
        let response = self.client.get(url.clone()).send().await?;

        tracing::debug!("Feed response status: {}", response.status());
        if !response.status().is_success() {
            return Err(EtlError::HttpStatusError {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let path = self.cache_path(url);
        tokio::fs::create_dir_all(&self.cache_dir).await?;

        let mut part_name = path.clone().into_os_string();
        part_name.push(".part");
        let part_path = PathBuf::from(part_name);

        let written = match write_body(response, &part_path).await {
            Ok(written) => written,
            Err(e) => {
                let _ = tokio::fs::remove_file(&part_path).await;
                return Err(e);
            }
        };
        tokio::fs::rename(&part_path, &path).await?;

        tracing::info!("Downloaded {} bytes to {}", written, path.display());
        Ok(path)
    }
}

/// Streams the response body to `path` chunk by chunk.
async fn write_body(response: Response, path: &Path) -> Result<u64> {
    let mut file = tokio::fs::File::create(path).await?;
    let mut chunks = response.bytes_stream();
    let mut written = 0u64;

    while let Some(chunk) = chunks.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    Ok(written)
}
