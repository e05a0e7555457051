// ML model store
// Resolves the local cache path for the pose model and downloads it on first use

use crate::models::model_asset::{ModelAsset, ModelError, ModelResult};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use uuid::Uuid;

/// Network primitive used to fetch model files
#[async_trait]
pub trait ModelFetcher: Send + Sync {
    /// Stream the body at `url` into `writer`, returning the number of bytes written
    async fn download(
        &self,
        url: &str,
        writer: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> ModelResult<u64>;
}

/// `reqwest`-backed fetcher
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> ModelResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ModelError::NetworkFailure(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ModelFetcher for HttpFetcher {
    async fn download(
        &self,
        url: &str,
        writer: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> ModelResult<u64> {
        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| ModelError::NetworkFailure(e.to_string()))?;

        let mut written = 0u64;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| ModelError::NetworkFailure(e.to_string()))?
        {
            writer.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }

        Ok(written)
    }
}

/// Model cache rooted at one directory
pub struct ModelStore {
    cache_dir: PathBuf,
    fetcher: Arc<dyn ModelFetcher>,
}

impl ModelStore {
    pub fn new(cache_dir: PathBuf, fetcher: Arc<dyn ModelFetcher>) -> Self {
        Self { cache_dir, fetcher }
    }

    /// Store that downloads over HTTP with the given request timeout
    pub fn with_http(cache_dir: PathBuf, timeout: Duration) -> ModelResult<Self> {
        Ok(Self::new(cache_dir, Arc::new(HttpFetcher::new(timeout)?)))
    }

    /// Get the cache directory path
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Get the local path for a model
    pub fn model_path(&self, asset: &ModelAsset) -> PathBuf {
        self.cache_dir.join(&asset.file_name)
    }

    /// A model is cached when its file exists and is non-empty
    pub async fn is_cached(&self, asset: &ModelAsset) -> bool {
        match tokio::fs::metadata(self.model_path(asset)).await {
            Ok(metadata) => metadata.is_file() && metadata.len() > 0,
            Err(_) => false,
        }
    }

    /// Make sure the model is on disk, downloading it if needed.
    ///
    /// The body is streamed into a temporary file next to the destination and
    /// renamed into place only after the transfer completed, so an interrupted
    /// download never looks like a cache hit. No retries are attempted.
    pub async fn ensure_available(&self, asset: &ModelAsset) -> ModelResult<PathBuf> {
        let model_path = self.model_path(asset);

        if self.is_cached(asset).await {
            log::debug!("Model {} already cached at {:?}", asset.file_name, model_path);
            return Ok(model_path);
        }

        tokio::fs::create_dir_all(&self.cache_dir).await?;

        log::info!("Downloading model {} from {}", asset.file_name, asset.url);

        let temp_path = self
            .cache_dir
            .join(format!(".{}.{}.part", asset.file_name, Uuid::new_v4()));

        let committed = match self.download_to(&asset.url, &temp_path).await {
            Ok(bytes) => tokio::fs::rename(&temp_path, &model_path)
                .await
                .map(|_| bytes)
                .map_err(ModelError::from),
            Err(e) => Err(e),
        };

        match committed {
            Ok(bytes) => {
                log::info!("Model {} downloaded ({} bytes)", asset.file_name, bytes);
                Ok(model_path)
            }
            Err(e) => {
                log::error!("Error downloading model {}: {}", asset.file_name, e);
                if let Err(cleanup) = tokio::fs::remove_file(&temp_path).await {
                    log::debug!("No partial download removed at {:?}: {}", temp_path, cleanup);
                }
                Err(e)
            }
        }
    }

    async fn download_to(&self, url: &str, temp_path: &Path) -> ModelResult<u64> {
        let mut file = tokio::fs::File::create(temp_path).await?;
        let bytes = self.fetcher.download(url, &mut file).await?;

        if bytes == 0 {
            return Err(ModelError::NetworkFailure(format!(
                "Empty response body from {}",
                url
            )));
        }

        file.flush().await?;
        file.sync_all().await?;
        Ok(bytes)
    }
}
