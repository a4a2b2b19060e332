//! Image load-and-decode step.
//!
//! This is the equivalent of handing a URL to an image element: the bytes
//! are requested and decoded so they are warm for display. Either outcome
//! lets the worker move on to caching; a failure is not an error for the
//! pipeline.

use async_trait::async_trait;
use tracing::debug;

use crate::fetcher::Fetcher;
use crate::{Error, Result};

/// Result of an image load attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The image decoded successfully.
    Loaded {
        /// Pixel width.
        width: u32,
        /// Pixel height.
        height: u32,
    },
    /// Fetching or decoding failed.
    Failed(String),
}

impl LoadOutcome {
    /// Whether the image decoded.
    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded { .. })
    }
}

/// Loads and decodes an image by URL.
///
/// Implementations settle eventually or never; the worker bounds the wait
/// with [`PRELOAD_TIMEOUT`](crate::PRELOAD_TIMEOUT) itself.
#[async_trait]
pub trait ImageLoader: Send + Sync {
    /// Load `url`, reporting success or failure.
    async fn load(&self, url: &str) -> LoadOutcome;
}

/// Loader that fetches over HTTP and decodes with the `image` crate.
#[derive(Debug, Clone)]
pub struct DecodingImageLoader {
    fetcher: Fetcher,
}

impl DecodingImageLoader {
    /// Create a loader that fetches through `fetcher`.
    #[must_use]
    pub const fn new(fetcher: Fetcher) -> Self {
        Self { fetcher }
    }

    async fn try_load(&self, url: &str) -> Result<(u32, u32)> {
        let fetched = self.fetcher.fetch_bytes(url).await?;
        tokio::task::spawn_blocking(move || decode_dimensions(&fetched))
            .await
            .map_err(|e| Error::Other(format!("Decode task failed: {e}")))?
    }
}

#[async_trait]
impl ImageLoader for DecodingImageLoader {
    async fn load(&self, url: &str) -> LoadOutcome {
        match self.try_load(url).await {
            Ok((width, height)) => {
                debug!("Decoded {}x{} image from {}", width, height, url);
                LoadOutcome::Loaded { width, height }
            },
            Err(e) => {
                debug!(category = e.category(), "Image load failed for {}: {}", url, e);
                LoadOutcome::Failed(e.to_string())
            },
        }
    }
}

/// Decode `bytes` fully and return the image dimensions.
pub fn decode_dimensions(bytes: &[u8]) -> Result<(u32, u32)> {
    let image = image::load_from_memory(bytes)?;
    Ok((image.width(), image.height()))
}
