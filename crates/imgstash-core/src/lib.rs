//! # imgstash-core
//!
//! Background image preloading with a persistent local cache.
//!
//! Once a page is ready, imgstash finds every image it references, fetches
//! the ones on screen first, and writes the bytes into a durable store keyed
//! by URL so later views (including offline ones) can be served locally.
//!
//! ## Architecture
//!
//! - **Document**: read-only snapshot of the page's images and links
//! - **Discovery**: image sources plus links that point at images, deduplicated
//! - **Visibility**: viewport intersection and the visible/offscreen split
//! - **Preloader**: the per-session queue, batch scheduler and worker
//! - **Store**: URL → bytes persistence on disk or in memory
//! - **Error Handling**: one error type; the worker swallows all of it
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use imgstash_core::{Config, Preloader};
//! use imgstash_core::document::{HtmlDocument, Rect};
//! use imgstash_core::visibility::ViewportSize;
//!
//! # async fn example() -> imgstash_core::Result<()> {
//! let config = Config::load()?;
//! let preloader = Preloader::from_config(&config).await?;
//!
//! let html = r#"<img src="hero.jpg"><img src="footer.png"><a href="zoom.webp">zoom</a>"#;
//! let document = HtmlDocument::parse(html, "https://example.com/gallery/")?
//!     .with_rect(0, Rect::from_xywh(0.0, 0.0, 1280.0, 400.0));
//!
//! let stats = preloader
//!     .start(&document, &ViewportSize::new(1280.0, 720.0))
//!     .await;
//! println!("cached {} of {} images", stats.cached, stats.claimed);
//! # Ok(())
//! # }
//! ```
//!
//! ## Guarantees
//!
//! - Each URL is processed at most once per [`Preloader`]
//! - Visible images are dispatched before offscreen ones
//! - At most [`BATCH_SIZE`] preloads are in flight at any time
//! - [`Preloader::preload`] settles within [`PRELOAD_TIMEOUT`] and never errors

use std::time::Duration;

/// Configuration for store location and HTTP identity
pub mod config;
/// Image URL discovery
pub mod discovery;
/// Read-only document model
pub mod document;
/// Error types and result aliases
pub mod error;
/// HTTP fetching of image bytes
pub mod fetcher;
/// Pacing between batches
pub mod idle;
/// Image load-and-decode
pub mod loader;
/// Log subscriber setup
pub mod logging;
/// Session, scheduler and worker
pub mod preloader;
/// Persistent key-value store
pub mod store;
/// Viewport intersection
pub mod visibility;

/// Preloads dispatched together; also the in-flight bound.
pub const BATCH_SIZE: usize = 4;

/// Longest a single preload is waited on.
pub const PRELOAD_TIMEOUT: Duration = Duration::from_millis(30_000);

/// Pause between batches when no idle scheduler is configured.
pub const IDLE_FALLBACK_DELAY: Duration = Duration::from_millis(100);

/// Identifier of the durable store.
pub const STORE_NAME: &str = "imgstash";

/// Layout version written when a store is created.
pub const STORE_VERSION: u32 = 1;

/// The store's single logical table.
pub const STORE_TABLE: &str = "images";

/// Extensions that mark a link target as an image.
pub const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "webp"];

// Re-export commonly used types
pub use config::{Config, HttpConfig, StoreConfig};
pub use discovery::{DiscoveredUrl, UrlSource, discover_all, discover_urls};
pub use document::{Document, HtmlDocument, ImageElement, Rect};
pub use error::{Error, Result};
pub use fetcher::Fetcher;
pub use idle::{FixedDelay, IdleScheduler, YieldIdle};
pub use loader::{DecodingImageLoader, ImageLoader, LoadOutcome};
pub use preloader::{
    DrainStep, PreloadOutcome, Preloader, PreloaderBuilder, StatsSnapshot, build_queue,
};
pub use store::{DiskStore, MemoryStore, Store, open_store};
pub use visibility::{Partition, Viewport, ViewportSize, partition};
