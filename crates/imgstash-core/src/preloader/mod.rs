//! Prefetch session: queue, scheduler and worker.
//!
//! A [`Preloader`] is one page session. It owns the deduplication set, the
//! pending queue and the handles to its collaborators, and it is dropped when
//! the session ends. Nothing is global: two sessions never share state except
//! through the store they write to.
//!
//! ## Flow
//!
//! 1. [`discover_all`] collects image URLs from the document.
//! 2. [`partition`] splits them by viewport membership.
//! 3. [`build_queue`] puts visible URLs first.
//! 4. [`Preloader::drain`] dispatches [`BATCH_SIZE`] URLs at a time and waits
//!    for the whole batch to settle before pacing the next one through the
//!    [`IdleScheduler`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use imgstash_core::document::HtmlDocument;
//! use imgstash_core::store::MemoryStore;
//! use imgstash_core::visibility::ViewportSize;
//! use imgstash_core::Preloader;
//!
//! # async fn example() -> imgstash_core::Result<()> {
//! let html = r#"<img src="hero.jpg"><a href="full.png">full</a>"#;
//! let document = HtmlDocument::parse(html, "https://example.com/")?;
//!
//! let preloader = Preloader::builder()
//!     .store(Arc::new(MemoryStore::new()))
//!     .build()?;
//! let handle = preloader.launch(document, ViewportSize::new(1280.0, 720.0), std::future::ready(()));
//! let stats = handle.await.map_err(|e| imgstash_core::Error::Other(e.to_string()))?;
//! println!("cached {} images", stats.cached);
//! # Ok(())
//! # }
//! ```

mod queue;
mod stats;
mod worker;

use std::collections::{HashSet, VecDeque};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::join_all;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::Config;
use crate::discovery::discover_all;
use crate::document::Document;
use crate::fetcher::Fetcher;
use crate::idle::{IdleScheduler, YieldIdle, wait_for_idle};
use crate::loader::{DecodingImageLoader, ImageLoader};
use crate::store::{Store, open_store};
use crate::visibility::{Viewport, partition};
use crate::{BATCH_SIZE, Result};

pub use queue::build_queue;
pub use stats::StatsSnapshot;
pub use worker::PreloadOutcome;

use stats::PreloadStats;

/// Result of one [`Preloader::drain_next`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainStep {
    /// Another drain holds the guard; nothing was done.
    Busy,
    /// The queue was empty; nothing was done.
    Empty,
    /// A batch was dispatched and has fully settled.
    Dispatched {
        /// URLs in the batch.
        count: usize,
        /// URLs still queued afterwards.
        remaining: usize,
    },
}

/// One preloading session for one document.
///
/// Cloning is cheap and yields a handle to the same session.
#[derive(Clone)]
pub struct Preloader {
    session: Arc<Session>,
}

struct Session {
    store: Option<Arc<dyn Store>>,
    fetcher: Fetcher,
    loader: Arc<dyn ImageLoader>,
    idle: Option<Arc<dyn IdleScheduler>>,
    seen: Mutex<HashSet<String>>,
    queue: Mutex<VecDeque<String>>,
    draining: AtomicBool,
    stats: PreloadStats,
}

impl std::fmt::Debug for Preloader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Preloader")
            .field("persistent", &self.session.store.is_some())
            .field("queued", &self.session.queue_len())
            .field("draining", &self.session.draining.load(Ordering::Acquire))
            .field("stats", &self.session.stats.snapshot())
            .finish_non_exhaustive()
    }
}

/// Builder for [`Preloader`].
#[derive(Default)]
pub struct PreloaderBuilder {
    store: Option<Arc<dyn Store>>,
    fetcher: Option<Fetcher>,
    loader: Option<Arc<dyn ImageLoader>>,
    idle: Option<Option<Arc<dyn IdleScheduler>>>,
}

impl PreloaderBuilder {
    /// Persist fetched images into `store`. Without one the session is
    /// memory-only.
    #[must_use]
    pub fn store(mut self, store: Arc<dyn Store>) -> Self {
        self.store = Some(store);
        self
    }

    /// Use an already opened store handle, possibly `None`.
    #[must_use]
    pub fn maybe_store(mut self, store: Option<Arc<dyn Store>>) -> Self {
        self.store = store;
        self
    }

    /// HTTP client for the cache fetch (and the default image loader).
    #[must_use]
    pub fn fetcher(mut self, fetcher: Fetcher) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Replace the image loader.
    #[must_use]
    pub fn loader(mut self, loader: Arc<dyn ImageLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Pace batches with `idle` instead of [`YieldIdle`].
    #[must_use]
    pub fn idle(mut self, idle: Arc<dyn IdleScheduler>) -> Self {
        self.idle = Some(Some(idle));
        self
    }

    /// Pace batches with the fixed fallback delay.
    #[must_use]
    pub fn without_idle(mut self) -> Self {
        self.idle = Some(None);
        self
    }

    /// Build the session.
    pub fn build(self) -> Result<Preloader> {
        let fetcher = match self.fetcher {
            Some(fetcher) => fetcher,
            None => Fetcher::new()?,
        };
        let loader = self
            .loader
            .unwrap_or_else(|| Arc::new(DecodingImageLoader::new(fetcher.clone())));
        let idle = self
            .idle
            .unwrap_or_else(|| Some(Arc::new(YieldIdle) as Arc<dyn IdleScheduler>));

        Ok(Preloader {
            session: Arc::new(Session {
                store: self.store,
                fetcher,
                loader,
                idle,
                seen: Mutex::new(HashSet::new()),
                queue: Mutex::new(VecDeque::new()),
                draining: AtomicBool::new(false),
                stats: PreloadStats::default(),
            }),
        })
    }
}

impl Preloader {
    /// Start configuring a session.
    #[must_use]
    pub fn builder() -> PreloaderBuilder {
        PreloaderBuilder::default()
    }

    /// Build a session from configuration, opening the configured store.
    ///
    /// An unavailable store is logged and the session runs memory-only.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let store = open_store(&config.store).await;
        Self::builder()
            .maybe_store(store)
            .fetcher(Fetcher::from_config(&config.http)?)
            .build()
    }

    /// Spawn the session once `ready` resolves.
    ///
    /// Pass `std::future::ready(())` when the document is already loaded.
    pub fn launch<D, V, R>(&self, document: D, viewport: V, ready: R) -> JoinHandle<StatsSnapshot>
    where
        D: Document + 'static,
        V: Viewport + 'static,
        R: Future<Output = ()> + Send + 'static,
    {
        let preloader = self.clone();
        tokio::spawn(async move {
            ready.await;
            preloader.start(&document, &viewport).await
        })
    }

    /// Discover, prioritize and preload every image in `document`.
    ///
    /// Returns once the queue is drained.
    pub async fn start(&self, document: &dyn Document, viewport: &dyn Viewport) -> StatsSnapshot {
        let discovered = discover_all(document);
        let parts = partition(&discovered, document, viewport);
        info!(
            visible = parts.visible.len(),
            offscreen = parts.offscreen.len(),
            "Discovered {} image URLs",
            discovered.len()
        );

        self.enqueue(build_queue(parts));
        self.drain().await;

        let stats = self.stats();
        info!(
            cached = stats.cached,
            fetch_failures = stats.fetch_failures,
            timeouts = stats.timeouts,
            "Preloaded {} images in {} batches",
            stats.claimed,
            stats.batches
        );
        stats
    }

    /// Append URLs to the back of the queue.
    pub fn enqueue(&self, urls: impl IntoIterator<Item = String>) {
        lock(&self.session.queue).extend(urls);
    }

    /// Snapshot of the pending queue, front first.
    #[must_use]
    pub fn queued(&self) -> Vec<String> {
        lock(&self.session.queue).iter().cloned().collect()
    }

    /// Whether `url` has been claimed in this session.
    #[must_use]
    pub fn is_seen(&self, url: &str) -> bool {
        lock(&self.session.seen).contains(url)
    }

    /// Current session counters.
    #[must_use]
    pub fn stats(&self) -> StatsSnapshot {
        self.session.stats.snapshot()
    }

    /// Dispatch batches until the queue is empty.
    ///
    /// Returns immediately if another drain is already running. The running
    /// drain checks the queue again after releasing its guard, so URLs
    /// enqueued by the caller that got [`DrainStep::Busy`] are still
    /// dispatched.
    pub async fn drain(&self) {
        loop {
            match self.drain_next().await {
                DrainStep::Busy => break,
                DrainStep::Empty => {
                    if self.session.queue_len() == 0 {
                        break;
                    }
                },
                DrainStep::Dispatched { .. } => {
                    if self.session.queue_len() == 0 {
                        break;
                    }
                    wait_for_idle(self.session.idle.as_deref()).await;
                },
            }
        }
    }

    /// Dispatch one batch of up to [`BATCH_SIZE`] URLs and wait for all of
    /// them to settle.
    pub async fn drain_next(&self) -> DrainStep {
        let Some(_guard) = DrainGuard::acquire(&self.session.draining) else {
            return DrainStep::Busy;
        };

        let batch = self.session.take_batch();
        if batch.is_empty() {
            return DrainStep::Empty;
        }

        self.session.stats.record_batch();
        debug!("Dispatching batch of {}", batch.len());
        join_all(batch.iter().map(|url| self.preload(url))).await;

        DrainStep::Dispatched {
            count: batch.len(),
            remaining: self.session.queue_len(),
        }
    }
}

impl Session {
    fn take_batch(&self) -> Vec<String> {
        let mut queue = lock(&self.queue);
        let n = queue.len().min(BATCH_SIZE);
        queue.drain(..n).collect()
    }

    fn queue_len(&self) -> usize {
        lock(&self.queue).len()
    }

    /// Claim `url`; `false` if it was already claimed.
    fn claim(&self, url: &str) -> bool {
        lock(&self.seen).insert(url.to_string())
    }
}

/// Holds the drain-in-progress flag; releases it on drop, including when the
/// draining future is cancelled.
struct DrainGuard<'a>(&'a AtomicBool);

impl<'a> DrainGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
