//! Per-URL fetch-and-cache work.
//!
//! Every failure mode stops here: a worker call always settles with a
//! [`PreloadOutcome`] and never returns an error.

use std::sync::Arc;

use tracing::{debug, warn};

use super::{Preloader, Session};
use crate::loader::LoadOutcome;
use crate::{Error, PRELOAD_TIMEOUT};

/// How a single [`Preloader::preload`] call settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreloadOutcome {
    /// The URL was already claimed in this session; nothing was done.
    AlreadySeen,
    /// The load and cache attempt ran to completion, successfully or not.
    Completed,
    /// [`PRELOAD_TIMEOUT`] elapsed first. The load and cache work carries on
    /// detached and may still write to the store later.
    TimedOut,
}

impl Preloader {
    /// Load, decode and cache a single URL.
    ///
    /// The URL is claimed before any work starts, so a concurrent or later
    /// call with the same URL returns [`PreloadOutcome::AlreadySeen`]
    /// immediately.
    pub async fn preload(&self, url: &str) -> PreloadOutcome {
        if !self.session.claim(url) {
            self.session.stats.record_duplicate();
            debug!("Skipping {}, already claimed", url);
            return PreloadOutcome::AlreadySeen;
        }
        let _in_flight = self.session.stats.enter();

        let session = Arc::clone(&self.session);
        let owned = url.to_string();
        let track = tokio::spawn(async move { session.load_then_cache(&owned).await });

        tokio::select! {
            joined = track => {
                if let Err(e) = joined {
                    warn!("Preload task for {} did not finish: {}", url, e);
                }
                PreloadOutcome::Completed
            }
            () = tokio::time::sleep(PRELOAD_TIMEOUT) => {
                self.session.stats.record_timeout();
                let e = Error::Timeout(format!("{url} after {PRELOAD_TIMEOUT:?}"));
                debug!(category = e.category(), "Gave up waiting on {}", e);
                PreloadOutcome::TimedOut
            }
        }
    }
}

impl Session {
    async fn load_then_cache(&self, url: &str) {
        if let LoadOutcome::Failed(reason) = self.loader.load(url).await {
            self.stats.record_decode_failure();
            debug!("Image load failed for {}: {}", url, reason);
        }
        self.cache_and_resolve(url).await;
    }

    async fn cache_and_resolve(&self, url: &str) {
        let fetched = match self.fetcher.fetch_bytes(url).await {
            Ok(fetched) => fetched,
            Err(e) => {
                self.stats.record_fetch_failure();
                warn!(
                    category = e.category(),
                    recoverable = e.is_recoverable(),
                    "Not caching {}: {}",
                    url,
                    e
                );
                return;
            },
        };

        let Some(store) = &self.store else {
            debug!("No store, {} stays memory-only", url);
            return;
        };

        match store.put(url, fetched).await {
            Ok(()) => self.stats.record_cached(),
            Err(e) => {
                self.stats.record_store_failure();
                warn!(category = e.category(), "Failed to cache {}: {}", url, e);
            },
        }
    }
}
