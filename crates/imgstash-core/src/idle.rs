//! Pacing between preload batches.
//!
//! After a batch settles the scheduler waits for an idle moment before
//! dispatching the next one, so background preloading yields to whatever
//! else the host runtime is doing.

use std::time::Duration;

use async_trait::async_trait;

use crate::IDLE_FALLBACK_DELAY;

/// Best-effort "run me when things are quiet" primitive.
#[async_trait]
pub trait IdleScheduler: Send + Sync {
    /// Resolve at the next idle opportunity.
    async fn idle(&self);
}

/// Yields to the tokio scheduler so every other ready task runs first.
#[derive(Debug, Clone, Copy, Default)]
pub struct YieldIdle;

#[async_trait]
impl IdleScheduler for YieldIdle {
    async fn idle(&self) {
        tokio::task::yield_now().await;
    }
}

/// Waits a fixed delay.
#[derive(Debug, Clone, Copy)]
pub struct FixedDelay(pub Duration);

impl Default for FixedDelay {
    fn default() -> Self {
        Self(IDLE_FALLBACK_DELAY)
    }
}

#[async_trait]
impl IdleScheduler for FixedDelay {
    async fn idle(&self) {
        tokio::time::sleep(self.0).await;
    }
}

/// Wait on `scheduler`, or [`IDLE_FALLBACK_DELAY`] when there is none.
pub async fn wait_for_idle(scheduler: Option<&dyn IdleScheduler>) {
    match scheduler {
        Some(scheduler) => scheduler.idle().await,
        None => tokio::time::sleep(IDLE_FALLBACK_DELAY).await,
    }
}
