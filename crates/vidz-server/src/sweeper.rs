//! Periodic eviction of finished jobs from the registry.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use vidz_core::JobRegistry;

/// Every `interval`, drop terminal jobs older than `ttl`. Exits on `cancel`.
pub(crate) async fn run(
    registry: Arc<JobRegistry>,
    ttl: Duration,
    interval: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                let evicted = registry.evict_expired(ttl);
                if evicted > 0 {
                    tracing::debug!(evicted, remaining = registry.len(), "evicted finished jobs");
                }
            }
        }
    }
}
