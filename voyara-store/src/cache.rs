use tokio::sync::mpsc;
use tracing::{info, warn};

use voyara_core::cache::CacheNotifier;
use voyara_shared::events::{CacheInvalidation, CacheScope};

/// Channel-backed cache invalidation sink. Mutating operations push an
/// event and move on; a background task drains the queue. The drain task is
/// where a real revalidation hook (CDN purge, page cache bust) plugs in.
#[derive(Clone)]
pub struct CacheQueue {
    tx: mpsc::UnboundedSender<CacheInvalidation>,
}

impl CacheQueue {
    /// Spawn the drain task on the current runtime and hand back the sender
    /// side.
    pub fn start() -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<CacheInvalidation>();

        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                info!(
                    event_id = %event.event_id,
                    scope = event.scope.as_str(),
                    emitted_at = %event.emitted_at,
                    "cache invalidation"
                );
            }
        });

        Self { tx }
    }
}

impl CacheNotifier for CacheQueue {
    fn notify(&self, scope: CacheScope) {
        // Best-effort: a closed queue costs a stale cache, never the mutation.
        if let Err(err) = self.tx.send(CacheInvalidation::new(scope)) {
            warn!(scope = scope.as_str(), error = %err, "cache invalidation dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_notify_survives_closed_drain() {
        let queue = CacheQueue::start();
        queue.notify(CacheScope::Bookings);

        // Even with the runtime about to drop the drain task, notify never
        // panics or blocks.
        queue.notify(CacheScope::Tours);
    }
}
