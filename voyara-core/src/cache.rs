pub use voyara_shared::events::{CacheInvalidation, CacheScope};

/// Downstream cache invalidation sink. Implementations must not block and
/// must swallow their own failures; a missed invalidation is logged by the
/// implementation and never propagated to the mutation that triggered it.
pub trait CacheNotifier: Send + Sync {
    fn notify(&self, scope: CacheScope);
}

/// Sink that drops every notification. Placeholder for wiring paths that
/// have no cache behind them.
pub struct NoopNotifier;

impl CacheNotifier for NoopNotifier {
    fn notify(&self, _scope: CacheScope) {}
}
