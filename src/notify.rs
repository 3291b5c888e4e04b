use async_trait::async_trait;

/// Fire-and-forget completion signal. Implementations swallow their own
/// failures; a lost notification must never fail a redeem.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn swap_completed(&self, order_id: &str);
}

pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn swap_completed(&self, order_id: &str) {
        tracing::info!(%order_id, "swap completed");
    }
}
