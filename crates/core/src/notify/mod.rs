pub mod pushplus;

use crate::error::PickError;

/// Outbound message channel. Only called on explicit user action.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    fn channel_name(&self) -> &'static str;

    async fn notify(&self, title: &str, body: &str) -> Result<(), PickError>;
}
