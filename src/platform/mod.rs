pub mod telegram;

use anyhow::Result;
use async_trait::async_trait;

/// Outbound delivery of an HTML-formatted notification to one user
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_text(&self, recipient: u64, html: &str) -> Result<()>;
}
