use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::error::ResolveError;
use crate::event::DebugEvent;
use crate::types::TabId;

/// Low-level debugging connection to browser tabs.
///
/// Implemented over the Chrome DevTools Protocol by `fiberlens-browser`.
#[async_trait]
pub trait DebuggerBackend: Send + Sync {
    /// Establish a debugging connection to the tab.
    async fn attach(&self, tab: &TabId) -> Result<(), ResolveError>;

    /// Drop the connection. Never fails; unknown tabs are ignored.
    async fn detach(&self, tab: &TabId);

    /// Issue a protocol command and wait for its result.
    async fn send_command(
        &self,
        tab: &TabId,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, ResolveError>;

    /// Receive every notification from every attached tab.
    fn subscribe(&self) -> broadcast::Receiver<DebugEvent>;
}

/// Retrieves the text body behind a URL (used for remote source maps).
#[async_trait]
pub trait MapFetcher: Send + Sync {
    async fn fetch_text(&self, url: &str) -> anyhow::Result<String>;
}
