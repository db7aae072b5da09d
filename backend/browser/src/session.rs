//! Debug Session Manager
//!
//! Owns the attach/detach lifecycle of debugging connections for this flow and
//! hands out `DebugSession` handles for issuing commands.

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use fiberlens_core::{DebugEvent, DebuggerBackend, ResolveError, TabId};

/// Attach/detach bookkeeping over a `DebuggerBackend`.
///
/// Only tabs attached through this manager are detached by it, so a tab held by
/// another controller is never torn down from here.
pub struct DebugSessionManager {
    backend: Arc<dyn DebuggerBackend>,
    attached: Mutex<HashSet<TabId>>,
}

impl DebugSessionManager {
    pub fn new(backend: Arc<dyn DebuggerBackend>) -> Self {
        Self {
            backend,
            attached: Mutex::new(HashSet::new()),
        }
    }

    /// Attach to `tab`. Attaching a tab this manager already holds is a success.
    pub async fn attach(&self, tab: &TabId) -> Result<DebugSession, ResolveError> {
        let mut attached = self.attached.lock().await;
        if attached.contains(tab) {
            debug!(tab = %tab, "Reusing existing debug session");
        } else {
            self.backend.attach(tab).await.inspect_err(|e| {
                warn!(tab = %tab, error = %e, "Failed to attach debugger");
            })?;
            attached.insert(tab.clone());
            info!(tab = %tab, "Debug session attached");
        }

        Ok(DebugSession {
            tab: tab.clone(),
            backend: Arc::clone(&self.backend),
        })
    }

    /// Detach from `tab`. Idempotent and infallible.
    pub async fn detach(&self, tab: &TabId) {
        if self.attached.lock().await.remove(tab) {
            self.backend.detach(tab).await;
            info!(tab = %tab, "Debug session detached");
        }
    }

    pub async fn is_attached(&self, tab: &TabId) -> bool {
        self.attached.lock().await.contains(tab)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DebugEvent> {
        self.backend.subscribe()
    }
}

/// Command handle for one attached tab.
#[derive(Clone)]
pub struct DebugSession {
    tab: TabId,
    backend: Arc<dyn DebuggerBackend>,
}

impl DebugSession {
    pub fn tab(&self) -> &TabId {
        &self.tab
    }

    pub async fn send_command(&self, method: &str, params: Value) -> Result<Value, ResolveError> {
        self.backend.send_command(&self.tab, method, params).await
    }

    /// Enables the DOM domain, then the Debugger domain.
    ///
    /// Order matters: enabling Debugger replays `scriptParsed` for every loaded script.
    pub async fn enable_domains(&self) -> Result<(), ResolveError> {
        self.send_command("DOM.enable", Value::Object(Default::default()))
            .await?;
        self.send_command("Debugger.enable", Value::Object(Default::default()))
            .await?;
        debug!(tab = %self.tab, "DOM and Debugger domains enabled");
        Ok(())
    }
}
