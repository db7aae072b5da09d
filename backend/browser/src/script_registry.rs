//! Script Registry
//!
//! Collects `Debugger.scriptParsed` notifications for a tab so later stages can
//! enumerate the page's scripts. Records live for one debug session only.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use fiberlens_core::{DebugEvent, ScriptRecord, TabId};
use fiberlens_logging::redact_sensitive_data;

/// Records in first-parse order, indexed by script id.
#[derive(Debug, Default)]
struct Records {
    ordered: Vec<ScriptRecord>,
    by_id: HashMap<String, usize>,
}

impl Records {
    fn upsert(&mut self, record: ScriptRecord) {
        match self.by_id.get(&record.script_id) {
            Some(&idx) => self.ordered[idx] = record,
            None => {
                self.by_id.insert(record.script_id.clone(), self.ordered.len());
                self.ordered.push(record);
            }
        }
    }

    fn clear(&mut self) {
        self.ordered.clear();
        self.by_id.clear();
    }
}

/// Scripts seen in the current session, in first-parse order.
#[derive(Default)]
pub struct ScriptRegistry {
    records: Arc<RwLock<Records>>,
    listeners: Mutex<HashMap<TabId, JoinHandle<()>>>,
}

impl ScriptRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start recording parse notifications for `tab` from `events`.
    ///
    /// Subscribe before enabling the Debugger domain, or the replayed
    /// notifications for already-loaded scripts are missed.
    pub async fn start(&self, tab: &TabId, mut events: broadcast::Receiver<DebugEvent>) {
        let records = Arc::clone(&self.records);
        let watched = tab.clone();

        let handle = tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) if event.tab == watched && event.is_script_parsed() => {
                        if let Some(record) = record_from_params(&event.params) {
                            upsert(&records, record).await;
                        }
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(tab = %watched, skipped, "Script registry lagged behind notifications");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        if let Some(previous) = self.listeners.lock().await.insert(tab.clone(), handle) {
            previous.abort();
        }
        debug!(tab = %tab, "Script registry listening");
    }

    /// Stop listening for `tab`. Recorded scripts stay until `clear`.
    pub async fn stop(&self, tab: &TabId) {
        if let Some(handle) = self.listeners.lock().await.remove(tab) {
            handle.abort();
            debug!(tab = %tab, "Script registry stopped");
        }
    }

    pub async fn clear(&self) {
        self.records.write().await.clear();
    }

    /// Record a script directly. The listener uses the same path.
    pub async fn record(&self, record: ScriptRecord) {
        upsert(&self.records, record).await;
    }

    pub async fn snapshot(&self) -> Vec<ScriptRecord> {
        self.records.read().await.ordered.clone()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.ordered.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.ordered.is_empty()
    }
}

/// Builds a record only when both the script id and its URL are present.
fn record_from_params(params: &Value) -> Option<ScriptRecord> {
    let script_id = params.get("scriptId")?.as_str().filter(|s| !s.is_empty())?;
    let script_url = params.get("url")?.as_str().filter(|s| !s.is_empty())?;
    let source_map_hint = params
        .get("sourceMapURL")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(String::from);

    Some(ScriptRecord {
        script_id: script_id.to_string(),
        script_url: script_url.to_string(),
        source_map_hint,
    })
}

async fn upsert(records: &RwLock<Records>, record: ScriptRecord) {
    debug!(
        script_id = %record.script_id,
        url = %redact_sensitive_data(&record.script_url),
        "Script parsed"
    );
    records.write().await.upsert(record);
}
