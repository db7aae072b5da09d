use serde::{Deserialize, Serialize};

use crate::types::TabId;

/// CDP method name of the script-parsed notification.
pub const SCRIPT_PARSED: &str = "Debugger.scriptParsed";

/// A protocol notification received from an attached tab.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebugEvent {
    pub tab: TabId,
    pub method: String,
    pub params: serde_json::Value,
}

impl DebugEvent {
    pub fn new(tab: TabId, method: impl Into<String>, params: serde_json::Value) -> Self {
        Self {
            tab,
            method: method.into(),
            params,
        }
    }

    pub fn is_script_parsed(&self) -> bool {
        self.method == SCRIPT_PARSED
    }
}
