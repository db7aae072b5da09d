//! Resolution Event Logger
//!
//! Structured events (batch lifecycle, per-element outcome) emitted on the
//! `resolution_events` target so they land in the NDJSON log.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::redact::redact_sensitive_data;

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResolutionEvent {
    BatchStarted {
        elements: usize,
    },
    ElementResolved {
        selector: String,
        outcome: String,
        file: Option<String>,
    },
    BatchFinished {
        exact: usize,
        fuzzy: usize,
        not_found: usize,
        elapsed_ms: u64,
    },
    SessionFailed {
        error_msg: String,
    },
}

#[derive(Debug, Serialize)]
pub struct ResolutionLogEntry {
    pub tab: String,
    pub timestamp: DateTime<Utc>,
    pub event: ResolutionEvent,
}

pub struct EventLogger;

impl EventLogger {
    /// Logs a resolution event, scrubbing any URLs it carries.
    pub fn log_event(tab: &str, mut event: ResolutionEvent) {
        match &mut event {
            ResolutionEvent::ElementResolved { file: Some(file), .. } => {
                *file = redact_sensitive_data(file);
            }
            ResolutionEvent::SessionFailed { error_msg } => {
                *error_msg = redact_sensitive_data(error_msg);
            }
            _ => {}
        }

        let entry = ResolutionLogEntry {
            tab: tab.into(),
            timestamp: Utc::now(),
            event,
        };

        info!(target: "resolution_events", event = ?entry, "Resolution event");
    }
}
