//! Telemetry and structured logging components for fiberlens.
//!
//! Handles URL redaction, console/NDJSON output, file rotation, and resolution event logging.

pub mod event_logger;
pub mod logger;
pub mod redact;

pub use event_logger::{EventLogger, ResolutionEvent, ResolutionLogEntry};
pub use logger::{LoggerOptions, init_logger};
pub use redact::redact_sensitive_data;
