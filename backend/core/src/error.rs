use thiserror::Error;

use crate::types::TabId;

/// Errors raised by the debug transport and the resolution pipeline.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("another debugger is already attached to tab {0}")]
    AlreadyAttachedElsewhere(TabId),

    #[error("no debug session attached to tab {0}")]
    NotAttached(TabId),

    #[error("protocol error: {0}")]
    ProtocolError(String),

    #[error("debugger connection closed")]
    ConnectionClosed,

    #[error("source map error: {0}")]
    SourceMap(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ResolveError {
    pub fn protocol(message: impl Into<String>) -> Self {
        ResolveError::ProtocolError(message.into())
    }
}
