//! `fiberlens-core` — shared vocabulary of the fiberlens source-resolution pipeline.
//!
//! Provides:
//! - Resolution results (`SourceInfo`) and the element descriptors they attach to
//! - Debug-session notifications and script records
//! - The `DebuggerBackend` / `MapFetcher` seams the other crates plug into

pub mod error;
pub mod event;
pub mod traits;
pub mod types;

pub use error::ResolveError;
pub use event::{DebugEvent, SCRIPT_PARSED};
pub use traits::{DebuggerBackend, MapFetcher};
pub use types::{
    ElementDescriptor, ResolutionMethod, ScriptRecord, SourceInfo, SourceType, TabId,
    DEFAULT_DISPLAY_PREFIXES,
};
