//! `fiberlens-resolver` — maps selected DOM elements back to their source.
//!
//! Per element: read the live component instance tree in the page (exact),
//! fall back to matching the component name against source maps (fuzzy),
//! otherwise report `not_found`.

pub mod inspector;
pub mod instance;
pub mod matcher;
pub mod orchestrator;

pub use inspector::{FiberInspector, FiberKeyCache};
pub use instance::{
    ANONYMOUS, DebugSource, Inspection, InstanceGraph, InstanceKind, InstanceNode, NameHints,
    SourceLocation, display_name, normalize_file_name,
};
pub use matcher::{FuzzyMatcher, MatchRules};
pub use orchestrator::{DEFAULT_DISCOVERY_WINDOW, ResolverOptions, SourceResolver};
