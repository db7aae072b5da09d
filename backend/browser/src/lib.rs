//! `fiberlens-browser` — debugging transport for live browser tabs.
//!
//! Provides:
//! - `CdpClient`: Chrome DevTools Protocol over a single browser websocket
//! - Target discovery through the DevTools HTTP endpoint
//! - `DebugSessionManager` / `DebugSession`: scoped attach, detach, and commands
//! - `ScriptRegistry`: per-session record of parsed scripts
//! - Page-control helpers for in-page evaluation and script text

pub mod cdp_client;
pub mod discovery;
pub mod page_control;
pub mod script_registry;
pub mod session;

#[cfg(any(test, feature = "testing"))]
pub mod fake;

pub use cdp_client::CdpClient;
pub use discovery::{list_page_targets, resolve_ws_endpoint, TargetInfo};
pub use page_control::{evaluate_by_value, script_source};
pub use script_registry::ScriptRegistry;
pub use session::{DebugSession, DebugSessionManager};
