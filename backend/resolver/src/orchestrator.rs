//! Resolution Orchestrator
//!
//! Runs one batch: attach, discover scripts, resolve every element concurrently,
//! and always tear the session down again.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, error, info, warn};

use fiberlens_browser::{DebugSession, DebugSessionManager, ScriptRegistry};
use fiberlens_core::{
    DebuggerBackend, ElementDescriptor, ResolveError, SourceInfo, SourceType, TabId,
};
use fiberlens_logging::{EventLogger, ResolutionEvent};
use fiberlens_sourcemap::SourceMapCache;

use crate::inspector::FiberInspector;
use crate::instance::Inspection;
use crate::matcher::{FuzzyMatcher, MatchRules};

/// Default time spent collecting script-parsed notifications before matching.
pub const DEFAULT_DISCOVERY_WINDOW: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone)]
pub struct ResolverOptions {
    /// Fixed wait after enabling the Debugger domain. Scripts parsed later are
    /// invisible to fuzzy matching for the batch.
    pub discovery_window: Duration,
    pub rules: MatchRules,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            discovery_window: DEFAULT_DISCOVERY_WINDOW,
            rules: MatchRules::default(),
        }
    }
}

pub struct SourceResolver {
    sessions: Arc<DebugSessionManager>,
    registry: Arc<ScriptRegistry>,
    maps: Arc<SourceMapCache>,
    options: ResolverOptions,
    // Batches share the registry, which is reset per batch
    batch_lock: Arc<Mutex<()>>,
}

impl SourceResolver {
    pub fn new(
        backend: Arc<dyn DebuggerBackend>,
        maps: Arc<SourceMapCache>,
        options: ResolverOptions,
    ) -> Self {
        Self {
            sessions: Arc::new(DebugSessionManager::new(backend)),
            registry: Arc::new(ScriptRegistry::new()),
            maps,
            options,
            batch_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn registry(&self) -> &Arc<ScriptRegistry> {
        &self.registry
    }

    /// Attaches a `SourceInfo` to every element.
    ///
    /// The output has the input's length and order. Never fails: session-level
    /// problems degrade every element to `not_found`.
    pub async fn resolve_batch(
        &self,
        tab: &TabId,
        elements: Vec<ElementDescriptor>,
    ) -> Vec<ElementDescriptor> {
        let batch = Arc::clone(&self.batch_lock).lock_owned().await;
        let started = Instant::now();
        info!(tab = %tab, elements = elements.len(), "Starting source resolution");
        EventLogger::log_event(
            tab.as_str(),
            ResolutionEvent::BatchStarted {
                elements: elements.len(),
            },
        );

        self.registry.clear().await;

        let session = match self.sessions.attach(tab).await {
            Ok(session) => session,
            Err(e) => {
                error!(tab = %tab, error = %e, "Could not open debug session");
                EventLogger::log_event(
                    tab.as_str(),
                    ResolutionEvent::SessionFailed {
                        error_msg: e.to_string(),
                    },
                );
                return all_not_found(elements);
            }
        };
        let teardown = SessionTeardown::new(TeardownState {
            tab: tab.clone(),
            sessions: Arc::clone(&self.sessions),
            registry: Arc::clone(&self.registry),
            _batch: batch,
        });
        self.registry.start(tab, self.sessions.subscribe()).await;

        let resolved = match self.discover(&session).await {
            Ok(()) => self.resolve_all(&session, elements).await,
            Err(e) => {
                error!(tab = %tab, error = %e, "Debug session setup failed");
                EventLogger::log_event(
                    tab.as_str(),
                    ResolutionEvent::SessionFailed {
                        error_msg: e.to_string(),
                    },
                );
                all_not_found(elements)
            }
        };

        teardown.finish().await;

        let count = |kind: SourceType| {
            resolved
                .iter()
                .filter(|el| el.source_info.as_ref().map(SourceInfo::source_type) == Some(kind))
                .count()
        };
        EventLogger::log_event(
            tab.as_str(),
            ResolutionEvent::BatchFinished {
                exact: count(SourceType::Exact),
                fuzzy: count(SourceType::Fuzzy),
                not_found: count(SourceType::NotFound),
                elapsed_ms: started.elapsed().as_millis() as u64,
            },
        );
        resolved
    }

    /// Enables the protocol domains, then waits out the discovery window.
    async fn discover(&self, session: &DebugSession) -> Result<(), ResolveError> {
        session.enable_domains().await?;
        tokio::time::sleep(self.options.discovery_window).await;
        let scripts = self.registry.len().await;
        debug!(
            tab = %session.tab(),
            scripts,
            "Script discovery window closed"
        );
        Ok(())
    }

    async fn resolve_all(
        &self,
        session: &DebugSession,
        elements: Vec<ElementDescriptor>,
    ) -> Vec<ElementDescriptor> {
        let inspector = FiberInspector::new();
        let matcher = FuzzyMatcher::new(
            Arc::clone(&self.registry),
            Arc::clone(&self.maps),
            self.options.rules.clone(),
        );

        let pending = elements.into_iter().map(|element| {
            let (inspector, matcher) = (&inspector, &matcher);
            async move {
                let info = match resolve_element(session, inspector, matcher, &element.selector).await
                {
                    Ok(info) => info,
                    Err(e) => {
                        warn!(selector = %element.selector, error = %e, "Source resolution failed");
                        SourceInfo::not_found()
                    }
                };
                EventLogger::log_event(
                    session.tab().as_str(),
                    ResolutionEvent::ElementResolved {
                        selector: element.selector.clone(),
                        outcome: info.source_type().to_string(),
                        file: info.file().map(String::from),
                    },
                );
                element.with_source(info)
            }
        });

        join_all(pending).await
    }
}

/// Exact first; a bare component name falls through to fuzzy matching.
async fn resolve_element(
    session: &DebugSession,
    inspector: &FiberInspector,
    matcher: &FuzzyMatcher,
    selector: &str,
) -> Result<SourceInfo, ResolveError> {
    let info = match inspector.inspect(session, selector).await? {
        Inspection::Exact {
            location,
            component_name,
        } => SourceInfo::exact(location.file, location.line, location.column, component_name),
        Inspection::NameOnly { component_name } => matcher
            .match_by_name(session, &component_name)
            .await
            .unwrap_or_else(|| SourceInfo::name_only(component_name)),
        Inspection::Nothing => SourceInfo::not_found(),
    };
    Ok(info)
}

/// What has to be undone once a session is attached.
struct TeardownState {
    tab: TabId,
    sessions: Arc<DebugSessionManager>,
    registry: Arc<ScriptRegistry>,
    // Held until teardown completes so the next batch cannot start early
    _batch: OwnedMutexGuard<()>,
}

impl TeardownState {
    async fn run(self) {
        self.registry.stop(&self.tab).await;
        self.sessions.detach(&self.tab).await;
        self.registry.clear().await;
    }
}

/// Stops the registry and detaches when the batch ends.
///
/// The normal path awaits `finish`. If the batch future is dropped or a
/// resolution panics, `Drop` spawns the same teardown on the current runtime.
struct SessionTeardown {
    state: Option<TeardownState>,
}

impl SessionTeardown {
    fn new(state: TeardownState) -> Self {
        Self { state: Some(state) }
    }

    async fn finish(mut self) {
        if let Some(state) = self.state.take() {
            state.run().await;
        }
    }
}

impl Drop for SessionTeardown {
    fn drop(&mut self) {
        let Some(state) = self.state.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                warn!(tab = %state.tab, "Batch interrupted, detaching in the background");
                handle.spawn(state.run());
            }
            Err(_) => {
                error!(tab = %state.tab, "No runtime left to detach on; session stays attached");
            }
        }
    }
}

fn all_not_found(elements: Vec<ElementDescriptor>) -> Vec<ElementDescriptor> {
    elements
        .into_iter()
        .map(|element| element.with_source(SourceInfo::not_found()))
        .collect()
}
