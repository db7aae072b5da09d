//! In-memory `DebuggerBackend` for tests.
//!
//! Commands are answered by per-method handlers; `Debugger.enable` replays the
//! configured script-parsed notifications the way a real browser does.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::broadcast;

use fiberlens_core::{DebugEvent, DebuggerBackend, ResolveError, TabId, SCRIPT_PARSED};

type Handler = Arc<dyn Fn(&Value) -> Result<Value, ResolveError> + Send + Sync>;

#[derive(Default)]
struct FakeState {
    attached: HashSet<TabId>,
    foreign: HashSet<TabId>,
    attach_count: usize,
    detach_count: usize,
    methods: Vec<String>,
    handlers: HashMap<String, Handler>,
    parsed_scripts: Vec<Value>,
}

pub struct FakeBackend {
    state: Mutex<FakeState>,
    events: broadcast::Sender<DebugEvent>,
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeBackend {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            state: Mutex::new(FakeState::default()),
            events,
        }
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().expect("fake backend state poisoned")
    }

    /// Make `tab` look as if another debugger already holds it.
    pub fn hold_elsewhere(&self, tab: &TabId) {
        self.state().foreign.insert(tab.clone());
    }

    /// Answer `method` with `handler`.
    pub fn on<F>(&self, method: &str, handler: F)
    where
        F: Fn(&Value) -> Result<Value, ResolveError> + Send + Sync + 'static,
    {
        self.state().handlers.insert(method.to_string(), Arc::new(handler));
    }

    /// Announce a script when the Debugger domain gets enabled.
    pub fn parse_script_on_enable(&self, script_id: &str, url: &str) {
        self.state()
            .parsed_scripts
            .push(json!({ "scriptId": script_id, "url": url }));
    }

    pub fn attach_count(&self) -> usize {
        self.state().attach_count
    }

    pub fn detach_count(&self) -> usize {
        self.state().detach_count
    }

    /// Methods sent so far, in order.
    pub fn methods(&self) -> Vec<String> {
        self.state().methods.clone()
    }

    pub fn is_attached(&self, tab: &TabId) -> bool {
        self.state().attached.contains(tab)
    }
}

#[async_trait]
impl DebuggerBackend for FakeBackend {
    async fn attach(&self, tab: &TabId) -> Result<(), ResolveError> {
        let mut state = self.state();
        if state.foreign.contains(tab) {
            return Err(ResolveError::AlreadyAttachedElsewhere(tab.clone()));
        }
        state.attach_count += 1;
        state.attached.insert(tab.clone());
        Ok(())
    }

    async fn detach(&self, tab: &TabId) {
        let mut state = self.state();
        if state.attached.remove(tab) {
            state.detach_count += 1;
        }
    }

    async fn send_command(
        &self,
        tab: &TabId,
        method: &str,
        params: Value,
    ) -> Result<Value, ResolveError> {
        let (handler, scripts) = {
            let mut state = self.state();
            if !state.attached.contains(tab) {
                return Err(ResolveError::NotAttached(tab.clone()));
            }
            state.methods.push(method.to_string());
            let scripts = if method == "Debugger.enable" {
                state.parsed_scripts.clone()
            } else {
                Vec::new()
            };
            (state.handlers.get(method).cloned(), scripts)
        };

        for params in scripts {
            let _ = self
                .events
                .send(DebugEvent::new(tab.clone(), SCRIPT_PARSED, params));
        }

        match handler {
            Some(handler) => handler(&params),
            None => Ok(json!({})),
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<DebugEvent> {
        self.events.subscribe()
    }
}
