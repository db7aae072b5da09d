//! Chrome DevTools Protocol Client
//!
//! Holds one browser-level websocket and multiplexes flattened target sessions
//! over it. Responses are routed by message id, notifications by `sessionId`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::sync::{broadcast, mpsc, oneshot, Mutex, RwLock};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use fiberlens_core::{DebugEvent, DebuggerBackend, ResolveError, TabId};

/// Capacity of the notification fan-out channel. `Debugger.enable` replays one
/// `scriptParsed` per loaded script in a single burst; dev-server pages can
/// carry several thousand modules.
const EVENT_BUFFER_SIZE: usize = 16384;

const TARGET_DETACHED: &str = "Target.detachedFromTarget";

type PendingCalls = Arc<Mutex<HashMap<u64, oneshot::Sender<Result<Value, ResolveError>>>>>;

#[derive(Debug, Default)]
struct Sessions {
    by_tab: HashMap<TabId, String>,
    by_session: HashMap<String, TabId>,
}

/// A decoded inbound protocol frame.
#[derive(Debug, PartialEq)]
pub(crate) enum Incoming {
    Response {
        id: u64,
        result: std::result::Result<Value, String>,
    },
    Event {
        session_id: Option<String>,
        method: String,
        params: Value,
    },
}

pub(crate) fn parse_incoming(text: &str) -> Option<Incoming> {
    let frame: Value = serde_json::from_str(text).ok()?;

    if let Some(id) = frame.get("id").and_then(Value::as_u64) {
        let result = match frame.get("error") {
            Some(error) => Err(error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown protocol error")
                .to_string()),
            None => Ok(frame.get("result").cloned().unwrap_or(Value::Null)),
        };
        return Some(Incoming::Response { id, result });
    }

    let method = frame.get("method")?.as_str()?.to_string();
    Some(Incoming::Event {
        session_id: frame
            .get("sessionId")
            .and_then(Value::as_str)
            .map(String::from),
        method,
        params: frame.get("params").cloned().unwrap_or(Value::Null),
    })
}

fn is_already_attached(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    lower.contains("already attached") || lower.contains("another debugger")
}

pub struct CdpClient {
    ws_endpoint: String,
    outgoing: mpsc::UnboundedSender<Message>,
    pending: PendingCalls,
    sessions: Arc<RwLock<Sessions>>,
    next_id: AtomicU64,
    closed: Arc<AtomicBool>,
    events: broadcast::Sender<DebugEvent>,
}

impl CdpClient {
    /// Connects to a browser websocket endpoint (`ws://host:port/devtools/browser/<id>`).
    pub async fn connect(ws_endpoint: &str) -> Result<Self> {
        info!(endpoint = %ws_endpoint, "Connecting to CDP websocket");
        let (stream, _) = tokio_tungstenite::connect_async(ws_endpoint)
            .await
            .with_context(|| format!("Failed to connect to CDP endpoint {ws_endpoint}"))?;
        let (mut sink, mut source) = stream.split();

        let (outgoing, mut outgoing_rx) = mpsc::unbounded_channel::<Message>();
        let (events, _) = broadcast::channel(EVENT_BUFFER_SIZE);
        let pending: PendingCalls = Arc::new(Mutex::new(HashMap::new()));
        let sessions = Arc::new(RwLock::new(Sessions::default()));

        tokio::spawn(async move {
            while let Some(message) = outgoing_rx.recv().await {
                if let Err(e) = sink.send(message).await {
                    warn!(error = %e, "CDP writer stopped");
                    break;
                }
            }
        });

        let reader_pending = Arc::clone(&pending);
        let reader_sessions = Arc::clone(&sessions);
        let reader_events = events.clone();
        let closed = Arc::new(AtomicBool::new(false));
        let reader_closed = Arc::clone(&closed);
        tokio::spawn(async move {
            while let Some(frame) = source.next().await {
                let text = match frame {
                    Ok(Message::Text(text)) => text,
                    Ok(Message::Close(_)) => break,
                    Ok(_) => continue,
                    Err(e) => {
                        warn!(error = %e, "CDP reader stopped");
                        break;
                    }
                };

                match parse_incoming(&text) {
                    Some(Incoming::Response { id, result }) => {
                        if let Some(tx) = reader_pending.lock().await.remove(&id) {
                            let _ = tx.send(result.map_err(ResolveError::ProtocolError));
                        }
                    }
                    Some(Incoming::Event {
                        session_id: Some(session_id),
                        method,
                        params,
                    }) => {
                        let tab = reader_sessions
                            .read()
                            .await
                            .by_session
                            .get(&session_id)
                            .cloned();
                        if let Some(tab) = tab {
                            // No subscribers is fine
                            let _ = reader_events.send(DebugEvent::new(tab, method, params));
                        }
                    }
                    Some(Incoming::Event { method, params, .. })
                        if method == TARGET_DETACHED =>
                    {
                        // Tab closed or debugger detached from outside
                        if let Some(session_id) = params.get("sessionId").and_then(Value::as_str) {
                            let mut sessions = reader_sessions.write().await;
                            if let Some(tab) = sessions.by_session.remove(session_id) {
                                sessions.by_tab.remove(&tab);
                                info!(tab = %tab, "Target detached by the browser");
                            }
                        }
                    }
                    Some(Incoming::Event { method, .. }) => {
                        debug!(method = %method, "Ignoring browser-level CDP event");
                    }
                    None => debug!("Ignoring unparseable CDP frame"),
                }
            }

            // Fail everything still waiting so no caller hangs on a dead socket
            let mut waiting = reader_pending.lock().await;
            reader_closed.store(true, Ordering::Release);
            for (_, tx) in waiting.drain() {
                let _ = tx.send(Err(ResolveError::ConnectionClosed));
            }
            info!("CDP connection closed");
        });

        Ok(Self {
            ws_endpoint: ws_endpoint.into(),
            outgoing,
            pending,
            sessions,
            next_id: AtomicU64::new(1),
            closed,
            events,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.ws_endpoint
    }

    /// Dispatches a raw protocol call, optionally scoped to a target session.
    async fn call(
        &self,
        session_id: Option<&str>,
        method: &str,
        params: Value,
    ) -> Result<Value, ResolveError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut frame = json!({ "id": id, "method": method, "params": params });
        if let Some(session_id) = session_id {
            frame["sessionId"] = Value::String(session_id.to_string());
        }

        let (tx, rx) = oneshot::channel();
        {
            let mut pending = self.pending.lock().await;
            if self.closed.load(Ordering::Acquire) {
                return Err(ResolveError::ConnectionClosed);
            }
            pending.insert(id, tx);
        }

        debug!(id, method, "Sending CDP command");
        if self.outgoing.send(Message::Text(frame.to_string())).is_err() {
            self.pending.lock().await.remove(&id);
            return Err(ResolveError::ConnectionClosed);
        }

        rx.await.map_err(|_| ResolveError::ConnectionClosed)?
    }

    async fn session_for(&self, tab: &TabId) -> Option<String> {
        self.sessions.read().await.by_tab.get(tab).cloned()
    }
}

#[async_trait]
impl DebuggerBackend for CdpClient {
    async fn attach(&self, tab: &TabId) -> Result<(), ResolveError> {
        if self.session_for(tab).await.is_some() {
            return Ok(());
        }

        let result = self
            .call(
                None,
                "Target.attachToTarget",
                json!({ "targetId": tab.as_str(), "flatten": true }),
            )
            .await
            .map_err(|e| match e {
                ResolveError::ProtocolError(message) if is_already_attached(&message) => {
                    ResolveError::AlreadyAttachedElsewhere(tab.clone())
                }
                other => other,
            })?;

        let session_id = result
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| ResolveError::protocol("attachToTarget returned no sessionId"))?
            .to_string();

        info!(tab = %tab, session = %session_id, "Attached to target");
        let mut sessions = self.sessions.write().await;
        sessions.by_session.insert(session_id.clone(), tab.clone());
        sessions.by_tab.insert(tab.clone(), session_id);
        Ok(())
    }

    async fn detach(&self, tab: &TabId) {
        let session_id = {
            let mut sessions = self.sessions.write().await;
            let Some(session_id) = sessions.by_tab.remove(tab) else {
                return;
            };
            sessions.by_session.remove(&session_id);
            session_id
        };

        if let Err(e) = self
            .call(
                None,
                "Target.detachFromTarget",
                json!({ "sessionId": session_id }),
            )
            .await
        {
            debug!(tab = %tab, error = %e, "Detach reported an error; ignoring");
        }
        info!(tab = %tab, "Detached from target");
    }

    async fn send_command(
        &self,
        tab: &TabId,
        method: &str,
        params: Value,
    ) -> Result<Value, ResolveError> {
        let session_id = self
            .session_for(tab)
            .await
            .ok_or_else(|| ResolveError::NotAttached(tab.clone()))?;
        self.call(Some(&session_id), method, params).await
    }

    fn subscribe(&self) -> broadcast::Receiver<DebugEvent> {
        self.events.subscribe()
    }
}
