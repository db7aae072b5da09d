//! Runtime fiber inspection.
//!
//! Ships `inspector.js` into the page, receives a plain-data snapshot of the
//! element's instance graph, and hands it to the pure walker in `instance`.

use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::debug;

use fiberlens_browser::{DebugSession, evaluate_by_value};
use fiberlens_core::ResolveError;

use crate::instance::{Inspection, InstanceGraph, InstanceNode};

/// In-page routine; evaluated as `(<function>)(selector, knownKeys)`.
const INSPECTOR_PAYLOAD: &str = include_str!("inspector.js");

/// What the in-page routine reports back.
#[derive(Debug, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum InspectorReport {
    /// The selector matched nothing; the element went away after selection.
    ElementMissing,
    /// No instance handle on the element or any DOM ancestor.
    NoInstance,
    Ok {
        #[serde(rename = "fiberKey", default)]
        fiber_key: Option<String>,
        root: usize,
        nodes: Vec<InstanceNode>,
        #[serde(default)]
        truncated: bool,
    },
    Error {
        message: String,
    },
}

/// Property names under which the page stores instance handles.
///
/// Discovered keys are replayed to later inspections so the page can skip the
/// full property scan. Scoped to one batch; the suffix changes per page load.
#[derive(Debug, Default)]
pub struct FiberKeyCache {
    keys: RwLock<Vec<String>>,
}

impl FiberKeyCache {
    pub async fn known(&self) -> Vec<String> {
        self.keys.read().await.clone()
    }

    pub async fn remember(&self, key: &str) {
        let mut keys = self.keys.write().await;
        if !keys.iter().any(|k| k == key) {
            debug!(key, "Cached instance property name");
            keys.push(key.to_string());
        }
    }
}

/// Builds the expression evaluated in the page.
pub fn build_expression(selector: &str, known_keys: &[String]) -> Result<String, ResolveError> {
    let selector = serde_json::to_string(selector).map_err(anyhow::Error::from)?;
    let keys = serde_json::to_string(known_keys).map_err(anyhow::Error::from)?;
    Ok(format!("({})({selector}, {keys})", INSPECTOR_PAYLOAD.trim()))
}

#[derive(Debug, Default)]
pub struct FiberInspector {
    keys: FiberKeyCache,
}

impl FiberInspector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs the in-page routine for `selector` and walks the returned snapshot.
    pub async fn inspect(
        &self,
        session: &DebugSession,
        selector: &str,
    ) -> Result<Inspection, ResolveError> {
        let expression = build_expression(selector, &self.keys.known().await)?;
        let value = evaluate_by_value(session, &expression).await?;

        if value.is_null() {
            return Ok(Inspection::Nothing);
        }
        let report: InspectorReport = serde_json::from_value(value)
            .map_err(|e| ResolveError::protocol(format!("unexpected inspector report: {e}")))?;

        match report {
            InspectorReport::ElementMissing => {
                debug!(selector, "Element no longer in the document");
                Ok(Inspection::Nothing)
            }
            InspectorReport::NoInstance => {
                debug!(selector, "No component instance found");
                Ok(Inspection::Nothing)
            }
            InspectorReport::Error { message } => Err(ResolveError::ProtocolError(format!(
                "in-page inspection failed: {message}"
            ))),
            InspectorReport::Ok {
                fiber_key,
                root,
                nodes,
                truncated,
            } => {
                if let Some(key) = fiber_key {
                    self.keys.remember(&key).await;
                }
                if truncated {
                    debug!(selector, nodes = nodes.len(), "Instance snapshot truncated");
                }
                Ok(InstanceGraph::new(root, nodes).walk())
            }
        }
    }

    pub fn keys(&self) -> &FiberKeyCache {
        &self.keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::SourceLocation;
    use fiberlens_browser::DebugSessionManager;
    use fiberlens_browser::fake::FakeBackend;
    use fiberlens_core::TabId;
    use serde_json::json;
    use std::sync::Arc;

    fn wrap(value: serde_json::Value) -> serde_json::Value {
        json!({ "result": { "type": "object", "value": value } })
    }

    #[test]
    fn expression_embeds_arguments() {
        let expr = build_expression(r#"div[data-id="a"]"#, &["__reactFiber$x1".to_string()]).unwrap();
        assert!(expr.starts_with("(function inspectInstanceTree("));
        assert!(expr.ends_with(r#"("div[data-id=\"a\"]", ["__reactFiber$x1"])"#));
    }

    #[tokio::test]
    async fn inspects_and_caches_key() {
        let backend = Arc::new(FakeBackend::new());
        backend.on("Runtime.evaluate", |_| {
            Ok(wrap(json!({
                "status": "ok",
                "fiberKey": "__reactFiber$abc",
                "root": 0,
                "nodes": [
                    {"id": 0, "kind": "host", "tag": 5, "hostTag": "button", "owner": 1, "parent": 1,
                     "debugSource": {"fileName": "<Toolbar>", "lineNumber": 9, "columnNumber": null},
                     "names": {}},
                    {"id": 1, "kind": "component", "tag": 0, "owner": null, "parent": null,
                     "debugSource": null, "names": {"name": "Toolbar"}}
                ],
                "truncated": false
            })))
        });
        let manager = DebugSessionManager::new(backend.clone());
        let session = manager.attach(&TabId::new("T1")).await.unwrap();
        let inspector = FiberInspector::new();

        let result = inspector.inspect(&session, "#save").await.unwrap();
        assert_eq!(
            result,
            Inspection::Exact {
                location: SourceLocation {
                    file: "Toolbar".into(),
                    line: 9,
                    column: 1,
                },
                component_name: "Toolbar".into(),
            }
        );
        assert_eq!(inspector.keys().known().await, vec!["__reactFiber$abc".to_string()]);
    }

    #[tokio::test]
    async fn missing_element_is_nothing() {
        let backend = Arc::new(FakeBackend::new());
        backend.on("Runtime.evaluate", |_| Ok(wrap(json!({"status": "element_missing"}))));
        let manager = DebugSessionManager::new(backend.clone());
        let session = manager.attach(&TabId::new("T1")).await.unwrap();

        let result = FiberInspector::new().inspect(&session, "#gone").await.unwrap();
        assert_eq!(result, Inspection::Nothing);
    }

    #[tokio::test]
    async fn in_page_error_is_reported() {
        let backend = Arc::new(FakeBackend::new());
        backend.on("Runtime.evaluate", |_| {
            Ok(wrap(json!({"status": "error", "message": "'##' is not a valid selector"})))
        });
        let manager = DebugSessionManager::new(backend.clone());
        let session = manager.attach(&TabId::new("T1")).await.unwrap();

        let err = FiberInspector::new().inspect(&session, "##").await.unwrap_err();
        assert!(matches!(err, ResolveError::ProtocolError(_)));
    }

    /// Evaluates the real page expression under node against a stub DOM.
    ///
    /// `page` defines `document` (and optionally the devtools hook) on `globalThis`.
    fn evaluate_in_node(page: &str, selector: &str, known_keys: &[String]) -> InspectorReport {
        let expression = build_expression(selector, known_keys).unwrap();
        let script = format!(
            "globalThis.window = globalThis;\n{page}\nconsole.log(JSON.stringify({expression}));"
        );
        let output = std::process::Command::new("node")
            .arg("-e")
            .arg(script)
            .output()
            .expect("node on PATH");
        assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
        serde_json::from_slice(&output.stdout).unwrap()
    }

    const TOOLBAR_TREE: &str = r#"
        function Toolbar() {}
        const Card = function Card() {};
        const toolbar = { tag: 0, elementType: Toolbar, _debugSource: null, _debugOwner: null, return: null };
        const memo = { tag: 14, elementType: { $$typeof: Symbol.for('react.memo'), type: Card },
                       _debugSource: null, _debugOwner: toolbar, return: toolbar };
        const button = { tag: 5, elementType: 'button', _debugOwner: toolbar, return: memo,
                         _debugSource: { fileName: '<Toolbar>', lineNumber: 9 } };
    "#;

    fn walk(report: InspectorReport) -> (Option<String>, Inspection) {
        match report {
            InspectorReport::Ok {
                fiber_key,
                root,
                nodes,
                truncated,
            } => {
                assert!(!truncated);
                (fiber_key, InstanceGraph::new(root, nodes).walk())
            }
            other => panic!("unexpected report: {other:?}"),
        }
    }

    fn toolbar_exact() -> Inspection {
        Inspection::Exact {
            location: SourceLocation {
                file: "Toolbar".into(),
                line: 9,
                column: 1,
            },
            component_name: "Toolbar".into(),
        }
    }

    #[test]
    #[ignore = "runs the in-page payload under node"]
    fn payload_scans_element_properties() {
        let page = format!(
            "{TOOLBAR_TREE}
            const el = {{ parentElement: null, '__reactFiber$abc': button }};
            globalThis.document = {{ querySelector: (s) => (s === '#save' ? el : null) }};"
        );
        let (key, inspection) = walk(evaluate_in_node(&page, "#save", &[]));
        assert_eq!(key.as_deref(), Some("__reactFiber$abc"));
        assert_eq!(inspection, toolbar_exact());
    }

    #[test]
    #[ignore = "runs the in-page payload under node"]
    fn payload_prefers_known_keys_and_walks_ancestors() {
        let page = format!(
            "{TOOLBAR_TREE}
            const parent = {{ parentElement: null, customFiberKey: button }};
            const el = {{ parentElement: parent }};
            globalThis.document = {{ querySelector: () => el }};"
        );
        let (key, inspection) =
            walk(evaluate_in_node(&page, "#save span", &["customFiberKey".to_string()]));
        assert_eq!(key.as_deref(), Some("customFiberKey"));
        assert_eq!(inspection, toolbar_exact());
    }

    #[test]
    #[ignore = "runs the in-page payload under node"]
    fn payload_uses_devtools_hook() {
        let page = format!(
            "{TOOLBAR_TREE}
            const el = {{ parentElement: null }};
            globalThis.__REACT_DEVTOOLS_GLOBAL_HOOK__ = {{
                renderers: new Map([[1, {{ findFiberByHostInstance: (node) => (node === el ? memo : null) }}]]),
            }};
            globalThis.document = {{ querySelector: () => el }};"
        );
        let report = evaluate_in_node(&page, "#card", &[]);
        let InspectorReport::Ok { fiber_key, nodes, .. } = &report else {
            panic!("unexpected report: {report:?}");
        };
        assert!(fiber_key.is_none());
        assert_eq!(nodes[0].names.type_name.as_deref(), Some("Card"));
        assert_eq!(walk(report).1, Inspection::NameOnly { component_name: "Card".into() });
    }

    #[test]
    #[ignore = "runs the in-page payload under node"]
    fn payload_reports_missing_element_and_instance() {
        let page = "globalThis.document = { querySelector: (s) => (s === '#bare' ? { parentElement: null } : null) };";
        assert!(matches!(
            evaluate_in_node(page, "#gone", &[]),
            InspectorReport::ElementMissing
        ));
        assert!(matches!(
            evaluate_in_node(page, "#bare", &[]),
            InspectorReport::NoInstance
        ));
    }
}
