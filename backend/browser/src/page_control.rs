//! Page Control Actions
//!
//! Evaluates payloads inside the page's own JS context and reads back script
//! text, both through an attached `DebugSession`.

use serde_json::{json, Value};
use tracing::debug;

use fiberlens_core::ResolveError;

use crate::session::DebugSession;

/// Evaluates `expression` in the page's main world and returns its value as plain JSON.
///
/// `undefined` comes back as `Value::Null`. An exception thrown by the page code
/// is reported as a `ProtocolError`.
pub async fn evaluate_by_value(session: &DebugSession, expression: &str) -> Result<Value, ResolveError> {
    debug!(tab = %session.tab(), len = expression.len(), "Evaluating payload in page");
    let response = session
        .send_command(
            "Runtime.evaluate",
            json!({
                "expression": expression,
                "returnByValue": true,
                "awaitPromise": false,
                "silent": true,
            }),
        )
        .await?;

    evaluation_value(response)
}

fn evaluation_value(mut response: Value) -> Result<Value, ResolveError> {
    if let Some(details) = response.get("exceptionDetails") {
        let message = details
            .pointer("/exception/description")
            .or_else(|| details.get("text"))
            .and_then(Value::as_str)
            .unwrap_or("page evaluation threw");
        return Err(ResolveError::protocol(message));
    }

    Ok(response
        .get_mut("result")
        .and_then(|r| r.get_mut("value"))
        .map(Value::take)
        .unwrap_or(Value::Null))
}

/// Fetches the current text of a parsed script.
pub async fn script_source(session: &DebugSession, script_id: &str) -> Result<String, ResolveError> {
    let response = session
        .send_command("Debugger.getScriptSource", json!({ "scriptId": script_id }))
        .await?;

    response
        .get("scriptSource")
        .and_then(Value::as_str)
        .map(String::from)
        .ok_or_else(|| ResolveError::protocol("getScriptSource returned no scriptSource"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_extraction() {
        let response = json!({"result": {"type": "object", "value": {"status": "ok"}}});
        assert_eq!(evaluation_value(response).unwrap(), json!({"status": "ok"}));

        let undefined = json!({"result": {"type": "undefined"}});
        assert_eq!(evaluation_value(undefined).unwrap(), Value::Null);
    }

    #[test]
    fn test_exception_becomes_error() {
        let response = json!({
            "result": {"type": "object"},
            "exceptionDetails": {"text": "Uncaught", "exception": {"description": "SyntaxError: bad selector"}}
        });
        let err = evaluation_value(response).unwrap_err();
        assert!(err.to_string().contains("bad selector"));
    }
}
