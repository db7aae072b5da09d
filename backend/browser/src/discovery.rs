//! Target Discovery
//!
//! Talks to the DevTools HTTP endpoint (`--remote-debugging-port`) to find the
//! browser websocket and the page targets it exposes.

use anyhow::{bail, Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::info;

/// A debuggable target as listed by `/json/list`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetInfo {
    pub id: String,
    #[serde(rename = "type")]
    pub target_type: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub web_socket_debugger_url: Option<String>,
}

impl TargetInfo {
    pub fn is_page(&self) -> bool {
        self.target_type == "page"
    }
}

#[derive(Debug, Deserialize)]
struct VersionInfo {
    #[serde(rename = "webSocketDebuggerUrl")]
    web_socket_debugger_url: String,
}

fn http_base(endpoint: &str) -> Result<url::Url> {
    let parsed = url::Url::parse(endpoint).with_context(|| format!("Invalid endpoint {endpoint}"))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => bail!("Endpoint scheme {other} is not an HTTP DevTools endpoint"),
    }
}

/// Turns a configured endpoint into a browser websocket URL.
///
/// `ws://` and `wss://` endpoints are returned unchanged; `http(s)://` endpoints
/// are asked for their `webSocketDebuggerUrl`.
pub async fn resolve_ws_endpoint(client: &Client, endpoint: &str) -> Result<String> {
    if endpoint.starts_with("ws://") || endpoint.starts_with("wss://") {
        return Ok(endpoint.to_string());
    }

    let version_url = http_base(endpoint)?.join("/json/version")?;
    let version: VersionInfo = client
        .get(version_url.clone())
        .send()
        .await
        .with_context(|| format!("Failed to reach {version_url}"))?
        .error_for_status()?
        .json()
        .await
        .context("Unexpected /json/version payload")?;

    info!(ws = %version.web_socket_debugger_url, "Discovered browser websocket");
    Ok(version.web_socket_debugger_url)
}

/// Lists page targets exposed by the browser.
pub async fn list_page_targets(client: &Client, endpoint: &str) -> Result<Vec<TargetInfo>> {
    let list_url = http_base(endpoint)?.join("/json/list")?;
    let targets: Vec<TargetInfo> = client
        .get(list_url.clone())
        .send()
        .await
        .with_context(|| format!("Failed to reach {list_url}"))?
        .error_for_status()?
        .json()
        .await
        .context("Unexpected /json/list payload")?;

    Ok(targets.into_iter().filter(TargetInfo::is_page).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ws_endpoint_passes_through() {
        let client = Client::new();
        let ws = "ws://127.0.0.1:9222/devtools/browser/abc";
        assert_eq!(resolve_ws_endpoint(&client, ws).await.unwrap(), ws);
    }

    #[test]
    fn rejects_non_http_base() {
        assert!(http_base("ftp://host").is_err());
        assert!(http_base("http://127.0.0.1:9222").is_ok());
    }

    #[test]
    fn parses_target_list() {
        let raw = serde_json::json!([
            {"id": "A1", "type": "page", "title": "App", "url": "http://localhost:3000/",
             "webSocketDebuggerUrl": "ws://127.0.0.1:9222/devtools/page/A1"},
            {"id": "W1", "type": "service_worker", "url": "http://localhost:3000/sw.js"}
        ]);
        let targets: Vec<TargetInfo> = serde_json::from_value(raw).unwrap();
        let pages: Vec<_> = targets.into_iter().filter(TargetInfo::is_page).collect();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].id, "A1");
    }
}
