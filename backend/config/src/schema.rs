//! fiberlens configuration schema.
//!
//! Every field has a default so an empty or missing file is a valid config.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FiberlensConfig {
    /// Where to reach the browser.
    pub browser: BrowserConfig,
    /// Source resolution tuning.
    pub resolver: ResolverConfig,
    /// Remote source map fetching.
    pub fetch: FetchConfig,
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BrowserConfig {
    /// DevTools endpoint: `http(s)://host:port` or a browser `ws(s)://` URL.
    pub endpoint: String,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:9222".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResolverConfig {
    /// How long to collect script-parsed notifications before matching.
    pub discovery_window_ms: u64,
    /// URL extensions treated as executable script.
    pub script_extensions: Vec<String>,
    /// Extensions a component source file may have.
    pub source_extensions: Vec<String>,
    /// Path segments marking third-party code.
    pub dependency_markers: Vec<String>,
    /// Prefixes of bundler-generated modules.
    pub internal_prefixes: Vec<String>,
    /// Synthetic prefixes stripped from file paths for display.
    pub display_strip_prefixes: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            discovery_window_ms: 1000,
            script_extensions: strings(&["js", "mjs", "cjs", "jsx", "ts", "tsx"]),
            source_extensions: strings(&["tsx", "ts", "jsx", "js", "mjs", "cjs"]),
            dependency_markers: strings(&[
                "node_modules",
                "bower_components",
                ".pnpm",
                ".yarn",
                "jspm_packages",
            ]),
            internal_prefixes: strings(&[
                "webpack/bootstrap",
                "webpack/runtime",
                "(webpack)",
                "\0",
                "vite/",
                "@vite/",
                "@react-refresh",
                "__vite-",
            ]),
            display_strip_prefixes: strings(&["webpack:///"]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FetchConfig {
    pub timeout_secs: u64,
    pub user_agent: Option<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            user_agent: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is unset.
    pub level: String,
    /// JSON console output.
    pub json: bool,
    /// Directory for rolling NDJSON logs; unset disables file logging.
    pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            dir: None,
        }
    }
}
