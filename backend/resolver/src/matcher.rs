//! Fuzzy source matching.
//!
//! When the runtime knows a component's name but not its file, scan the source
//! maps of the page's scripts for a file named after the component.

use std::sync::Arc;

use tracing::{debug, info};

use fiberlens_browser::{DebugSession, ScriptRegistry, script_source};
use fiberlens_core::{ScriptRecord, SourceInfo};
use fiberlens_logging::redact_sensitive_data;
use fiberlens_sourcemap::{SourceMapCache, last_source_mapping_url};

/// Heuristics deciding which scripts and source paths take part in matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRules {
    /// URL extensions treated as executable script. Extensionless URLs always count.
    pub script_extensions: Vec<String>,
    /// Extensions a component's source file may have.
    pub source_extensions: Vec<String>,
    /// Path segments marking third-party code.
    pub dependency_markers: Vec<String>,
    /// Prefixes of bundler-generated modules.
    pub internal_prefixes: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for MatchRules {
    fn default() -> Self {
        Self {
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
        }
    }
}

/// Drops `?query` and `#fragment` suffixes.
fn without_suffix(path: &str) -> &str {
    path.split(['?', '#']).next().unwrap_or(path)
}

/// Strips `scheme://namespace/` and leading `./` or `/` from a source path.
fn module_path(path: &str) -> &str {
    let path = without_suffix(path);
    let path = match path.find("://") {
        Some(idx) => {
            let rest = &path[idx + 3..];
            rest.find('/').map_or("", |slash| &rest[slash + 1..])
        }
        None => path,
    };
    path.trim_start_matches("./").trim_start_matches('/')
}

impl MatchRules {
    /// Whether a registry URL looks like executable script rather than another resource.
    pub fn looks_like_script(&self, script_url: &str) -> bool {
        let Ok(parsed) = url::Url::parse(script_url) else {
            return false;
        };
        if !matches!(parsed.scheme(), "http" | "https" | "file") {
            return false;
        }

        let last = parsed.path().rsplit('/').next().unwrap_or("");
        match last.rsplit_once('.') {
            None => true,
            Some((_, ext)) => self
                .script_extensions
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(ext)),
        }
    }

    /// Whether a source path belongs to a dependency or to bundler internals.
    pub fn is_dependency_path(&self, source_path: &str) -> bool {
        if source_path.starts_with('\0') {
            return true;
        }
        let path = module_path(source_path);

        if self
            .internal_prefixes
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
        {
            return true;
        }

        path.split(['/', '\\'])
            .any(|segment| self.dependency_markers.iter().any(|m| m == segment))
    }

    /// `Name.<ext>` or `Name/index.<ext>` with a recognized source extension.
    pub fn matches_component(&self, source_path: &str, component_name: &str) -> bool {
        let mut segments = without_suffix(source_path).rsplit(['/', '\\']);
        let Some(file) = segments.next() else {
            return false;
        };
        let Some((stem, ext)) = file.rsplit_once('.') else {
            return false;
        };
        if !self.source_extensions.iter().any(|allowed| allowed == ext) {
            return false;
        }

        stem == component_name || (stem == "index" && segments.next() == Some(component_name))
    }
}

pub struct FuzzyMatcher {
    registry: Arc<ScriptRegistry>,
    maps: Arc<SourceMapCache>,
    rules: MatchRules,
}

impl FuzzyMatcher {
    pub fn new(registry: Arc<ScriptRegistry>, maps: Arc<SourceMapCache>, rules: MatchRules) -> Self {
        Self {
            registry,
            maps,
            rules,
        }
    }

    /// Finds a source file for `component_name` across the session's scripts.
    ///
    /// The first matching path wins, in script-registry order and then in map order.
    /// Failures on one script only skip that script.
    pub async fn match_by_name(
        &self,
        session: &DebugSession,
        component_name: &str,
    ) -> Option<SourceInfo> {
        for record in self.registry.snapshot().await {
            if !self.rules.looks_like_script(&record.script_url) {
                continue;
            }
            if let Some(file) = self.match_in_script(session, &record, component_name).await {
                info!(
                    component = component_name,
                    file = %file,
                    script = %redact_sensitive_data(&record.script_url),
                    "Fuzzy source match"
                );
                return Some(SourceInfo::fuzzy_match(file, component_name));
            }
        }

        debug!(component = component_name, "No fuzzy source match");
        None
    }

    async fn match_in_script(
        &self,
        session: &DebugSession,
        record: &ScriptRecord,
        component_name: &str,
    ) -> Option<String> {
        let text = match script_source(session, &record.script_id).await {
            Ok(text) => text,
            Err(e) => {
                debug!(script_id = %record.script_id, error = %e, "Script source unavailable");
                return None;
            }
        };

        let map_url = last_source_mapping_url(&text)
            .map(String::from)
            .or_else(|| record.source_map_hint.clone())?;
        let map = self.maps.get(&map_url, &record.script_url).await?;

        map.original_files()
            .iter()
            .filter(|path| !self.rules.is_dependency_path(path))
            .find(|path| self.rules.matches_component(path, component_name))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_urls() {
        let rules = MatchRules::default();
        assert!(rules.looks_like_script("http://localhost:3000/static/js/main.js"));
        assert!(rules.looks_like_script("http://localhost:5173/src/App.tsx?t=1712"));
        assert!(rules.looks_like_script("http://localhost:5173/@vite/client"));
        assert!(rules.looks_like_script("file:///srv/app/bundle.MJS"));
        assert!(!rules.looks_like_script("http://localhost:3000/styles/site.css"));
        assert!(!rules.looks_like_script("chrome-extension://abc/content.js"));
        assert!(!rules.looks_like_script("webpack-internal:///./src/App.tsx"));
        assert!(!rules.looks_like_script(""));
    }

    #[test]
    fn dependency_paths() {
        let rules = MatchRules::default();
        assert!(rules.is_dependency_path("webpack:///node_modules/react-dom/cjs/react-dom.development.js"));
        assert!(rules.is_dependency_path("../../node_modules/.pnpm/react@18.3.1/node_modules/react/index.js"));
        assert!(rules.is_dependency_path("webpack:///webpack/bootstrap"));
        assert!(rules.is_dependency_path("webpack://my-app/webpack/runtime/define property getters"));
        assert!(rules.is_dependency_path("\0vite/preload-helper"));
        assert!(rules.is_dependency_path("/@react-refresh"));
        assert!(!rules.is_dependency_path("webpack:///./src/components/Card.tsx"));
        assert!(!rules.is_dependency_path("src/components/Card.tsx"));
    }

    #[test]
    fn component_file_names() {
        let rules = MatchRules::default();
        assert!(rules.matches_component("src/components/Card.tsx", "Card"));
        assert!(rules.matches_component("webpack:///./src/Card/index.jsx", "Card"));
        assert!(rules.matches_component("src\\ui\\Card.js?abc", "Card"));
        assert!(!rules.matches_component("src/components/CardList.tsx", "Card"));
        assert!(!rules.matches_component("src/components/Card.css", "Card"));
        assert!(!rules.matches_component("src/index.tsx", "Card"));
        assert!(!rules.matches_component("Card", "Card"));
    }

    #[test]
    fn module_path_normalization() {
        assert_eq!(module_path("webpack:///./src/App.tsx"), "src/App.tsx");
        assert_eq!(module_path("webpack://ns/src/App.tsx?x=1"), "src/App.tsx");
        assert_eq!(module_path("./lib/a.js"), "lib/a.js");
    }
}
