//! Process-wide source map cache.
//!
//! Entries are keyed by the resolved map URL and never evicted. Two concurrent
//! lookups of the same uncached URL may both load it; the last store wins.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::RwLock;
use tracing::{debug, warn};

use fiberlens_core::{MapFetcher, ResolveError};
use fiberlens_logging::redact_sensitive_data;

use crate::decode::{ParsedSourceMap, decode_data_url, resolve_map_url};

pub struct SourceMapCache {
    fetcher: Arc<dyn MapFetcher>,
    entries: RwLock<HashMap<String, Arc<ParsedSourceMap>>>,
    loads: AtomicUsize,
}

impl SourceMapCache {
    pub fn new(fetcher: Arc<dyn MapFetcher>) -> Self {
        Self {
            fetcher,
            entries: RwLock::new(HashMap::new()),
            loads: AtomicUsize::new(0),
        }
    }

    /// Returns the parsed map referenced by `map_url` from the script at `script_url`.
    ///
    /// Unresolvable, unfetchable, or malformed maps yield `None`; the failure is
    /// logged and not cached, so a later lookup retries.
    pub async fn get(&self, map_url: &str, script_url: &str) -> Option<Arc<ParsedSourceMap>> {
        let Some(resolved) = resolve_map_url(map_url, script_url) else {
            debug!(
                map = %redact_sensitive_data(map_url),
                script = %redact_sensitive_data(script_url),
                "Could not resolve source map URL"
            );
            return None;
        };

        if let Some(hit) = self.entries.read().await.get(&resolved) {
            return Some(Arc::clone(hit));
        }

        match self.load(&resolved).await {
            Ok(map) => {
                let map = Arc::new(map);
                self.entries
                    .write()
                    .await
                    .insert(resolved, Arc::clone(&map));
                Some(map)
            }
            Err(e) => {
                warn!(
                    map = %redact_sensitive_data(&resolved),
                    error = %e,
                    "Source map unavailable"
                );
                None
            }
        }
    }

    async fn load(&self, resolved: &str) -> Result<ParsedSourceMap, ResolveError> {
        self.loads.fetch_add(1, Ordering::Relaxed);

        let text = if resolved.starts_with("data:") {
            decode_data_url(resolved)?
        } else {
            self.fetcher
                .fetch_text(resolved)
                .await
                .map_err(|e| ResolveError::SourceMap(format!("fetch failed: {e:#}")))?
        };

        let map = ParsedSourceMap::from_json(resolved, &text)?;
        debug!(
            map = %redact_sensitive_data(resolved),
            sources = map.sources.len(),
            "Source map cached"
        );
        Ok(map)
    }

    /// Number of decode/fetch attempts made so far, cache hits excluded.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::Relaxed)
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
