//! Canned `MapFetcher` for tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Result, anyhow};
use async_trait::async_trait;

use fiberlens_core::MapFetcher;

/// Serves fixed bodies by URL; unknown URLs fail like a 404.
#[derive(Default)]
pub struct StaticFetcher {
    bodies: HashMap<String, String>,
    fetches: AtomicUsize,
    requested: Mutex<Vec<String>>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url: &str, body: &str) -> Self {
        self.bodies.insert(url.to_string(), body.to_string());
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::Relaxed)
    }

    /// URLs requested so far, in order.
    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().expect("fetcher log poisoned").clone()
    }
}

#[async_trait]
impl MapFetcher for StaticFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String> {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        self.requested
            .lock()
            .expect("fetcher log poisoned")
            .push(url.to_string());
        self.bodies
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow!("HTTP status client error (404 Not Found) for url ({url})"))
    }
}
