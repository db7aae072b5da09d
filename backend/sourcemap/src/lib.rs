//! `fiberlens-sourcemap` — locating and loading source maps for page scripts.
//!
//! Provides:
//! - `sourceMappingURL` directive extraction (last directive wins)
//! - URL resolution relative to the referencing script
//! - Inline `data:application/json;base64,` decoding
//! - `SourceMapCache`: memoized, process-lifetime parsed maps

pub mod cache;
pub mod decode;
pub mod directive;
pub mod fetch;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use cache::SourceMapCache;
pub use decode::{INLINE_MAP_PREFIX, ParsedSourceMap, decode_data_url, resolve_map_url};
pub use directive::last_source_mapping_url;
pub use fetch::{DEFAULT_USER_AGENT, HttpFetcher};
