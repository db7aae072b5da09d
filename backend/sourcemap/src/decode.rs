//! Source map URL resolution, inline payload decoding, and parsing.

use base64::{Engine as _, engine::general_purpose};
use serde::Deserialize;

use fiberlens_core::ResolveError;

/// The only inline media type and encoding accepted.
pub const INLINE_MAP_PREFIX: &str = "data:application/json;base64,";

/// Resolves `map_url` against the URL of the script that referenced it.
///
/// Absolute `http(s)` and `data:` URLs pass through unchanged.
pub fn resolve_map_url(map_url: &str, script_url: &str) -> Option<String> {
    let map_url = map_url.trim();
    if map_url.is_empty() {
        return None;
    }
    if map_url.starts_with("data:") {
        return Some(map_url.to_string());
    }
    if let Ok(absolute) = url::Url::parse(map_url) {
        if matches!(absolute.scheme(), "http" | "https") {
            return Some(map_url.to_string());
        }
    }

    let base = url::Url::parse(script_url).ok()?;
    base.join(map_url).ok().map(|u| u.to_string())
}

/// Decodes an inline `data:application/json;base64,` map into its JSON text.
pub fn decode_data_url(data_url: &str) -> Result<String, ResolveError> {
    let payload = data_url
        .strip_prefix(INLINE_MAP_PREFIX)
        .ok_or_else(|| ResolveError::SourceMap("unsupported data URL encoding".into()))?;
    let bytes = general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| ResolveError::SourceMap(format!("invalid base64 payload: {e}")))?;
    String::from_utf8(bytes)
        .map_err(|e| ResolveError::SourceMap(format!("inline map is not UTF-8: {e}")))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSourceMap {
    version: Option<u32>,
    file: Option<String>,
    source_root: Option<String>,
    sources: Option<Vec<Option<String>>>,
    #[serde(default)]
    names: Vec<String>,
    #[serde(default)]
    mappings: String,
    sections: Option<Vec<RawSection>>,
}

#[derive(Debug, Deserialize)]
struct RawSection {
    map: Option<Box<RawSourceMap>>,
}

/// A decoded source map and the original files it references.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedSourceMap {
    /// Resolved absolute URL this map was loaded from (the cache key).
    pub url: String,
    pub version: u32,
    pub file: Option<String>,
    pub source_root: Option<String>,
    /// Original source paths, `sourceRoot` applied, in map order.
    pub sources: Vec<String>,
    pub names: Vec<String>,
    /// Encoded mappings; empty for index maps.
    pub mappings: String,
    /// Number of sections for index maps, zero otherwise.
    pub sections: usize,
}

impl ParsedSourceMap {
    pub fn from_json(url: &str, text: &str) -> Result<Self, ResolveError> {
        let raw: RawSourceMap = serde_json::from_str(text)
            .map_err(|e| ResolveError::SourceMap(format!("malformed source map JSON: {e}")))?;
        if raw.sources.is_none() && raw.sections.is_none() {
            return Err(ResolveError::SourceMap(
                "JSON has neither sources nor sections".into(),
            ));
        }

        let mut sources = Vec::new();
        let mut names = Vec::new();
        collect(&raw, &mut sources, &mut names);

        Ok(Self {
            url: url.to_string(),
            version: raw.version.unwrap_or(3),
            file: raw.file,
            source_root: raw.source_root,
            sources,
            names,
            mappings: raw.mappings,
            sections: raw.sections.as_ref().map_or(0, Vec::len),
        })
    }

    /// Original source paths referenced by this map.
    pub fn original_files(&self) -> &[String] {
        &self.sources
    }
}

fn collect(raw: &RawSourceMap, sources: &mut Vec<String>, names: &mut Vec<String>) {
    let root = raw.source_root.as_deref().unwrap_or("");
    for source in raw.sources.iter().flatten().flatten() {
        sources.push(apply_source_root(root, source));
    }
    names.extend(raw.names.iter().cloned());

    for section in raw.sections.iter().flatten() {
        if let Some(map) = &section.map {
            collect(map, sources, names);
        }
    }
}

fn apply_source_root(root: &str, source: &str) -> String {
    if root.is_empty() || source.contains("://") {
        source.to_string()
    } else if root.ends_with('/') {
        format!("{root}{source}")
    } else {
        format!("{root}/{source}")
    }
}
