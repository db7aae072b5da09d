//! `fiberlens resolve`: map elements of a live page back to their source files.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tracing::info;

use fiberlens_browser::{resolve_ws_endpoint, CdpClient};
use fiberlens_config::{FiberlensConfig, ResolverConfig};
use fiberlens_core::{ElementDescriptor, SourceInfo, SourceType, TabId};
use fiberlens_resolver::{MatchRules, ResolverOptions, SourceResolver};
use fiberlens_sourcemap::{HttpFetcher, SourceMapCache, DEFAULT_USER_AGENT};

use crate::terminal_output::{paint, render_table, supports_color, Column, DIM, GREEN, RED, YELLOW};
use crate::OutputFormat;

pub async fn run(
    config: &FiberlensConfig,
    target: &str,
    selectors: Vec<String>,
    elements_file: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    let elements = collect_elements(selectors, elements_file).await?;
    if elements.is_empty() {
        bail!("Nothing to resolve: pass --selector or --elements");
    }

    let http = reqwest::Client::new();
    let ws_endpoint = resolve_ws_endpoint(&http, &config.browser.endpoint).await?;
    let backend = Arc::new(CdpClient::connect(&ws_endpoint).await?);

    let user_agent = config.fetch.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT);
    let fetcher = HttpFetcher::new(Duration::from_secs(config.fetch.timeout_secs), user_agent)?;
    let maps = Arc::new(SourceMapCache::new(Arc::new(fetcher)));

    let resolver = SourceResolver::new(backend, maps, resolver_options(&config.resolver));
    let resolved = resolver.resolve_batch(&TabId::new(target), elements).await;
    info!(tab = target, elements = resolved.len(), "Resolution finished");

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&resolved)?),
        OutputFormat::Text => print!(
            "{}",
            render_text(&resolved, &config.resolver.display_strip_prefixes, supports_color())
        ),
    }
    Ok(())
}

/// Selectors from the command line first, then descriptors from the file.
async fn collect_elements(
    selectors: Vec<String>,
    elements_file: Option<&Path>,
) -> Result<Vec<ElementDescriptor>> {
    let mut elements: Vec<ElementDescriptor> =
        selectors.into_iter().map(ElementDescriptor::from_selector).collect();

    if let Some(path) = elements_file {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read elements file: {}", path.display()))?;
        let from_file: Vec<ElementDescriptor> = serde_json::from_str(&raw)
            .with_context(|| format!("Expected a JSON array of elements in {}", path.display()))?;
        elements.extend(from_file);
    }
    Ok(elements)
}

pub fn resolver_options(config: &ResolverConfig) -> ResolverOptions {
    ResolverOptions {
        discovery_window: Duration::from_millis(config.discovery_window_ms),
        rules: MatchRules {
            script_extensions: config.script_extensions.clone(),
            source_extensions: config.source_extensions.clone(),
            dependency_markers: config.dependency_markers.clone(),
            internal_prefixes: config.internal_prefixes.clone(),
        },
    }
}

fn location(info: &SourceInfo, prefixes: &[String]) -> String {
    let Some(file) = info.display_file_with(prefixes) else {
        return "-".to_string();
    };
    match (info.line(), info.column()) {
        (Some(line), Some(column)) => format!("{file}:{line}:{column}"),
        (Some(line), None) => format!("{file}:{line}"),
        _ => file.to_string(),
    }
}

fn render_text(elements: &[ElementDescriptor], prefixes: &[String], color: bool) -> String {
    let columns = [
        Column::new("Selector").max_width(48),
        Column::new("Match"),
        Column::new("Component"),
        Column::new("Location"),
    ];
    let rows: Vec<Vec<String>> = elements
        .iter()
        .map(|el| {
            let info = el.source_info.clone().unwrap_or_else(SourceInfo::not_found);
            let style = match info.source_type() {
                SourceType::Exact => GREEN,
                SourceType::Fuzzy => YELLOW,
                SourceType::NotFound => RED,
            };
            vec![
                el.selector.clone(),
                paint(&info.source_type().to_string(), style, color),
                info.component_name().unwrap_or("-").to_string(),
                paint(&location(&info, prefixes), DIM, color && info.file().is_none()),
            ]
        })
        .collect();
    render_table(&columns, &rows, color)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prefixes() -> Vec<String> {
        vec!["webpack:///".to_string()]
    }

    #[test]
    fn text_output_lists_each_element() {
        let elements = vec![
            ElementDescriptor::from_selector("#save")
                .with_source(SourceInfo::exact("webpack:///src/Toolbar.tsx", 12, 7, "Toolbar")),
            ElementDescriptor::from_selector(".card")
                .with_source(SourceInfo::fuzzy_match("src/Card.tsx", "Card")),
            ElementDescriptor::from_selector("footer").with_source(SourceInfo::not_found()),
        ];
        let out = render_text(&elements, &prefixes(), false);
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines.len(), 5);
        assert!(lines[2].contains("exact") && lines[2].ends_with("src/Toolbar.tsx:12:7"));
        assert!(lines[3].contains("fuzzy") && lines[3].ends_with("src/Card.tsx"));
        assert!(lines[4].contains("not_found") && lines[4].ends_with("-"));
    }

    #[test]
    fn options_follow_config() {
        let mut config = ResolverConfig::default();
        config.discovery_window_ms = 250;
        config.dependency_markers = vec!["vendor".to_string()];

        let options = resolver_options(&config);
        assert_eq!(options.discovery_window, Duration::from_millis(250));
        assert!(options.rules.is_dependency_path("src/vendor/lib.js"));
        assert!(!options.rules.is_dependency_path("node_modules/react/index.js"));
    }

    #[tokio::test]
    async fn selectors_precede_file_elements() {
        let path = std::env::temp_dir().join(format!("fiberlens-elements-{}.json", std::process::id()));
        tokio::fs::write(&path, r##"[{"selector": "#from-file", "tagName": "button"}]"##)
            .await
            .unwrap();

        let elements = collect_elements(vec!["#cli".to_string()], Some(&path)).await.unwrap();
        let selectors: Vec<&str> = elements.iter().map(|e| e.selector.as_str()).collect();
        assert_eq!(selectors, vec!["#cli", "#from-file"]);
        assert_eq!(elements[1].tag_name, "button");
        tokio::fs::remove_file(&path).await.unwrap();
    }
}
