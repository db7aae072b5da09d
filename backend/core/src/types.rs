use std::fmt;

use serde::{Deserialize, Serialize};

/// Synthetic prefixes that bundlers put in front of source paths.
pub const DEFAULT_DISPLAY_PREFIXES: &[&str] = &["webpack:///"];

/// Identifier of the page target a debug session is attached to (a CDP target id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(String);

impl TabId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TabId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Confidence tier of a resolved source location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    /// File and line came from live debug metadata.
    Exact,
    /// File guessed from the component name, or only the name is known.
    Fuzzy,
    /// No usable location.
    NotFound,
}

/// How a `SourceInfo` was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionMethod {
    RuntimeIntrospection,
    FuzzyMatch,
    None,
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SourceType::Exact => "exact",
            SourceType::Fuzzy => "fuzzy",
            SourceType::NotFound => "not_found",
        };
        f.write_str(s)
    }
}

/// Best-effort pointer from a DOM element back to the source that produced it.
///
/// Fields are private so the tier invariants hold for every value:
/// `Exact` always carries a file and a line, `NotFound` carries nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceInfo {
    #[serde(rename = "type")]
    source_type: SourceType,
    resolution_method: ResolutionMethod,
    file: Option<String>,
    line: Option<u32>,
    column: Option<u32>,
    component_name: Option<String>,
}

impl SourceInfo {
    /// Location read from a debug-source annotation on the live instance tree.
    pub fn exact(
        file: impl Into<String>,
        line: u32,
        column: u32,
        component_name: impl Into<String>,
    ) -> Self {
        Self {
            source_type: SourceType::Exact,
            resolution_method: ResolutionMethod::RuntimeIntrospection,
            file: Some(file.into()),
            line: Some(line),
            column: Some(column),
            component_name: Some(component_name.into()),
        }
    }

    /// File guessed by matching the component name against source-map paths.
    /// Source maps alone never pin a line.
    pub fn fuzzy_match(file: impl Into<String>, component_name: impl Into<String>) -> Self {
        Self {
            source_type: SourceType::Fuzzy,
            resolution_method: ResolutionMethod::FuzzyMatch,
            file: Some(file.into()),
            line: None,
            column: None,
            component_name: Some(component_name.into()),
        }
    }

    /// The runtime knows which component rendered the element but not where it lives.
    pub fn name_only(component_name: impl Into<String>) -> Self {
        Self {
            source_type: SourceType::Fuzzy,
            resolution_method: ResolutionMethod::RuntimeIntrospection,
            file: None,
            line: None,
            column: None,
            component_name: Some(component_name.into()),
        }
    }

    pub fn not_found() -> Self {
        Self {
            source_type: SourceType::NotFound,
            resolution_method: ResolutionMethod::None,
            file: None,
            line: None,
            column: None,
            component_name: None,
        }
    }

    pub fn source_type(&self) -> SourceType {
        self.source_type
    }

    pub fn resolution_method(&self) -> ResolutionMethod {
        self.resolution_method
    }

    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    pub fn line(&self) -> Option<u32> {
        self.line
    }

    pub fn column(&self) -> Option<u32> {
        self.column
    }

    pub fn component_name(&self) -> Option<&str> {
        self.component_name.as_deref()
    }

    /// File path with the default bundler prefixes stripped, for display.
    pub fn display_file(&self) -> Option<&str> {
        self.display_file_with(DEFAULT_DISPLAY_PREFIXES)
    }

    pub fn display_file_with<S: AsRef<str>>(&self, prefixes: &[S]) -> Option<&str> {
        let file = self.file.as_deref()?;
        Some(
            prefixes
                .iter()
                .find_map(|p| file.strip_prefix(p.as_ref()))
                .unwrap_or(file),
        )
    }
}

/// A selected DOM element plus the shallow metadata captured at selection time.
///
/// `source_info` is filled by the resolution pipeline and is never read from input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementDescriptor {
    pub selector: String,
    #[serde(default)]
    pub tag_name: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub classes: Vec<String>,
    #[serde(default)]
    pub text_content: Option<String>,
    #[serde(default)]
    pub href: Option<String>,
    #[serde(default)]
    pub src: Option<String>,
    #[serde(default)]
    pub alt: Option<String>,
    #[serde(default)]
    pub placeholder: Option<String>,
    #[serde(skip_deserializing)]
    pub source_info: Option<SourceInfo>,
}

impl ElementDescriptor {
    /// Descriptor carrying only a selector.
    pub fn from_selector(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            tag_name: String::new(),
            id: None,
            classes: Vec::new(),
            text_content: None,
            href: None,
            src: None,
            alt: None,
            placeholder: None,
            source_info: None,
        }
    }

    /// Returns a new descriptor with the resolved source attached.
    pub fn with_source(self, source_info: SourceInfo) -> Self {
        Self {
            source_info: Some(source_info),
            ..self
        }
    }
}

/// A script observed during one debug session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptRecord {
    pub script_id: String,
    pub script_url: String,
    /// Source map URL reported alongside the parse notification, if any.
    #[serde(default)]
    pub source_map_hint: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_carries_file_and_line() {
        let info = SourceInfo::exact("app/Button.tsx", 42, 5, "Button");
        assert_eq!(info.source_type(), SourceType::Exact);
        assert_eq!(info.resolution_method(), ResolutionMethod::RuntimeIntrospection);
        assert_eq!(info.file(), Some("app/Button.tsx"));
        assert_eq!(info.line(), Some(42));
        assert_eq!(info.column(), Some(5));
    }

    #[test]
    fn not_found_is_empty() {
        let info = SourceInfo::not_found();
        assert_eq!(info.resolution_method(), ResolutionMethod::None);
        assert!(info.file().is_none());
        assert!(info.line().is_none());
        assert!(info.column().is_none());
        assert!(info.component_name().is_none());
    }

    #[test]
    fn serializes_with_wire_names() {
        let info = SourceInfo::fuzzy_match("src/components/Card.tsx", "Card");
        let v = serde_json::to_value(&info).unwrap();
        assert_eq!(v["type"], "fuzzy");
        assert_eq!(v["resolutionMethod"], "fuzzy_match");
        assert_eq!(v["componentName"], "Card");
        assert!(v["line"].is_null());

        let v = serde_json::to_value(SourceInfo::not_found()).unwrap();
        assert_eq!(v["type"], "not_found");
        assert_eq!(v["resolutionMethod"], "none");
    }

    #[test]
    fn display_file_strips_webpack_prefix() {
        let info = SourceInfo::exact("webpack:///src/App.tsx", 3, 1, "App");
        assert_eq!(info.display_file(), Some("src/App.tsx"));
        assert_eq!(info.file(), Some("webpack:///src/App.tsx"));

        let plain = SourceInfo::fuzzy_match("src/App.tsx", "App");
        assert_eq!(plain.display_file(), Some("src/App.tsx"));
    }

    #[test]
    fn descriptor_ignores_incoming_source_info() {
        let raw = serde_json::json!({
            "selector": "#save",
            "tagName": "button",
            "classes": ["primary"],
            "sourceInfo": {"type": "exact"}
        });
        let el: ElementDescriptor = serde_json::from_value(raw).unwrap();
        assert_eq!(el.selector, "#save");
        assert_eq!(el.classes, vec!["primary".to_string()]);
        assert!(el.source_info.is_none());

        let resolved = el.clone().with_source(SourceInfo::not_found());
        assert_eq!(resolved.selector, el.selector);
        assert!(resolved.source_info.is_some());
    }
}
