//! Component instance tree model and the walk over it.
//!
//! The in-page adapter snapshots the framework's live instance graph into
//! plain `InstanceNode`s; everything here is pure and runs outside the page.

use std::collections::HashSet;

use serde::Deserialize;

/// Name used when no identifier can be derived for a component.
pub const ANONYMOUS: &str = "Anonymous";

/// What an instance represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceKind {
    /// A plain DOM tag (or text).
    Host,
    /// A user-authored function or class component, possibly wrapped.
    Component,
    /// Context provider plumbing.
    Provider,
    /// Context consumer plumbing.
    Consumer,
    /// Symbol-tagged framework internals, roots, fragments.
    Internal,
}

impl InstanceKind {
    /// Kinds that never name the component that authored the markup.
    pub fn is_plumbing(self) -> bool {
        !matches!(self, InstanceKind::Component)
    }
}

/// Raw `{fileName, lineNumber, columnNumber}` annotation from a development build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugSource {
    pub file_name: Option<String>,
    pub line_number: Option<u32>,
    pub column_number: Option<u32>,
}

/// A usable location taken from a `DebugSource`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

impl DebugSource {
    /// The annotation counts only when it has a file and a non-zero line.
    pub fn location(&self) -> Option<SourceLocation> {
        let file = self.file_name.as_deref().filter(|f| !f.is_empty())?;
        let line = self.line_number.filter(|l| *l > 0)?;
        Some(SourceLocation {
            file: normalize_file_name(file),
            line,
            column: self.column_number.unwrap_or(1),
        })
    }
}

/// Strips the angle brackets some bundlers wrap synthetic file names in (`<Foo>` → `Foo`).
pub fn normalize_file_name(file: &str) -> String {
    if file.len() >= 2 && file.starts_with('<') && file.ends_with('>') {
        file[1..file.len() - 1].to_string()
    } else {
        file.to_string()
    }
}

/// Identifier candidates read off a component's type object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NameHints {
    /// The function or class name.
    pub name: Option<String>,
    /// An explicit `displayName` override.
    pub display_name: Option<String>,
    /// `render.name` of a forwarding wrapper.
    pub render_name: Option<String>,
    /// `type.name` of a memoizing wrapper.
    pub type_name: Option<String>,
    /// `type.render.name`, a memo around a forwarding wrapper.
    pub type_render_name: Option<String>,
    /// Resolved payload name of a lazily loaded module.
    pub lazy_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceNode {
    pub id: usize,
    pub kind: InstanceKind,
    #[serde(default)]
    pub tag: Option<i64>,
    #[serde(default)]
    pub host_tag: Option<String>,
    /// The component whose code wrote this markup.
    #[serde(default)]
    pub owner: Option<usize>,
    /// The structural parent in the rendered tree.
    #[serde(default)]
    pub parent: Option<usize>,
    #[serde(default)]
    pub debug_source: Option<DebugSource>,
    #[serde(default)]
    pub names: NameHints,
}

/// Human-readable name for an instance.
pub fn display_name(node: &InstanceNode) -> String {
    if node.kind == InstanceKind::Host {
        return node
            .host_tag
            .clone()
            .unwrap_or_else(|| ANONYMOUS.to_string());
    }

    let hints = &node.names;
    [
        &hints.name,
        &hints.display_name,
        &hints.render_name,
        &hints.type_name,
        &hints.type_render_name,
        &hints.lazy_name,
    ]
    .into_iter()
    .flatten()
    .find(|name| !name.is_empty())
    .cloned()
    .unwrap_or_else(|| ANONYMOUS.to_string())
}

/// Outcome of walking the instance graph for one element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inspection {
    /// A debug-source annotation was found.
    Exact {
        location: SourceLocation,
        component_name: String,
    },
    /// Only the owning component's name is known.
    NameOnly { component_name: String },
    /// Nothing usable.
    Nothing,
}

/// Snapshot of the instances reachable from the element's own instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceGraph {
    pub root: usize,
    pub nodes: Vec<InstanceNode>,
}

impl InstanceGraph {
    pub fn new(root: usize, nodes: Vec<InstanceNode>) -> Self {
        Self { root, nodes }
    }

    pub fn node(&self, id: usize) -> Option<&InstanceNode> {
        self.nodes
            .get(id)
            .filter(|n| n.id == id)
            .or_else(|| self.nodes.iter().find(|n| n.id == id))
    }

    /// Owner links win over parent links: the owner reaches a named source faster.
    fn next(&self, node: &InstanceNode) -> Option<&InstanceNode> {
        node.owner.or(node.parent).and_then(|id| self.node(id))
    }

    /// First non-plumbing instance reached from `start`, `start` included.
    fn owning_component<'a>(&'a self, start: &'a InstanceNode) -> Option<&'a InstanceNode> {
        let mut seen = HashSet::new();
        let mut current = Some(start);
        while let Some(node) = current {
            if !seen.insert(node.id) {
                return None;
            }
            if !node.kind.is_plumbing() {
                return Some(node);
            }
            current = self.next(node);
        }
        None
    }

    /// Walks from the root toward the app root looking for a debug-source annotation.
    pub fn walk(&self) -> Inspection {
        let Some(root) = self.node(self.root) else {
            return Inspection::Nothing;
        };

        let mut seen = HashSet::new();
        let mut current = Some(root);
        while let Some(node) = current {
            if !seen.insert(node.id) {
                break;
            }
            if let Some(location) = node.debug_source.as_ref().and_then(DebugSource::location) {
                let owner = self.owning_component(node).unwrap_or(node);
                return Inspection::Exact {
                    location,
                    component_name: display_name(owner),
                };
            }
            current = self.next(node);
        }

        match self.owning_component(root).map(display_name) {
            Some(name) if name != ANONYMOUS => Inspection::NameOnly {
                component_name: name,
            },
            _ => Inspection::Nothing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host(id: usize, tag: &str, owner: Option<usize>, parent: Option<usize>) -> InstanceNode {
        InstanceNode {
            id,
            kind: InstanceKind::Host,
            tag: Some(5),
            host_tag: Some(tag.into()),
            owner,
            parent,
            debug_source: None,
            names: NameHints::default(),
        }
    }

    fn component(id: usize, name: &str, owner: Option<usize>, parent: Option<usize>) -> InstanceNode {
        InstanceNode {
            id,
            kind: InstanceKind::Component,
            tag: Some(0),
            host_tag: None,
            owner,
            parent,
            debug_source: None,
            names: NameHints {
                name: (!name.is_empty()).then(|| name.to_string()),
                ..Default::default()
            },
        }
    }

    fn source(file: &str, line: u32, column: Option<u32>) -> Option<DebugSource> {
        Some(DebugSource {
            file_name: Some(file.into()),
            line_number: Some(line),
            column_number: column,
        })
    }

    #[test]
    fn exact_hit_names_owner() {
        let mut div = host(0, "div", Some(1), Some(1));
        div.debug_source = source("app/Button.tsx", 42, Some(5));
        let graph = InstanceGraph::new(0, vec![div, component(1, "Button", None, None)]);

        assert_eq!(
            graph.walk(),
            Inspection::Exact {
                location: SourceLocation {
                    file: "app/Button.tsx".into(),
                    line: 42,
                    column: 5,
                },
                component_name: "Button".into(),
            }
        );
    }

    #[test]
    fn owner_walk_skips_plumbing() {
        let mut span = host(0, "span", None, Some(1));
        span.debug_source = source("src/List.tsx", 7, None);
        let provider = InstanceNode {
            kind: InstanceKind::Provider,
            ..component(1, "", None, Some(2))
        };
        let consumer = InstanceNode {
            kind: InstanceKind::Consumer,
            ..component(2, "", None, Some(3))
        };
        let internal = InstanceNode {
            kind: InstanceKind::Internal,
            ..component(3, "", Some(4), None)
        };
        let graph = InstanceGraph::new(
            0,
            vec![span, provider, consumer, internal, component(4, "List", None, None)],
        );

        match graph.walk() {
            Inspection::Exact {
                location,
                component_name,
            } => {
                assert_eq!(component_name, "List");
                assert_eq!(location.column, 1);
            }
            other => panic!("expected exact, got {other:?}"),
        }
    }

    #[test]
    fn owner_preferred_over_parent() {
        // 0 -owner-> 2 (has source), 0 -parent-> 1 (has a different source)
        let mut parent = component(1, "Layout", None, None);
        parent.debug_source = source("src/Layout.tsx", 3, Some(1));
        let mut owner = component(2, "Card", None, None);
        owner.debug_source = source("src/Card.tsx", 11, Some(4));
        let graph = InstanceGraph::new(0, vec![host(0, "p", Some(2), Some(1)), parent, owner]);

        match graph.walk() {
            Inspection::Exact { location, .. } => assert_eq!(location.file, "src/Card.tsx"),
            other => panic!("expected exact, got {other:?}"),
        }
    }

    #[test]
    fn strips_bracketed_file_names() {
        assert_eq!(normalize_file_name("<Foo>"), "Foo");
        assert_eq!(normalize_file_name("src/<Foo>.tsx"), "src/<Foo>.tsx");
        assert_eq!(normalize_file_name("<"), "<");
    }

    #[test]
    fn incomplete_source_is_ignored() {
        assert!(DebugSource {
            file_name: Some("a.tsx".into()),
            line_number: None,
            column_number: Some(2),
        }
        .location()
        .is_none());
        assert!(DebugSource {
            file_name: Some(String::new()),
            line_number: Some(4),
            column_number: None,
        }
        .location()
        .is_none());
    }

    #[test]
    fn name_only_without_sources() {
        let graph = InstanceGraph::new(
            0,
            vec![host(0, "div", Some(1), Some(1)), component(1, "Card", None, None)],
        );
        assert_eq!(
            graph.walk(),
            Inspection::NameOnly {
                component_name: "Card".into()
            }
        );
    }

    #[test]
    fn anonymous_owner_yields_nothing() {
        let graph = InstanceGraph::new(
            0,
            vec![host(0, "div", Some(1), None), component(1, "", None, None)],
        );
        assert_eq!(graph.walk(), Inspection::Nothing);

        let lone = InstanceGraph::new(0, vec![host(0, "div", None, None)]);
        assert_eq!(lone.walk(), Inspection::Nothing);
    }

    #[test]
    fn cycles_terminate() {
        let graph = InstanceGraph::new(
            0,
            vec![host(0, "div", Some(1), None), host(1, "span", Some(0), None)],
        );
        assert_eq!(graph.walk(), Inspection::Nothing);
    }

    #[test]
    fn truncated_snapshot_stops_walk() {
        let graph = InstanceGraph::new(0, vec![host(0, "div", Some(7), Some(1))]);
        assert_eq!(graph.walk(), Inspection::Nothing);
    }

    #[test]
    fn display_name_unwraps_wrappers() {
        let mut node = component(0, "", None, None);
        node.names.render_name = Some("FancyInput".into());
        assert_eq!(display_name(&node), "FancyInput");

        node.names = NameHints {
            type_render_name: Some("MemoForward".into()),
            ..Default::default()
        };
        assert_eq!(display_name(&node), "MemoForward");

        node.names = NameHints {
            display_name: Some("Styled(Button)".into()),
            type_name: Some("Inner".into()),
            ..Default::default()
        };
        assert_eq!(display_name(&node), "Styled(Button)");

        node.names = NameHints {
            lazy_name: Some("Settings".into()),
            ..Default::default()
        };
        assert_eq!(display_name(&node), "Settings");

        assert_eq!(display_name(&host(1, "section", None, None)), "section");
        assert_eq!(display_name(&component(2, "", None, None)), ANONYMOUS);
    }
}
