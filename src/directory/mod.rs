mod search;

pub use search::{LinkHit, resolve};

use crate::error::DirectoryError;
use regex::{Regex, RegexBuilder};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// The team catalog shipped with the binary. A `links.toml` in the data
/// directory takes precedence.
const BUILTIN_CATALOG: &str = include_str!("../../assets/links.toml");

// ── Raw (wire) form ──────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RawDirectory {
    #[serde(default)]
    sections: Vec<RawNode>,
}

#[derive(Debug, Deserialize)]
struct RawNode {
    name: String,
    #[serde(default)]
    key: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    patterns: Vec<String>,
    #[serde(default)]
    children: Vec<RawNode>,
}

// ── Compiled form ────────────────────────────────────────────────

/// Static catalog of documentation links. Loaded once at startup, read-only
/// afterwards; declaration order is preserved everywhere it is shown.
#[derive(Debug)]
pub struct Directory {
    pub roots: Vec<Node>,
}

#[derive(Debug)]
pub struct Node {
    /// Display name shown in menus and keyword replies
    pub name: String,
    /// Stable identifier used in menu callback data
    pub key: Option<String>,
    pub kind: NodeKind,
}

/// Classification happens once at load time. A raw node with children is a
/// container even if it also carries a url (the url is ignored); a node with
/// neither children nor url is a configuration error and is dropped.
#[derive(Debug)]
pub enum NodeKind {
    Leaf { url: String, patterns: Vec<Regex> },
    Container { children: Vec<Node> },
}

impl Node {
    pub fn is_container(&self) -> bool {
        matches!(self.kind, NodeKind::Container { .. })
    }
}

impl Directory {
    /// Load `links.toml` from the data directory if present, otherwise fall
    /// back to the built-in catalog.
    pub fn load(data_dir: &Path) -> Result<Self, DirectoryError> {
        let override_path = data_dir.join("links.toml");
        if override_path.exists() {
            let contents = fs::read_to_string(&override_path)
                .map_err(|e| DirectoryError::Parse(format!("{}: {e}", override_path.display())))?;
            tracing::info!("loading link directory from {}", override_path.display());
            Self::from_toml(&contents)
        } else {
            Self::builtin()
        }
    }

    pub fn builtin() -> Result<Self, DirectoryError> {
        Self::from_toml(BUILTIN_CATALOG)
    }

    pub fn from_toml(contents: &str) -> Result<Self, DirectoryError> {
        let raw: RawDirectory =
            toml::from_str(contents).map_err(|e| DirectoryError::Parse(e.to_string()))?;

        let roots: Vec<Node> = raw.sections.into_iter().filter_map(compile_node).collect();
        if roots.is_empty() {
            return Err(DirectoryError::Empty);
        }
        Ok(Self { roots })
    }

    /// Find a container node anywhere in the tree by its key.
    pub fn find_section(&self, key: &str) -> Option<&Node> {
        fn walk<'a>(nodes: &'a [Node], key: &str) -> Option<&'a Node> {
            for node in nodes {
                if node.is_container() && node.key.as_deref() == Some(key) {
                    return Some(node);
                }
                if let NodeKind::Container { children } = &node.kind {
                    if let Some(found) = walk(children, key) {
                        return Some(found);
                    }
                }
            }
            None
        }
        walk(&self.roots, key)
    }
}

fn compile_node(raw: RawNode) -> Option<Node> {
    if !raw.children.is_empty() {
        if raw.url.is_some() {
            tracing::debug!(name = %raw.name, "container node carries a url; it is ignored");
        }
        let children = raw.children.into_iter().filter_map(compile_node).collect();
        return Some(Node {
            name: raw.name,
            key: raw.key,
            kind: NodeKind::Container { children },
        });
    }

    let Some(url) = raw.url else {
        tracing::warn!(
            name = %raw.name,
            "directory node has neither children nor url; excluded from catalog"
        );
        return None;
    };

    let patterns = compile_patterns(&raw.name, &raw.patterns);
    Some(Node {
        name: raw.name,
        key: raw.key,
        kind: NodeKind::Leaf { url, patterns },
    })
}

fn compile_patterns(entry_name: &str, patterns: &[String]) -> Vec<Regex> {
    patterns
        .iter()
        .filter_map(|p| {
            match RegexBuilder::new(p).case_insensitive(true).build() {
                Ok(re) => Some(re),
                Err(e) => {
                    // A broken pattern never matches; the entry stays reachable
                    // through the menu.
                    tracing::warn!(entry = %entry_name, pattern = %p, "invalid pattern: {e}");
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_parses() {
        let dir = Directory::builtin().unwrap();
        assert!(!dir.roots.is_empty());
    }

    #[test]
    fn builtin_catalog_preserves_declaration_order() {
        let dir = Directory::builtin().unwrap();
        assert_eq!(dir.roots[0].name, "Доступы");
        assert_eq!(dir.roots[1].name, "Полезные ссылки");
    }

    #[test]
    fn leaf_without_children_classified_as_leaf() {
        let dir = Directory::from_toml(
            r#"
[[sections]]
name = "Entry"
key = "entry"
url = "https://example.com"
patterns = ['\bentry\b']
"#,
        )
        .unwrap();
        assert!(matches!(dir.roots[0].kind, NodeKind::Leaf { .. }));
    }

    #[test]
    fn container_with_own_url_stays_container() {
        let dir = Directory::from_toml(
            r#"
[[sections]]
name = "Section"
key = "section"
url = "https://ignored.example.com"

[[sections.children]]
name = "Child"
url = "https://example.com/child"
"#,
        )
        .unwrap();
        assert!(dir.roots[0].is_container());
    }

    #[test]
    fn node_without_url_or_children_is_dropped() {
        let dir = Directory::from_toml(
            r#"
[[sections]]
name = "Broken"
key = "broken"

[[sections]]
name = "Good"
url = "https://example.com"
"#,
        )
        .unwrap();
        assert_eq!(dir.roots.len(), 1);
        assert_eq!(dir.roots[0].name, "Good");
    }

    #[test]
    fn all_broken_nodes_yield_empty_error() {
        let err = Directory::from_toml(
            r#"
[[sections]]
name = "Broken"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, DirectoryError::Empty));
    }

    #[test]
    fn invalid_pattern_is_skipped_not_fatal() {
        let dir = Directory::from_toml(
            r#"
[[sections]]
name = "Entry"
url = "https://example.com"
patterns = ['[unclosed', '\bok\b']
"#,
        )
        .unwrap();
        match &dir.roots[0].kind {
            NodeKind::Leaf { patterns, .. } => assert_eq!(patterns.len(), 1),
            NodeKind::Container { .. } => panic!("expected leaf"),
        }
    }

    #[test]
    fn find_section_by_key() {
        let dir = Directory::builtin().unwrap();
        let section = dir.find_section("dostupy").unwrap();
        assert_eq!(section.name, "Доступы");
        assert!(dir.find_section("no_such_key").is_none());
    }

    #[test]
    fn find_section_nested() {
        let dir = Directory::from_toml(
            r#"
[[sections]]
name = "Top"
key = "top"

[[sections.children]]
name = "Mid"
key = "mid"

[[sections.children.children]]
name = "Leaf"
url = "https://example.com"
"#,
        )
        .unwrap();
        assert_eq!(dir.find_section("mid").unwrap().name, "Mid");
    }

    #[test]
    fn garbage_toml_is_parse_error() {
        let err = Directory::from_toml("not toml [[").unwrap_err();
        assert!(matches!(err, DirectoryError::Parse(_)));
    }
}
