use super::{Directory, Node, NodeKind};

/// A resolved candidate: the entry's display name and destination url.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkHit {
    pub name: String,
    pub url: String,
}

/// Find every directory entry whose pattern set matches the keyword.
///
/// The keyword is trimmed and lowercased first; an empty keyword matches
/// nothing. Matching is a case-insensitive regex *search* (substring), and
/// results follow the catalog's declaration order. Pure function of
/// `(directory, keyword)` — safe to call concurrently from any number of
/// chats.
pub fn resolve(directory: &Directory, keyword: &str) -> Vec<LinkHit> {
    let keyword = keyword.trim().to_lowercase();
    if keyword.is_empty() {
        return Vec::new();
    }

    let mut hits = Vec::new();
    walk(&directory.roots, &keyword, &mut hits);

    if hits.is_empty() {
        tracing::debug!(%keyword, "no directory matches");
    }
    hits
}

fn walk(nodes: &[Node], keyword: &str, hits: &mut Vec<LinkHit>) {
    for node in nodes {
        match &node.kind {
            // A container's own url (if the raw config had one) is never
            // matchable; only its children are visited.
            NodeKind::Container { children } => walk(children, keyword, hits),
            NodeKind::Leaf { url, patterns } => {
                if patterns.iter().any(|re| re.is_match(keyword)) {
                    tracing::debug!(entry = %node.name, %url, "keyword match");
                    hits.push(LinkHit {
                        name: node.name.clone(),
                        url: url.clone(),
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Directory {
        Directory::builtin().unwrap()
    }

    #[test]
    fn mobile_iron_matches_ivanti_entry() {
        let hits = resolve(&catalog(), "mobile iron");
        assert_eq!(
            hits,
            vec![LinkHit {
                name: "Доступ на препрод (Ivanti Mobile)".into(),
                url: "https://sfera.inno.local/knowledge/pages?id=851177".into(),
            }]
        );
    }

    #[test]
    fn keyword_is_case_insensitive() {
        let upper = resolve(&catalog(), "CHARLES");
        let lower = resolve(&catalog(), "charles");
        assert_eq!(upper, lower);
        assert_eq!(upper.len(), 1);
        assert_eq!(upper[0].name, "Настройка Charles");
    }

    #[test]
    fn cyrillic_keyword_matches() {
        let hits = resolve(&catalog(), "чарльз");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Настройка Charles");
    }

    #[test]
    fn whitespace_is_trimmed() {
        assert_eq!(resolve(&catalog(), "  чарльз  "), resolve(&catalog(), "чарльз"));
    }

    #[test]
    fn empty_keyword_matches_nothing() {
        assert!(resolve(&catalog(), "").is_empty());
        assert!(resolve(&catalog(), "   ").is_empty());
    }

    #[test]
    fn unknown_keyword_matches_nothing() {
        assert!(resolve(&catalog(), "qwertyuiop").is_empty());
    }

    #[test]
    fn resolve_is_pure_across_calls() {
        let dir = catalog();
        let first = resolve(&dir, "препрод");
        let _ = resolve(&dir, "матрица");
        let second = resolve(&dir, "препрод");
        assert_eq!(first, second);
    }

    #[test]
    fn multiple_matches_follow_declaration_order() {
        let dir = Directory::from_toml(
            r#"
[[sections]]
name = "First"
url = "https://example.com/1"
patterns = ['shared']

[[sections]]
name = "Second"
url = "https://example.com/2"
patterns = ['shared']
"#,
        )
        .unwrap();
        let hits = resolve(&dir, "shared keyword");
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].name, "First");
        assert_eq!(hits[1].name, "Second");
    }

    #[test]
    fn each_entry_appears_at_most_once() {
        // Two patterns of the same entry both match; the entry is still
        // reported once.
        let dir = Directory::from_toml(
            r#"
[[sections]]
name = "Entry"
url = "https://example.com"
patterns = ['fo.', 'foo']
"#,
        )
        .unwrap();
        assert_eq!(resolve(&dir, "foo").len(), 1);
    }

    #[test]
    fn container_url_never_matches() {
        let dir = Directory::from_toml(
            r#"
[[sections]]
name = "Section"
key = "section"
url = "https://container.example.com"
patterns = ['section']

[[sections.children]]
name = "Child"
url = "https://example.com/child"
patterns = ['child']
"#,
        )
        .unwrap();
        // "section" would match the container's own patterns, but containers
        // are recursed into, never matched.
        assert!(resolve(&dir, "section").is_empty());
        assert_eq!(resolve(&dir, "child").len(), 1);
    }

    #[test]
    fn leaf_without_patterns_is_inert_for_search() {
        let hits = resolve(&catalog(), "Шаблоны ТК");
        assert!(hits.is_empty());
    }

    #[test]
    fn match_is_substring_search_not_full_match() {
        let hits = resolve(&catalog(), "как настроить charles для ios");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Настройка Charles");
    }

    #[test]
    fn deeply_nested_leaves_are_reachable() {
        let dir = Directory::from_toml(
            r#"
[[sections]]
name = "A"
key = "a"

[[sections.children]]
name = "B"
key = "b"

[[sections.children.children]]
name = "C"
url = "https://example.com/c"
patterns = ['needle']
"#,
        )
        .unwrap();
        let hits = resolve(&dir, "needle");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "C");
    }
}
