//! Helpers shared by the language detectors

use tree_sitter::Node;

/// Source text of a node, empty on invalid UTF-8
pub fn get_node_text(node: &Node, source: &str) -> String {
    node.utf8_text(source.as_bytes()).unwrap_or("").to_string()
}

/// Borrowed source text of a node
pub fn node_str<'a>(node: &Node, source: &'a str) -> &'a str {
    source.get(node.byte_range()).unwrap_or("")
}

/// 1-indexed first and last line of a node
pub fn line_span(node: &Node) -> (usize, usize) {
    (node.start_position().row + 1, node.end_position().row + 1)
}

/// Number of lines a node spans
pub fn line_count(node: &Node) -> usize {
    node.end_position().row - node.start_position().row + 1
}

/// First direct child of the given kind
pub fn child_of_kind<'t>(node: &Node<'t>, kind: &str) -> Option<Node<'t>> {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).find(|c| c.kind() == kind);
    found
}

/// Last segment of a dotted name: `org.junit.Test` -> `Test`
pub fn last_segment(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

/// Visit every descendant of `node` depth-first (excluding `node` itself)
///
/// The callback returns false to skip a node's subtree.
pub fn walk_descendants<'t, F>(node: &Node<'t>, visit: &mut F)
where
    F: FnMut(&Node<'t>) -> bool,
{
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if visit(&child) {
            walk_descendants(&child, visit);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_segment() {
        assert_eq!(last_segment("org.junit.Test"), "Test");
        assert_eq!(last_segment("Service"), "Service");
    }
}
