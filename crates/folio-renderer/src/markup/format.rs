//! Whitespace pretty-printing for markup trees.

use super::tree::TreeNode;

/// Elements whose content is never re-indented.
const PRESERVE: &[&str] = &["pre", "code", "script", "style", "textarea"];

/// Elements laid out on their own lines.
const BLOCK: &[&str] = &[
    "address", "article", "aside", "blockquote", "caption", "col", "colgroup", "dd", "details",
    "div", "dl", "dt", "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3",
    "h4", "h5", "h6", "header", "hr", "li", "main", "nav", "ol", "p", "pre", "section",
    "summary", "table", "tbody", "td", "tfoot", "th", "thead", "tr", "ul",
];

/// Re-indent whitespace between block-level elements.
///
/// Only nodes whose children are all block elements separated by
/// whitespace-only text are touched, so rendered output is unchanged.
/// Each nesting level is indented by two spaces; the children of an
/// anonymous root start at column zero.
pub fn format_tree(root: &mut TreeNode) {
    if root.tag.is_empty() {
        if is_block_container(root) {
            root.text.clear();
            let last = root.children.len() - 1;
            for (index, child) in root.children.iter_mut().enumerate() {
                child.tail = if index == last { String::new() } else { "\n".to_owned() };
            }
        }
        for child in &mut root.children {
            format_node(child, 0);
        }
    } else {
        format_node(root, 0);
    }
}

fn format_node(node: &mut TreeNode, depth: usize) {
    if PRESERVE.contains(&node.tag.as_str()) {
        return;
    }

    if is_block_container(node) {
        let inner = indent(depth + 1);
        node.text.clone_from(&inner);
        let last = node.children.len() - 1;
        for (index, child) in node.children.iter_mut().enumerate() {
            child.tail = if index == last {
                indent(depth)
            } else {
                inner.clone()
            };
        }
    }

    for child in &mut node.children {
        format_node(child, depth + 1);
    }
}

fn is_block_container(node: &TreeNode) -> bool {
    !node.children.is_empty()
        && node.text.trim().is_empty()
        && node
            .children
            .iter()
            .all(|child| BLOCK.contains(&child.tag.as_str()) && child.tail.trim().is_empty())
}

fn indent(depth: usize) -> String {
    format!("\n{}", "  ".repeat(depth))
}
