//! HTML serializer for markup trees.

use std::fmt::Write;

use super::parser::is_void;
use super::tree::TreeNode;

/// Elements whose text is written without escaping.
const RAW_TEXT: &[&str] = &["script", "style", "xmp", "iframe", "noembed", "noframes", "plaintext"];

/// Serialize a node, its descendants and its tail.
///
/// An anonymous root (empty tag) serializes as its text and children only.
#[must_use]
pub fn serialize(node: &TreeNode) -> String {
    let mut out = String::with_capacity(4096);
    if node.tag.is_empty() {
        out.push_str(&escape_text(&node.text));
        for child in &node.children {
            serialize_node(child, &mut out);
        }
    } else {
        serialize_node(node, &mut out);
    }
    out
}

/// Serialize the content of a node: its text and children, without the
/// node's own tags and tail.
#[must_use]
pub fn serialize_children(node: &TreeNode) -> String {
    let mut out = String::with_capacity(4096);
    out.push_str(&escape_text(&node.text));
    for child in &node.children {
        serialize_node(child, &mut out);
    }
    out
}

fn serialize_node(node: &TreeNode, out: &mut String) {
    out.push('<');
    out.push_str(&node.tag);
    for (key, value) in &node.attrs {
        write!(out, r#" {}="{}""#, key, escape_attr(value)).unwrap();
    }
    out.push('>');

    if RAW_TEXT.contains(&node.tag.as_str()) {
        out.push_str(&node.text);
        write!(out, "</{}>", node.tag).unwrap();
    } else if !is_void(&node.tag) {
        out.push_str(&escape_text(&node.text));
        for child in &node.children {
            serialize_node(child, out);
        }
        write!(out, "</{}>", node.tag).unwrap();
    }

    out.push_str(&escape_text(&node.tail));
}

/// Escape text content.
#[must_use]
pub fn escape_text(text: &str) -> String {
    escape(text, false)
}

/// Escape a double-quoted attribute value.
#[must_use]
pub fn escape_attr(text: &str) -> String {
    escape(text, true)
}

fn escape(text: &str, escape_quotes: bool) -> String {
    let mut result = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' if escape_quotes => result.push_str("&quot;"),
            _ => result.push(ch),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::markup::parse_fragment;

    #[test]
    fn test_serialize_element() {
        let node = TreeNode::new("p")
            .with_attr("class", "lead")
            .with_text("a < b & c")
            .with_tail("\n");
        assert_eq!(serialize(&node), "<p class=\"lead\">a &lt; b &amp; c</p>\n");
    }

    #[test]
    fn test_void_and_empty_elements() {
        let node = TreeNode::new("div").with_children(vec![
            TreeNode::new("br"),
            TreeNode::new("img").with_attr("alt", "say \"hi\""),
            TreeNode::new("span"),
        ]);
        assert_eq!(
            serialize(&node),
            r#"<div><br><img alt="say &quot;hi&quot;"><span></span></div>"#
        );
    }

    #[test]
    fn test_anonymous_root() {
        let root = parse_fragment("intro<p>x</p>outro");
        assert_eq!(serialize(&root), "intro<p>x</p>outro");
    }

    #[test]
    fn test_serialize_children() {
        let root = parse_fragment(r#"<ul class="x"><li>a</li><li>b</li></ul>"#);
        assert_eq!(serialize_children(&root.children[0]), "<li>a</li><li>b</li>");
    }

    #[test]
    fn test_parse_serialize_is_stable() {
        let html = r#"<h2 id="a-b">A &amp; B</h2><p>x<code>&lt;T&gt;</code></p><ul><li><input type="checkbox" disabled=""> done</li></ul>"#;
        let first = serialize(&parse_fragment(html));
        let second = serialize(&parse_fragment(&first));
        assert_eq!(first, html);
        assert_eq!(second, first);
    }

    #[test]
    fn test_raw_text_written_verbatim() {
        let html = "<p>1 &lt; 2</p><script>if (a < b && c > d) { go(\"&amp;\"); }</script><style>a > b::after { content: \"&\"; }</style>";
        let first = serialize(&parse_fragment(html));
        assert_eq!(first, html);
        assert_eq!(serialize(&parse_fragment(&first)), first);
    }
}
