//! Frontmatter extraction.
//!
//! The leading `---` block is parsed as YAML and merged into the page
//! config map; the block is then removed so later stages only see content.

use pulldown_cmark::{Event, Tag, TagEnd};
use serde_json::{Map, Value};

use crate::{ContentTree, RenderError};

/// Merge the tree's frontmatter into `config` and remove it from the tree.
///
/// Keys overwrite existing entries (last write wins). A tree without a
/// metadata block is left untouched. Empty frontmatter merges nothing.
pub fn extract_frontmatter(
    tree: &mut ContentTree<'_>,
    config: &mut Map<String, Value>,
) -> Result<(), RenderError> {
    let Some(start) = tree
        .events
        .iter()
        .position(|e| matches!(e, Event::Start(Tag::MetadataBlock(_))))
    else {
        return Ok(());
    };
    let end = tree.events[start..]
        .iter()
        .position(|e| matches!(e, Event::End(TagEnd::MetadataBlock(_))))
        .map_or(tree.events.len() - 1, |offset| start + offset);

    let yaml: String = tree.events[start..=end]
        .iter()
        .filter_map(|e| match e {
            Event::Text(text) => Some(text.as_ref()),
            _ => None,
        })
        .collect();

    merge_yaml(&yaml, config)?;
    tree.events.drain(start..=end);
    Ok(())
}

/// Parse `yaml` and merge its top-level keys into `config`.
pub fn merge_yaml(yaml: &str, config: &mut Map<String, Value>) -> Result<(), RenderError> {
    let parsed: serde_yaml::Value =
        serde_yaml::from_str(yaml).map_err(|e| RenderError::Frontmatter(e.to_string()))?;

    match serde_json::to_value(parsed).map_err(|e| RenderError::Frontmatter(e.to_string()))? {
        Value::Null => Ok(()),
        Value::Object(map) => {
            config.extend(map);
            Ok(())
        }
        other => Err(RenderError::Frontmatter(format!(
            "expected a mapping, found {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}

/// Split a leading `---` delimited block off raw markdown.
///
/// Returns the block including both delimiter lines (without the final
/// newline) and the remaining body.
pub fn split_frontmatter(text: &str) -> Option<(&str, &str)> {
    let rest = text
        .strip_prefix("---\n")
        .or_else(|| text.strip_prefix("---\r\n"))?;
    let opening = text.len() - rest.len();

    let mut offset = opening;
    for line in rest.split_inclusive('\n') {
        let content = line.trim_end_matches(['\n', '\r']);
        if content == "---" || content == "..." {
            let block_end = offset + content.len();
            let body_start = offset + line.len();
            return Some((&text[..block_end], &text[body_start..]));
        }
        offset += line.len();
    }
    None
}
