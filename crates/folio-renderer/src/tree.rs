//! Content tree: the parsed event sequence of one document.

use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd};

/// Parser extensions used for every document.
///
/// GitHub-flavored syntax (tables, strikethrough, task lists, footnotes)
/// is resolved at parse time, and a leading `---` block becomes a
/// metadata block.
fn parse_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_YAML_STYLE_METADATA_BLOCKS
}

/// Intermediate representation of a document between parsing and rendering.
///
/// Pipeline stages mutate the event sequence in place. Each stage leaves
/// the tree well formed: every `Start` has its matching `End`.
#[derive(Debug, Clone)]
pub struct ContentTree<'a> {
    pub(crate) events: Vec<Event<'a>>,
}

/// Location and text of one heading in a [`ContentTree`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    /// Index of the `Start(Heading)` event.
    pub start: usize,
    /// Index of the matching `End(Heading)` event.
    pub end: usize,
    /// Heading level, 1 to 6.
    pub level: u8,
    /// Plain text content (text and inline code).
    pub text: String,
}

impl<'a> ContentTree<'a> {
    /// Parse markdown into a content tree.
    #[must_use]
    pub fn parse(text: &'a str) -> Self {
        Self {
            events: Parser::new_ext(text, parse_options()).collect(),
        }
    }

    /// Events in document order.
    #[must_use]
    pub fn events(&self) -> &[Event<'a>] {
        &self.events
    }

    /// Consume the tree, returning its events.
    #[must_use]
    pub fn into_events(self) -> Vec<Event<'a>> {
        self.events
    }

    /// All headings in document order.
    #[must_use]
    pub fn headings(&self) -> Vec<Heading> {
        let mut headings = Vec::new();
        let mut current: Option<Heading> = None;

        for (index, event) in self.events.iter().enumerate() {
            match event {
                Event::Start(Tag::Heading { level, .. }) => {
                    current = Some(Heading {
                        start: index,
                        end: index,
                        level: heading_level_to_num(*level),
                        text: String::new(),
                    });
                }
                Event::Text(text) | Event::Code(text) => {
                    if let Some(heading) = current.as_mut() {
                        heading.text.push_str(text);
                    }
                }
                Event::End(TagEnd::Heading(_)) => {
                    if let Some(mut heading) = current.take() {
                        heading.end = index;
                        headings.push(heading);
                    }
                }
                _ => {}
            }
        }

        headings
    }
}

/// Convert a pulldown-cmark heading level to its number.
pub(crate) fn heading_level_to_num(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use pulldown_cmark::MetadataBlockKind;

    use super::*;

    #[test]
    fn test_headings_collects_text_and_code() {
        let tree = ContentTree::parse("# Using `load:`\n\ntext\n\n## Next\n");
        let headings = tree.headings();

        assert_eq!(headings.len(), 2);
        assert_eq!(headings[0].level, 1);
        assert_eq!(headings[0].text, "Using load:");
        assert_eq!(headings[1].level, 2);
        assert_eq!(headings[1].text, "Next");
        assert!(matches!(
            tree.events()[headings[1].end],
            Event::End(TagEnd::Heading(HeadingLevel::H2))
        ));
    }

    #[test]
    fn test_metadata_block_is_detected() {
        let tree = ContentTree::parse("---\ntitle: Foo\n---\n# Foo\n");
        assert!(matches!(
            tree.events()[0],
            Event::Start(Tag::MetadataBlock(MetadataBlockKind::YamlStyle))
        ));
    }

    #[test]
    fn test_tables_enabled() {
        let tree = ContentTree::parse("| a | b |\n|---|---|\n| 1 | 2 |\n");
        assert!(matches!(tree.events()[0], Event::Start(Tag::Table(_))));
    }
}
