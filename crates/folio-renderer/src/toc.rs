//! Heading anchors and the "on this page" outline.
//!
//! Three stages, run in this order:
//!
//! 1. [`insert_toc_heading`] prepends a level-6 `toc` marker heading.
//! 2. [`build_outline`] inserts a nested link list right after the marker.
//! 3. [`assign_anchor_ids`] gives every heading its id.
//!
//! The outline and the ids are both computed from the full heading
//! sequence with a fresh [`Slugger`], so outline links always match the
//! ids assigned afterwards. The marker itself always gets the id `toc`.

use pulldown_cmark::{CowStr, Event, HeadingLevel, LinkType, Tag, TagEnd};

use crate::slug::Slugger;
use crate::tree::Heading;
use crate::ContentTree;

/// Text (and therefore id) of the synthetic outline marker heading.
pub const TOC_MARKER: &str = "toc";

/// Insert the synthetic marker heading as the first node of the tree.
///
/// Must run after frontmatter extraction so the marker ends up first.
pub fn insert_toc_heading(tree: &mut ContentTree<'_>) {
    let marker = [
        Event::Start(Tag::Heading {
            level: HeadingLevel::H6,
            id: None,
            classes: Vec::new(),
            attrs: Vec::new(),
        }),
        Event::Text(CowStr::Borrowed(TOC_MARKER)),
        Event::End(TagEnd::Heading(HeadingLevel::H6)),
    ];
    tree.events.splice(0..0, marker);
}

/// Insert the outline list after the marker heading.
///
/// Lists every heading up to `max_depth` in document order, nested by
/// level. The marker and the first level-1 heading (the page title) are
/// left out. When no heading qualifies the list is still inserted, empty,
/// so whatever follows the marker is never mistaken for the outline.
/// Nothing is inserted when the tree has no marker.
pub fn build_outline(tree: &mut ContentTree<'_>, max_depth: u8) {
    let headings = tree.headings();
    let Some(marker) = headings.first().filter(|h| is_marker(h)) else {
        tracing::debug!("No toc marker heading, skipping outline");
        return;
    };

    let ids = heading_ids(&headings);
    let title = headings.iter().position(|h| h.level == 1);

    let entries: Vec<OutlineEntry<'_, '_>> = headings
        .iter()
        .zip(&ids)
        .enumerate()
        .skip(1)
        .filter(|(index, (heading, _))| Some(*index) != title && heading.level <= max_depth)
        .map(|(_, (heading, id))| OutlineEntry {
            level: heading.level,
            id,
            content: &tree.events[heading.start + 1..heading.end],
        })
        .collect();

    let list = if entries.is_empty() {
        tracing::debug!("No headings for the outline, inserting an empty list");
        vec![Event::Start(Tag::List(None)), Event::End(TagEnd::List(false))]
    } else {
        outline_events(&entries)
    };
    let at = marker.end + 1;
    tree.events.splice(at..at, list);
}

/// Set the id of every heading in the tree.
pub fn assign_anchor_ids(tree: &mut ContentTree<'_>) {
    let headings = tree.headings();
    let ids = heading_ids(&headings);

    for (heading, slug) in headings.iter().zip(ids) {
        if let Event::Start(Tag::Heading { id, .. }) = &mut tree.events[heading.start] {
            *id = Some(CowStr::from(slug));
        }
    }
}

fn is_marker(heading: &Heading) -> bool {
    heading.start == 0 && heading.level == 6 && heading.text == TOC_MARKER
}

/// Unique ids for `headings`, in order.
fn heading_ids(headings: &[Heading]) -> Vec<String> {
    let mut slugger = Slugger::new();
    headings.iter().map(|h| slugger.slug(&h.text)).collect()
}

struct OutlineEntry<'e, 'a> {
    level: u8,
    id: &'e str,
    /// Inline events of the heading.
    content: &'e [Event<'a>],
}

/// Build a loose bulleted list of links, nested by heading level.
fn outline_events<'a>(entries: &[OutlineEntry<'_, 'a>]) -> Vec<Event<'a>> {
    let mut events = Vec::new();
    let mut levels: Vec<u8> = Vec::new();

    for entry in entries {
        while levels.len() > 1 && levels.last().is_some_and(|&top| entry.level < top) {
            events.push(Event::End(TagEnd::Item));
            events.push(Event::End(TagEnd::List(false)));
            levels.pop();
        }

        match levels.last() {
            Some(&top) if entry.level <= top => events.push(Event::End(TagEnd::Item)),
            _ => {
                events.push(Event::Start(Tag::List(None)));
                levels.push(entry.level);
            }
        }

        events.push(Event::Start(Tag::Item));
        events.push(Event::Start(Tag::Paragraph));
        events.push(Event::Start(Tag::Link {
            link_type: LinkType::Inline,
            dest_url: CowStr::from(format!("#{}", entry.id)),
            title: CowStr::Borrowed(""),
            id: CowStr::Borrowed(""),
        }));
        events.extend(entry.content.iter().filter(|e| is_link_text(e)).cloned());
        events.push(Event::End(TagEnd::Link));
        events.push(Event::End(TagEnd::Paragraph));
    }

    for _ in &levels {
        events.push(Event::End(TagEnd::Item));
        events.push(Event::End(TagEnd::List(false)));
    }

    events
}

/// Inline events that may appear inside an outline link.
fn is_link_text(event: &Event<'_>) -> bool {
    match event {
        Event::Text(_) | Event::Code(_) | Event::SoftBreak => true,
        Event::Start(tag) => matches!(
            tag,
            Tag::Emphasis | Tag::Strong | Tag::Strikethrough | Tag::Superscript | Tag::Subscript
        ),
        Event::End(tag) => matches!(
            tag,
            TagEnd::Emphasis
                | TagEnd::Strong
                | TagEnd::Strikethrough
                | TagEnd::Superscript
                | TagEnd::Subscript
        ),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn prepare(markdown: &str, max_depth: u8) -> ContentTree<'_> {
        let mut tree = ContentTree::parse(markdown);
        insert_toc_heading(&mut tree);
        build_outline(&mut tree, max_depth);
        assign_anchor_ids(&mut tree);
        tree
    }

    fn heading_ids_of(tree: &ContentTree<'_>) -> Vec<String> {
        tree.events()
            .iter()
            .filter_map(|e| match e {
                Event::Start(Tag::Heading { id: Some(id), .. }) => Some(id.to_string()),
                _ => None,
            })
            .collect()
    }

    fn outline_links(tree: &ContentTree<'_>) -> Vec<String> {
        tree.events()
            .iter()
            .filter_map(|e| match e {
                Event::Start(Tag::Link { dest_url, .. }) => Some(dest_url.to_string()),
                _ => None,
            })
            .collect()
    }

    /// Nesting depth of each outline item, in order.
    fn item_depths(tree: &ContentTree<'_>) -> Vec<usize> {
        let mut depth = 0;
        let mut depths = Vec::new();
        for event in tree.events() {
            match event {
                Event::Start(Tag::List(_)) => depth += 1,
                Event::End(TagEnd::List(_)) => depth -= 1,
                Event::Start(Tag::Item) => depths.push(depth),
                _ => {}
            }
        }
        depths
    }

    #[test]
    fn test_marker_is_first() {
        let mut tree = ContentTree::parse("# Title\n");
        insert_toc_heading(&mut tree);

        let headings = tree.headings();
        assert_eq!(headings[0].level, 6);
        assert_eq!(headings[0].text, "toc");
        assert_eq!(headings[0].start, 0);
        assert_eq!(headings[1].text, "Title");
    }

    #[test]
    fn test_ids_unique_for_identical_text() {
        let tree = prepare("## Setup\n\n## Setup\n\n### Setup\n", 2);
        assert_eq!(heading_ids_of(&tree), ["toc", "setup", "setup-1", "setup-2"]);
    }

    #[test]
    fn test_user_heading_named_toc() {
        let tree = prepare("# Title\n\n## TOC\n", 2);
        assert_eq!(heading_ids_of(&tree), ["toc", "title", "toc-1"]);
        assert_eq!(outline_links(&tree), ["#toc-1"]);
    }

    #[test]
    fn test_depth_bound() {
        let tree = prepare("# Title\n\n# One\n\n## Two\n\n### Three\n\n#### Four\n", 2);
        assert_eq!(outline_links(&tree), ["#one", "#two"]);
    }

    #[test]
    fn test_title_excluded_and_links_match_ids() {
        let tree = prepare("# Foo\n\n## A\n\n## B\n", 2);

        assert_eq!(outline_links(&tree), ["#a", "#b"]);
        assert_eq!(item_depths(&tree), [1, 1]);
        assert_eq!(heading_ids_of(&tree), ["toc", "foo", "a", "b"]);
    }

    #[test]
    fn test_outline_follows_marker() {
        let tree = prepare("# Foo\n\n## A\n", 2);
        assert!(matches!(
            tree.events()[3],
            Event::Start(Tag::List(None))
        ));
    }

    #[test]
    fn test_nesting_mirrors_levels() {
        let tree = prepare("# T\n\n## A\n\n### A1\n\n### A2\n\n## B\n", 3);
        assert_eq!(outline_links(&tree), ["#a", "#a1", "#a2", "#b"]);
        assert_eq!(item_depths(&tree), [1, 2, 2, 1]);
    }

    #[test]
    fn test_level_jump_back_nests_under_open_item() {
        let tree = prepare("# T\n\n# A\n\n### Deep\n\n## Mid\n", 3);
        assert_eq!(item_depths(&tree), [1, 2, 2]);
    }

    #[test]
    fn test_empty_outline() {
        let tree = prepare("# Only Title\n\nBody text.\n", 2);
        assert!(outline_links(&tree).is_empty());
        assert!(item_depths(&tree).is_empty());
        assert!(matches!(tree.events()[3], Event::Start(Tag::List(None))));
        assert!(matches!(tree.events()[4], Event::End(TagEnd::List(false))));
    }

    #[test]
    fn test_empty_outline_precedes_leading_user_list() {
        let tree = prepare("- mine\n- also mine\n", 2);
        assert!(matches!(tree.events()[3], Event::Start(Tag::List(None))));
        assert!(matches!(tree.events()[4], Event::End(TagEnd::List(false))));
        assert_eq!(item_depths(&tree), [1, 1]);
    }

    #[test]
    fn test_outline_keeps_inline_code() {
        let tree = prepare("# T\n\n## Use `load:`\n", 2);
        let code = tree
            .events()
            .iter()
            .any(|e| matches!(e, Event::Code(c) if c.as_ref() == "load:"));
        assert!(code);
        assert_eq!(outline_links(&tree), ["#use-load"]);
    }

    #[test]
    fn test_outline_strips_nested_links() {
        let tree = prepare("# T\n\n## See [docs](https://example.com)\n", 2);
        assert_eq!(
            outline_links(&tree),
            ["#see-docs", "https://example.com"]
        );
    }
}
