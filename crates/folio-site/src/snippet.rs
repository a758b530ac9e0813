//! Code snippet processing.
//!
//! Every `<pre>` holding a `<code>` is turned into a numbered list of
//! lines:
//!
//! ```text
//! <pre class="snippet numbered"><ol class="snippet"><li value="1">...</li></ol></pre>
//! ```
//!
//! The code element's composite class (`language-js_unnumbered`) says how
//! to highlight and number it. The first lines of the content may hold
//! `load:` and `range:` directives that pull the content from elsewhere
//! and slice it.

use folio_fetch::{Fetch, FetchError};
use folio_renderer::markup::{TreeNode, parse_fragment};
use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::{IncludeBackground, styled_line_to_highlighted_html};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

/// Error processing a snippet.
#[derive(Debug, thiserror::Error)]
pub enum SnippetError {
    /// The `load:` target could not be fetched.
    #[error(transparent)]
    Fetch(#[from] FetchError),
    /// Syntax highlighting failed mid-way.
    #[error("failed to highlight {language} snippet: {source}")]
    Highlight {
        language: String,
        #[source]
        source: syntect::Error,
    },
}

/// Inclusive, 1-indexed line range. `end: None` runs to the last line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRange {
    pub start: usize,
    pub end: Option<usize>,
}

impl LineRange {
    /// Parse `n` or `n-m`. Zero, inverted and malformed ranges are `None`.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let (start, end) = match text.split_once('-') {
            Some((start, end)) => (start, Some(end)),
            None => (text, None),
        };
        let start: usize = start.parse().ok().filter(|&n| n > 0)?;
        let end = match end {
            Some(end) => Some(end.parse::<usize>().ok().filter(|&n| n >= start)?),
            None => None,
        };
        Some(Self { start, end })
    }

    /// Whether the 1-indexed `line` falls inside the range.
    #[must_use]
    pub fn contains(&self, line: usize) -> bool {
        line >= self.start && self.end.is_none_or(|end| line <= end)
    }
}

/// How one snippet is rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnippetSpec {
    pub numbered: bool,
    /// Highlight language; `None` leaves the text plain.
    pub language: Option<String>,
    /// Where to load the content from, replacing the inline text.
    pub url: Option<String>,
    pub range: Option<LineRange>,
}

impl Default for SnippetSpec {
    fn default() -> Self {
        Self {
            numbered: true,
            language: None,
            url: None,
            range: None,
        }
    }
}

impl SnippetSpec {
    /// Decode numbering and language from a code element's classes.
    ///
    /// Only a code element with exactly one class, starting with
    /// `language`, is decoded. Tokens `unnumbered` and `nonum` turn numbering
    /// off; any other token is the language, and the last one wins.
    #[must_use]
    pub fn from_code(code: &TreeNode) -> Self {
        let mut spec = Self::default();
        let classes: Vec<&str> = code.classes().collect();
        let [class] = classes.as_slice() else {
            return spec;
        };
        let Some(tag) = class.strip_prefix("language") else {
            return spec;
        };
        let tag = tag.strip_prefix('-').unwrap_or(tag);

        for token in tag.split('_').filter(|t| !t.is_empty()) {
            match token {
                "unnumbered" | "nonum" => spec.numbered = false,
                language => {
                    if let Some(previous) = spec.language.replace(language.to_owned()) {
                        tracing::debug!(previous = %previous, language, "Snippet language replaced");
                    }
                }
            }
        }
        spec
    }

    /// Read `load:` and `range:` directives from the first content lines.
    ///
    /// `range:` is only honored right after a `load:` line. Relative load
    /// targets are resolved against `repo_base`.
    pub fn read_directives(&mut self, content: &str, repo_base: &str) {
        let mut lines = content.trim_end().lines().map(strip_whitespace);
        let Some(target) = lines.next().and_then(|l| l.strip_prefix("load:").map(str::to_owned))
        else {
            return;
        };

        self.url = Some(if has_scheme(&target) {
            target
        } else {
            format!("{repo_base}{target}")
        });

        if let Some(range) = lines.next().and_then(|l| l.strip_prefix("range:").map(str::to_owned)) {
            self.range = LineRange::parse(&range);
            if self.range.is_none() {
                tracing::debug!(range = %range, "Ignoring malformed snippet range");
            }
        }
    }
}

fn strip_whitespace(line: &str) -> String {
    line.chars().filter(|c| !c.is_whitespace()).collect()
}

fn has_scheme(target: &str) -> bool {
    target.split_once("://").is_some_and(|(scheme, _)| {
        !scheme.is_empty()
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    })
}

/// Syntax highlighter producing inline-styled HTML, one fragment per line.
pub struct Highlighter {
    syntaxes: SyntaxSet,
    theme: Theme,
}

impl Highlighter {
    /// Highlighter with the bundled syntaxes and the named bundled theme.
    ///
    /// Returns `None` when no bundled theme has that name.
    #[must_use]
    pub fn new(theme_name: &str) -> Option<Self> {
        let mut themes = ThemeSet::load_defaults();
        let theme = themes.themes.remove(theme_name)?;
        Some(Self {
            syntaxes: SyntaxSet::load_defaults_newlines(),
            theme,
        })
    }

    /// Names of the bundled themes.
    #[must_use]
    pub fn theme_names() -> Vec<String> {
        ThemeSet::load_defaults().themes.into_keys().collect()
    }

    /// Highlight `code` line by line.
    ///
    /// Returns `Ok(None)` when `language` is not known.
    pub fn highlight(&self, code: &str, language: &str) -> Result<Option<Vec<String>>, syntect::Error> {
        let Some(syntax) = self.syntaxes.find_syntax_by_token(language) else {
            return Ok(None);
        };

        let mut highlighter = HighlightLines::new(syntax, &self.theme);
        let mut lines = Vec::new();
        for line in LinesWithEndings::from(code) {
            let regions = highlighter.highlight_line(line, &self.syntaxes)?;
            let regions: Vec<_> = regions
                .into_iter()
                .map(|(style, text)| (style, text.trim_end_matches(['\n', '\r'])))
                .collect();
            lines.push(styled_line_to_highlighted_html(&regions, IncludeBackground::No)?);
        }
        if lines.is_empty() {
            lines.push(String::new());
        }
        Ok(Some(lines))
    }
}

/// Rewrites the code blocks of one page.
pub struct SnippetProcessor<'a> {
    pub repo_base: &'a str,
    pub fetcher: &'a dyn Fetch,
    pub highlighter: &'a Highlighter,
}

impl SnippetProcessor<'_> {
    /// Process every `pre` with a `code` descendant, in document order.
    ///
    /// # Errors
    ///
    /// Fails when a `load:` target cannot be fetched or highlighting fails.
    pub fn process(&self, root: &mut TreeNode) -> Result<(), SnippetError> {
        let paths = root.find_all_paths(&|node: &TreeNode| {
            node.tag == "pre" && node.find_tag("code").is_some()
        });

        // Last first: a rewrite only touches its own subtree, so the paths
        // still to visit (earlier siblings and ancestors) stay valid.
        for path in paths.into_iter().rev() {
            if let Some(pre) = root.node_at_mut(&path) {
                self.process_pre(pre)?;
            }
        }
        Ok(())
    }

    fn process_pre(&self, pre: &mut TreeNode) -> Result<(), SnippetError> {
        let Some(code_path) = pre.find_path(&|node: &TreeNode| node.tag == "code") else {
            return Ok(());
        };
        let Some(code) = pre.node_at(&code_path) else {
            return Ok(());
        };

        let mut spec = SnippetSpec::from_code(code);
        let mut content = code.text_content();
        spec.read_directives(&content, self.repo_base);

        if let Some(url) = &spec.url {
            content = self.fetcher.fetch(url)?;
        }
        let content = content.trim_end();

        let lines = self.render_lines(content, &spec)?;
        let list = snippet_list(lines, spec.range);

        pre.remove_at(&code_path);
        pre.children.push(list);
        pre.add_class("snippet");
        pre.add_class(if spec.numbered { "numbered" } else { "unnumbered" });
        Ok(())
    }

    fn render_lines(&self, content: &str, spec: &SnippetSpec) -> Result<Vec<Line>, SnippetError> {
        if let Some(language) = &spec.language {
            match self.highlighter.highlight(content, language) {
                Ok(Some(lines)) => return Ok(lines.into_iter().map(Line::Html).collect()),
                Ok(None) => {
                    tracing::warn!(language = %language, "Unknown snippet language, leaving it plain");
                }
                Err(source) => {
                    return Err(SnippetError::Highlight {
                        language: language.clone(),
                        source,
                    });
                }
            }
        }
        Ok(content
            .split('\n')
            .map(|line| Line::Text(line.trim_end_matches('\r').to_owned()))
            .collect())
    }
}

enum Line {
    Text(String),
    Html(String),
}

/// `<ol class="snippet">` with one `<li value="N">` per line in range.
fn snippet_list(lines: Vec<Line>, range: Option<LineRange>) -> TreeNode {
    let mut list = TreeNode::new("ol").with_attr("class", "snippet");
    for (index, line) in lines.into_iter().enumerate() {
        let number = index + 1;
        if range.is_some_and(|range| !range.contains(number)) {
            continue;
        }
        let item = TreeNode::new("li").with_attr("value", number.to_string());
        list.children.push(match line {
            Line::Text(text) => item.with_text(text),
            Line::Html(html) => html_item(item, &html),
        });
    }
    list
}

fn html_item(item: TreeNode, html: &str) -> TreeNode {
    let fragment = parse_fragment(html);
    item.with_text(fragment.text).with_children(fragment.children)
}
