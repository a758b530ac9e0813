//! State structs tracked while rendering events.

use std::collections::HashMap;

use pulldown_cmark::Alignment;

/// Fenced or indented code block being collected.
#[derive(Default)]
pub struct CodeBlockState {
    active: bool,
    /// Composite tag of the current block (e.g. `js_unnumbered`).
    tag: Option<String>,
    /// Raw text, escaped when the block closes.
    buffer: String,
}

impl CodeBlockState {
    /// Open a block. `tag` becomes its `language-{tag}` class.
    pub fn start(&mut self, tag: Option<String>) {
        self.active = true;
        self.tag = tag;
        self.buffer.clear();
    }

    /// Close the block, handing back its tag and text.
    pub fn end(&mut self) -> (Option<String>, String) {
        self.active = false;
        (self.tag.take(), std::mem::take(&mut self.buffer))
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn push_str(&mut self, text: &str) {
        self.buffer.push_str(text);
    }
}

/// Position inside the table being rendered.
#[derive(Default)]
pub struct TableState {
    /// Cells render as `th` while set.
    in_head: bool,
    alignments: Vec<Alignment>,
    /// Zero-based column of the next cell.
    cell_index: usize,
}

impl TableState {
    pub fn start(&mut self, alignments: Vec<Alignment>) {
        self.alignments = alignments;
        self.in_head = false;
        self.cell_index = 0;
    }

    pub fn start_head(&mut self) {
        self.in_head = true;
        self.cell_index = 0;
    }

    pub fn end_head(&mut self) {
        self.in_head = false;
    }

    pub fn start_row(&mut self) {
        self.cell_index = 0;
    }

    pub fn next_cell(&mut self) {
        self.cell_index += 1;
    }

    pub fn is_in_head(&self) -> bool {
        self.in_head
    }

    /// Inline `style` attribute for the current column, empty when unaligned.
    pub fn current_alignment_style(&self) -> &'static str {
        match self.alignments.get(self.cell_index) {
            Some(Alignment::Left) => r#" style="text-align:left""#,
            Some(Alignment::Center) => r#" style="text-align:center""#,
            Some(Alignment::Right) => r#" style="text-align:right""#,
            Some(Alignment::None) | None => "",
        }
    }
}

/// Alt text collection for images, which may nest.
#[derive(Default)]
pub struct ImageState {
    /// Nesting depth of images being captured.
    depth: usize,
    alt_text: String,
}

impl ImageState {
    pub fn start(&mut self) {
        if self.depth == 0 {
            self.alt_text.clear();
        }
        self.depth += 1;
    }

    /// Alt text of the outermost image, `None` for a nested one.
    pub fn end(&mut self) -> Option<String> {
        self.depth = self.depth.saturating_sub(1);
        (self.depth == 0).then(|| std::mem::take(&mut self.alt_text))
    }

    pub fn is_active(&self) -> bool {
        self.depth > 0
    }

    pub fn push_str(&mut self, text: &str) {
        self.alt_text.push_str(text);
    }
}

/// Footnote numbering, in order of first reference or definition.
#[derive(Default)]
pub struct FootnoteState {
    numbers: HashMap<String, usize>,
}

impl FootnoteState {
    /// Number of the footnote `name`, assigning the next one if new.
    pub fn number(&mut self, name: &str) -> usize {
        let next = self.numbers.len() + 1;
        *self.numbers.entry(name.to_owned()).or_insert(next)
    }
}

/// Escape text for element content and double-quoted attributes.
#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
    }
    result
}
