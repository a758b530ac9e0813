//! Per-page configuration object written to `config.json`.

use folio_config::PageDefaults;
use serde::Serialize;
use serde_json::{Map, Value};

/// Ordered JSON object describing one page.
///
/// Seeded with defaults, then extended by frontmatter (keys are copied
/// verbatim, last write wins) and finally by the materializer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PageConfig {
    values: Map<String, Value>,
}

impl PageConfig {
    /// Fresh config with every default key, in output order.
    #[must_use]
    pub fn new(defaults: PageDefaults) -> Self {
        let mut values = Map::new();
        values.insert("author".to_owned(), Value::Null);
        values.insert("background".to_owned(), Value::from("white"));
        values.insert("bookPath".to_owned(), Value::Null);
        values.insert("bookTitle".to_owned(), Value::Null);
        values.insert("chapters".to_owned(), Value::Null);
        values.insert("hasOtp".to_owned(), Value::Bool(true));
        values.insert("hasCustomBase".to_owned(), Value::Bool(false));
        values.insert("hasEditBtn".to_owned(), Value::Bool(defaults.has_edit_btn));
        values.insert("hasPageHeader".to_owned(), Value::Bool(true));
        values.insert("hasPageScrollbar".to_owned(), Value::Bool(true));
        values.insert(
            "hasRefreshBtn".to_owned(),
            Value::Bool(defaults.has_refresh_btn),
        );
        values.insert("menuItem".to_owned(), Value::Null);
        values.insert("pages".to_owned(), Value::Null);
        values.insert("pathname".to_owned(), Value::Null);
        values.insert("publishedDate".to_owned(), Value::Null);
        values.insert("title".to_owned(), Value::Null);
        Self { values }
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.values
    }

    /// Mutable access for the frontmatter stage.
    pub fn as_map_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.values
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Set `key`, keeping its position if already present.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.values.insert(key.to_owned(), value.into());
    }

    /// The book title, when set to a non-empty string.
    pub fn book_title(&self) -> Option<&str> {
        self.values
            .get("bookTitle")
            .and_then(Value::as_str)
            .filter(|title| !title.is_empty())
    }

    /// Whether the page ships its own base page instead of the shared one.
    pub fn has_custom_base(&self) -> bool {
        self.values
            .get("hasCustomBase")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Pretty JSON with two-space indentation.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.values)
    }
}
