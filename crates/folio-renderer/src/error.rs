use folio_fetch::FetchError;

/// Error converting a document to markup.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The `src:` directive's remote body could not be loaded.
    #[error(transparent)]
    Fetch(#[from] FetchError),
    /// Frontmatter is not a YAML mapping.
    #[error("invalid frontmatter: {0}")]
    Frontmatter(String),
}
