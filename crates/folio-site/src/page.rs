//! Page materialization: one source directory in, one output triple out.

use std::path::{Path, PathBuf};
use std::time::Duration;

use folio_cache::{CacheBucket, CacheBucketExt};
use folio_config::{OutputConfig, PageDefaults};
use folio_fetch::{Fetch, FetchError, wait_for_json};
use folio_renderer::markup::{TreeNode, serialize_children};
use folio_renderer::{ConvertOptions, RenderError, TOC_MARKER, convert_to_markup};
use serde_json::Value;

use crate::page_config::PageConfig;
use crate::snippet::{Highlighter, SnippetError, SnippetProcessor};

/// Path segment that marks a book collection.
const BOOKS_SEGMENT: &str = "books";

/// Error materializing one page.
#[derive(Debug, thiserror::Error)]
pub enum PageError {
    #[error("failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Snippet(#[from] SnippetError),
    /// The book root's config never appeared.
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("failed to serialize page config: {0}")]
    Json(#[from] serde_json::Error),
}

impl PageError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// One document to materialize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageJob {
    /// Directory relative to the source root, `/`-separated, empty for the root.
    pub rel_dir: String,
}

impl PageJob {
    pub fn new(rel_dir: impl Into<String>) -> Self {
        Self {
            rel_dir: rel_dir.into(),
        }
    }

    /// Number of path segments below the root.
    pub fn depth(&self) -> usize {
        self.segments().count()
    }

    fn segments(&self) -> impl Iterator<Item = &str> {
        self.rel_dir.split('/').filter(|segment| !segment.is_empty())
    }

    /// Where the document sits relative to a book, if anywhere.
    pub fn book_position(&self) -> BookPosition {
        let segments: Vec<&str> = self.segments().collect();
        let Some(books) = segments.iter().position(|s| *s == BOOKS_SEGMENT) else {
            return BookPosition::None;
        };
        if segments.len() <= books + 1 {
            return BookPosition::None;
        }
        let book_id = segments[..=books + 1].join("/");
        if segments.len() == books + 2 {
            BookPosition::Root { book_id }
        } else {
            BookPosition::Chapter { book_id }
        }
    }

    /// Source directory of the document.
    pub fn source_dir(&self, source_root: &Path) -> PathBuf {
        join_rel(source_root, &self.rel_dir)
    }

    /// Output directory of the document.
    pub fn output_dir(&self, output_root: &Path) -> PathBuf {
        join_rel(output_root, &self.rel_dir)
    }
}

/// Position of a document relative to a `books/<name>` directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookPosition {
    None,
    /// The `books/<name>` directory itself.
    Root { book_id: String },
    /// Anywhere below a book root.
    Chapter { book_id: String },
}

pub(crate) fn join_rel(root: &Path, rel_dir: &str) -> PathBuf {
    rel_dir
        .split('/')
        .filter(|segment| !segment.is_empty())
        .fold(root.to_path_buf(), |path, segment| path.join(segment))
}

/// Everything a materialization needs besides the job itself.
///
/// Shared read-only across all jobs of a build.
pub struct MaterializeContext<'a> {
    pub source_dir: &'a Path,
    pub output_dir: &'a Path,
    pub files: &'a OutputConfig,
    pub defaults: PageDefaults,
    pub convert: &'a ConvertOptions,
    pub fetcher: &'a dyn Fetch,
    pub highlighter: &'a Highlighter,
    /// Memoized book titles, keyed by book id.
    pub books: &'a dyn CacheBucket,
    pub book_wait_interval: Duration,
    pub book_wait_timeout: Duration,
}

/// Materialized page, ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct PageOutput {
    pub config: PageConfig,
    pub body: String,
    /// "On this page" list, absent when the page has no outline.
    pub otp: Option<String>,
}

/// Run the whole page pipeline for one document.
///
/// # Errors
///
/// Fails when the document cannot be read or converted, a snippet cannot
/// be loaded, or the book root's config never appears.
pub fn materialize(job: &PageJob, ctx: &MaterializeContext<'_>) -> Result<PageOutput, PageError> {
    let source_dir = job.source_dir(ctx.source_dir);
    let md_path = source_dir.join(&ctx.files.md_file);
    let document = std::fs::read_to_string(&md_path).map_err(|e| PageError::io(&md_path, e))?;

    let mut config = PageConfig::new(ctx.defaults);
    let mut root = convert_to_markup(&document, config.as_map_mut(), ctx.convert, ctx.fetcher)?;

    SnippetProcessor {
        repo_base: &ctx.convert.repo_base,
        fetcher: ctx.fetcher,
        highlighter: ctx.highlighter,
    }
    .process(&mut root)?;

    let otp = extract_otp(&mut root);

    let title = extract_title(&mut root);
    if title.is_none() {
        tracing::warn!(path = %md_path.display(), "Page has no title heading");
    }
    config.set("title", title);
    config.set("pathname", source_dir.to_string_lossy().into_owned());

    resolve_book(job, &mut config, ctx)?;
    rewrite_images(&mut root, &job.rel_dir);

    Ok(PageOutput {
        config,
        body: serialize_children(&root).trim().to_owned(),
        otp,
    })
}

/// Cut the outline list out of `root` and return it as a standalone list.
///
/// The outline list is always present after the marker, so an empty one
/// is removed too. Returns `None` when there is no marker, no list right
/// after it, or the list has no items.
fn extract_otp(root: &mut TreeNode) -> Option<String> {
    let marker = root.find_path(&|node: &TreeNode| node.attr("id") == Some(TOC_MARKER))?;
    root.remove_at(&marker)?;

    let (&index, parent_path) = marker.split_last()?;
    let parent = root.node_at_mut(parent_path)?;
    if !parent
        .children
        .get(index)
        .is_some_and(|node| matches!(node.tag.as_str(), "ul" | "ol"))
    {
        return None;
    }

    let mut list = parent.remove_child(index);
    if !list.children.iter().any(|node| node.tag == "li") {
        return None;
    }
    list.for_each_descendant_mut(&mut |node| {
        if matches!(node.tag.as_str(), "li" | "ul") {
            node.add_class("dynamic");
        }
    });
    unwrap_paragraphs(&mut list);

    Some(format!("<ul>{}</ul>", serialize_children(&list).trim()))
}

fn unwrap_paragraphs(node: &mut TreeNode) {
    let mut index = 0;
    while index < node.children.len() {
        if node.children[index].tag == "p" {
            node.unwrap_child(index);
        } else {
            unwrap_paragraphs(&mut node.children[index]);
            index += 1;
        }
    }
}

/// Remove the first `h1` and return its text.
fn extract_title(root: &mut TreeNode) -> Option<String> {
    let path = root.find_path(&|node: &TreeNode| node.tag == "h1")?;
    let heading = root.remove_at(&path)?;
    Some(heading.text_content())
}

fn resolve_book(
    job: &PageJob,
    config: &mut PageConfig,
    ctx: &MaterializeContext<'_>,
) -> Result<(), PageError> {
    if config.book_title().is_some() {
        config.set("bookPath", job.rel_dir.as_str());
        return Ok(());
    }

    match job.book_position() {
        BookPosition::None => {}
        BookPosition::Root { book_id } => {
            tracing::warn!(rel_dir = %job.rel_dir, "Book root has no bookTitle");
            config.set("bookPath", job.rel_dir.as_str());
            config.set("bookId", book_id);
        }
        BookPosition::Chapter { book_id } => {
            config.set("bookPath", job.rel_dir.as_str());
            if let Some(title) = book_title(&book_id, ctx)? {
                config.set("bookTitle", title);
            }
            config.set("bookId", book_id);
        }
    }
    Ok(())
}

/// Title of the book rooted at `book_id`, read from its written config.
fn book_title(book_id: &str, ctx: &MaterializeContext<'_>) -> Result<Option<String>, PageError> {
    if let Some(title) = ctx.books.get_json::<Option<String>>(book_id) {
        return Ok(title);
    }

    let config_path = join_rel(ctx.output_dir, book_id).join(&ctx.files.cfg_file);
    let book_source = join_rel(ctx.source_dir, book_id).join(&ctx.files.md_file);
    if !config_path.exists() && !book_source.exists() {
        tracing::warn!(book_id, "Book has no index document, nothing to inherit");
        return Ok(None);
    }

    let book_config = wait_for_json(&config_path, ctx.book_wait_interval, ctx.book_wait_timeout)?;
    let title = book_config
        .get("bookTitle")
        .and_then(Value::as_str)
        .map(str::to_owned);
    ctx.books.set_json(book_id, &title);
    Ok(title)
}

/// Root relative image sources at the document's directory.
fn rewrite_images(root: &mut TreeNode, rel_dir: &str) {
    root.for_each_descendant_mut(&mut |node| {
        if node.tag != "img" {
            return;
        }
        let Some(src) = node.attr("src") else {
            return;
        };
        if is_rooted(src) {
            return;
        }
        let rewritten = if rel_dir.is_empty() {
            format!("/{src}")
        } else {
            format!("/{rel_dir}/{src}")
        };
        node.set_attr("src", rewritten);
    });
}

fn is_rooted(src: &str) -> bool {
    src.starts_with('/') || src.starts_with("data:") || src.contains("://")
}

#[cfg(test)]
mod tests {
    use std::sync::LazyLock;

    use folio_cache::{Cache, MemoryCache};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    static HIGHLIGHTER: LazyLock<Highlighter> =
        LazyLock::new(|| Highlighter::new("InspiredGitHub").unwrap());

    struct Offline;

    impl Fetch for Offline {
        fn fetch(&self, url: &str) -> Result<String, FetchError> {
            Err(FetchError::Http {
                url: url.to_owned(),
                message: "offline".to_owned(),
            })
        }
    }

    struct Site {
        source: tempfile::TempDir,
        output: tempfile::TempDir,
        files: OutputConfig,
        convert: ConvertOptions,
        cache: MemoryCache,
    }

    impl Site {
        fn new() -> Self {
            Self {
                source: tempfile::tempdir().unwrap(),
                output: tempfile::tempdir().unwrap(),
                files: OutputConfig::default(),
                convert: ConvertOptions::default(),
                cache: MemoryCache::new(),
            }
        }

        fn document(&self, rel_dir: &str, text: &str) {
            let dir = join_rel(self.source.path(), rel_dir);
            std::fs::create_dir_all(&dir).unwrap();
            std::fs::write(dir.join("index.md"), text).unwrap();
        }

        fn materialize(&self, rel_dir: &str) -> Result<PageOutput, PageError> {
            let books = self.cache.bucket("books");
            let ctx = MaterializeContext {
                source_dir: self.source.path(),
                output_dir: self.output.path(),
                files: &self.files,
                defaults: PageDefaults::default(),
                convert: &self.convert,
                fetcher: &Offline,
                highlighter: &HIGHLIGHTER,
                books: books.as_ref(),
                book_wait_interval: Duration::from_millis(10),
                book_wait_timeout: Duration::from_millis(100),
            };
            materialize(&PageJob::new(rel_dir), &ctx)
        }
    }

    #[test]
    fn test_book_position() {
        assert_eq!(PageJob::new("").book_position(), BookPosition::None);
        assert_eq!(PageJob::new("en/books").book_position(), BookPosition::None);
        assert_eq!(
            PageJob::new("en/books/guide").book_position(),
            BookPosition::Root {
                book_id: "en/books/guide".to_owned()
            }
        );
        assert_eq!(
            PageJob::new("books/guide/ch1/part").book_position(),
            BookPosition::Chapter {
                book_id: "books/guide".to_owned()
            }
        );
        assert_eq!(PageJob::new("a/b/c").depth(), 3);
    }

    #[test]
    fn test_end_to_end() {
        let site = Site::new();
        site.document("", "---\ntitle: Foo\n---\n# Foo\n## A\n## B\n");

        let page = site.materialize("").unwrap();

        assert_eq!(page.config.get("title"), Some(&json!("Foo")));
        assert_eq!(page.body, "<h2 id=\"a\">A</h2>\n<h2 id=\"b\">B</h2>");
        assert_eq!(
            page.otp.as_deref(),
            Some(
                "<ul><li class=\"dynamic\">\n    <a href=\"#a\">A</a>\n  </li>\n  \
                 <li class=\"dynamic\">\n    <a href=\"#b\">B</a>\n  </li></ul>"
            )
        );
        assert_eq!(
            page.config.get("pathname"),
            Some(&json!(site.source.path().to_string_lossy()))
        );
    }

    #[test]
    fn test_nested_outline_marked_dynamic() {
        let mut site = Site::new();
        site.convert.toc_max_depth = 3;
        site.document("", "# T\n## A\n### A1\n");

        let otp = site.materialize("").unwrap().otp.unwrap();
        let list = folio_renderer::markup::parse_fragment(&otp);

        let mut items = 0;
        let mut lists = 0;
        let mut paragraphs = 0;
        let mut root = list;
        root.for_each_descendant_mut(&mut |node| match node.tag.as_str() {
            "li" => {
                items += 1;
                assert_eq!(node.attr("class"), Some("dynamic"));
            }
            "ul" => lists += 1,
            "p" => paragraphs += 1,
            _ => {}
        });
        assert_eq!((items, lists, paragraphs), (2, 2, 0));
    }

    #[test]
    fn test_otp_omitted_without_headings() {
        let site = Site::new();
        site.document("guide", "# Only Title\n\nText.\n");

        let page = site.materialize("guide").unwrap();
        assert_eq!(page.otp, None);
        assert_eq!(page.body, "<p>Text.</p>");
        assert_eq!(page.config.get("title"), Some(&json!("Only Title")));
    }

    #[test]
    fn test_leading_user_list_stays_in_body() {
        let site = Site::new();
        site.document("guide", "- first\n- second\n\nText.\n");

        let page = site.materialize("guide").unwrap();
        assert_eq!(page.otp, None);
        assert_eq!(
            page.body,
            "<ul>\n  <li>first</li>\n  <li>second</li>\n</ul>\n<p>Text.</p>"
        );
    }

    #[test]
    fn test_missing_title_is_null() {
        let site = Site::new();
        site.document("", "## A\n");

        let page = site.materialize("").unwrap();
        assert_eq!(page.config.get("title"), Some(&Value::Null));
        assert!(page.otp.is_some());
    }

    #[test]
    fn test_frontmatter_book_title_sets_path() {
        let site = Site::new();
        site.document("books/mybook", "---\nbookTitle: My Book\n---\n# Intro\n");

        let page = site.materialize("books/mybook").unwrap();
        assert_eq!(page.config.book_title(), Some("My Book"));
        assert_eq!(page.config.get("bookPath"), Some(&json!("books/mybook")));
        assert_eq!(page.config.get("bookId"), None);
    }

    #[test]
    fn test_chapter_inherits_book_title() {
        let site = Site::new();
        site.document("books/mybook/ch1", "# Chapter 1\n");
        let book_out = site.output.path().join("books/mybook");
        std::fs::create_dir_all(&book_out).unwrap();
        std::fs::write(book_out.join("config.json"), r#"{"bookTitle":"My Book"}"#).unwrap();

        let page = site.materialize("books/mybook/ch1").unwrap();
        assert_eq!(page.config.book_title(), Some("My Book"));
        assert_eq!(page.config.get("bookPath"), Some(&json!("books/mybook/ch1")));
        assert_eq!(page.config.get("bookId"), Some(&json!("books/mybook")));
    }

    #[test]
    fn test_chapter_without_book_document_inherits_nothing() {
        let site = Site::new();
        site.document("books/orphan/ch1", "# Chapter\n");

        let page = site.materialize("books/orphan/ch1").unwrap();
        assert_eq!(page.config.book_title(), None);
        assert_eq!(page.config.get("bookPath"), Some(&json!("books/orphan/ch1")));
    }

    #[test]
    fn test_chapter_times_out_when_book_never_written() {
        let site = Site::new();
        site.document("books/mybook", "---\nbookTitle: My Book\n---\n# Intro\n");
        site.document("books/mybook/ch1", "# Chapter\n");

        let err = site.materialize("books/mybook/ch1").unwrap_err();
        assert!(matches!(err, PageError::Fetch(FetchError::WaitTimeout { .. })));
    }

    #[test]
    fn test_book_title_cached() {
        let site = Site::new();
        site.document("books/mybook/ch1", "# One\n");
        site.document("books/mybook/ch2", "# Two\n");
        let book_out = site.output.path().join("books/mybook");
        std::fs::create_dir_all(&book_out).unwrap();
        std::fs::write(book_out.join("config.json"), r#"{"bookTitle":"My Book"}"#).unwrap();

        site.materialize("books/mybook/ch1").unwrap();
        std::fs::remove_file(book_out.join("config.json")).unwrap();

        let page = site.materialize("books/mybook/ch2").unwrap();
        assert_eq!(page.config.book_title(), Some("My Book"));
    }

    #[test]
    fn test_image_sources_rewritten() {
        let site = Site::new();
        site.document(
            "guide/setup",
            "# Setup\n\n![a](shot.png) ![b](/abs.png) ![c](https://x.org/c.png)\n",
        );

        let body = site.materialize("guide/setup").unwrap().body;
        assert!(body.contains(r#"src="/guide/setup/shot.png""#));
        assert!(body.contains(r#"src="/abs.png""#));
        assert!(body.contains(r#"src="https://x.org/c.png""#));
    }

    #[test]
    fn test_snippet_in_body() {
        let site = Site::new();
        site.document("", "# T\n\n```js unnumbered\nlet a = 1;\n```\n");

        let body = site.materialize("").unwrap().body;
        assert!(body.starts_with(r#"<pre class="snippet unnumbered"><ol class="snippet"><li value="1">"#));
    }

    #[test]
    fn test_missing_document() {
        let site = Site::new();
        let err = site.materialize("nowhere").unwrap_err();
        assert!(matches!(err, PageError::Io { .. }));
        assert!(err.to_string().contains("index.md"));
    }
}
