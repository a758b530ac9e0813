//! Whole-site build: scan, copy, materialize every document, link.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use folio_cache::{Cache, MemoryCache};
use folio_config::Config;
use folio_fetch::RemoteFetcher;
use folio_renderer::ConvertOptions;
use rayon::prelude::*;

use crate::minify::{minify_asset, minify_page};
use crate::output::write_output;
use crate::page::{BookPosition, MaterializeContext, PageError, PageJob, join_rel, materialize};
use crate::scanner::{BASE_PAGE, Scanner, SourceTree};
use crate::snippet::Highlighter;

/// Name of a directory's default page in the output.
const DEFAULT_PAGE: &str = "index.html";

/// Error returned by [`SiteBuilder::build`].
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unknown highlight theme {theme:?}, available: {available}")]
    Highlighter { theme: String, available: String },
    /// Some documents failed; each failure has been logged.
    #[error("{failed} of {total} documents failed")]
    Documents { failed: usize, total: usize },
}

impl BuildError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Counts of what a successful build produced.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BuildReport {
    pub documents: usize,
    pub assets: usize,
    pub base_pages: usize,
}

/// Builds the output tree for one configuration.
pub struct SiteBuilder<'a> {
    config: &'a Config,
}

impl<'a> SiteBuilder<'a> {
    #[must_use]
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Run a full build.
    ///
    /// Documents run on the rayon pool in two waves: first everything that
    /// is not a book chapter, then the chapters, so book roots are written
    /// before chapters read them. One failing document does not stop the
    /// others.
    pub fn build(&self) -> Result<BuildReport, BuildError> {
        let site = &self.config.site_resolved;
        let files = &self.config.output;

        std::fs::create_dir_all(&site.output_dir)
            .map_err(|e| BuildError::io(&site.output_dir, e))?;

        let tree = Scanner::new(site.source_dir.clone(), &files.md_file, &files.cfg_file).scan();
        tracing::info!(
            source = %site.source_dir.display(),
            documents = tree.documents.len(),
            assets = tree.assets.len(),
            "Scanned source tree"
        );

        self.copy_assets(&tree)?;
        self.copy_base_pages(&tree)?;

        let theme = &self.config.render.highlight_theme;
        let highlighter = Highlighter::new(theme).ok_or_else(|| BuildError::Highlighter {
            theme: theme.clone(),
            available: Highlighter::theme_names().join(", "),
        })?;

        let remote = &self.config.remote_resolved;
        let cache = MemoryCache::new();
        let fetcher = RemoteFetcher::new(
            remote.repo_base.clone(),
            remote.mirror_dir.clone(),
            remote.timeout,
            &cache,
        );
        let books = cache.bucket("books");
        let convert = ConvertOptions {
            toc_max_depth: self.config.render.toc_max_depth,
            repo_base: remote.repo_base.clone(),
            repo_src_dir: remote.src_dir.clone(),
        };

        let ctx = MaterializeContext {
            source_dir: &site.source_dir,
            output_dir: &site.output_dir,
            files,
            defaults: self.config.page,
            convert: &convert,
            fetcher: &fetcher,
            highlighter: &highlighter,
            books: books.as_ref(),
            book_wait_interval: self.config.books.wait_interval(),
            book_wait_timeout: self.config.books.wait_timeout(),
        };

        let (chapters, others): (Vec<PageJob>, Vec<PageJob>) = tree
            .documents
            .iter()
            .map(PageJob::new)
            .partition(|job| matches!(job.book_position(), BookPosition::Chapter { .. }));

        let total = chapters.len() + others.len();
        let mut failed = run_wave(&others, &ctx, &tree);
        failed += run_wave(&chapters, &ctx, &tree);

        if failed > 0 {
            return Err(BuildError::Documents { failed, total });
        }

        Ok(BuildReport {
            documents: total,
            assets: tree.assets.len(),
            base_pages: tree.base_pages.len(),
        })
    }

    /// Copy assets, minifying stylesheets and scripts when enabled. An
    /// asset that fails to minify is copied as is.
    fn copy_assets(&self, tree: &SourceTree) -> Result<(), BuildError> {
        let site = &self.config.site_resolved;
        for asset in &tree.assets {
            let from = join_rel(&site.source_dir, asset);
            let to = join_rel(&site.output_dir, asset);
            if !self.config.assets.minify {
                copy_file(&from, &to)?;
                continue;
            }

            let source = std::fs::read(&from).map_err(|e| BuildError::io(&from, e))?;
            match minify_asset(&from, &source) {
                Some(Ok(minified)) => {
                    tracing::debug!(
                        path = %asset,
                        before = source.len(),
                        after = minified.len(),
                        "Minified asset"
                    );
                    write_file(&to, &minified)?;
                }
                Some(Err(e)) => {
                    tracing::warn!(
                        path = %asset,
                        error = %e,
                        "Failed to minify asset, copying as is"
                    );
                    write_file(&to, &source)?;
                }
                None => write_file(&to, &source)?,
            }
        }
        Ok(())
    }

    fn copy_base_pages(&self, tree: &SourceTree) -> Result<(), BuildError> {
        let site = &self.config.site_resolved;
        for rel_dir in &tree.base_pages {
            let from = join_rel(&site.source_dir, rel_dir).join(BASE_PAGE);
            let to = join_rel(&site.output_dir, rel_dir).join(DEFAULT_PAGE);
            if self.config.assets.minify {
                let source = std::fs::read(&from).map_err(|e| BuildError::io(&from, e))?;
                write_file(&to, &minify_page(&source))?;
            } else {
                copy_file(&from, &to)?;
            }
        }
        Ok(())
    }
}

/// Run one wave of jobs in parallel and return the number of failures.
fn run_wave(jobs: &[PageJob], ctx: &MaterializeContext<'_>, tree: &SourceTree) -> usize {
    let errors: Vec<(&PageJob, PageError)> = jobs
        .par_iter()
        .filter_map(|job| run_job(job, ctx, tree).err().map(|e| (job, e)))
        .collect();

    for (job, error) in &errors {
        tracing::error!(rel_dir = %job.rel_dir, error = %error, "Document failed");
    }
    errors.len()
}

fn run_job(job: &PageJob, ctx: &MaterializeContext<'_>, tree: &SourceTree) -> Result<(), PageError> {
    let page = materialize(job, ctx)?;
    let out_dir = job.output_dir(ctx.output_dir);
    write_output(&out_dir, ctx.files, &page)?;
    tracing::debug!(rel_dir = %job.rel_dir, "Wrote page");

    if job.depth() >= 2 && !page.config.has_custom_base() && !tree.has_base_page(&job.rel_dir) {
        link_default_page(&out_dir, job.depth());
    }
    Ok(())
}

/// Copy `from` to `to`, replacing whatever `to` was, links included.
fn copy_file(from: &Path, to: &Path) -> Result<(), BuildError> {
    if let Some(parent) = to.parent() {
        std::fs::create_dir_all(parent).map_err(|e| BuildError::io(parent, e))?;
    }
    remove_if_exists(to).map_err(|e| BuildError::io(to, e))?;
    std::fs::copy(from, to).map_err(|e| BuildError::io(from, e))?;
    Ok(())
}

/// Write `contents` to `to`, replacing whatever `to` was, links included.
fn write_file(to: &Path, contents: &[u8]) -> Result<(), BuildError> {
    if let Some(parent) = to.parent() {
        std::fs::create_dir_all(parent).map_err(|e| BuildError::io(parent, e))?;
    }
    remove_if_exists(to).map_err(|e| BuildError::io(to, e))?;
    std::fs::write(to, contents).map_err(|e| BuildError::io(to, e))
}

fn remove_if_exists(path: &Path) -> std::io::Result<()> {
    match std::fs::remove_file(path) {
        Err(e) if e.kind() != ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

/// Link target from a directory `depth` levels down to its top-level directory's default page.
fn default_page_target(depth: usize) -> String {
    format!("{}{DEFAULT_PAGE}", "../".repeat(depth.saturating_sub(1)))
}

/// Point `<dir>/index.html` at an ancestor's default page. Failures only warn.
#[cfg(unix)]
fn link_default_page(dir: &Path, depth: usize) {
    let link = dir.join(DEFAULT_PAGE);
    let target = default_page_target(depth);
    let result = remove_if_exists(&link).and_then(|()| std::os::unix::fs::symlink(&target, &link));
    if let Err(e) = result {
        tracing::warn!(path = %link.display(), link_target = %target, error = %e, "Failed to link default page");
    }
}

#[cfg(not(unix))]
fn link_default_page(dir: &Path, depth: usize) {
    tracing::debug!(
        path = %dir.display(),
        link_target = %default_page_target(depth),
        "Default page links need a unix filesystem"
    );
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    struct Fixture {
        source: tempfile::TempDir,
        output: tempfile::TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                source: tempfile::tempdir().unwrap(),
                output: tempfile::tempdir().unwrap(),
            }
        }

        fn write(&self, rel_path: &str, text: &str) {
            let path = self.source.path().join(rel_path);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, text).unwrap();
        }

        fn config(&self) -> Config {
            let mut config = Config::default();
            config.site_resolved.source_dir = self.source.path().to_path_buf();
            config.site_resolved.output_dir = self.output.path().join("build");
            config.books.wait_interval_ms = 10;
            config.books.wait_timeout_secs = 1;
            config.assets.minify = false;
            config
        }

        fn out(&self, rel_path: &str) -> PathBuf {
            self.output.path().join("build").join(rel_path)
        }

        fn read_out(&self, rel_path: &str) -> String {
            std::fs::read_to_string(self.out(rel_path)).unwrap()
        }
    }

    #[test]
    fn test_default_page_target() {
        assert_eq!(default_page_target(2), "../index.html");
        assert_eq!(default_page_target(3), "../../index.html");
    }

    #[test]
    fn test_build_site() {
        let fx = Fixture::new();
        fx.write("base.html", "<html></html>");
        fx.write("index.md", "# Home\n## Start\n");
        fx.write("en/guide/index.md", "# Guide\n");
        fx.write("en/guide/shot.png", "png");
        fx.write("en/guide/config.json", "{}");

        let report = SiteBuilder::new(&fx.config()).build().unwrap();

        assert_eq!(
            report,
            BuildReport {
                documents: 2,
                assets: 1,
                base_pages: 1
            }
        );
        assert_eq!(fx.read_out("index.html"), "<html></html>");
        assert_eq!(fx.read_out("en/guide/shot.png"), "png");
        assert!(fx.out("otp.html").exists());
        assert!(!fx.out("en/guide/otp.html").exists());

        let config: serde_json::Value =
            serde_json::from_str(&fx.read_out("en/guide/config.json")).unwrap();
        assert_eq!(config["title"], "Guide");
    }

    #[cfg(unix)]
    #[test]
    fn test_default_page_links() {
        let fx = Fixture::new();
        fx.write("base.html", "<html></html>");
        fx.write("top/index.md", "# Top\n");
        fx.write("a/b/index.md", "# Deep\n");
        fx.write("a/c/index.md", "---\nhasCustomBase: true\n---\n# Custom\n");
        fx.write("a/d/index.md", "# Own base\n");
        fx.write("a/d/base.html", "<html>d</html>");

        SiteBuilder::new(&fx.config()).build().unwrap();

        let link = std::fs::read_link(fx.out("a/b/index.html")).unwrap();
        assert_eq!(link, Path::new("../index.html"));
        assert!(!fx.out("top/index.html").exists());
        assert!(!fx.out("a/c/index.html").exists());
        assert_eq!(fx.read_out("a/d/index.html"), "<html>d</html>");
        assert_eq!(fx.read_out("index.html"), "<html></html>");
    }

    #[test]
    fn test_failures_are_isolated() {
        let fx = Fixture::new();
        fx.write("good/index.md", "# Good\n");
        fx.write("bad/index.md", "---\n- not\n- a mapping\n---\n# Bad\n");

        let err = SiteBuilder::new(&fx.config()).build().unwrap_err();

        assert!(matches!(err, BuildError::Documents { failed: 1, total: 2 }));
        assert!(fx.out("good/page.html").exists());
        assert!(!fx.out("bad/config.json").exists());
    }

    #[test]
    fn test_chapters_wait_for_book_root() {
        let fx = Fixture::new();
        fx.write("books/guide/index.md", "---\nbookTitle: The Guide\n---\n# Guide\n");
        fx.write("books/guide/ch1/index.md", "# One\n");
        fx.write("books/guide/ch2/index.md", "# Two\n");

        SiteBuilder::new(&fx.config()).build().unwrap();

        for chapter in ["books/guide/ch1", "books/guide/ch2"] {
            let config: serde_json::Value =
                serde_json::from_str(&fx.read_out(&format!("{chapter}/config.json"))).unwrap();
            assert_eq!(config["bookTitle"], "The Guide");
            assert_eq!(config["bookPath"], chapter);
            assert_eq!(config["bookId"], "books/guide");
        }
    }

    #[test]
    fn test_unknown_theme() {
        let fx = Fixture::new();
        let mut config = fx.config();
        config.render.highlight_theme = "Nope".to_owned();

        let err = SiteBuilder::new(&config).build().unwrap_err();
        assert!(matches!(err, BuildError::Highlighter { .. }));
        assert!(err.to_string().contains("InspiredGitHub"));
    }

    #[test]
    fn test_minified_assets_and_base_pages() {
        let fx = Fixture::new();
        fx.write("base.html", "<html>\n  <body>\n    <p>Home</p>\n  </body>\n</html>\n");
        fx.write("assets/site.css", "/* theme */\nbody {\n  margin: 0;\n}\n");
        fx.write("assets/site.js", "function toggle(menu) {\n  // open or close\n  menu.hidden = !menu.hidden;\n}\n");
        fx.write("assets/broken.js", "function ( {");
        fx.write("assets/logo.svg", "<svg>\n</svg>\n");
        let mut config = fx.config();
        config.assets.minify = true;

        let report = SiteBuilder::new(&config).build().unwrap();

        assert_eq!(report.assets, 4);
        assert_eq!(fx.read_out("assets/site.css"), "body{margin:0}");
        let script = fx.read_out("assets/site.js");
        assert!(script.contains("toggle("));
        assert!(!script.contains("open or close"));
        assert_eq!(fx.read_out("assets/broken.js"), "function ( {");
        assert_eq!(fx.read_out("assets/logo.svg"), "<svg>\n</svg>\n");
        let page = fx.read_out("index.html");
        assert!(page.contains("<p>Home"));
        assert!(!page.contains("\n  "));
    }
}
