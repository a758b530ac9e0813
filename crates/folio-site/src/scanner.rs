//! Source tree discovery.
//!
//! The scanner only finds files; nothing is read or copied here. The
//! builder turns the result into page jobs and copy operations.

use std::fs;
use std::path::{Path, PathBuf};

/// Per-directory base page, copied to the output as `index.html`.
pub const BASE_PAGE: &str = "base.html";

/// Everything the scanner found, each list in walk order.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SourceTree {
    /// Directories holding a markdown document, relative to the root.
    pub documents: Vec<String>,
    /// Directories holding a base page, relative to the root.
    pub base_pages: Vec<String>,
    /// Other files, relative to the root.
    pub assets: Vec<String>,
}

impl SourceTree {
    /// Whether the directory `rel_dir` has its own base page.
    pub fn has_base_page(&self, rel_dir: &str) -> bool {
        self.base_pages.iter().any(|dir| dir == rel_dir)
    }
}

/// Walks a source directory.
pub struct Scanner {
    source_dir: PathBuf,
    md_file: String,
    cfg_file: String,
}

impl Scanner {
    /// Create a scanner.
    ///
    /// # Arguments
    ///
    /// * `source_dir` - Root directory to scan
    /// * `md_file` - Name of the markdown document in a directory
    /// * `cfg_file` - Name of config files, which are never copied
    pub fn new(source_dir: PathBuf, md_file: impl Into<String>, cfg_file: impl Into<String>) -> Self {
        Self {
            source_dir,
            md_file: md_file.into(),
            cfg_file: cfg_file.into(),
        }
    }

    /// Scan the source tree. Hidden files and directories are skipped.
    ///
    /// Returns an empty tree if the source directory doesn't exist.
    pub fn scan(&self) -> SourceTree {
        let mut tree = SourceTree::default();
        if self.source_dir.is_dir() {
            self.scan_directory(&self.source_dir, "", &mut tree);
        }
        tree
    }

    fn scan_directory(&self, dir_path: &Path, rel_dir: &str, tree: &mut SourceTree) {
        let entries = match fs::read_dir(dir_path) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(path = %dir_path.display(), error = %e, "Failed to read directory");
                return;
            }
        };

        let mut entries: Vec<_> = entries
            .filter_map(Result::ok)
            .map(|e| {
                let is_dir = fs::metadata(e.path()).is_ok_and(|m| m.is_dir());
                let name = e.file_name().to_string_lossy().into_owned();
                (name, is_dir)
            })
            .filter(|(name, _)| !name.starts_with('.'))
            .collect();
        entries.sort();

        let mut subdirs = Vec::new();
        for (name, is_dir) in entries {
            let rel_path = if rel_dir.is_empty() {
                name.clone()
            } else {
                format!("{rel_dir}/{name}")
            };

            if is_dir {
                subdirs.push((dir_path.join(&name), rel_path));
            } else if name == self.md_file {
                tree.documents.push(rel_dir.to_owned());
            } else if name == BASE_PAGE {
                tree.base_pages.push(rel_dir.to_owned());
            } else if name != self.cfg_file {
                tree.assets.push(rel_path);
            }
        }

        for (path, rel_path) in subdirs {
            self.scan_directory(&path, &rel_path, tree);
        }
    }
}
