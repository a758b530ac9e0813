//! Configuration management for Folio.
//!
//! Parses `folio.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `remote.repo_base`
//! - `remote.mirror_dir`

mod expand;

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override markdown source directory.
    pub source_dir: Option<PathBuf>,
    /// Override output directory.
    pub output_dir: Option<PathBuf>,
    /// Override repository base URL.
    pub repo_base: Option<String>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "folio.toml";

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Site directories (paths are relative strings from TOML).
    site: SiteConfigRaw,
    /// Remote source settings as written in TOML.
    remote: RemoteConfigRaw,
    /// Per-document output filenames.
    pub output: OutputConfig,
    /// Feature flag defaults seeded into every page config.
    pub page: PageDefaults,
    /// Rendering options.
    pub render: RenderConfig,
    /// Book metadata resolution.
    pub books: BooksConfig,
    /// Static asset and base page handling.
    pub assets: AssetsConfig,

    /// Resolved site configuration (set after loading).
    #[serde(skip)]
    pub site_resolved: SiteConfig,
    /// Resolved remote configuration (set after loading).
    #[serde(skip)]
    pub remote_resolved: RemoteConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct SiteConfigRaw {
    source_dir: Option<String>,
    output_dir: Option<String>,
}

/// Resolved site directories.
#[derive(Debug, Default)]
pub struct SiteConfig {
    /// Root of the markdown source tree.
    pub source_dir: PathBuf,
    /// Root of the generated output tree.
    pub output_dir: PathBuf,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RemoteConfigRaw {
    repo_base: Option<String>,
    src_dir: Option<String>,
    mirror_dir: Option<String>,
    timeout_secs: Option<u64>,
}

/// Resolved remote content settings.
#[derive(Debug)]
pub struct RemoteConfig {
    /// Repository base URL. Relative `load:` paths and `src:` references
    /// are resolved against it. Empty disables mirror lookups.
    pub repo_base: String,
    /// Directory under `repo_base` holding remote documents for `src:`.
    pub src_dir: String,
    /// Local checkout mirroring `repo_base`, tried before the network.
    pub mirror_dir: Option<PathBuf>,
    /// Global timeout for one HTTP request.
    pub timeout: Duration,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            repo_base: String::new(),
            src_dir: String::new(),
            mirror_dir: None,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Fixed filenames of the per-document inputs and outputs.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Markdown document name inside a source directory.
    pub md_file: String,
    /// Page config JSON.
    pub cfg_file: String,
    /// Page body fragment.
    pub page_file: String,
    /// "On this page" outline fragment.
    pub otp_file: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            md_file: "index.md".to_owned(),
            cfg_file: "config.json".to_owned(),
            page_file: "page.html".to_owned(),
            otp_file: "otp.html".to_owned(),
        }
    }
}

/// Page feature flags that come from configuration rather than frontmatter.
#[derive(Debug, Deserialize, Default, Clone, Copy)]
#[serde(default)]
pub struct PageDefaults {
    pub has_edit_btn: bool,
    pub has_refresh_btn: bool,
}

/// Rendering options.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Deepest heading level listed in the page outline.
    pub toc_max_depth: u8,
    /// Syntect theme used for code highlighting.
    pub highlight_theme: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            toc_max_depth: 2,
            highlight_theme: "InspiredGitHub".to_owned(),
        }
    }
}

/// Static file handling.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AssetsConfig {
    /// Minify base pages and `.css`/`.js` assets instead of copying them.
    pub minify: bool,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self { minify: true }
    }
}

/// Settings for waiting on a book root's config.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BooksConfig {
    pub wait_interval_ms: u64,
    pub wait_timeout_secs: u64,
}

impl Default for BooksConfig {
    fn default() -> Self {
        Self {
            wait_interval_ms: 1000,
            wait_timeout_secs: 10,
        }
    }
}

impl BooksConfig {
    /// Delay between two reads of the awaited config.
    #[must_use]
    pub fn wait_interval(&self) -> Duration {
        Duration::from_millis(self.wait_interval_ms)
    }

    /// Total time to wait before giving up.
    #[must_use]
    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_secs)
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`remote.repo_base`").
        field: String,
        /// Error message (e.g., "${`REPO_BASE`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a URL field to use http:// or https:// scheme.
fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

/// Require a numeric field to be non-zero.
fn require_non_zero(value: u64, field: &str) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::Validation(format!(
            "{field} must be greater than 0"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `folio.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values. The merged result
    /// is validated last.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails or
    /// the merged configuration is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        config.validate()?;
        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(source_dir) = &settings.source_dir {
            self.site_resolved.source_dir.clone_from(source_dir);
        }
        if let Some(output_dir) = &settings.output_dir {
            self.site_resolved.output_dir.clone_from(output_dir);
        }
        if let Some(repo_base) = &settings.repo_base {
            self.remote_resolved.repo_base.clone_from(repo_base);
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        Self {
            site: SiteConfigRaw::default(),
            remote: RemoteConfigRaw::default(),
            output: OutputConfig::default(),
            page: PageDefaults::default(),
            render: RenderConfig::default(),
            books: BooksConfig::default(),
            assets: AssetsConfig::default(),
            site_resolved: SiteConfig {
                source_dir: base.join("src"),
                output_dir: base.join("build"),
            },
            remote_resolved: RemoteConfig::default(),
            config_path: None,
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        // Expand environment variables before path resolution
        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_remote()?;
        self.validate_output()?;
        self.validate_render()?;
        require_non_zero(self.books.wait_interval_ms, "books.wait_interval_ms")?;
        require_non_zero(self.books.wait_timeout_secs, "books.wait_timeout_secs")?;
        Ok(())
    }

    fn validate_remote(&self) -> Result<(), ConfigError> {
        let remote = &self.remote_resolved;
        if !remote.repo_base.is_empty() {
            require_http_url(&remote.repo_base, "remote.repo_base")?;
        }
        require_non_zero(remote.timeout.as_secs(), "remote.timeout_secs")?;
        Ok(())
    }

    fn validate_output(&self) -> Result<(), ConfigError> {
        let names = [
            (&self.output.md_file, "output.md_file"),
            (&self.output.cfg_file, "output.cfg_file"),
            (&self.output.page_file, "output.page_file"),
            (&self.output.otp_file, "output.otp_file"),
        ];
        for (i, (name, field)) in names.iter().enumerate() {
            require_non_empty(name, field)?;
            if names[..i].iter().any(|(other, _)| other == name) {
                return Err(ConfigError::Validation(format!(
                    "{field} duplicates another output filename: {name}"
                )));
            }
        }
        Ok(())
    }

    fn validate_render(&self) -> Result<(), ConfigError> {
        if !(1..=6).contains(&self.render.toc_max_depth) {
            return Err(ConfigError::Validation(
                "render.toc_max_depth must be between 1 and 6".to_owned(),
            ));
        }
        require_non_empty(&self.render.highlight_theme, "render.highlight_theme")?;
        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.remote.repo_base =
            expand::expand_env_opt(self.remote.repo_base.as_deref(), "remote.repo_base")?;
        self.remote.mirror_dir =
            expand::expand_env_opt(self.remote.mirror_dir.as_deref(), "remote.mirror_dir")?;
        Ok(())
    }

    /// Resolve relative paths to absolute paths based on config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        let resolve = |path: Option<&str>, default: &str| config_dir.join(path.unwrap_or(default));

        self.site_resolved = SiteConfig {
            source_dir: resolve(self.site.source_dir.as_deref(), "src"),
            output_dir: resolve(self.site.output_dir.as_deref(), "build"),
        };

        let defaults = RemoteConfig::default();
        self.remote_resolved = RemoteConfig {
            repo_base: self.remote.repo_base.clone().unwrap_or_default(),
            src_dir: self.remote.src_dir.clone().unwrap_or_default(),
            mirror_dir: self.remote.mirror_dir.as_deref().map(|d| config_dir.join(d)),
            timeout: self
                .remote
                .timeout_secs
                .map_or(defaults.timeout, Duration::from_secs),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default_with_base(Path::new("/test"));
        assert_eq!(config.site_resolved.source_dir, PathBuf::from("/test/src"));
        assert_eq!(config.site_resolved.output_dir, PathBuf::from("/test/build"));
        assert_eq!(config.output.md_file, "index.md");
        assert_eq!(config.output.cfg_file, "config.json");
        assert_eq!(config.output.page_file, "page.html");
        assert_eq!(config.output.otp_file, "otp.html");
        assert_eq!(config.render.toc_max_depth, 2);
        assert_eq!(config.render.highlight_theme, "InspiredGitHub");
        assert_eq!(config.books.wait_interval(), Duration::from_secs(1));
        assert_eq!(config.remote_resolved.timeout, Duration::from_secs(30));
        assert!(config.remote_resolved.mirror_dir.is_none());
        assert!(!config.page.has_edit_btn);
        assert!(config.assets.minify);
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.render.toc_max_depth, 2);
        assert_eq!(config.books.wait_timeout_secs, 10);
    }

    #[test]
    fn test_parse_assets_section() {
        let config: Config = toml::from_str("[assets]\nminify = false\n").unwrap();
        assert!(!config.assets.minify);
    }

    #[test]
    fn test_parse_page_and_render_sections() {
        let toml = r#"
[page]
has_edit_btn = true

[render]
toc_max_depth = 3
highlight_theme = "Solarized (light)"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert!(config.page.has_edit_btn);
        assert!(!config.page.has_refresh_btn);
        assert_eq!(config.render.toc_max_depth, 3);
        assert_eq!(config.render.highlight_theme, "Solarized (light)");
    }

    #[test]
    fn test_resolve_paths() {
        let toml = r#"
[site]
source_dir = "docs"
output_dir = "public"

[remote]
repo_base = "https://raw.example.com/lang/master/"
src_dir = "docs/"
mirror_dir = "../lang"
timeout_secs = 5
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.resolve_paths(Path::new("/project"));

        assert_eq!(config.site_resolved.source_dir, PathBuf::from("/project/docs"));
        assert_eq!(
            config.site_resolved.output_dir,
            PathBuf::from("/project/public")
        );
        assert_eq!(
            config.remote_resolved.repo_base,
            "https://raw.example.com/lang/master/"
        );
        assert_eq!(config.remote_resolved.src_dir, "docs/");
        assert_eq!(
            config.remote_resolved.mirror_dir,
            Some(PathBuf::from("/project/../lang"))
        );
        assert_eq!(config.remote_resolved.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_load_explicit_missing_file() {
        let result = Config::load(Some(Path::new("/nonexistent/folio.toml")), None);
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_load_from_file_resolves_against_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("folio.toml");
        std::fs::write(&path, "[site]\nsource_dir = \"pages\"\n").unwrap();

        let config = Config::load(Some(&path), None).unwrap();

        assert_eq!(config.site_resolved.source_dir, dir.path().join("pages"));
        assert_eq!(config.site_resolved.output_dir, dir.path().join("build"));
        assert_eq!(config.config_path, Some(path));
    }

    #[test]
    fn test_load_rejects_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("folio.toml");
        std::fs::write(&path, "[site\n").unwrap();

        let result = Config::load(Some(&path), None);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_apply_cli_settings() {
        let mut config = Config::default_with_base(Path::new("/test"));
        let settings = CliSettings {
            source_dir: Some(PathBuf::from("/custom/src")),
            output_dir: Some(PathBuf::from("/custom/out")),
            repo_base: Some("https://cli.example.com/".to_owned()),
        };
        config.apply_cli_settings(&settings);

        assert_eq!(
            config.site_resolved.source_dir,
            PathBuf::from("/custom/src")
        );
        assert_eq!(
            config.site_resolved.output_dir,
            PathBuf::from("/custom/out")
        );
        assert_eq!(config.remote_resolved.repo_base, "https://cli.example.com/");
    }

    #[test]
    fn test_apply_cli_settings_empty() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.apply_cli_settings(&CliSettings::default());
        assert_eq!(config.site_resolved.source_dir, PathBuf::from("/test/src"));
        assert!(config.remote_resolved.repo_base.is_empty());
    }

    #[test]
    fn test_expand_env_vars_remote() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("FOLIO_CFG_TEST_BASE", "https://raw.example.com/");
        }

        let toml = r#"
[remote]
repo_base = "${FOLIO_CFG_TEST_BASE}"
mirror_dir = "${FOLIO_CFG_TEST_MIRROR:-../mirror}"
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.expand_env_vars().unwrap();

        assert_eq!(
            config.remote.repo_base.as_deref(),
            Some("https://raw.example.com/")
        );
        assert_eq!(config.remote.mirror_dir.as_deref(), Some("../mirror"));

        unsafe {
            std::env::remove_var("FOLIO_CFG_TEST_BASE");
        }
    }

    #[test]
    fn test_expand_env_vars_missing_required_var() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("FOLIO_CFG_TEST_MISSING");
        }

        let toml = r#"
[remote]
repo_base = "${FOLIO_CFG_TEST_MISSING}"
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        let err = config.expand_env_vars().unwrap_err();

        assert!(matches!(err, ConfigError::EnvVar { .. }));
        assert!(err.to_string().contains("remote.repo_base"));
    }

    /// Assert that validation fails with expected substrings in the error message.
    fn assert_validation_error(config: &Config, expected_substrings: &[&str]) {
        let err = config.validate().unwrap_err();
        assert!(
            matches!(err, ConfigError::Validation(_)),
            "Expected ConfigError::Validation, got {err:?}"
        );
        let msg = err.to_string();
        for s in expected_substrings {
            assert!(
                msg.contains(s),
                "Expected error to contain '{s}', got: {msg}"
            );
        }
    }

    #[test]
    fn test_validate_default_config_passes() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_repo_base_scheme() {
        let mut config = Config::default();
        config.remote_resolved.repo_base = "ftp://example.com/".to_owned();
        assert_validation_error(&config, &["remote.repo_base", "http"]);
    }

    #[test]
    fn test_validate_timeout_zero() {
        let mut config = Config::default();
        config.remote_resolved.timeout = Duration::ZERO;
        assert_validation_error(&config, &["remote.timeout_secs"]);
    }

    #[test]
    fn test_validate_toc_depth_bounds() {
        let mut config = Config::default();
        config.render.toc_max_depth = 0;
        assert_validation_error(&config, &["render.toc_max_depth"]);
        config.render.toc_max_depth = 7;
        assert_validation_error(&config, &["render.toc_max_depth"]);
    }

    #[test]
    fn test_validate_output_names_distinct() {
        let mut config = Config::default();
        config.output.otp_file = "page.html".to_owned();
        assert_validation_error(&config, &["output.otp_file", "page.html"]);
    }

    #[test]
    fn test_validate_output_name_empty() {
        let mut config = Config::default();
        config.output.cfg_file = String::new();
        assert_validation_error(&config, &["output.cfg_file", "empty"]);
    }

    #[test]
    fn test_validate_books_wait_interval_zero() {
        let mut config = Config::default();
        config.books.wait_interval_ms = 0;
        assert_validation_error(&config, &["books.wait_interval_ms"]);
    }
}
