//! Minification of base pages and static `.css`/`.js` assets.

use std::path::Path;

use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};

/// Error minifying one asset.
#[derive(Debug, thiserror::Error)]
pub enum MinifyError {
    #[error("invalid stylesheet: {0}")]
    Css(String),
    #[error("invalid script: {0}")]
    Js(String),
}

/// Minify an HTML page, including its inline styles and scripts.
#[must_use]
pub fn minify_page(source: &[u8]) -> Vec<u8> {
    let cfg = minify_html::Cfg {
        minify_css: true,
        minify_js: true,
        ..minify_html::Cfg::default()
    };
    minify_html::minify(source, &cfg)
}

/// Minify a stylesheet.
pub fn minify_stylesheet(source: &str) -> Result<String, MinifyError> {
    let mut sheet = StyleSheet::parse(source, ParserOptions::default())
        .map_err(|e| MinifyError::Css(e.to_string()))?;
    sheet
        .minify(MinifyOptions::default())
        .map_err(|e| MinifyError::Css(e.to_string()))?;
    let printed = sheet
        .to_css(PrinterOptions {
            minify: true,
            ..PrinterOptions::default()
        })
        .map_err(|e| MinifyError::Css(e.to_string()))?;
    Ok(printed.code)
}

/// Minify a classic (non-module) script. Top-level names are kept.
pub fn minify_script(source: &[u8]) -> Result<Vec<u8>, MinifyError> {
    let session = minify_js::Session::new();
    let mut out = Vec::with_capacity(source.len());
    minify_js::minify(&session, minify_js::TopLevelMode::Global, source, &mut out)
        .map_err(|e| MinifyError::Js(format!("{e:?}")))?;
    Ok(out)
}

/// Minified content of the asset at `path`, or `None` for kinds that are
/// copied verbatim.
pub fn minify_asset(path: &Path, source: &[u8]) -> Option<Result<Vec<u8>, MinifyError>> {
    match path.extension()?.to_str()? {
        "css" => Some(
            std::str::from_utf8(source)
                .map_err(|e| MinifyError::Css(e.to_string()))
                .and_then(minify_stylesheet)
                .map(String::into_bytes),
        ),
        "js" => Some(minify_script(source)),
        _ => None,
    }
}
