//! Writing a materialized page to its output directory.

use std::io::{ErrorKind, Write};
use std::path::Path;

use folio_config::OutputConfig;
use tempfile::NamedTempFile;

use crate::page::{PageError, PageOutput};

/// Write the page triple into `dir`.
///
/// Each file is written to a temporary file next to its target and renamed
/// into place. The config goes last, so a readable config means the whole
/// triple is there. Without an outline any earlier outline file is removed.
pub fn write_output(dir: &Path, files: &OutputConfig, page: &PageOutput) -> Result<(), PageError> {
    std::fs::create_dir_all(dir).map_err(|e| PageError::io(dir, e))?;

    let otp_path = dir.join(&files.otp_file);
    match &page.otp {
        Some(otp) => write_atomic(&otp_path, otp.as_bytes())?,
        None => match std::fs::remove_file(&otp_path) {
            Ok(()) => tracing::debug!(path = %otp_path.display(), "Removed stale outline"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(PageError::io(&otp_path, e)),
        },
    }

    write_atomic(&dir.join(&files.page_file), page.body.as_bytes())?;

    let config = page.config.to_json_pretty()?;
    write_atomic(&dir.join(&files.cfg_file), config.as_bytes())
}

fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), PageError> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut file = NamedTempFile::new_in(dir).map_err(|e| PageError::io(dir, e))?;
    file.write_all(contents)
        .map_err(|e| PageError::io(file.path(), e))?;
    file.persist(path)
        .map_err(|e| PageError::io(path, e.error))?;
    Ok(())
}
