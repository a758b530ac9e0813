//! `folio build` command implementation.

use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use folio_config::{CliSettings, Config};
use folio_site::SiteBuilder;

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the build command.
#[derive(Args)]
pub(crate) struct BuildArgs {
    /// Path to configuration file (default: auto-discover folio.toml).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Markdown source directory (overrides config).
    #[arg(short, long)]
    pub source_dir: Option<PathBuf>,

    /// Output directory (overrides config).
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Base URL of the upstream repository (overrides config).
    #[arg(long, env = "FOLIO_REPO_BASE")]
    pub repo_base: Option<String>,

    /// Enable verbose output (per-document progress logs).
    #[arg(short, long)]
    pub verbose: bool,
}

impl BuildArgs {
    /// Execute the build command.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or any document
    /// fails to build.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            source_dir: self.source_dir,
            output_dir: self.output_dir,
            repo_base: self.repo_base,
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;

        if let Some(path) = &config.config_path {
            output.field("Config", &path.display().to_string());
        }
        output.field("Source", &config.site_resolved.source_dir.display().to_string());
        output.field("Output", &config.site_resolved.output_dir.display().to_string());

        let started = Instant::now();
        let report = SiteBuilder::new(&config).build()?;

        output.success(&format!(
            "Built {} documents, copied {} assets in {:.2?}",
            report.documents,
            report.assets,
            started.elapsed()
        ));
        if report.documents == 0 {
            output.info("No documents found; check the source directory");
        }
        Ok(())
    }
}
