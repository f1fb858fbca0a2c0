//! CLI argument parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::core::settings::DEFAULT_SETTINGS_FILE;

/// Fetch the current SWT release from eclipse.org, verify it, and
/// optionally deploy it to a Maven repository.
#[derive(Parser, Debug)]
#[command(name = "swt-release-fetcher")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Deploy newly downloaded archives to the Maven repository
    #[arg(long)]
    pub deploy: bool,

    /// Enable verbose logging
    #[arg(long)]
    pub debug: bool,

    /// Suppress progress output
    #[arg(long)]
    pub silent: bool,

    /// Skip change detection and always check every archive
    #[arg(long)]
    pub force: bool,

    /// Path to the settings file
    #[arg(long, value_name = "PATH", default_value = DEFAULT_SETTINGS_FILE)]
    pub config: PathBuf,

    /// Directory archives are downloaded into (overrides the settings file)
    #[arg(long, value_name = "DIR")]
    pub download_dir: Option<PathBuf>,
}
