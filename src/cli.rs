use crate::config::Config;
use crate::output::Format;
use std::path::PathBuf;
use clap::{ArgAction, Parser};

#[derive(Debug, Parser)]
#[command(
    name = "oldsweep",
    about = "Delete files older than a retention age and prune the empty folders left behind",
    version
)]
pub struct Cli {
    /// Folders to clean (replaces the folders listed in the config file)
    pub roots: Vec<PathBuf>,

    /// Config file to use instead of the default location
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Delete files not modified for this many calendar months
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_age_months: Option<u32>,

    /// Actually delete files and folders. Without it nothing is touched.
    #[arg(long, conflicts_with = "dry_run")]
    pub confirm: bool,

    /// Only report what would be deleted, even if the config says otherwise
    #[arg(long)]
    pub dry_run: bool,

    /// Output format
    #[arg(long, value_enum)]
    pub format: Option<Format>,

    /// Disable coloured output
    #[arg(long)]
    pub no_color: bool,

    /// Log traversal details to stderr
    #[arg(short, long, action = ArgAction::SetTrue)]
    pub verbose: bool,
}

impl Cli {
    /// Command-line flags win over the config file.
    pub fn apply(&self, config: &mut Config) {
        if !self.roots.is_empty() {
            config.folders = self.roots.clone();
        }
        if let Some(months) = self.max_age_months {
            config.max_age_months = months;
        }
        if self.confirm {
            config.dry_run = false;
        }
        if self.dry_run {
            config.dry_run = true;
        }
        if let Some(format) = self.format {
            config.format = format;
        }
    }
}
