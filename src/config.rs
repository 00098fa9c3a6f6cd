use crate::error::{Result, SweepError};
use crate::output::Format;
use crate::passes::Cutoff;
use crate::sweep::CleanupConfig;
use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};

/// User configuration loaded from `<config dir>/oldsweep/config.toml`.
///
/// All fields have defaults so the file is optional. A run that deletes
/// anything needs `dry_run = false` here or `--confirm` on the command line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub folders: Vec<PathBuf>,
    #[serde(default = "default_max_age_months")]
    pub max_age_months: u32,
    #[serde(default = "default_dry_run")]
    pub dry_run: bool,
    #[serde(default)]
    pub format: Format,
}

fn default_max_age_months() -> u32 {
    12
}

fn default_dry_run() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            folders: Vec::new(),
            max_age_months: default_max_age_months(),
            dry_run: default_dry_run(),
            format: Format::default(),
        }
    }
}

impl Config {
    /// Load `explicit` if given (it must exist), else the default location
    /// if a file is there, else defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::read(path);
        }
        match Self::config_path() {
            Some(path) if path.exists() => Self::read(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("oldsweep").join("config.toml"))
    }

    fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| SweepError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, path)
    }

    fn parse(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|source| SweepError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn roots(&self) -> Result<&[PathBuf]> {
        if self.folders.is_empty() {
            return Err(SweepError::NoRoots);
        }
        Ok(&self.folders)
    }

    /// Validate and fix the cutoff. Runs before anything is deleted.
    pub fn cleanup_config(&self) -> Result<CleanupConfig> {
        Ok(CleanupConfig {
            cutoff: Cutoff::months_ago(self.max_age_months)?,
            dry_run: self.dry_run,
        })
    }
}
