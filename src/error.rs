use std::path::PathBuf;

/// Errors that stop a run before anything is touched on disk.
///
/// Per-file and per-directory failures during a run are not errors: they are
/// reported as events and the traversal carries on.
#[derive(Debug, thiserror::Error)]
pub enum SweepError {
    #[error("max age must be at least one month (got {0})")]
    InvalidMaxAge(u32),

    #[error("cannot compute a cutoff {0} months before now")]
    CutoffOutOfRange(u32),

    #[error("no folders to clean (pass them as arguments or list them in the config file)")]
    NoRoots,

    #[error("failed to read config file {}: {source}", .path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {}: {source}", .path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

pub type Result<T> = std::result::Result<T, SweepError>;
