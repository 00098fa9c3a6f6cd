//! `oldsweep` removes files older than a retention age from a set of folders
//! and prunes the folders left empty, reporting every step as it goes.
//!
//! Each root is handled in three passes: prune empty folders, sweep old
//! files, prune again. Dry runs report exactly what a live run would do.

pub mod cleaner;
pub mod cli;
pub mod config;
pub mod error;
pub mod output;
pub mod passes;
pub mod sweep;
pub mod utils;

pub use cleaner::{Event, EventSink, PruneResult, SweepResult};
pub use config::Config;
pub use error::{Result, SweepError};
pub use passes::Cutoff;
pub use sweep::{run, CleanupConfig, CleanupReport};
