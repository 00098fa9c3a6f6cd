pub mod empty_folders;
pub mod old_files;

pub use empty_folders::EmptyFolders;
pub use old_files::{Cutoff, OldFiles};
