use crate::cleaner::{Cleaner, Event, PruneResult, Session};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use log::debug;

/// Removes folders with no entries left, deepest first.
///
/// A folder holding only files is never empty. Symlinks count as entries and
/// are never followed.
pub struct EmptyFolders;

impl EmptyFolders {
    /// Prune `path` and everything below it, `path` included.
    pub fn prune(&self, path: &Path, session: &mut Session<'_>) -> PruneResult {
        if !path.is_dir() {
            return PruneResult::default();
        }
        self.prune_dir(path, session)
    }

    /// Prune everything below `root` but leave `root` itself in place.
    pub fn prune_contents(&self, root: &Path, session: &mut Session<'_>) -> PruneResult {
        if !root.is_dir() {
            return PruneResult::default();
        }
        self.prune_children(root, session).unwrap_or_default()
    }

    fn prune_dir(&self, path: &Path, session: &mut Session<'_>) -> PruneResult {
        let Some(mut result) = self.prune_children(path, session) else {
            return PruneResult::default();
        };

        // Recursion may just have removed subfolders: list again.
        match remaining_entries(path, session) {
            Ok(0) => {
                session.emit(Event::EmptyFolder(path.to_path_buf()));
                if session.remove(path, |p| fs::remove_dir(p)) {
                    result.folders_removed += 1;
                }
            }
            Ok(n) => debug!("keeping {}: {n} entries left", path.display()),
            Err(e) => session.unreadable(path, e),
        }
        result
    }

    /// `None` when `path` could not be listed.
    fn prune_children(&self, path: &Path, session: &mut Session<'_>) -> Option<PruneResult> {
        let subdirs = subdirectories(path, session)?;
        let mut result = PruneResult::default();
        for dir in subdirs {
            result += self.prune_dir(&dir, session);
        }
        Some(result)
    }
}

impl Cleaner for EmptyFolders {
    type Outcome = PruneResult;

    fn label(&self) -> &'static str {
        "Empty Folders"
    }

    fn clean(&self, root: &Path, session: &mut Session<'_>) -> PruneResult {
        self.prune_contents(root, session)
    }
}

/// Direct subfolders of `path` in name order, minus any a dry run already
/// removed.
fn subdirectories(path: &Path, session: &mut Session<'_>) -> Option<Vec<PathBuf>> {
    let entries = match fs::read_dir(path) {
        Ok(rd) => rd,
        Err(e) => {
            session.unreadable(path, e);
            return None;
        }
    };

    let mut dirs = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                session.unreadable(path, e);
                continue;
            }
        };
        match entry.file_type() {
            Ok(ft) if ft.is_dir() => {
                let dir = entry.path();
                if !session.is_removed(&dir) {
                    dirs.push(dir);
                }
            }
            Ok(_) => {}
            Err(e) => session.unreadable(&entry.path(), e),
        }
    }
    dirs.sort();
    Some(dirs)
}

/// Fresh count of the entries in `path` that still exist.
fn remaining_entries(path: &Path, session: &Session<'_>) -> io::Result<usize> {
    let mut count = 0;
    for entry in fs::read_dir(path)? {
        if !session.is_removed(&entry?.path()) {
            count += 1;
        }
    }
    Ok(count)
}
