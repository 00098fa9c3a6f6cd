use crate::cleaner::{Cleaner, Event, Session, SweepResult};
use crate::error::{Result, SweepError};
use std::fs;
use std::path::Path;
use std::time::SystemTime;
use chrono::{DateTime, Local, LocalResult, Months, Utc};
use log::debug;
use walkdir::WalkDir;

/// The moment before which a file counts as old.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cutoff {
    instant: DateTime<Local>,
    max_age_months: u32,
}

impl Cutoff {
    pub fn months_ago(max_age_months: u32) -> Result<Self> {
        Self::months_before(Local::now(), max_age_months)
    }

    /// Calendar months, not multiples of 30 days: one month before March 31
    /// is the last day of February.
    ///
    /// The subtraction happens on the wall clock. A result that falls in a
    /// DST overlap takes the earlier instant; one that falls in a DST gap is
    /// computed in UTC instead, which lands next to the gap.
    pub fn months_before(now: DateTime<Local>, max_age_months: u32) -> Result<Self> {
        if max_age_months == 0 {
            return Err(SweepError::InvalidMaxAge(max_age_months));
        }
        let months = Months::new(max_age_months);
        let wall_clock = now
            .naive_local()
            .checked_sub_months(months)
            .ok_or(SweepError::CutoffOutOfRange(max_age_months))?;
        let instant = match wall_clock.and_local_timezone(Local) {
            LocalResult::Single(instant) => instant,
            LocalResult::Ambiguous(earliest, _) => earliest,
            LocalResult::None => now
                .with_timezone(&Utc)
                .checked_sub_months(months)
                .ok_or(SweepError::CutoffOutOfRange(max_age_months))?
                .with_timezone(&Local),
        };
        Ok(Self {
            instant,
            max_age_months,
        })
    }

    pub fn instant(&self) -> DateTime<Local> {
        self.instant
    }

    pub fn max_age_months(&self) -> u32 {
        self.max_age_months
    }

    /// Strictly before the cutoff. A file modified exactly at the cutoff
    /// is kept.
    pub fn is_expired(&self, modified: SystemTime) -> bool {
        DateTime::<Local>::from(modified) < self.instant
    }
}

/// Deletes regular files last modified before the cutoff. Never touches
/// folders.
pub struct OldFiles {
    cutoff: Cutoff,
}

impl OldFiles {
    pub fn new(cutoff: Cutoff) -> Self {
        Self { cutoff }
    }

    pub fn sweep(&self, path: &Path, session: &mut Session<'_>) -> SweepResult {
        let mut result = SweepResult::default();
        if !path.is_dir() {
            return result;
        }

        let walker = WalkDir::new(path)
            .follow_links(false)
            .contents_first(true)
            .sort_by_file_name();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let failed = e.path().unwrap_or(path).to_path_buf();
                    session.unreadable(&failed, e);
                    continue;
                }
            };

            if !entry.file_type().is_file() || session.is_removed(entry.path()) {
                continue;
            }

            // Single metadata call for size and mtime
            let meta = match entry.metadata() {
                Ok(m) => m,
                Err(e) => {
                    session.unreadable(entry.path(), e);
                    continue;
                }
            };
            let modified = match meta.modified() {
                Ok(t) => t,
                Err(e) => {
                    session.unreadable(entry.path(), e);
                    continue;
                }
            };

            if !self.cutoff.is_expired(modified) {
                debug!("keeping {}: recent enough", entry.path().display());
                continue;
            }

            let size = meta.len();
            session.emit(Event::OldFile {
                path: entry.path().to_path_buf(),
                modified: modified.into(),
                size,
            });
            if session.remove(entry.path(), |p| fs::remove_file(p)) {
                result.files_removed += 1;
                result.bytes_freed += size;
            }
        }

        result
    }
}

impl Cleaner for OldFiles {
    type Outcome = SweepResult;

    fn label(&self) -> &'static str {
        "Old Files"
    }

    fn clean(&self, root: &Path, session: &mut Session<'_>) -> SweepResult {
        self.sweep(root, session)
    }
}
