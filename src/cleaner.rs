use crate::utils;
use std::collections::HashSet;
use std::fmt;
use std::io;
use std::ops::AddAssign;
use std::path::{Path, PathBuf};
use chrono::{DateTime, Local};
use log::{debug, warn};

/// Folders removed (or removable, in a dry run) by one prune pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PruneResult {
    pub folders_removed: u64,
}

impl AddAssign for PruneResult {
    fn add_assign(&mut self, rhs: Self) {
        self.folders_removed += rhs.folders_removed;
    }
}

impl fmt::Display for PruneResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} empty folders", self.folders_removed)
    }
}

/// Files removed (or removable) by one sweep, and their combined size.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepResult {
    pub files_removed: u64,
    pub bytes_freed: u64,
}

impl AddAssign for SweepResult {
    fn add_assign(&mut self, rhs: Self) {
        self.files_removed += rhs.files_removed;
        self.bytes_freed += rhs.bytes_freed;
    }
}

impl fmt::Display for SweepResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} old files, {}",
            self.files_removed,
            utils::format_size(self.bytes_freed)
        )
    }
}

/// The three steps run against every root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    PruneEmpty,
    SweepOld { max_age_months: u32 },
    PruneEmptied,
}

impl Step {
    pub fn number(&self) -> u8 {
        match self {
            Step::PruneEmpty => 1,
            Step::SweepOld { .. } => 2,
            Step::PruneEmptied => 3,
        }
    }

    pub fn description(&self) -> String {
        match self {
            Step::PruneEmpty => "Removing empty folders...".to_string(),
            Step::SweepOld { max_age_months } => {
                format!("Removing files older than {max_age_months} months...")
            }
            Step::PruneEmptied => "Removing newly empty folders...".to_string(),
        }
    }
}

/// Short marker printed in front of an event line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Warning,
    Step(u8),
    Empty,
    Old,
    Error,
    Unreadable,
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tag::Warning => f.write_str("[WARNING]"),
            Tag::Step(n) => write!(f, "[Step {n}]"),
            Tag::Empty => f.write_str("[EMPTY]"),
            Tag::Old => f.write_str("[OLD]"),
            Tag::Error => f.write_str("[ERROR]"),
            Tag::Unreadable => f.write_str("[UNREADABLE]"),
        }
    }
}

/// Something that happened during a run, in the order it happened.
///
/// Candidate events (`EmptyFolder`, `OldFile`) are emitted the same way in
/// dry and live runs; only live runs can produce `RemoveFailed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    MissingRoot(PathBuf),
    RootStarted(PathBuf),
    Step(Step),
    EmptyFolder(PathBuf),
    OldFile {
        path: PathBuf,
        modified: DateTime<Local>,
        size: u64,
    },
    RemoveFailed {
        path: PathBuf,
        reason: String,
    },
    Unreadable {
        path: PathBuf,
        reason: String,
    },
}

impl Event {
    pub fn tag(&self) -> Option<Tag> {
        match self {
            Event::MissingRoot(_) => Some(Tag::Warning),
            Event::RootStarted(_) => None,
            Event::Step(step) => Some(Tag::Step(step.number())),
            Event::EmptyFolder(_) => Some(Tag::Empty),
            Event::OldFile { .. } => Some(Tag::Old),
            Event::RemoveFailed { .. } => Some(Tag::Error),
            Event::Unreadable { .. } => Some(Tag::Unreadable),
        }
    }

    /// The line without its tag or indentation.
    pub fn message(&self) -> String {
        match self {
            Event::MissingRoot(path) => format!("Folder does not exist: {}", path.display()),
            Event::RootStarted(path) => format!("Processing: {}", path.display()),
            Event::Step(step) => step.description(),
            Event::EmptyFolder(path) => path.display().to_string(),
            Event::OldFile {
                path,
                modified,
                size,
            } => format!(
                "{} (modified: {}, size: {})",
                path.display(),
                modified.format("%Y-%m-%d"),
                utils::format_size(*size)
            ),
            Event::RemoveFailed { path, reason } => {
                format!("Failed to delete: {} ({reason})", path.display())
            }
            Event::Unreadable { path, reason } => {
                format!("Cannot read: {} ({reason})", path.display())
            }
        }
    }

    /// Per-item events are indented under their step header.
    pub fn is_item(&self) -> bool {
        matches!(
            self,
            Event::EmptyFolder(_)
                | Event::OldFile { .. }
                | Event::RemoveFailed { .. }
                | Event::Unreadable { .. }
        )
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_item() {
            f.write_str("  ")?;
        }
        if let Some(tag) = self.tag() {
            write!(f, "{tag} ")?;
        }
        f.write_str(&self.message())
    }
}

/// Receives events synchronously, as soon as they are produced.
pub trait EventSink {
    fn emit(&mut self, event: &Event);
}

impl<F: FnMut(&Event)> EventSink for F {
    fn emit(&mut self, event: &Event) {
        self(event)
    }
}

/// State shared by the passes of a single run.
///
/// Records every event line and, in a dry run, the paths the run pretended
/// to delete so later passes see the tree as a live run would have left it.
pub struct Session<'a> {
    dry_run: bool,
    removed: HashSet<PathBuf>,
    lines: Vec<String>,
    sink: &'a mut dyn EventSink,
}

impl<'a> Session<'a> {
    pub fn new(dry_run: bool, sink: &'a mut dyn EventSink) -> Self {
        Self {
            dry_run,
            removed: HashSet::new(),
            lines: Vec::new(),
            sink,
        }
    }

    pub fn emit(&mut self, event: Event) {
        self.lines.push(event.to_string());
        self.sink.emit(&event);
    }

    pub fn unreadable(&mut self, path: &Path, reason: impl fmt::Display) {
        warn!("cannot read {}: {reason}", path.display());
        self.emit(Event::Unreadable {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        });
    }

    /// Removes `path` with `remove`, or only records it in a dry run.
    /// Returns whether the removal counts as done.
    pub fn remove(
        &mut self,
        path: &Path,
        remove: impl FnOnce(&Path) -> io::Result<()>,
    ) -> bool {
        if self.dry_run {
            debug!("dry run: would remove {}", path.display());
            self.removed.insert(path.to_path_buf());
            return true;
        }
        match remove(path) {
            Ok(()) => {
                debug!("removed {}", path.display());
                true
            }
            Err(e) => {
                warn!("failed to remove {}: {e}", path.display());
                self.emit(Event::RemoveFailed {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                });
                false
            }
        }
    }

    /// True if a dry run already pretended to delete `path`.
    pub fn is_removed(&self, path: &Path) -> bool {
        self.removed.contains(path)
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }
}

/// One pass over a root directory.
pub trait Cleaner {
    type Outcome: fmt::Display;

    /// Human-readable label used in logs (e.g. "Empty Folders").
    fn label(&self) -> &'static str;

    /// Run the pass over `root`. Failures on individual entries are
    /// reported through the session and never abort the pass.
    fn clean(&self, root: &Path, session: &mut Session<'_>) -> Self::Outcome;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn event_lines_match_their_tags() {
        let modified = Local.with_ymd_and_hms(2023, 5, 17, 12, 0, 0).unwrap();
        let old = Event::OldFile {
            path: PathBuf::from("/data/a/old.txt"),
            modified,
            size: 100,
        };
        assert_eq!(
            old.to_string(),
            "  [OLD] /data/a/old.txt (modified: 2023-05-17, size: 100 B)"
        );
        assert_eq!(
            Event::EmptyFolder(PathBuf::from("/data/b")).to_string(),
            "  [EMPTY] /data/b"
        );
        assert_eq!(
            Event::MissingRoot(PathBuf::from("/nope")).to_string(),
            "[WARNING] Folder does not exist: /nope"
        );
        assert_eq!(
            Event::Step(Step::SweepOld { max_age_months: 12 }).to_string(),
            "[Step 2] Removing files older than 12 months..."
        );
        assert_eq!(
            Event::RootStarted(PathBuf::from("/data")).to_string(),
            "Processing: /data"
        );
    }

    #[test]
    fn dry_run_remembers_without_calling_remove() {
        let mut sink = |_: &Event| {};
        let mut session = Session::new(true, &mut sink);
        let path = Path::new("/does/not/matter");

        let counted = session.remove(path, |_| panic!("dry run must not delete"));

        assert!(counted);
        assert!(session.is_removed(path));
        assert!(session.into_lines().is_empty());
    }

    #[test]
    fn failed_removal_is_reported_and_not_counted() {
        let mut seen = Vec::new();
        let mut sink = |event: &Event| seen.push(event.clone());
        let mut session = Session::new(false, &mut sink);
        let path = Path::new("/locked/file.txt");

        let counted = session.remove(path, |_| {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))
        });

        assert!(!counted);
        assert!(!session.is_removed(path));
        let lines = session.into_lines();
        assert_eq!(lines, vec!["  [ERROR] Failed to delete: /locked/file.txt (denied)"]);
        assert!(matches!(seen.as_slice(), [Event::RemoveFailed { .. }]));
    }

    #[test]
    fn results_accumulate() {
        let mut sweep = SweepResult::default();
        sweep += SweepResult {
            files_removed: 2,
            bytes_freed: 300,
        };
        sweep += SweepResult {
            files_removed: 1,
            bytes_freed: 24,
        };
        assert_eq!(sweep.files_removed, 3);
        assert_eq!(sweep.bytes_freed, 324);

        let mut prune = PruneResult::default();
        prune += PruneResult { folders_removed: 4 };
        assert_eq!(prune.folders_removed, 4);
    }
}
