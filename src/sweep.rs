use crate::cleaner::{Cleaner, Event, EventSink, PruneResult, Session, Step, SweepResult};
use crate::passes::{Cutoff, EmptyFolders, OldFiles};
use std::path::{Path, PathBuf};
use log::{info, warn};

/// Settings that stay fixed for a whole run.
#[derive(Debug, Clone, Copy)]
pub struct CleanupConfig {
    pub cutoff: Cutoff,
    pub dry_run: bool,
}

/// Totals across every root plus the event lines in the order they were
/// produced.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CleanupReport {
    pub dry_run: bool,
    pub empty_folders_total: u64,
    pub old_files_total: u64,
    pub bytes_freed_total: u64,
    pub lines: Vec<String>,
}

impl CleanupReport {
    fn add_prune(&mut self, result: PruneResult) {
        self.empty_folders_total += result.folders_removed;
    }

    fn add_sweep(&mut self, result: SweepResult) {
        self.old_files_total += result.files_removed;
        self.bytes_freed_total += result.bytes_freed;
    }
}

/// Clean every root in order: prune empty folders, sweep old files, then
/// prune the folders the sweep emptied.
///
/// Roots that are not directories are reported and skipped. Roots
/// themselves are never removed.
pub fn run(roots: &[PathBuf], config: &CleanupConfig, sink: &mut dyn EventSink) -> CleanupReport {
    let mut report = CleanupReport {
        dry_run: config.dry_run,
        ..CleanupReport::default()
    };
    let mut session = Session::new(config.dry_run, sink);
    let pruner = EmptyFolders;
    let sweeper = OldFiles::new(config.cutoff);

    for root in roots {
        if !root.is_dir() || session.is_removed(root) {
            warn!("skipping {}: not a directory", root.display());
            session.emit(Event::MissingRoot(root.clone()));
            continue;
        }

        info!("processing {}", root.display());
        session.emit(Event::RootStarted(root.clone()));

        session.emit(Event::Step(Step::PruneEmpty));
        report.add_prune(run_pass(&pruner, root, &mut session));

        session.emit(Event::Step(Step::SweepOld {
            max_age_months: config.cutoff.max_age_months(),
        }));
        report.add_sweep(run_pass(&sweeper, root, &mut session));

        session.emit(Event::Step(Step::PruneEmptied));
        report.add_prune(run_pass(&pruner, root, &mut session));
    }

    report.lines = session.into_lines();
    report
}

fn run_pass<C: Cleaner>(cleaner: &C, root: &Path, session: &mut Session<'_>) -> C::Outcome {
    let outcome = cleaner.clean(root, session);
    info!("{} in {}: {outcome}", cleaner.label(), root.display());
    outcome
}
