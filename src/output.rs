use crate::cleaner::{Event, EventSink, Tag};
use crate::sweep::{self, CleanupConfig, CleanupReport};
use crate::utils;
use std::fmt::Display;
use std::io::{self, Write};
use std::path::PathBuf;
use colored::Colorize;
use serde::{Deserialize, Serialize};

const RULE_WIDTH: usize = 58;

/// How the report is written to stdout.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    #[default]
    Text,
    Html,
}

/// Writes a run as it happens: a banner, every event, then a summary.
pub trait Presenter: EventSink {
    fn begin(&mut self, config: &CleanupConfig);

    /// Writes the summary. Reports the first write error of the whole run.
    fn finish(&mut self, report: &CleanupReport) -> io::Result<()>;
}

/// Run the cleanup with `presenter` receiving every line as it is produced.
pub fn render<P: Presenter>(
    presenter: &mut P,
    roots: &[PathBuf],
    config: &CleanupConfig,
) -> io::Result<CleanupReport> {
    presenter.begin(config);
    let report = sweep::run(roots, config, presenter);
    presenter.finish(&report)?;
    Ok(report)
}

fn mode_line(dry_run: bool) -> &'static str {
    if dry_run {
        "DRY RUN (no changes will be made)"
    } else {
        "LIVE (files will be deleted!)"
    }
}

/// Label/value rows of the closing summary.
fn summary_rows(report: &CleanupReport) -> [(String, String); 3] {
    let (delete, free) = if report.dry_run {
        ("to delete", "to free")
    } else {
        ("deleted", "freed")
    };
    [
        (
            format!("Empty folders {delete}:"),
            report.empty_folders_total.to_string(),
        ),
        (
            format!("Old files {delete}:"),
            report.old_files_total.to_string(),
        ),
        (
            format!("Space {free}:"),
            utils::format_size(report.bytes_freed_total),
        ),
    ]
}

fn summary_title(dry_run: bool) -> &'static str {
    if dry_run {
        "SUMMARY (DRY RUN)"
    } else {
        "SUMMARY"
    }
}

const DRY_RUN_FOOTER: &str = "This was a dry run. Run again with --confirm to actually delete files.";

/// Line writer that flushes every line and keeps the first error.
struct Lines<W: Write> {
    out: W,
    error: Option<io::Error>,
}

impl<W: Write> Lines<W> {
    fn new(out: W) -> Self {
        Self { out, error: None }
    }

    fn line(&mut self, text: impl Display) {
        if self.error.is_some() {
            return;
        }
        if let Err(e) = writeln!(self.out, "{text}").and_then(|()| self.out.flush()) {
            log::warn!("output stopped: {e}");
            self.error = Some(e);
        }
    }

    fn take_error(&mut self) -> io::Result<()> {
        match self.error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Coloured terminal output.
pub struct TextOutput<W: Write> {
    lines: Lines<W>,
}

impl<W: Write> TextOutput<W> {
    pub fn new(out: W) -> Self {
        Self {
            lines: Lines::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.lines.out
    }

    fn rule(&mut self) {
        self.lines.line("=".repeat(RULE_WIDTH));
    }
}

fn colored_tag(tag: Tag) -> colored::ColoredString {
    let text = tag.to_string();
    match tag {
        Tag::Warning => text.yellow().bold(),
        Tag::Step(_) => text.bold(),
        Tag::Empty => text.dimmed(),
        Tag::Old => text.yellow(),
        Tag::Error | Tag::Unreadable => text.red().bold(),
    }
}

impl<W: Write> EventSink for TextOutput<W> {
    fn emit(&mut self, event: &Event) {
        let message = event.message();
        let indent = if event.is_item() { "  " } else { "" };
        match (event, event.tag()) {
            (Event::RootStarted(_), _) => {
                self.lines.line(message.bold());
                self.lines.line("-".repeat(RULE_WIDTH + 2));
            }
            (Event::Step(_), Some(tag)) => {
                self.lines.line("");
                self.lines.line(format!("{} {message}", colored_tag(tag)));
            }
            (Event::MissingRoot(_), Some(tag)) => {
                self.lines
                    .line(format!("{} {}", colored_tag(tag), message.yellow()));
                self.lines.line("");
            }
            (_, Some(tag)) => {
                self.lines
                    .line(format!("{indent}{} {message}", colored_tag(tag)));
            }
            (_, None) => self.lines.line(format!("{indent}{message}")),
        }
    }
}

impl<W: Write> Presenter for TextOutput<W> {
    fn begin(&mut self, config: &CleanupConfig) {
        self.rule();
        self.lines.line("oldsweep".bold().cyan());
        self.rule();
        let mode = if config.dry_run {
            mode_line(true).blue()
        } else {
            mode_line(false).red().bold()
        };
        self.lines.line(format!("Mode: {mode}"));
        self.lines.line(format!(
            "Cutoff date: {}",
            config.cutoff.instant().format("%Y-%m-%d %H:%M:%S")
        ));
        self.rule();
        self.lines.line("");
    }

    fn finish(&mut self, report: &CleanupReport) -> io::Result<()> {
        self.lines.line("");
        self.rule();
        self.lines.line(summary_title(report.dry_run).bold());
        self.rule();
        for (label, value) in summary_rows(report) {
            self.lines.line(format!("{label:<26} {}", value.green().bold()));
        }
        self.rule();
        if report.dry_run {
            self.lines.line("");
            self.lines.line(DRY_RUN_FOOTER.blue());
        }
        self.lines.take_error()
    }
}

/// A standalone HTML page, streamed one `<br>` line at a time.
pub struct HtmlOutput<W: Write> {
    lines: Lines<W>,
}

impl<W: Write> HtmlOutput<W> {
    pub fn new(out: W) -> Self {
        Self {
            lines: Lines::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.lines.out
    }

    fn line(&mut self, html: impl Display) {
        self.lines.line(format_args!("{html}<br>"));
    }

    fn rule(&mut self) {
        self.line("=".repeat(RULE_WIDTH));
    }
}

fn tag_class(tag: Tag) -> &'static str {
    match tag {
        Tag::Warning => "warning",
        Tag::Step(_) => "step",
        Tag::Empty => "empty",
        Tag::Old => "old",
        Tag::Error | Tag::Unreadable => "error",
    }
}

impl<W: Write> EventSink for HtmlOutput<W> {
    fn emit(&mut self, event: &Event) {
        let message = utils::escape_html(&event.message());
        let indent = if event.is_item() { "&nbsp;&nbsp;" } else { "" };
        match (event, event.tag()) {
            (Event::RootStarted(_), _) => {
                self.line(format_args!("<b>{message}</b>"));
                self.line("-".repeat(RULE_WIDTH + 2));
            }
            (Event::Step(_), Some(tag)) => {
                self.line("");
                self.line(format_args!("<b>{tag}</b> {message}"));
            }
            (_, Some(tag)) => {
                self.line(format_args!(
                    "{indent}<span class='{}'>{tag}</span> {message}",
                    tag_class(tag)
                ));
                if matches!(event, Event::MissingRoot(_)) {
                    self.line("");
                }
            }
            (_, None) => self.line(format_args!("{indent}{message}")),
        }
    }
}

impl<W: Write> Presenter for HtmlOutput<W> {
    fn begin(&mut self, config: &CleanupConfig) {
        self.lines.line("<!DOCTYPE html>");
        self.lines.line(
            "<html><head><meta charset=\"utf-8\"><title>oldsweep</title><style>\
             body { font-family: monospace; font-size: 14px; padding: 20px; } \
             .warning, .old { color: orange; } .empty { color: gray; } \
             .error, .live { color: red; } .dry { color: blue; }\
             </style></head><body>",
        );
        self.rule();
        self.line("<b>oldsweep</b>");
        self.rule();
        let class = if config.dry_run { "dry" } else { "live" };
        self.line(format_args!(
            "Mode: <span class='{class}'>{}</span>",
            mode_line(config.dry_run)
        ));
        self.line(format_args!(
            "Cutoff date: {}",
            config.cutoff.instant().format("%Y-%m-%d %H:%M:%S")
        ));
        self.rule();
        self.line("");
    }

    fn finish(&mut self, report: &CleanupReport) -> io::Result<()> {
        self.line("");
        self.rule();
        self.line(format_args!("<b>{}</b>", summary_title(report.dry_run)));
        self.rule();
        for (label, value) in summary_rows(report) {
            self.line(format_args!("{label} <b>{value}</b>"));
        }
        self.rule();
        if report.dry_run {
            self.line("");
            self.line(format_args!("<span class='dry'>{DRY_RUN_FOOTER}</span>"));
        }
        self.lines.line("</body></html>");
        self.lines.take_error()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passes::Cutoff;
    use std::fs;
    use tempfile::TempDir;

    fn dry_config() -> CleanupConfig {
        CleanupConfig {
            cutoff: Cutoff::months_ago(12).unwrap(),
            dry_run: true,
        }
    }

    #[test]
    fn text_output_has_banner_events_and_summary() {
        colored::control::set_override(false);
        let tmp = TempDir::new().expect("tempdir");
        fs::create_dir(tmp.path().join("empty")).unwrap();

        let mut output = TextOutput::new(Vec::new());
        let report = render(&mut output, &[tmp.path().to_path_buf()], &dry_config()).unwrap();
        let text = String::from_utf8(output.into_inner()).unwrap();

        assert_eq!(report.empty_folders_total, 1);
        assert!(text.contains("Mode: DRY RUN (no changes will be made)"));
        assert!(text.contains("Cutoff date: "));
        assert!(text.contains(&format!("  [EMPTY] {}", tmp.path().join("empty").display())));
        assert!(text.contains("SUMMARY (DRY RUN)"));
        assert!(text.contains("Empty folders to delete:"));
        assert!(text.contains("Space to free:"));
        assert!(text.contains(DRY_RUN_FOOTER));
    }

    #[test]
    fn live_summary_uses_past_tense() {
        colored::control::set_override(false);
        let mut output = TextOutput::new(Vec::new());
        let report = CleanupReport {
            dry_run: false,
            old_files_total: 2,
            bytes_freed_total: 2048,
            ..CleanupReport::default()
        };

        output.finish(&report).unwrap();
        let text = String::from_utf8(output.into_inner()).unwrap();

        assert!(text.contains("Old files deleted:"));
        assert!(text.contains("2.00 KB"));
        assert!(!text.contains(DRY_RUN_FOOTER));
    }

    #[test]
    fn html_output_escapes_paths() {
        let tmp = TempDir::new().expect("tempdir");
        let odd = tmp.path().join("<script>&");
        fs::create_dir(&odd).unwrap();

        let mut output = HtmlOutput::new(Vec::new());
        render(&mut output, &[tmp.path().to_path_buf()], &dry_config()).unwrap();
        let html = String::from_utf8(output.into_inner()).unwrap();

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("&lt;script&gt;&amp;"));
        assert!(!html.contains("<script>"));
        assert!(html.contains("<span class='empty'>[EMPTY]</span>"));
        assert!(html.trim_end().ends_with("</body></html>"));
    }

    #[test]
    fn write_errors_surface_at_finish() {
        struct Broken;
        impl Write for Broken {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let mut output = TextOutput::new(Broken);
        output.begin(&dry_config());
        let err = output.finish(&CleanupReport::default()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}
