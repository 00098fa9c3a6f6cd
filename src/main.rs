use oldsweep::Config;
use oldsweep::cli::Cli;
use oldsweep::output::{self, Format, HtmlOutput, TextOutput};
use std::io;
use anyhow::Result;
use clap::Parser;
use log::{debug, info};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::init_from_env(env_logger::Env::default().default_filter_or(default_level));

    if cli.no_color {
        colored::control::set_override(false);
    }

    let mut config = Config::load(cli.config.as_deref())?;
    cli.apply(&mut config);
    debug!("effective config: {config:?}");

    // Validate everything before the first deletion.
    let roots = config.roots()?.to_vec();
    let cleanup = config.cleanup_config()?;

    let stdout = io::stdout().lock();
    let report = match config.format {
        Format::Text => output::render(&mut TextOutput::new(stdout), &roots, &cleanup)?,
        Format::Html => output::render(&mut HtmlOutput::new(stdout), &roots, &cleanup)?,
    };

    info!(
        "done: {} empty folders, {} old files, {} bytes",
        report.empty_folders_total, report.old_files_total, report.bytes_freed_total
    );
    Ok(())
}
