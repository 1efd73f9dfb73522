use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use mergelog::direction::{self, Direction};
use mergelog::{merge, output};

/// Entry-aware merge driver for changelog-style files
///
/// Merges independent modifications of a file made of dated,
/// append-at-the-top entries. Invoked by the version control system as
///
///   mergelog %O %A %B
///
/// New entries added at the top of both sides are concatenated without
/// conflict, edits and removals of past entries are carried over, and
/// anything unresolvable is written as a conflict block at the top of
/// the destination file.
///
/// The pull direction is taken from the GIT_DOWNSTREAM or GIT_UPSTREAM
/// environment variables when set, and guessed from GIT_REFLOG_ACTION
/// otherwise.
#[derive(Parser)]
#[command(name = "mergelog", version, about)]
struct Cli {
    /// Possibly split an entry that merged several paragraphs under one
    /// title (on by default; flag kept for compatibility)
    #[arg(long)]
    split_merged_entry: bool,

    /// The common ancestor of the two sides
    ancestor: PathBuf,

    /// The destination file; receives the merged result
    destination: PathBuf,

    /// The other side of the merge
    other: PathBuf,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(conflicts) if conflicts > 0 => ExitCode::from(1),
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("mergelog: {err:#}");
            ExitCode::from(2)
        }
    }
}

/// Run the merge and write the result to the destination file.
///
/// Returns the number of conflicts written.
fn run(cli: &Cli) -> Result<usize> {
    if cli.split_merged_entry {
        debug!("--split-merged-entry is the default and needs no flag");
    }

    let dir = direction::from_env();
    debug!(direction = ?dir, "detected pull direction");
    let (mainstream_path, modified_path) = match dir {
        Direction::Downstream => (&cli.other, &cli.destination),
        Direction::Upstream => (&cli.destination, &cli.other),
    };

    let read = |path: &PathBuf| {
        fs::read(path).with_context(|| format!("could not read file '{}'", path.display()))
    };
    let ancestor = read(&cli.ancestor)?;
    let mainstream = read(mainstream_path)?;
    let modified = read(modified_path)?;

    let outcome = merge(&ancestor, &mainstream, &modified);
    if !outcome.is_clean() {
        info!(
            conflicts = outcome.conflicts.len(),
            "merged with conflicts"
        );
    }

    fs::write(&cli.destination, output::render(&outcome)).with_context(|| {
        format!("could not write file '{}'", cli.destination.display())
    })?;
    Ok(outcome.conflicts.len())
}
