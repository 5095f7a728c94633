use std::fs::read_dir;
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use clap::{App, Arg};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use tracing::warn;

use hlt_replays::analyzer::{TurnRecord, build_dataset, parse_replay, resolve_player};
use hlt_replays::{Replay, ReplayResult};

/// Parses one replay file, either from the winner's perspective (the
/// default) or from a named player's.
fn process_file(path: &Path, player: Option<&str>) -> ReplayResult<Vec<TurnRecord>> {
    match player {
        None => parse_replay(path),
        Some(name) => {
            let replay = Replay::from_file(path)?;
            let identity = resolve_player(&replay, name)?;
            build_dataset(&replay, &identity)
        }
    }
}

/// Collects the `.hlt` files directly inside a folder, in file-name order.
fn candidate_files(folder: &Path, max_files: Option<usize>) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in read_dir(folder).with_context(|| format!("failed to read {}", folder.display()))? {
        let entry = entry?;
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "hlt") {
            files.push(path);
        }
    }
    files.sort();
    if let Some(max) = max_files {
        files.truncate(max);
    }
    Ok(files)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let matches = App::new("replaymine")
        .about("Converts a folder of Halite III replays into per-turn training data")
        .arg(
            Arg::with_name("REPLAY_DIR")
                .help("Folder containing .hlt replay files")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::with_name("JOBS")
                .help("Number of worker threads (default: all logical CPUs)")
                .short("j")
                .long("jobs")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("MAX_FILES")
                .help("Parse at most this many replays")
                .short("n")
                .long("max-files")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("PLAYER")
                .help("Parse from this player's perspective instead of the winner's")
                .short("p")
                .long("player")
                .takes_value(true),
        )
        .get_matches();

    let folder = Path::new(matches.value_of("REPLAY_DIR").unwrap());
    let player = matches.value_of("PLAYER");
    let max_files = matches
        .value_of("MAX_FILES")
        .map(|n| n.parse::<usize>().context("invalid --max-files"))
        .transpose()?;

    if let Some(jobs) = matches.value_of("JOBS") {
        let jobs = jobs.parse::<usize>().context("invalid --jobs")?;
        rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build_global()
            .map_err(|e| anyhow!("failed to size the worker pool: {e}"))?;
    }

    let files = candidate_files(folder, max_files)?;
    if files.is_empty() {
        println!("No .hlt files in {}", folder.display());
        return Ok(());
    }

    let progress = ProgressBar::new(files.len() as u64).with_style(
        ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}").expect("static template"),
    );

    // One independent parse per file; the indexed collect keeps results in
    // file-name order no matter which worker finishes first.
    let results: Vec<(&PathBuf, ReplayResult<Vec<TurnRecord>>)> = files
        .par_iter()
        .map(|path| {
            let result = process_file(path, player);
            progress.inc(1);
            (path, result)
        })
        .collect();
    progress.finish_and_clear();

    let mut datasets = Vec::with_capacity(results.len());
    for (path, result) in results {
        match result {
            Ok(records) => datasets.push(records),
            Err(err) => warn!(path = %path.display(), %err, "skipping replay"),
        }
    }

    let turns: usize = datasets.iter().map(Vec::len).sum();
    println!(
        "Parsed {} of {} replays ({} turn records)",
        datasets.len(),
        files.len(),
        turns
    );
    Ok(())
}
