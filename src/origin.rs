// src/origin.rs

//! Resolves the date each tracked file first entered a branch.
//!
//! Resolution per path:
//! 1. the first line of the log of commits that *added* the path (renames
//!    followed);
//! 2. otherwise the *last* line of the merge-commit log for the path. Merge
//!    history is printed newest first, so this approximates the earliest
//!    merge that brought the file in; dates found this way are less certain;
//! 3. otherwise no date.
//!
//! Paths are resolved on a bounded pool owned by one [`build_index`] call.
//! Outcomes arrive in completion order. A failed lookup still produces a
//! record, with no date, so the index holds exactly one record per listed path.

use crate::error::Result;
use crate::history::{parse_author_date, HistoryLog};
use crate::index::FileCreationIndex;
use crate::model::{FileOriginRecord, OriginSource, TrackedFile};
use crate::repo::GitRepository;
use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::ThreadPoolBuilder;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedOrigin {
    pub added_date: Option<DateTime<Utc>>,
    pub source: OriginSource,
}

/// Result of resolving one path; `Err` when a history query failed
pub type OriginOutcome = Result<ResolvedOrigin>;

pub fn resolve_origin(log: &dyn HistoryLog, branch: &str, path: &str) -> OriginOutcome {
    let additions = log.addition_log(branch, path)?;
    if let Some(first) = additions.first() {
        return Ok(ResolvedOrigin {
            added_date: Some(parse_author_date(first)?),
            source: OriginSource::Addition,
        });
    }

    let merges = log.merge_log(branch, path)?;
    if let Some(last) = merges.last() {
        return Ok(ResolvedOrigin {
            added_date: Some(parse_author_date(last)?),
            source: OriginSource::MergeFallback,
        });
    }

    Ok(ResolvedOrigin {
        added_date: None,
        source: OriginSource::NotFound,
    })
}

#[derive(Debug, Clone)]
pub struct IndexOptions {
    pub branch: String,
    /// Worker threads; defaults to available parallelism
    pub jobs: Option<NonZeroUsize>,
    pub show_progress: bool,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            branch: "main".to_string(),
            jobs: None,
            show_progress: false,
        }
    }
}

/// Tally of how the records of one build were dated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildSummary {
    pub via_addition: usize,
    pub via_merge: usize,
    pub not_found: usize,
    pub failed: usize,
}

impl BuildSummary {
    pub fn total(&self) -> usize {
        self.via_addition + self.via_merge + self.not_found + self.failed
    }
}

/// Turns an outcome into the path's record. Failures are kept with a null
/// date so the path stays represented in the index.
fn record_from_outcome(
    path: TrackedFile,
    outcome: OriginOutcome,
    summary: &mut BuildSummary,
) -> FileOriginRecord {
    let added_date = match outcome {
        Ok(resolved) => {
            match resolved.source {
                OriginSource::Addition => summary.via_addition += 1,
                OriginSource::MergeFallback => summary.via_merge += 1,
                OriginSource::NotFound => summary.not_found += 1,
            }
            resolved.added_date
        }
        Err(e) => {
            warn!("An error occurred while processing {}: {}", path, e);
            summary.failed += 1;
            None
        }
    };
    FileOriginRecord { path, added_date }
}

/// Resolves every path in `paths` on a dedicated pool of `jobs` workers.
pub fn resolve_all<L>(
    log: Arc<L>,
    branch: &str,
    paths: Vec<TrackedFile>,
    jobs: NonZeroUsize,
    progress: &ProgressBar,
) -> Result<(Vec<FileOriginRecord>, BuildSummary)>
where
    L: HistoryLog + 'static,
{
    let pool = ThreadPoolBuilder::new()
        .num_threads(jobs.get())
        .thread_name(|i| format!("origin-{i}"))
        .build()?;

    let total = paths.len();
    let (tx, rx) = crossbeam_channel::unbounded();
    for path in paths {
        let tx = tx.clone();
        let log = Arc::clone(&log);
        let branch = branch.to_string();
        pool.spawn(move || {
            let outcome = resolve_origin(&*log, &branch, &path);
            // The receiver outlives every task.
            let _ = tx.send((path, outcome));
        });
    }
    drop(tx);

    let mut summary = BuildSummary::default();
    let mut records = Vec::with_capacity(total);
    for (path, outcome) in rx.iter() {
        debug!("resolved {}", path);
        records.push(record_from_outcome(path, outcome, &mut summary));
        progress.inc(1);
    }

    Ok((records, summary))
}

/// Lists the files at the tip of `options.branch` and dates each of them.
pub fn build_index<L>(
    repo: &GitRepository,
    log: Arc<L>,
    options: &IndexOptions,
) -> Result<(FileCreationIndex, BuildSummary)>
where
    L: HistoryLog + 'static,
{
    let paths = repo.tracked_files(&options.branch)?;
    let jobs = options.jobs.unwrap_or_else(default_jobs);
    info!(
        "Resolving origin dates of {} files on {} with {} workers",
        paths.len(),
        options.branch,
        jobs
    );

    let progress = if options.show_progress {
        let bar = ProgressBar::new(paths.len() as u64);
        if let Ok(style) = ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}") {
            bar.set_style(style);
        }
        bar.set_message("Resolving file origins");
        bar
    } else {
        ProgressBar::hidden()
    };

    let (records, summary) = resolve_all(log, &options.branch, paths, jobs, &progress)?;
    progress.finish_with_message("File origins resolved");

    info!(
        "Indexed {} files: {} by addition, {} by merge fallback, {} undated, {} failed",
        summary.total(),
        summary.via_addition,
        summary.via_merge,
        summary.not_found,
        summary.failed
    );

    Ok((FileCreationIndex::from_records(records), summary))
}

fn default_jobs() -> NonZeroUsize {
    std::thread::available_parallelism().unwrap_or(NonZeroUsize::MIN)
}
