// src/model.rs

use crate::error::{ChurnError, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Repository-relative path, unique within one branch snapshot
pub type TrackedFile = String;

/// Owner identifiers in the order the ownership rule lists them
pub type Owners = Vec<String>;

/// The date a path first entered the branch, if history could tell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOriginRecord {
    pub path: TrackedFile,
    pub added_date: Option<DateTime<Utc>>,
}

/// How an origin date was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OriginSource {
    /// Earliest commit that added the path (renames followed)
    Addition,
    /// Oldest merge commit touching the path; an approximation
    MergeFallback,
    /// Neither query produced a line
    NotFound,
}

/// Line statistics of one file within one commit
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileLineStats {
    pub path: String,
    pub lines_added: u64,
    pub lines_deleted: u64,
    pub lines_modified: u64,
}

/// A commit inside the extraction window with its per-file statistics
#[derive(Debug, Clone)]
pub struct CommitStats {
    pub hash: String,
    pub committed_at: DateTime<Utc>,
    pub files: Vec<FileLineStats>,
}

/// One (commit, file) touch, joined with the file's origin date and owners
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitFileStat {
    pub commit_hash: String,
    pub path: String,
    pub lines_added: u64,
    pub lines_deleted: u64,
    pub lines_modified: u64,
    pub commit_date: DateTime<Utc>,
    /// `None` when the index holds the path but could not date it
    pub file_creation_date: Option<DateTime<Utc>>,
    pub owners: Option<Owners>,
}

impl CommitFileStat {
    pub fn total_churn(&self) -> u64 {
        self.lines_added + self.lines_deleted + self.lines_modified
    }

    /// Whole days between the file's origin and this commit, truncated toward zero.
    pub fn file_age_days(&self) -> Option<i64> {
        self.file_creation_date
            .map(|created| (self.commit_date - created).num_days())
    }
}

/// Summed churn for one aggregation key (a file path or an owner)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChurnSummary {
    pub key: String,
    pub lines_added: u64,
    pub lines_deleted: u64,
    pub lines_modified: u64,
    pub total_churn: u64,
    pub churn_count: u64,
}

impl ChurnSummary {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            lines_added: 0,
            lines_deleted: 0,
            lines_modified: 0,
            total_churn: 0,
            churn_count: 0,
        }
    }

    pub fn add(&mut self, stat: &CommitFileStat) {
        self.lines_added += stat.lines_added;
        self.lines_deleted += stat.lines_deleted;
        self.lines_modified += stat.lines_modified;
        self.total_churn += stat.total_churn();
        self.churn_count += 1;
    }
}

/// Inclusive `[start, end]` range of commit timestamps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateWindow {
    /// `[now - days_ago, now]`; fails when the start predates chrono's range.
    pub fn last_days(days_ago: u32, now: DateTime<Utc>) -> Result<Self> {
        let start = now
            .checked_sub_signed(Duration::days(i64::from(days_ago)))
            .ok_or(ChurnError::WindowOutOfRange { days_ago })?;
        Ok(Self { start, end: now })
    }

    /// Explicit bounds win; missing ones fall back to the `days_ago` default.
    pub fn resolve(
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        days_ago: u32,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let start = match start {
            Some(start) => start,
            None => Self::last_days(days_ago, now)?.start,
        };
        Ok(Self {
            start,
            end: end.unwrap_or(now),
        })
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.end
    }
}

/// How `lines_modified` is derived from a file's diff hunks.
///
/// `Total` is the per-file `lines` figure of numstat-based churn tools
/// (`added + deleted`). `Paired` is the default so that a commit made only of
/// new lines reports zero modified lines and its total churn equals the lines
/// it added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LineCounting {
    /// Per hunk, the lines replaced in place: `min(added, deleted)`
    #[default]
    Paired,
    /// Every changed line: `added + deleted`, the numstat `lines` figure
    Total,
}

impl LineCounting {
    pub fn modified(self, added: u64, deleted: u64) -> u64 {
        match self {
            LineCounting::Paired => added.min(deleted),
            LineCounting::Total => added + deleted,
        }
    }
}
