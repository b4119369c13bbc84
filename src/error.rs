// src/error.rs

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ChurnError>;

#[derive(Error, Debug)]
pub enum ChurnError {
    #[error("failed to open git repository at {path:?}: {source}")]
    RepositoryOpen {
        path: PathBuf,
        #[source]
        source: git2::Error,
    },

    #[error("git error: {0}")]
    Git(#[from] git2::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("`git {args}` failed: {stderr}")]
    GitCommand { args: String, stderr: String },

    #[error("invalid branch '{0}': must be a branch, tag or commit (cannot start with '-')")]
    InvalidBranch(String),

    #[error("unparseable author date '{value}': {source}")]
    DateParse {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("a lookback of {days_ago} days falls outside the supported date range")]
    WindowOutOfRange { days_ago: u32 },

    #[error("cannot read file creation index {path:?}: {source}")]
    IndexRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed file creation index: {0}")]
    MalformedIndex(String),

    #[error("invalid ownership pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("worker pool error: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}
