// src/history.rs

//! Per-path history queries that libgit2 does not offer (`--follow`,
//! `--diff-filter`), answered by the `git` executable.

use crate::error::{ChurnError, Result};
use crate::repo::check_branch;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Raw history lookups for a single path. Implementations are shared by
/// every worker of an index build, so they must tolerate concurrent reads.
pub trait HistoryLog: Send + Sync {
    /// Output lines of the log of commits on `branch` that added `path`,
    /// following renames. Empty when there were none.
    fn addition_log(&self, branch: &str, path: &str) -> Result<Vec<String>>;

    /// Output lines of the log of merge commits on `branch` touching `path`,
    /// newest first.
    fn merge_log(&self, branch: &str, path: &str) -> Result<Vec<String>>;
}

/// [`HistoryLog`] backed by `git log` subprocesses
#[derive(Debug, Clone)]
pub struct GitCli {
    git_dir: PathBuf,
}

impl GitCli {
    pub fn new(git_dir: &Path) -> Self {
        Self {
            git_dir: git_dir.to_path_buf(),
        }
    }

    fn log(&self, args: &[&str]) -> Result<Vec<String>> {
        let output = Command::new("git")
            .arg("--git-dir")
            .arg(&self.git_dir)
            .args(args)
            .output()?;

        if !output.status.success() {
            return Err(ChurnError::GitCommand {
                args: args.join(" "),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout
            .trim()
            .lines()
            .map(str::to_string)
            .collect())
    }
}

impl HistoryLog for GitCli {
    fn addition_log(&self, branch: &str, path: &str) -> Result<Vec<String>> {
        check_branch(branch)?;
        self.log(&[
            "log",
            branch,
            "--diff-filter=A",
            "--format=%aD",
            "--name-only",
            "--follow",
            "--",
            path,
        ])
    }

    fn merge_log(&self, branch: &str, path: &str) -> Result<Vec<String>> {
        check_branch(branch)?;
        self.log(&["log", branch, "--format=%aD", "--merges", "--", path])
    }
}

/// Parses an RFC 2822 author date as printed by `--format=%aD`.
pub fn parse_author_date(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value.trim())
        .map(|date| date.with_timezone(&Utc))
        .map_err(|source| ChurnError::DateParse {
            value: value.to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_git_author_dates() {
        let date = parse_author_date("Tue, 5 Mar 2024 14:30:00 +0100").unwrap();
        assert_eq!(date, Utc.with_ymd_and_hms(2024, 3, 5, 13, 30, 0).unwrap());
    }

    #[test]
    fn rejects_file_names_as_dates() {
        let err = parse_author_date("src/main.rs").unwrap_err();
        assert!(matches!(err, ChurnError::DateParse { .. }));
    }
}
