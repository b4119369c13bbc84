// src/repo.rs

use crate::codeowners::CODEOWNERS_CANDIDATES;
use crate::error::{ChurnError, Result};
use crate::model::{CommitStats, DateWindow, FileLineStats, LineCounting, TrackedFile};
use chrono::{DateTime, TimeZone, Utc};
use git2::{Commit, Diff, DiffOptions, ObjectType, Patch, Repository, Sort, TreeWalkMode, TreeWalkResult};
use std::path::Path;
use tracing::debug;

/// Read-only access to a repository through libgit2
pub struct GitRepository {
    repo: Repository,
}

impl GitRepository {
    pub fn open(path: &Path) -> Result<Self> {
        let repo = Repository::open(path).map_err(|source| ChurnError::RepositoryOpen {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Opened git repository at {:?}", repo.path());
        Ok(Self { repo })
    }

    /// The `.git` directory (or the repository itself when bare).
    pub fn git_dir(&self) -> &Path {
        self.repo.path()
    }

    fn tip(&self, branch: &str) -> Result<Commit<'_>> {
        check_branch(branch)?;
        let commit = self.repo.revparse_single(branch)?.peel_to_commit()?;
        Ok(commit)
    }

    /// Every blob path in the tree at the tip of `branch`, like `git ls-tree -r --name-only`.
    pub fn tracked_files(&self, branch: &str) -> Result<Vec<TrackedFile>> {
        let tree = self.tip(branch)?.tree()?;

        let mut files = Vec::new();
        tree.walk(TreeWalkMode::PreOrder, |dir, entry| {
            if entry.kind() == Some(ObjectType::Blob) {
                if let Some(name) = entry.name() {
                    files.push(format!("{dir}{name}"));
                }
            }
            TreeWalkResult::Ok
        })?;

        debug!("{} tracked files at {}", files.len(), branch);
        Ok(files)
    }

    /// Raw text of the first ownership document found at the tip of `branch`.
    pub fn ownership_document(&self, branch: &str) -> Result<Option<String>> {
        let tree = self.tip(branch)?.tree()?;
        for name in CODEOWNERS_CANDIDATES {
            let Some(entry) = tree.get_name(name) else {
                continue;
            };
            if entry.kind() != Some(ObjectType::Blob) {
                continue;
            }
            let blob = self.repo.find_blob(entry.id())?;
            debug!("Using ownership rules from {}", name);
            return Ok(Some(String::from_utf8_lossy(blob.content()).into_owned()));
        }
        Ok(None)
    }

    /// Commits reachable from `branch` whose committer time lies in `window`,
    /// newest first, each with per-file line statistics against its first parent.
    pub fn commits_in_range(
        &self,
        branch: &str,
        window: &DateWindow,
        with_merges: bool,
        counting: LineCounting,
    ) -> Result<Vec<CommitStats>> {
        let tip = self.tip(branch)?;

        let mut revwalk = self.repo.revwalk()?;
        revwalk.push(tip.id())?;
        revwalk.set_sorting(Sort::TIME)?;

        let mut commits = Vec::new();
        for oid in revwalk {
            let commit = self.repo.find_commit(oid?)?;
            if !with_merges && commit.parent_count() > 1 {
                continue;
            }
            let Some(committed_at) = commit_time(&commit) else {
                continue;
            };
            if !window.contains(committed_at) {
                continue;
            }

            let files = self.file_stats(&commit, counting)?;
            debug!("{} touches {} files", commit.id(), files.len());
            commits.push(CommitStats {
                hash: commit.id().to_string(),
                committed_at,
                files,
            });
        }

        Ok(commits)
    }

    fn file_stats(&self, commit: &Commit, counting: LineCounting) -> Result<Vec<FileLineStats>> {
        let parent_tree = match commit.parent(0) {
            Ok(parent) => Some(parent.tree()?),
            Err(_) => None,
        };
        let current_tree = commit.tree()?;

        let mut diff_opts = DiffOptions::new();
        diff_opts.ignore_filemode(true);
        diff_opts.include_typechange(true);

        let diff = self
            .repo
            .diff_tree_to_tree(parent_tree.as_ref(), Some(&current_tree), Some(&mut diff_opts))?;

        diff_line_stats(&diff, counting)
    }
}

/// One entry per path, in diff order. Deltas sharing a path are summed.
fn diff_line_stats(diff: &Diff, counting: LineCounting) -> Result<Vec<FileLineStats>> {
    let mut files: Vec<FileLineStats> = Vec::with_capacity(diff.deltas().len());

    for idx in 0..diff.deltas().len() {
        let Some(patch) = Patch::from_diff(diff, idx)? else {
            continue;
        };
        let delta = patch.delta();
        let Some(path) = delta
            .new_file()
            .path()
            .or_else(|| delta.old_file().path())
            .and_then(|p| p.to_str())
            .map(String::from)
        else {
            continue;
        };

        let mut stats = FileLineStats {
            path,
            ..Default::default()
        };
        for hunk in 0..patch.num_hunks() {
            let (mut added, mut deleted) = (0u64, 0u64);
            for line in 0..patch.num_lines_in_hunk(hunk)? {
                match patch.line_in_hunk(hunk, line)?.origin() {
                    '+' => added += 1,
                    '-' => deleted += 1,
                    _ => {}
                }
            }
            stats.lines_added += added;
            stats.lines_deleted += deleted;
            stats.lines_modified += counting.modified(added, deleted);
        }

        match files.iter_mut().find(|f| f.path == stats.path) {
            Some(existing) => {
                existing.lines_added += stats.lines_added;
                existing.lines_deleted += stats.lines_deleted;
                existing.lines_modified += stats.lines_modified;
            }
            None => files.push(stats),
        }
    }

    Ok(files)
}

fn commit_time(commit: &Commit) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(commit.time().seconds(), 0).single()
}

/// Rejects revisions that git would read as an option.
pub(crate) fn check_branch(branch: &str) -> Result<()> {
    if branch.is_empty() || branch.starts_with('-') {
        return Err(ChurnError::InvalidBranch(branch.to_string()));
    }
    Ok(())
}
