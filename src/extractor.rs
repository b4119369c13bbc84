// src/extractor.rs

use crate::codeowners::OwnershipRules;
use crate::error::Result;
use crate::index::FileCreationIndex;
use crate::model::{CommitFileStat, CommitStats, DateWindow, LineCounting};
use crate::repo::GitRepository;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct ExtractOptions {
    pub branch: String,
    pub window: DateWindow,
    /// Merge commits are skipped entirely unless set
    pub with_merges: bool,
    pub line_counting: LineCounting,
}

/// Walks `options.window` on `options.branch` and emits one record per
/// (commit, indexed file) touch.
pub fn extract_commit_stats(
    repo: &GitRepository,
    options: &ExtractOptions,
    index: &FileCreationIndex,
    owners: Option<&OwnershipRules>,
) -> Result<Vec<CommitFileStat>> {
    let commits = repo.commits_in_range(
        &options.branch,
        &options.window,
        options.with_merges,
        options.line_counting,
    )?;
    info!(
        "{} commits on {} between {} and {}",
        commits.len(),
        options.branch,
        options.window.start,
        options.window.end
    );

    let records = join_commits(commits, index, owners);
    info!("Extracted {} commit-file records", records.len());
    Ok(records)
}

/// Joins raw commit statistics with origin dates and owners. Files missing
/// from the index are dropped.
pub fn join_commits(
    commits: Vec<CommitStats>,
    index: &FileCreationIndex,
    owners: Option<&OwnershipRules>,
) -> Vec<CommitFileStat> {
    let mut records = Vec::new();
    let mut dropped = 0usize;

    for commit in commits {
        for file in commit.files {
            let Some(file_creation_date) = index.added_date(&file.path) else {
                dropped += 1;
                continue;
            };
            let file_owners = owners.and_then(|rules| rules.owners_for(&file.path).cloned());

            records.push(CommitFileStat {
                commit_hash: commit.hash.clone(),
                path: file.path,
                lines_added: file.lines_added,
                lines_deleted: file.lines_deleted,
                lines_modified: file.lines_modified,
                commit_date: commit.committed_at,
                file_creation_date,
                owners: file_owners,
            });
        }
    }

    if dropped > 0 {
        debug!("Dropped {} touches of files missing from the index", dropped);
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FileLineStats, FileOriginRecord};
    use chrono::{TimeZone, Utc};

    fn stats(path: &str, added: u64) -> FileLineStats {
        FileLineStats {
            path: path.into(),
            lines_added: added,
            ..Default::default()
        }
    }

    #[test]
    fn unindexed_files_are_dropped_and_owners_joined() {
        let created = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let index = FileCreationIndex::from_records(vec![
            FileOriginRecord {
                path: "src/a.py".into(),
                added_date: Some(created),
            },
            FileOriginRecord {
                path: "undated.py".into(),
                added_date: None,
            },
        ]);
        let rules = OwnershipRules::parse("/src @core\n");
        let commits = vec![CommitStats {
            hash: "c1".into(),
            committed_at: Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap(),
            files: vec![stats("src/a.py", 3), stats("gone.py", 9), stats("undated.py", 1)],
        }];

        let records = join_commits(commits, &index, Some(&rules));
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].path, "src/a.py");
        assert_eq!(records[0].file_creation_date, Some(created));
        assert_eq!(records[0].owners, Some(vec!["@core".to_string()]));
        assert_eq!(records[1].path, "undated.py");
        assert_eq!(records[1].file_creation_date, None);
        assert_eq!(records[1].owners, None);
    }

    #[test]
    fn owners_are_absent_without_rules() {
        let index = FileCreationIndex::from_records(vec![FileOriginRecord {
            path: "a.py".into(),
            added_date: None,
        }]);
        let commits = vec![CommitStats {
            hash: "c1".into(),
            committed_at: Utc::now(),
            files: vec![stats("a.py", 1)],
        }];
        let records = join_commits(commits, &index, None);
        assert_eq!(records[0].owners, None);
    }
}
