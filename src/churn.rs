// src/churn.rs

//! Churn of recently introduced files, summed per file or per owner.
//!
//! Only touches where `commit_date - file_creation_date` is at most
//! `days_ago` whole days count. Touches of undated files never count.

use crate::model::{ChurnSummary, CommitFileStat};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

/// Filter and ordering applied to summary rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregationPolicy {
    /// Rows are kept only when `churn_count` exceeds this
    pub min_churn_count: u64,
    /// Order by `total_churn`; ties fall back to the key, ascending
    pub order: SortOrder,
    pub limit: Option<usize>,
}

impl AggregationPolicy {
    /// Every row, highest churn first.
    pub fn top(limit: Option<usize>) -> Self {
        Self {
            min_churn_count: 0,
            order: SortOrder::Descending,
            limit,
        }
    }

    /// Rows touched more than once, lowest churn first.
    pub fn recurring() -> Self {
        Self {
            min_churn_count: 1,
            order: SortOrder::Ascending,
            limit: None,
        }
    }

    fn apply(&self, rows: impl IntoIterator<Item = ChurnSummary>) -> Vec<ChurnSummary> {
        let mut rows: Vec<ChurnSummary> = rows
            .into_iter()
            .filter(|row| row.churn_count > self.min_churn_count)
            .collect();

        rows.sort_by(|a, b| {
            let by_churn = match self.order {
                SortOrder::Ascending => a.total_churn.cmp(&b.total_churn),
                SortOrder::Descending => b.total_churn.cmp(&a.total_churn),
            };
            by_churn.then_with(|| a.key.cmp(&b.key))
        });

        if let Some(limit) = self.limit {
            rows.truncate(limit);
        }
        rows
    }
}

impl Default for AggregationPolicy {
    fn default() -> Self {
        Self::top(None)
    }
}

pub fn is_new_file(stat: &CommitFileStat, days_ago: u32) -> bool {
    stat.file_age_days()
        .is_some_and(|age| age <= i64::from(days_ago))
}

/// Records of files that were themselves introduced within `days_ago` of the commit.
pub fn new_file_records(records: &[CommitFileStat], days_ago: u32) -> Vec<&CommitFileStat> {
    records
        .iter()
        .filter(|stat| is_new_file(stat, days_ago))
        .collect()
}

pub fn summarize_by_file(
    records: &[CommitFileStat],
    days_ago: u32,
    policy: &AggregationPolicy,
) -> Vec<ChurnSummary> {
    let mut groups: BTreeMap<&str, ChurnSummary> = BTreeMap::new();
    for stat in new_file_records(records, days_ago) {
        groups
            .entry(stat.path.as_str())
            .or_insert_with(|| ChurnSummary::new(stat.path.as_str()))
            .add(stat);
    }
    policy.apply(groups.into_values())
}

/// Each touch counts in full for every one of its owners. Touches without
/// owners do not appear.
pub fn summarize_by_owner(
    records: &[CommitFileStat],
    days_ago: u32,
    policy: &AggregationPolicy,
) -> Vec<ChurnSummary> {
    let mut groups: BTreeMap<&str, ChurnSummary> = BTreeMap::new();
    for stat in new_file_records(records, days_ago) {
        for owner in stat.owners.iter().flatten() {
            groups
                .entry(owner.as_str())
                .or_insert_with(|| ChurnSummary::new(owner.as_str()))
                .add(stat);
        }
    }
    policy.apply(groups.into_values())
}
