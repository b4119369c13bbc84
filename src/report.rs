// src/report.rs

use crate::error::Result;
use crate::model::ChurnSummary;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

/// Writes summary rows as a JSON array.
pub fn write_summaries(path: &Path, rows: &[ChurnSummary]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, rows)?;
    writeln!(writer)?;
    writer.flush()?;
    info!("Wrote {} rows to {:?}", rows.len(), path);
    Ok(())
}

/// Fixed-width table of at most `top` rows, highest churn first.
pub fn format_table(title: &str, rows: &[ChurnSummary], top: usize) -> String {
    let mut sorted: Vec<&ChurnSummary> = rows.iter().collect();
    sorted.sort_by(|a, b| {
        b.total_churn
            .cmp(&a.total_churn)
            .then_with(|| a.key.cmp(&b.key))
    });

    let width = sorted
        .iter()
        .take(top)
        .map(|r| r.key.len())
        .max()
        .unwrap_or(0)
        .max(title.len());

    let mut out = format!(
        "{:<width$}  {:>8}  {:>8}  {:>8}  {:>8}  {:>6}\n",
        title, "added", "deleted", "modified", "total", "count"
    );
    for row in sorted.into_iter().take(top) {
        out.push_str(&format!(
            "{:<width$}  {:>8}  {:>8}  {:>8}  {:>8}  {:>6}\n",
            row.key,
            row.lines_added,
            row.lines_deleted,
            row.lines_modified,
            row.total_churn,
            row.churn_count
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn row(key: &str, total: u64) -> ChurnSummary {
        ChurnSummary {
            key: key.into(),
            lines_added: total,
            lines_deleted: 0,
            lines_modified: 0,
            total_churn: total,
            churn_count: 1,
        }
    }

    #[test]
    fn writes_rows_as_json_array() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out").join("churn.json");
        write_summaries(&path, &[row("a.py", 3)]).unwrap();

        let parsed: Vec<ChurnSummary> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed, vec![row("a.py", 3)]);
    }

    #[test]
    fn table_lists_highest_churn_first() {
        let table = format_table("file", &[row("low.py", 1), row("high.py", 9), row("mid.py", 5)], 2);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("high.py"));
        assert!(lines[2].starts_with("mid.py"));
    }
}
