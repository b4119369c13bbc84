// src/index.rs

use crate::error::{ChurnError, Result};
use crate::model::FileOriginRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::{info, warn};

/// On-disk layout: two parallel columns, one row per indexed path.
#[derive(Debug, Serialize, Deserialize)]
struct IndexColumns {
    #[serde(alias = "filename")]
    path: Vec<String>,
    added_date: Vec<Option<DateTime<Utc>>>,
}

/// Path → origin date lookup, the hand-off between index build and extraction.
/// Unordered; nothing may depend on the order records were produced in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileCreationIndex {
    entries: HashMap<String, Option<DateTime<Utc>>>,
}

impl FileCreationIndex {
    pub fn from_records(records: impl IntoIterator<Item = FileOriginRecord>) -> Self {
        let mut entries = HashMap::new();
        for record in records {
            if entries.insert(record.path.clone(), record.added_date).is_some() {
                warn!("duplicate index entry for {}", record.path);
            }
        }
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    /// `None` when the path is not indexed; `Some(None)` when it is but has no date.
    pub fn added_date(&self, path: &str) -> Option<Option<DateTime<Utc>>> {
        self.entries.get(path).copied()
    }

    /// Records sorted by path.
    pub fn records(&self) -> Vec<FileOriginRecord> {
        let mut records: Vec<FileOriginRecord> = self
            .entries
            .iter()
            .map(|(path, added_date)| FileOriginRecord {
                path: path.clone(),
                added_date: *added_date,
            })
            .collect();
        records.sort_by(|a, b| a.path.cmp(&b.path));
        records
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let (paths, dates): (Vec<String>, Vec<Option<DateTime<Utc>>>) = self
            .records()
            .into_iter()
            .map(|r| (r.path, r.added_date))
            .unzip();
        let columns = IndexColumns {
            path: paths,
            added_date: dates,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(&mut writer, &columns)?;
        writer.flush()?;
        info!("Wrote file creation index with {} entries to {:?}", self.len(), path);
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| ChurnError::IndexRead {
            path: path.to_path_buf(),
            source,
        })?;
        let columns: IndexColumns = serde_json::from_reader(BufReader::new(file))?;
        if columns.path.len() != columns.added_date.len() {
            return Err(ChurnError::MalformedIndex(format!(
                "{} paths but {} dates",
                columns.path.len(),
                columns.added_date.len()
            )));
        }

        let records = columns
            .path
            .into_iter()
            .zip(columns.added_date)
            .map(|(path, added_date)| FileOriginRecord { path, added_date });
        let index = Self::from_records(records);
        info!("Loaded file creation index with {} entries from {:?}", index.len(), path);
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    #[test]
    fn save_then_load_preserves_null_dates() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("nested").join("index.json");
        let index = FileCreationIndex::from_records(vec![
            FileOriginRecord {
                path: "b.rs".into(),
                added_date: None,
            },
            FileOriginRecord {
                path: "a.rs".into(),
                added_date: Some(Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()),
            },
        ]);

        index.save(&file).unwrap();
        let loaded = FileCreationIndex::load(&file).unwrap();
        assert_eq!(loaded, index);
        assert_eq!(loaded.added_date("b.rs"), Some(None));
        assert_eq!(loaded.added_date("missing.rs"), None);
    }

    #[test]
    fn accepts_filename_column() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("index.json");
        std::fs::write(
            &file,
            r#"{"filename": ["x.py"], "added_date": ["2024-05-01T00:00:00Z"]}"#,
        )
        .unwrap();
        let loaded = FileCreationIndex::load(&file).unwrap();
        assert!(loaded.contains("x.py"));
    }

    #[test]
    fn rejects_uneven_columns() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("index.json");
        std::fs::write(&file, r#"{"path": ["x.py", "y.py"], "added_date": [null]}"#).unwrap();
        assert!(matches!(
            FileCreationIndex::load(&file),
            Err(ChurnError::MalformedIndex(_))
        ));
    }

    #[test]
    fn missing_index_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            FileCreationIndex::load(&dir.path().join("nope.json")),
            Err(ChurnError::IndexRead { .. })
        ));
    }
}
