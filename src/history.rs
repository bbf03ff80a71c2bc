// Local upload history: a single JSON document rewritten on every change.
//
// There is no locking: two `pinme` processes saving at the same time can
// lose one of the records.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Local, TimeZone};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;

pub const HISTORY_FILE: &str = "upload-history.json";

/// Number of records shown when no limit is given.
pub const DEFAULT_LIST_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadKind {
    File,
    Directory,
}

/// One successful upload. Records are never edited after they are written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRecord {
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    #[serde(rename = "date")]
    pub human_date: String,
    #[serde(rename = "path")]
    pub source_path: String,
    #[serde(rename = "filename")]
    pub display_name: String,
    pub content_hash: String,
    #[serde(default)]
    pub preview_hash: Option<String>,
    #[serde(rename = "size")]
    pub size_bytes: u64,
    pub file_count: u64,
    #[serde(rename = "type")]
    pub kind: UploadKind,
    #[serde(rename = "shortUrl", default)]
    pub short_alias: Option<String>,
}

impl UploadRecord {
    /// Build a record stamped with the current local time.
    pub fn new(
        source_path: &Path,
        content_hash: impl Into<String>,
        size_bytes: u64,
        file_count: u64,
        kind: UploadKind,
        short_alias: Option<String>,
    ) -> Self {
        let now = Local::now();
        let display_name = source_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| source_path.display().to_string());

        UploadRecord {
            timestamp: now.timestamp_millis(),
            human_date: now.format("%Y-%m-%d %H:%M:%S").to_string(),
            source_path: source_path.display().to_string(),
            display_name,
            content_hash: content_hash.into(),
            preview_hash: None,
            size_bytes,
            file_count,
            kind,
            short_alias,
        }
    }

    /// Upload time rendered in the local timezone.
    pub fn local_time(&self) -> String {
        match Local.timestamp_millis_opt(self.timestamp).single() {
            Some(t) => t.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => self.human_date.clone(),
        }
    }
}

/// On-disk document, newest record first.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UploadHistory {
    pub uploads: Vec<UploadRecord>,
}

/// Totals over a set of records.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct HistoryStats {
    pub uploads: usize,
    pub files: u64,
    pub bytes: u64,
}

impl HistoryStats {
    pub fn of(records: &[UploadRecord]) -> Self {
        HistoryStats {
            uploads: records.len(),
            files: records.iter().map(|r| r.file_count).sum(),
            bytes: records.iter().map(|r| r.size_bytes).sum(),
        }
    }
}

/// Reads and rewrites the history file under a config directory.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    dir: PathBuf,
}

impl HistoryStore {
    /// Store kept in `dir`. Nothing is created until first use.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        HistoryStore { dir: dir.into() }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(HISTORY_FILE)
    }

    /// Create the directory and an empty document if they are missing.
    fn ensure(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path();
        if !path.exists() {
            self.write(&UploadHistory::default())?;
        }
        Ok(())
    }

    fn read(&self) -> Result<UploadHistory> {
        self.ensure()?;
        let contents = fs::read_to_string(self.path())?;
        Ok(serde_json::from_str(&contents)?)
    }

    fn write(&self, history: &UploadHistory) -> Result<()> {
        let contents = serde_json::to_string_pretty(history)?;
        fs::write(self.path(), contents)?;
        Ok(())
    }

    /// Prepend `record` and rewrite the whole document.
    pub fn save(&self, record: UploadRecord) -> Result<()> {
        let mut history = self.read()?;
        history.uploads.insert(0, record);
        self.write(&history)?;
        debug!(path = %self.path().display(), total = history.uploads.len(), "history saved");
        Ok(())
    }

    /// Up to `limit` most recent records, newest first.
    pub fn list(&self, limit: usize) -> Result<Vec<UploadRecord>> {
        let mut history = self.read()?;
        history.uploads.truncate(limit);
        Ok(history.uploads)
    }

    /// Drop every record.
    pub fn clear(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        self.write(&UploadHistory::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(name: &str, hash: &str) -> UploadRecord {
        UploadRecord::new(
            &Path::new("/tmp").join(name),
            hash,
            42,
            1,
            UploadKind::File,
            None,
        )
    }

    #[test]
    fn save_then_list_returns_record() {
        let dir = TempDir::new().unwrap();
        let store = HistoryStore::new(dir.path().join(".pinme"));

        let rec = record("notes.txt", "bafkreiabc");
        store.save(rec.clone()).unwrap();

        assert_eq!(store.list(1).unwrap(), vec![rec]);
    }

    #[test]
    fn newest_record_comes_first() {
        let dir = TempDir::new().unwrap();
        let store = HistoryStore::new(dir.path());

        store.save(record("first.txt", "hash1")).unwrap();
        store.save(record("second.txt", "hash2")).unwrap();
        store.save(record("third.txt", "hash3")).unwrap();

        let hashes: Vec<String> = store
            .list(DEFAULT_LIST_LIMIT)
            .unwrap()
            .into_iter()
            .map(|r| r.content_hash)
            .collect();
        assert_eq!(hashes, vec!["hash3", "hash2", "hash1"]);
        assert_eq!(store.list(2).unwrap().len(), 2);
    }

    #[test]
    fn clear_empties_history() {
        let dir = TempDir::new().unwrap();
        let store = HistoryStore::new(dir.path());
        store.save(record("a.txt", "h")).unwrap();

        store.clear().unwrap();
        assert!(store.list(100).unwrap().is_empty());
    }

    #[test]
    fn missing_file_lists_empty() {
        let dir = TempDir::new().unwrap();
        let store = HistoryStore::new(dir.path().join("fresh"));
        assert!(store.list(DEFAULT_LIST_LIMIT).unwrap().is_empty());
        assert!(store.path().exists());
    }

    #[test]
    fn document_keys_are_stable() {
        let dir = TempDir::new().unwrap();
        let store = HistoryStore::new(dir.path());
        let rec = UploadRecord::new(
            Path::new("/srv/site"),
            "bafybeihash",
            2048,
            3,
            UploadKind::Directory,
            Some("3abt6ztu".into()),
        );
        store.save(rec).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        let first = &raw["uploads"][0];
        assert_eq!(first["filename"], "site");
        assert_eq!(first["path"], "/srv/site");
        assert_eq!(first["contentHash"], "bafybeihash");
        assert_eq!(first["size"], 2048);
        assert_eq!(first["fileCount"], 3);
        assert_eq!(first["type"], "directory");
        assert_eq!(first["shortUrl"], "3abt6ztu");
        assert!(first["previewHash"].is_null());
    }

    #[test]
    fn reads_records_without_short_url() {
        let dir = TempDir::new().unwrap();
        let store = HistoryStore::new(dir.path());
        fs::write(
            store.path(),
            r#"{"uploads":[{"timestamp":1700000000000,"date":"2023-11-14 22:13:20","path":"/a/b.txt","filename":"b.txt","contentHash":"Qmabc","previewHash":null,"size":10,"fileCount":1,"type":"file"}]}"#,
        )
        .unwrap();

        let records = store.list(5).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].short_alias, None);
        assert_eq!(records[0].kind, UploadKind::File);
    }

    #[test]
    fn stats_sum_files_and_bytes() {
        let mut a = record("a", "1");
        a.file_count = 4;
        a.size_bytes = 100;
        let b = record("b", "2");
        let stats = HistoryStats::of(&[a, b]);
        assert_eq!(
            stats,
            HistoryStats {
                uploads: 2,
                files: 5,
                bytes: 142
            }
        );
    }
}
