//! Flat, file-backed draft store.
//!
//! One JSON document per quote, keyed by quote number, plus a summary
//! index for the drafts list. Last write wins; there is no versioning.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use directories::ProjectDirs;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::QuoteError;
use crate::models::Quote;

/// One row of the drafts list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftSummary {
    pub number: String,
    pub title: String,
    pub date: NaiveDate,
    pub total: f64,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SummaryIndex {
    drafts: Vec<DraftSummary>,
}

pub struct DraftStore {
    root: PathBuf,
}

impl DraftStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Open the store at the configured directory, or the platform data
    /// directory when none was configured.
    pub fn open(data_dir: Option<PathBuf>) -> Result<Self, QuoteError> {
        let root = match data_dir {
            Some(dir) => dir,
            None => ProjectDirs::from("", "", "quote-manager")
                .map(|dirs| dirs.data_dir().to_path_buf())
                .ok_or_else(|| QuoteError::Storage("cannot determine data directory".to_string()))?,
        };
        Ok(Self::new(root))
    }

    fn index_path(&self) -> PathBuf {
        self.root.join("summaries.json")
    }

    fn draft_path(&self, number: &str) -> PathBuf {
        self.root.join(format!("quote-{}.json", file_key(number)))
    }

    /// Persist a draft and upsert its summary row. Saving the same
    /// number again overwrites both.
    pub fn save(&self, quote: &Quote) -> Result<(), QuoteError> {
        if quote.number.trim().is_empty() {
            return Err(QuoteError::Storage(
                "a quote needs a number before it can be stored".to_string(),
            ));
        }

        write_json_atomic(&self.draft_path(&quote.number), quote)?;

        let mut index: SummaryIndex = read_json(&self.index_path())?;
        let summary = DraftSummary {
            number: quote.number.clone(),
            title: quote.display_title().to_string(),
            date: quote.issue_date,
            total: quote.total,
        };
        match index.drafts.iter_mut().find(|d| d.number == quote.number) {
            Some(existing) => *existing = summary,
            None => index.drafts.push(summary),
        }
        write_json_atomic(&self.index_path(), &index)?;

        debug!(number = %quote.number, "draft saved");
        Ok(())
    }

    pub fn load(&self, number: &str) -> Result<Quote, QuoteError> {
        let path = self.draft_path(number);
        if !path.exists() {
            return Err(QuoteError::NotFound(number.to_string()));
        }

        let file = File::open(&path)
            .map_err(|e| QuoteError::Storage(format!("failed to open {}: {}", path.display(), e)))?;
        let quote = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| QuoteError::Storage(format!("failed to parse {}: {}", path.display(), e)))?;
        Ok(quote)
    }

    /// Remove a draft and its summary row. Returns false when the
    /// number was not stored.
    pub fn delete(&self, number: &str) -> Result<bool, QuoteError> {
        let path = self.draft_path(number);
        let existed = path.exists();
        if existed {
            fs::remove_file(&path).map_err(|e| {
                QuoteError::Storage(format!("failed to delete {}: {}", path.display(), e))
            })?;
        }

        let mut index: SummaryIndex = read_json(&self.index_path())?;
        let before = index.drafts.len();
        index.drafts.retain(|d| d.number != number);
        if index.drafts.len() != before {
            write_json_atomic(&self.index_path(), &index)?;
        }

        debug!(number, existed, "draft deleted");
        Ok(existed)
    }

    pub fn list(&self) -> Result<Vec<DraftSummary>, QuoteError> {
        let index: SummaryIndex = read_json(&self.index_path())?;
        Ok(index.drafts)
    }
}

/// Drafts are keyed by the user-supplied number, so tame it into a file
/// name.
fn file_key(number: &str) -> String {
    number
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect()
}

/// Read JSON from a file, returning a default value if file doesn't exist
fn read_json<T, P>(path: P) -> Result<T, QuoteError>
where
    T: DeserializeOwned + Default,
    P: AsRef<Path>,
{
    let path = path.as_ref();

    if !path.exists() {
        return Ok(T::default());
    }

    let file = File::open(path)
        .map_err(|e| QuoteError::Storage(format!("failed to open {}: {}", path.display(), e)))?;
    serde_json::from_reader(BufReader::new(file))
        .map_err(|e| QuoteError::Storage(format!("failed to parse {}: {}", path.display(), e)))
}

/// Write JSON to a file atomically (write to temp, then rename), so a
/// crash mid-write never leaves a corrupt draft behind.
fn write_json_atomic<T, P>(path: P, data: &T) -> Result<(), QuoteError>
where
    T: Serialize,
    P: AsRef<Path>,
{
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            QuoteError::Storage(format!("failed to create {}: {}", parent.display(), e))
        })?;
    }

    let temp_path = path.with_extension("json.tmp");
    let file = File::create(&temp_path)
        .map_err(|e| QuoteError::Storage(format!("failed to create temp file: {}", e)))?;

    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, data)
        .map_err(|e| QuoteError::Storage(format!("failed to serialize: {}", e)))?;
    writer
        .flush()
        .map_err(|e| QuoteError::Storage(format!("failed to flush: {}", e)))?;
    writer
        .get_ref()
        .sync_all()
        .map_err(|e| QuoteError::Storage(format!("failed to sync: {}", e)))?;

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        QuoteError::Storage(format!("failed to rename temp file: {}", e))
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn quote(number: &str, title: &str, total: f64) -> Quote {
        let mut quote = Quote {
            number: number.to_string(),
            total,
            ..Quote::default()
        };
        quote.project.title = title.to_string();
        quote
    }

    #[test]
    fn save_then_load_round_trips_the_draft() {
        let dir = TempDir::new().unwrap();
        let store = DraftStore::new(dir.path());

        let original = quote("QTE-1", "Checkout", 1200.0);
        store.save(&original).unwrap();

        let loaded = store.load("QTE-1").unwrap();
        assert_eq!(loaded, original);
    }

    #[test]
    fn saving_again_overwrites_the_summary() {
        let dir = TempDir::new().unwrap();
        let store = DraftStore::new(dir.path());

        store.save(&quote("QTE-1", "Checkout", 1200.0)).unwrap();
        store.save(&quote("QTE-1", "Checkout v2", 1500.0)).unwrap();

        let summaries = store.list().unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].title, "Checkout v2");
        assert_eq!(summaries[0].total, 1500.0);
    }

    #[test]
    fn list_shows_untitled_for_blank_titles() {
        let dir = TempDir::new().unwrap();
        let store = DraftStore::new(dir.path());

        store.save(&quote("QTE-2", "", 0.0)).unwrap();
        let summaries = store.list().unwrap();
        assert_eq!(summaries[0].title, "Untitled");
    }

    #[test]
    fn delete_removes_draft_and_summary() {
        let dir = TempDir::new().unwrap();
        let store = DraftStore::new(dir.path());

        store.save(&quote("QTE-1", "A", 1.0)).unwrap();
        store.save(&quote("QTE-2", "B", 2.0)).unwrap();

        assert!(store.delete("QTE-1").unwrap());
        assert!(!store.delete("QTE-1").unwrap());

        assert!(matches!(store.load("QTE-1"), Err(QuoteError::NotFound(_))));
        let summaries = store.list().unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].number, "QTE-2");
    }

    #[test]
    fn numbers_with_odd_characters_still_store() {
        let dir = TempDir::new().unwrap();
        let store = DraftStore::new(dir.path());

        store.save(&quote("QTE 2026/07", "Slashed", 10.0)).unwrap();
        assert!(store.load("QTE 2026/07").is_ok());
    }

    #[test]
    fn blank_numbers_are_rejected() {
        let dir = TempDir::new().unwrap();
        let store = DraftStore::new(dir.path());
        assert!(store.save(&Quote::default()).is_err());
    }
}
