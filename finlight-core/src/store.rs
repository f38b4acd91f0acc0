//! Persistence store: one JSON document under one key of a key-value store.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use crate::model::LedgerDocument;
use crate::time::current_month;

/// Key the ledger document lives under.
pub const DEFAULT_STORAGE_KEY: &str = "emi_finance_light_801010_v2";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("storage quota exceeded: {needed} bytes needed, {limit} allowed")]
    QuotaExceeded { needed: usize, limit: usize },

    #[error("serialize ledger: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// String key-value storage, the capability the ledger persists through.
pub trait KvStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

impl<S: KvStore + ?Sized> KvStore for &mut S {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }
}

/// In-process store with an optional per-value size limit.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: HashMap<String, String>,
    quota: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject values larger than `bytes`, like a browser storage quota.
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            values: HashMap::new(),
            quota: Some(bytes),
        }
    }

    pub fn raw(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        if let Some(limit) = self.quota {
            if value.len() > limit {
                return Err(StoreError::QuotaExceeded {
                    needed: value.len(),
                    limit,
                });
            }
        }
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// One file per key (`<dir>/<key>.json`), replaced atomically on write.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

fn io_err(path: &Path) -> impl FnOnce(io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

impl KvStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_err(&path)(e)),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir).map_err(io_err(&self.dir))?;
        let path = self.path_for(key);
        let tmp = self.dir.join(format!(".{key}.json.tmp"));
        fs::write(&tmp, value).map_err(io_err(&tmp))?;
        fs::rename(&tmp, &path).map_err(io_err(&path))?;
        Ok(())
    }
}

/// Loads and saves the ledger document under a fixed key.
#[derive(Debug, Clone)]
pub struct PersistenceStore<S> {
    kv: S,
    key: String,
}

impl<S: KvStore> PersistenceStore<S> {
    pub fn new(kv: S) -> Self {
        Self::with_key(kv, DEFAULT_STORAGE_KEY)
    }

    pub fn with_key(kv: S, key: impl Into<String>) -> Self {
        Self { kv, key: key.into() }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn kv(&self) -> &S {
        &self.kv
    }

    pub fn into_inner(self) -> S {
        self.kv
    }

    /// The saved document, or a freshly seeded one if nothing usable is stored.
    pub fn load(&self) -> LedgerDocument {
        let raw = match self.kv.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(key = %self.key, "no stored ledger, seeding defaults");
                return LedgerDocument::seeded(current_month());
            }
            Err(e) => {
                warn!(key = %self.key, error = %e, "reading stored ledger failed, seeding defaults");
                return LedgerDocument::seeded(current_month());
            }
        };

        match serde_json::from_str(&raw) {
            Ok(doc) => doc,
            Err(e) => {
                warn!(key = %self.key, error = %e, "stored ledger is unparsable, discarding");
                LedgerDocument::seeded(current_month())
            }
        }
    }

    /// Write the full document, replacing the previous value.
    pub fn try_save(&mut self, doc: &LedgerDocument) -> Result<(), StoreError> {
        let json = serde_json::to_string(doc)?;
        self.kv.set(&self.key, &json)
    }

    /// Best-effort [`try_save`](Self::try_save): failures are logged and
    /// dropped. Returns whether the write went through.
    pub fn save(&mut self, doc: &LedgerDocument) -> bool {
        match self.try_save(doc) {
            Ok(()) => true,
            Err(e) => {
                warn!(key = %self.key, error = %e, "persisting ledger failed; keeping in-memory state");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Debt, Expense, Income};
    use chrono::NaiveDate;

    fn sample_doc() -> LedgerDocument {
        let mut doc = LedgerDocument::seeded("2024-03");
        doc.expenses.push(Expense {
            id: 2,
            date: NaiveDate::from_ymd_opt(2024, 3, 5),
            category: "Food".to_string(),
            note: Some("lunch, with friends".to_string()),
            amount: 12.35,
        });
        doc.incomes.push(Income {
            id: 1,
            date: NaiveDate::from_ymd_opt(2024, 3, 1),
            label: "Salary".to_string(),
            amount: 1500.0,
        });
        doc.debts.push(Debt {
            id: 3,
            name: "Loan".to_string(),
            amount: 200.0,
            done: true,
        });
        doc
    }

    #[test]
    fn test_load_missing_seeds_defaults() {
        let store = PersistenceStore::new(MemoryStore::new());
        let doc = store.load();
        assert_eq!(doc.active_month, current_month());
        assert!(!doc.categories.is_empty());
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let mut store = PersistenceStore::new(MemoryStore::new());
        let doc = sample_doc();
        store.save(&doc);
        assert_eq!(store.load(), doc);
    }

    #[test]
    fn test_unparsable_value_is_discarded() {
        let mut kv = MemoryStore::new();
        kv.set(DEFAULT_STORAGE_KEY, "{not json").unwrap();
        let store = PersistenceStore::new(kv);
        let doc = store.load();
        assert!(doc.expenses.is_empty());
        assert_eq!(doc.categories.len(), crate::model::DEFAULT_CATEGORIES.len());
    }

    #[test]
    fn test_quota_failure_is_swallowed() {
        let mut store = PersistenceStore::new(MemoryStore::with_quota(8));
        let doc = sample_doc();
        store.save(&doc);
        assert!(store.kv().raw(DEFAULT_STORAGE_KEY).is_none());
        assert!(matches!(
            store.try_save(&doc),
            Err(StoreError::QuotaExceeded { limit: 8, .. })
        ));
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = PersistenceStore::new(FileStore::new(dir.path().join("store")));
        assert_eq!(store.kv().get(DEFAULT_STORAGE_KEY).unwrap(), None);

        let doc = sample_doc();
        store.try_save(&doc).unwrap();
        assert!(store.kv().path_for(DEFAULT_STORAGE_KEY).exists());
        assert_eq!(store.load(), doc);
    }
}
