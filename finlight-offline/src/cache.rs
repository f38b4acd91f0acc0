//! Named response caches owned by the worker's origin.
//!
//! Every put and match is atomic per key. Nothing else is coordinated between
//! concurrent fetches.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::error::CacheError;
use crate::http::Response;

pub trait CacheStorage: Send + Sync {
    /// Create the named cache if it does not exist yet.
    fn open(&self, name: &str) -> Result<(), CacheError>;

    /// Names of all caches, oldest first.
    fn keys(&self) -> Result<Vec<String>, CacheError>;

    /// Drop a cache and its entries; `false` if it did not exist.
    fn delete(&self, name: &str) -> Result<bool, CacheError>;

    fn match_in(&self, name: &str, key: &str) -> Result<Option<Response>, CacheError>;

    fn put(&self, name: &str, key: &str, response: &Response) -> Result<(), CacheError>;

    /// Entry keys stored in one cache.
    fn entries(&self, name: &str) -> Result<Vec<String>, CacheError>;

    /// Look `key` up in every cache, oldest cache first.
    fn match_any(&self, key: &str) -> Result<Option<Response>, CacheError> {
        for name in self.keys()? {
            if let Some(hit) = self.match_in(&name, key)? {
                return Ok(Some(hit));
            }
        }
        Ok(None)
    }

    fn put_all(&self, name: &str, entries: &[(String, Response)]) -> Result<(), CacheError> {
        self.open(name)?;
        for (key, response) in entries {
            self.put(name, key, response)?;
        }
        Ok(())
    }
}

/// Process-local caches; clones share the same storage.
#[derive(Debug, Default, Clone)]
pub struct MemoryCacheStorage {
    inner: Arc<Mutex<Vec<(String, HashMap<String, Response>)>>>,
}

impl MemoryCacheStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<T>(
        &self,
        f: impl FnOnce(&mut Vec<(String, HashMap<String, Response>)>) -> T,
    ) -> Result<T, CacheError> {
        let mut guard = self.inner.lock().map_err(|_| CacheError::Poisoned)?;
        Ok(f(&mut guard))
    }
}

impl CacheStorage for MemoryCacheStorage {
    fn open(&self, name: &str) -> Result<(), CacheError> {
        self.with(|caches| {
            if !caches.iter().any(|(n, _)| n == name) {
                caches.push((name.to_string(), HashMap::new()));
            }
        })
    }

    fn keys(&self) -> Result<Vec<String>, CacheError> {
        self.with(|caches| caches.iter().map(|(n, _)| n.clone()).collect())
    }

    fn delete(&self, name: &str) -> Result<bool, CacheError> {
        self.with(|caches| {
            let before = caches.len();
            caches.retain(|(n, _)| n != name);
            caches.len() != before
        })
    }

    fn match_in(&self, name: &str, key: &str) -> Result<Option<Response>, CacheError> {
        self.with(|caches| {
            caches
                .iter()
                .find(|(n, _)| n == name)
                .and_then(|(_, entries)| entries.get(key).cloned())
        })
    }

    fn put(&self, name: &str, key: &str, response: &Response) -> Result<(), CacheError> {
        self.with(|caches| {
            let idx = match caches.iter().position(|(n, _)| n == name) {
                Some(idx) => idx,
                None => {
                    caches.push((name.to_string(), HashMap::new()));
                    caches.len() - 1
                }
            };
            caches[idx].1.insert(key.to_string(), response.clone());
        })
    }

    fn entries(&self, name: &str) -> Result<Vec<String>, CacheError> {
        self.with(|caches| {
            let mut keys: Vec<String> = caches
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, entries)| entries.keys().cloned().collect())
                .unwrap_or_default();
            keys.sort();
            keys
        })
    }
}

/// Caches on disk: `<root>/<hex(name)>/<sha256(key)>.json`.
///
/// Entry files are named by a digest so any URL fits in a file name; the key
/// itself is stored inside the entry.
#[derive(Debug, Clone)]
pub struct DiskCacheStorage {
    root: PathBuf,
    lock: Arc<Mutex<()>>,
}

#[derive(Serialize, Deserialize)]
struct StoredEntry {
    key: String,
    response: Response,
}

const ENTRY_EXT: &str = ".json";

fn hex_encode(s: &str) -> String {
    s.bytes().map(|b| format!("{b:02x}")).collect()
}

fn hex_decode(s: &str) -> Option<String> {
    if s.len() % 2 != 0 {
        return None;
    }
    let bytes = (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(s.get(i..i + 2)?, 16).ok())
        .collect::<Option<Vec<u8>>>()?;
    String::from_utf8(bytes).ok()
}

fn key_digest(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn io_err(path: &Path, source: io::Error) -> CacheError {
    CacheError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn read_entry(path: &Path) -> Result<Option<StoredEntry>, CacheError> {
    let raw = match fs::read(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(io_err(path, e)),
    };
    serde_json::from_slice(&raw)
        .map(Some)
        .map_err(|source| CacheError::Corrupt {
            path: path.to_path_buf(),
            source,
        })
}

impl DiskCacheStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn cache_dir(&self, name: &str) -> PathBuf {
        self.root.join(hex_encode(name))
    }

    fn entry_path(&self, name: &str, key: &str) -> PathBuf {
        self.cache_dir(name)
            .join(format!("{}{ENTRY_EXT}", key_digest(key)))
    }

    /// Decoded cache names under the root with their creation times.
    fn cache_names(&self) -> Result<Vec<(String, std::time::SystemTime)>, CacheError> {
        let rd = match fs::read_dir(&self.root) {
            Ok(rd) => rd,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_err(&self.root, e)),
        };
        let mut out = Vec::new();
        for entry in rd {
            let entry = entry.map_err(|e| io_err(&self.root, e))?;
            let Some(decoded) = entry.file_name().to_str().and_then(hex_decode) else {
                continue;
            };
            let created = entry
                .metadata()
                .and_then(|m| m.created().or_else(|_| m.modified()))
                .unwrap_or(std::time::UNIX_EPOCH);
            out.push((decoded, created));
        }
        Ok(out)
    }

    fn guard(&self) -> Result<std::sync::MutexGuard<'_, ()>, CacheError> {
        self.lock.lock().map_err(|_| CacheError::Poisoned)
    }
}

impl CacheStorage for DiskCacheStorage {
    fn open(&self, name: &str) -> Result<(), CacheError> {
        let _g = self.guard()?;
        let dir = self.cache_dir(name);
        fs::create_dir_all(&dir).map_err(|e| io_err(&dir, e))
    }

    fn keys(&self) -> Result<Vec<String>, CacheError> {
        let _g = self.guard()?;
        let mut names = self.cache_names()?;
        names.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        Ok(names.into_iter().map(|(n, _)| n).collect())
    }

    fn delete(&self, name: &str) -> Result<bool, CacheError> {
        let _g = self.guard()?;
        let dir = self.cache_dir(name);
        match fs::remove_dir_all(&dir) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(io_err(&dir, e)),
        }
    }

    fn match_in(&self, name: &str, key: &str) -> Result<Option<Response>, CacheError> {
        let _g = self.guard()?;
        let path = self.entry_path(name, key);
        Ok(read_entry(&path)?
            .filter(|entry| entry.key == key)
            .map(|entry| entry.response))
    }

    fn put(&self, name: &str, key: &str, response: &Response) -> Result<(), CacheError> {
        let _g = self.guard()?;
        let dir = self.cache_dir(name);
        fs::create_dir_all(&dir).map_err(|e| io_err(&dir, e))?;
        let path = self.entry_path(name, key);
        let tmp = path.with_extension("json.tmp");
        let entry = StoredEntry {
            key: key.to_string(),
            response: response.clone(),
        };
        let json = serde_json::to_vec(&entry).map_err(|source| CacheError::Corrupt {
            path: path.clone(),
            source,
        })?;
        fs::write(&tmp, json).map_err(|e| io_err(&tmp, e))?;
        fs::rename(&tmp, &path).map_err(|e| io_err(&path, e))?;
        debug!(cache = name, key, "cache entry stored");
        Ok(())
    }

    fn entries(&self, name: &str) -> Result<Vec<String>, CacheError> {
        let _g = self.guard()?;
        let dir = self.cache_dir(name);
        let rd = match fs::read_dir(&dir) {
            Ok(rd) => rd,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_err(&dir, e)),
        };
        let mut keys = Vec::new();
        for file in rd {
            let path = file.map_err(|e| io_err(&dir, e))?.path();
            if !path.to_str().is_some_and(|p| p.ends_with(ENTRY_EXT)) {
                continue;
            }
            match read_entry(&path) {
                Ok(Some(entry)) => keys.push(entry.key),
                Ok(None) => {}
                Err(e) => warn!(error = %e, "skipping unreadable cache entry"),
            }
        }
        keys.sort();
        Ok(keys)
    }
}
