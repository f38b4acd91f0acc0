use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use finlight_core::{FileStore, Ledger, PersistenceStore};

use crate::config::Config;

/// `--home`, then `$FINLIGHT_HOME`, then `~/.finlight`.
pub fn finlight_home(override_dir: Option<&Path>) -> Result<PathBuf> {
    if let Some(dir) = override_dir {
        return Ok(dir.to_path_buf());
    }
    if let Ok(dir) = std::env::var("FINLIGHT_HOME") {
        if !dir.trim().is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".finlight"))
}

pub fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))
}

pub fn store_dir(home: &Path) -> PathBuf {
    home.join("store")
}

pub fn cache_dir(home: &Path) -> PathBuf {
    home.join("cache")
}

pub fn config_path(home: &Path) -> PathBuf {
    home.join("config.toml")
}

/// The on-disk ledger under `<home>/store`.
pub fn open_ledger(home: &Path, cfg: &Config) -> Result<Ledger<FileStore>> {
    let dir = store_dir(home);
    ensure_dir(&dir)?;
    let store = PersistenceStore::with_key(FileStore::new(dir), cfg.ledger.storage_key.clone());
    Ok(Ledger::open(store))
}
