use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use finlight_core::DEFAULT_STORAGE_KEY;
use finlight_offline::{
    DEFAULT_CACHE_NAME, DEFAULT_SHELL_ASSETS, DEFAULT_SHELL_DOCUMENT, WorkerConfig,
};

use crate::state::{config_path, ensure_dir};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub ledger: LedgerSection,
    #[serde(default)]
    pub offline: OfflineSection,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LedgerSection {
    /// Key the ledger document is stored under
    pub storage_key: String,
    /// Label printed after amounts
    pub currency: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OfflineSection {
    pub cache_name: String,
    /// Base URL of the hosted app
    pub scope: String,
    pub shell_assets: Vec<String>,
    pub shell_document: String,
}

impl Default for LedgerSection {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            currency: "лв".to_string(),
        }
    }
}

impl Default for OfflineSection {
    fn default() -> Self {
        Self {
            cache_name: DEFAULT_CACHE_NAME.to_string(),
            scope: "http://localhost:8080/".to_string(),
            shell_assets: DEFAULT_SHELL_ASSETS.iter().map(|a| a.to_string()).collect(),
            shell_document: DEFAULT_SHELL_DOCUMENT.to_string(),
        }
    }
}

impl OfflineSection {
    pub fn worker_config(&self) -> Result<WorkerConfig> {
        let scope = WorkerConfig::parse_scope(&self.scope)
            .with_context(|| format!("offline.scope = {:?}", self.scope))?;
        let mut cfg = WorkerConfig::new(scope);
        cfg.cache_name = self.cache_name.clone();
        cfg.shell_assets = self.shell_assets.clone();
        cfg.shell_document = self.shell_document.clone();
        Ok(cfg)
    }
}

pub fn load_config(home: &Path) -> Result<Config> {
    let p = config_path(home);
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    toml::from_str(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn save_config(home: &Path, cfg: &Config) -> Result<()> {
    ensure_dir(home)?;
    let p = config_path(home);
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config(home: &Path) -> Result<()> {
    let p = config_path(home);
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config(home, &Config::default())?;
    println!("Wrote {}", p.display());
    Ok(())
}
