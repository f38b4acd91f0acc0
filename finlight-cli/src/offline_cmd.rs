use anyhow::{Context, Result};
use clap::Subcommand;
use std::fs;
use std::path::{Path, PathBuf};

use finlight_offline::{
    CacheStorage, CacheWorker, DiskCacheStorage, ReqwestFetcher, Request, ServedFrom, WorkerState,
};

use crate::config::Config;
use crate::state::{cache_dir, ensure_dir};

#[derive(Subcommand, Debug)]
pub enum OfflineCommand {
    /// Precache the app shell, drop stale caches and take control
    Install,

    /// Fetch a path (relative to offline.scope) or URL through the worker
    Fetch {
        target: String,

        #[arg(long, default_value = "GET")]
        method: String,

        /// Write the response body here
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// List caches and their entries
    Status,
}

pub async fn run(home: &Path, cfg: &Config, cmd: OfflineCommand) -> Result<()> {
    let dir = cache_dir(home);
    ensure_dir(&dir)?;
    let storage = DiskCacheStorage::new(&dir);
    let worker_cfg = cfg.offline.worker_config()?;

    match cmd {
        OfflineCommand::Install => {
            let mut worker = CacheWorker::new(worker_cfg, storage, ReqwestFetcher::new());
            let removed = worker.start().await.context("install offline worker")?;
            println!(
                "Cached {} shell assets in {}",
                worker.config().shell_assets.len(),
                worker.config().cache_name
            );
            for name in removed {
                println!("Removed stale cache {name}");
            }
        }

        OfflineCommand::Fetch {
            target,
            method,
            out,
        } => {
            let worker = CacheWorker::restore(worker_cfg, storage, ReqwestFetcher::new())?;
            if worker.state() != WorkerState::Activated {
                println!("Worker not installed; request goes straight to the network (run: finlight offline install)");
            }
            let url = worker.config().resolve(&target)?;
            let served = worker
                .fetch(&Request {
                    method: method.to_uppercase(),
                    url: url.clone(),
                })
                .await;

            let from = match served.from {
                ServedFrom::Cache => "cache",
                ServedFrom::Network => "network",
                ServedFrom::ShellFallback => "cached shell (offline fallback)",
                ServedFrom::Error => "nowhere (network error)",
            };
            println!(
                "{url}: served from {from}, status {}, {} bytes",
                served.response.status,
                served.response.body.len()
            );
            if let Some(out) = out {
                fs::write(&out, &served.response.body)
                    .with_context(|| format!("write {}", out.display()))?;
                println!("Wrote {}", out.display());
            }
        }

        OfflineCommand::Status => {
            let names = storage.keys()?;
            if names.is_empty() {
                println!("No caches in {}", dir.display());
            }
            for name in names {
                let marker = if name == worker_cfg.cache_name { " (current)" } else { "" };
                println!("{name}{marker}");
                for key in storage.entries(&name)? {
                    println!("  {key}");
                }
            }
        }
    }

    Ok(())
}
