//! Cache-first offline worker.
//!
//! Lifecycle: `Parsed -> Installed -> Activated`. Install precaches the app
//! shell and skips the waiting phase; activate drops every cache except the
//! current one and claims open clients. Once active, each fetch is served
//! cache first, then network (storing a copy), then the cached shell document,
//! then a generic error response. Fetches never fail the caller.

use reqwest::Url;
use tracing::{debug, info, warn};

use crate::cache::CacheStorage;
use crate::error::WorkerError;
use crate::fetcher::Fetcher;
use crate::http::{Request, Response};

pub const DEFAULT_CACHE_NAME: &str = "emi-finance-cache-v2";
pub const DEFAULT_SHELL_DOCUMENT: &str = "index.html";
pub const DEFAULT_SHELL_ASSETS: [&str; 2] = ["index.html", "manifest.json"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    /// Current cache version; any other cache is stale on activation
    pub cache_name: String,
    /// Base URL shell assets are resolved against
    pub scope: Url,
    pub shell_assets: Vec<String>,
    /// Served when both cache and network miss
    pub shell_document: String,
}

impl WorkerConfig {
    pub fn new(scope: Url) -> Self {
        Self {
            cache_name: DEFAULT_CACHE_NAME.to_string(),
            scope,
            shell_assets: DEFAULT_SHELL_ASSETS.iter().map(|a| a.to_string()).collect(),
            shell_document: DEFAULT_SHELL_DOCUMENT.to_string(),
        }
    }

    /// Parse `scope`, making sure relative assets resolve beneath it.
    pub fn parse_scope(scope: &str) -> Result<Url, WorkerError> {
        let normalized = if scope.ends_with('/') {
            scope.to_string()
        } else {
            format!("{scope}/")
        };
        Url::parse(&normalized).map_err(|e| WorkerError::InvalidUrl {
            url: scope.to_string(),
            message: e.to_string(),
        })
    }

    /// Resolve an asset path (or absolute URL) against the scope.
    pub fn resolve(&self, path: &str) -> Result<Url, WorkerError> {
        self.scope.join(path).map_err(|e| WorkerError::InvalidUrl {
            url: path.to_string(),
            message: e.to_string(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Parsed,
    Installed,
    Activated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServedFrom {
    Cache,
    Network,
    ShellFallback,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Served {
    pub response: Response,
    pub from: ServedFrom,
}

pub struct CacheWorker<C, F> {
    config: WorkerConfig,
    caches: C,
    network: F,
    state: WorkerState,
    skip_waiting: bool,
    clients_claimed: bool,
}

impl<C: CacheStorage, F: Fetcher> CacheWorker<C, F> {
    pub fn new(config: WorkerConfig, caches: C, network: F) -> Self {
        Self {
            config,
            caches,
            network,
            state: WorkerState::Parsed,
            skip_waiting: false,
            clients_claimed: false,
        }
    }

    /// A worker whose cache version already exists was installed and activated
    /// by an earlier run, so it starts out in control.
    pub fn restore(config: WorkerConfig, caches: C, network: F) -> Result<Self, WorkerError> {
        let active = caches.keys()?.contains(&config.cache_name);
        let mut worker = Self::new(config, caches, network);
        if active {
            worker.state = WorkerState::Activated;
            worker.skip_waiting = true;
            worker.clients_claimed = true;
        }
        Ok(worker)
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn caches(&self) -> &C {
        &self.caches
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    pub fn skipped_waiting(&self) -> bool {
        self.skip_waiting
    }

    pub fn clients_claimed(&self) -> bool {
        self.clients_claimed
    }

    /// Precache every shell asset, all or nothing, then skip waiting.
    pub async fn install(&mut self) -> Result<(), WorkerError> {
        if self.state != WorkerState::Parsed {
            return Err(WorkerError::InvalidState {
                action: "install",
                state: self.state,
            });
        }

        let mut entries = Vec::with_capacity(self.config.shell_assets.len());
        for asset in &self.config.shell_assets {
            let url = self.config.resolve(asset)?;
            let request = Request::get(url.clone());
            let response = self
                .network
                .fetch(&request)
                .await
                .map_err(|e| WorkerError::Precache {
                    url: url.to_string(),
                    reason: e.to_string(),
                })?;
            if !response.ok() {
                return Err(WorkerError::Precache {
                    url: url.to_string(),
                    reason: format!("status {}", response.status),
                });
            }
            entries.push((request.cache_key(), response));
        }

        self.caches.put_all(&self.config.cache_name, &entries)?;
        self.skip_waiting = true;
        self.state = WorkerState::Installed;
        info!(cache = %self.config.cache_name, assets = entries.len(), "shell precached");
        Ok(())
    }

    /// Delete stale caches and take control of open clients. Returns the
    /// names of the caches that were removed.
    pub fn activate(&mut self) -> Result<Vec<String>, WorkerError> {
        if self.state != WorkerState::Installed {
            return Err(WorkerError::InvalidState {
                action: "activate",
                state: self.state,
            });
        }

        let mut removed = Vec::new();
        for name in self.caches.keys()? {
            if name != self.config.cache_name && self.caches.delete(&name)? {
                removed.push(name);
            }
        }
        self.clients_claimed = true;
        self.state = WorkerState::Activated;
        info!(cache = %self.config.cache_name, removed = removed.len(), "worker activated");
        Ok(removed)
    }

    /// Install and activate in one go.
    pub async fn start(&mut self) -> Result<Vec<String>, WorkerError> {
        self.install().await?;
        self.activate()
    }

    /// Serve one request. Until the worker is active, requests pass straight
    /// to the network without touching the caches.
    pub async fn fetch(&self, request: &Request) -> Served {
        if self.state != WorkerState::Activated {
            debug!(url = %request.url, state = ?self.state, "not in control, passing through");
            return match self.network.fetch(request).await {
                Ok(response) => Served {
                    response,
                    from: ServedFrom::Network,
                },
                Err(_) => Served {
                    response: Response::error(),
                    from: ServedFrom::Error,
                },
            };
        }

        // only GET requests are ever answered from the cache
        let key = request.cache_key();
        if request.is_get() {
            match self.caches.match_any(&key) {
                Ok(Some(response)) => {
                    debug!(url = %request.url, "cache hit");
                    return Served {
                        response,
                        from: ServedFrom::Cache,
                    };
                }
                Ok(None) => {}
                Err(e) => warn!(url = %request.url, error = %e, "cache lookup failed"),
            }
        }

        match self.network.fetch(request).await {
            Ok(response) => {
                self.store_copy(request, &key, &response);
                Served {
                    response,
                    from: ServedFrom::Network,
                }
            }
            Err(e) => {
                debug!(url = %request.url, error = %e, "network failed, trying shell");
                self.shell_fallback()
            }
        }
    }

    fn store_copy(&self, request: &Request, key: &str, response: &Response) {
        if !request.is_get() {
            debug!(url = %request.url, method = %request.method, "not caching non-GET response");
            return;
        }
        if let Err(e) = self.caches.put(&self.config.cache_name, key, response) {
            debug!(url = %request.url, error = %e, "cache write failed");
        }
    }

    fn shell_fallback(&self) -> Served {
        let shell = self
            .config
            .resolve(&self.config.shell_document)
            .ok()
            .and_then(|url| self.caches.match_any(url.as_str()).ok().flatten());

        match shell {
            Some(response) => Served {
                response,
                from: ServedFrom::ShellFallback,
            },
            None => Served {
                response: Response::error(),
                from: ServedFrom::Error,
            },
        }
    }
}
