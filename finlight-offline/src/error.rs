use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache I/O on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt cache entry {}: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("cache lock poisoned")]
    Poisoned,
}

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("request to {url} failed: {message}")]
    Request { url: String, message: String },

    #[error("network unreachable")]
    Offline,
}

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("invalid url {url}: {message}")]
    InvalidUrl { url: String, message: String },

    #[error("precaching {url} failed: {reason}")]
    Precache { url: String, reason: String },

    #[error("cannot {action} while worker is {state:?}")]
    InvalidState {
        action: &'static str,
        state: crate::worker::WorkerState,
    },

    #[error(transparent)]
    Cache(#[from] CacheError),
}
