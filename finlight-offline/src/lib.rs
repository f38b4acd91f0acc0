//! finlight-offline: cache-first offline worker for the app shell and assets

pub mod cache;
pub mod error;
pub mod fetcher;
pub mod http;
pub mod worker;

pub use cache::{CacheStorage, DiskCacheStorage, MemoryCacheStorage};
pub use error::{CacheError, NetworkError, WorkerError};
pub use fetcher::{Fetcher, ReqwestFetcher};
pub use http::{Request, Response};
pub use reqwest::Url;
pub use worker::{
    CacheWorker, DEFAULT_CACHE_NAME, DEFAULT_SHELL_ASSETS, DEFAULT_SHELL_DOCUMENT, Served,
    ServedFrom, WorkerConfig, WorkerState,
};
