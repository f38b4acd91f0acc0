use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use finlight_offline::{
    CacheStorage, CacheWorker, DiskCacheStorage, Fetcher, MemoryCacheStorage, NetworkError,
    Request, Response, ServedFrom, Url, WorkerConfig, WorkerError, WorkerState,
};

/// Scripted network: serves known URLs, 404s the rest, or fails everything when offline.
#[derive(Clone, Default)]
struct FakeNetwork {
    pages: Arc<Mutex<HashMap<String, Response>>>,
    calls: Arc<AtomicUsize>,
    offline: Arc<AtomicBool>,
}

impl FakeNetwork {
    fn serve(&self, url: &str, body: &str) {
        self.pages
            .lock()
            .unwrap()
            .insert(url.to_string(), Response::new(200, body));
    }

    fn go_offline(&self) {
        self.offline.store(true, Ordering::SeqCst);
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Fetcher for FakeNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(NetworkError::Offline);
        }
        let pages = self.pages.lock().unwrap();
        Ok(pages
            .get(request.url.as_str())
            .cloned()
            .unwrap_or_else(|| Response::new(404, "not found")))
    }
}

const SCOPE: &str = "https://finance.example/app/";

fn url(path: &str) -> Url {
    Url::parse(SCOPE).unwrap().join(path).unwrap()
}

fn online_network() -> FakeNetwork {
    let net = FakeNetwork::default();
    net.serve(url("index.html").as_str(), "<html>shell</html>");
    net.serve(url("manifest.json").as_str(), "{\"name\":\"finance\"}");
    net.serve(url("app.js").as_str(), "console.log(1)");
    net
}

fn config() -> WorkerConfig {
    WorkerConfig::new(WorkerConfig::parse_scope("https://finance.example/app").unwrap())
}

async fn active_worker(
    caches: MemoryCacheStorage,
    net: FakeNetwork,
) -> CacheWorker<MemoryCacheStorage, FakeNetwork> {
    let mut worker = CacheWorker::new(config(), caches, net);
    worker.start().await.unwrap();
    worker
}

#[tokio::test]
async fn test_install_precaches_shell_and_skips_waiting() {
    let caches = MemoryCacheStorage::new();
    let mut worker = CacheWorker::new(config(), caches.clone(), online_network());
    worker.install().await.unwrap();

    assert_eq!(worker.state(), WorkerState::Installed);
    assert!(worker.skipped_waiting());
    assert_eq!(
        caches.entries("emi-finance-cache-v2").unwrap(),
        vec![
            url("index.html").to_string(),
            url("manifest.json").to_string()
        ]
    );
}

#[tokio::test]
async fn test_install_is_all_or_nothing() {
    let net = FakeNetwork::default();
    net.serve(url("index.html").as_str(), "<html>shell</html>");
    // manifest.json 404s
    let caches = MemoryCacheStorage::new();
    let mut worker = CacheWorker::new(config(), caches.clone(), net);

    let err = worker.install().await.unwrap_err();
    assert!(matches!(err, WorkerError::Precache { .. }));
    assert_eq!(worker.state(), WorkerState::Parsed);
    assert!(caches.keys().unwrap().is_empty());
}

#[tokio::test]
async fn test_activate_deletes_stale_caches_and_claims() {
    let caches = MemoryCacheStorage::new();
    caches
        .put("emi-finance-cache-v1", &url("index.html").to_string(), &Response::new(200, "old"))
        .unwrap();
    caches.open("someone-else").unwrap();

    let mut worker = CacheWorker::new(config(), caches.clone(), online_network());
    assert!(matches!(
        worker.activate(),
        Err(WorkerError::InvalidState { .. })
    ));

    let mut removed = worker.start().await.unwrap();
    removed.sort();
    assert_eq!(removed, vec!["emi-finance-cache-v1", "someone-else"]);
    assert_eq!(caches.keys().unwrap(), vec!["emi-finance-cache-v2".to_string()]);
    assert!(worker.clients_claimed());
    assert_eq!(worker.state(), WorkerState::Activated);
}

#[tokio::test]
async fn test_cache_hit_skips_network() {
    let net = online_network();
    let worker = active_worker(MemoryCacheStorage::new(), net.clone()).await;
    let calls_after_install = net.calls();

    let served = worker.fetch(&Request::get(url("manifest.json"))).await;
    assert_eq!(served.from, ServedFrom::Cache);
    assert_eq!(served.response.body, b"{\"name\":\"finance\"}".to_vec());
    assert_eq!(net.calls(), calls_after_install);
}

#[tokio::test]
async fn test_miss_goes_to_network_and_stores_copy() {
    let net = online_network();
    let caches = MemoryCacheStorage::new();
    let worker = active_worker(caches.clone(), net.clone()).await;

    let first = worker.fetch(&Request::get(url("app.js"))).await;
    assert_eq!(first.from, ServedFrom::Network);
    assert_eq!(
        caches
            .match_in("emi-finance-cache-v2", url("app.js").as_str())
            .unwrap(),
        Some(Response::new(200, "console.log(1)"))
    );

    net.go_offline();
    let second = worker.fetch(&Request::get(url("app.js"))).await;
    assert_eq!(second.from, ServedFrom::Cache);
    assert_eq!(second.response, first.response);
}

#[tokio::test]
async fn test_offline_miss_falls_back_to_shell() {
    let net = online_network();
    let worker = active_worker(MemoryCacheStorage::new(), net.clone()).await;
    net.go_offline();

    let served = worker.fetch(&Request::get(url("reports/2024-03"))).await;
    assert_eq!(served.from, ServedFrom::ShellFallback);
    assert_eq!(served.response.body, b"<html>shell</html>".to_vec());
}

#[tokio::test]
async fn test_offline_without_shell_is_error_response() {
    let net = online_network();
    let caches = MemoryCacheStorage::new();
    let worker = active_worker(caches.clone(), net.clone()).await;
    caches.delete("emi-finance-cache-v2").unwrap();
    net.go_offline();

    let served = worker.fetch(&Request::get(url("app.js"))).await;
    assert_eq!(served.from, ServedFrom::Error);
    assert!(served.response.is_error());
}

#[tokio::test]
async fn test_non_get_requests_bypass_the_cache() {
    let net = online_network();
    let caches = MemoryCacheStorage::new();
    let worker = active_worker(caches.clone(), net.clone()).await;
    let cached_shell = caches
        .match_in("emi-finance-cache-v2", url("index.html").as_str())
        .unwrap();
    assert!(cached_shell.is_some());

    net.serve(url("index.html").as_str(), "<html>posted</html>");
    let before = net.calls();
    let post = Request {
        method: "POST".to_string(),
        url: url("index.html"),
    };
    let served = worker.fetch(&post).await;
    assert_eq!(served.from, ServedFrom::Network);
    assert_eq!(served.response.body, b"<html>posted</html>".to_vec());
    assert_eq!(net.calls(), before + 1);

    // the POST answer is neither stored nor allowed to replace the cached GET
    assert_eq!(
        caches
            .match_in("emi-finance-cache-v2", url("index.html").as_str())
            .unwrap(),
        cached_shell
    );
    let post_script = Request {
        method: "POST".to_string(),
        url: url("app.js"),
    };
    worker.fetch(&post_script).await;
    assert_eq!(
        caches
            .match_in("emi-finance-cache-v2", url("app.js").as_str())
            .unwrap(),
        None
    );
}

#[tokio::test]
async fn test_concurrent_fetches_are_independent() {
    let net = online_network();
    let worker = active_worker(MemoryCacheStorage::new(), net).await;

    let script = Request::get(url("app.js"));
    let shell = Request::get(url("index.html"));
    let missing = Request::get(url("missing.css"));
    let (a, b, c) = tokio::join!(
        worker.fetch(&script),
        worker.fetch(&shell),
        worker.fetch(&missing),
    );
    assert_eq!(a.from, ServedFrom::Network);
    assert_eq!(b.from, ServedFrom::Cache);
    assert_eq!(c.from, ServedFrom::Network);
    assert_eq!(c.response.status, 404);
}

#[tokio::test]
async fn test_uncontrolled_worker_passes_through() {
    let net = online_network();
    let caches = MemoryCacheStorage::new();
    let worker = CacheWorker::new(config(), caches.clone(), net);

    let served = worker.fetch(&Request::get(url("app.js"))).await;
    assert_eq!(served.from, ServedFrom::Network);
    assert!(caches.keys().unwrap().is_empty());
}

#[tokio::test]
async fn test_restore_from_disk_is_in_control() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("cache");
    let net = online_network();
    {
        let mut worker = CacheWorker::new(config(), DiskCacheStorage::new(&root), net.clone());
        worker.start().await.unwrap();
    }

    net.go_offline();
    let worker = CacheWorker::restore(config(), DiskCacheStorage::new(&root), net).unwrap();
    assert_eq!(worker.state(), WorkerState::Activated);
    let served = worker.fetch(&Request::get(url("anything"))).await;
    assert_eq!(served.from, ServedFrom::ShellFallback);
}
