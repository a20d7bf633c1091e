//! Offline cache manager.
//!
//! A versioned snapshot of the application shell lives in one named cache.
//! Installing populates it all-or-nothing from a fixed manifest, activating
//! deletes every other cache, and fetches are answered cache-first with
//! network fallback. The host (a service worker in the browser, an in-memory
//! fake in tests) is reached through [`CacheBackend`].

use std::cell::RefCell;

use futures::future::try_join_all;
use log::{debug, info, warn};
use thiserror::Error;

use crate::config::{CACHE_VERSION, OFFLINE_ASSETS, ROOT_DOCUMENT};

pub mod memory;
pub mod web;

pub use memory::{MemoryBackend, MemoryResponse};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OfflineError {
    #[error("cache storage error: {0}")]
    Cache(String),
    #[error("network request for '{url}' failed: {reason}")]
    Network { url: String, reason: String },
    #[error("installing cache '{version}' failed: {reason}")]
    Install { version: String, reason: String },
    #[error("'{0}' is not cached and the network is unreachable")]
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLifecycle {
    Uninstalled,
    Installing,
    Active(String),
}

/// Cache storage plus network, as seen from the worker.
///
/// Every operation is individually atomic from the caller's side. Futures are
/// not `Send`: the worker is single-threaded.
#[allow(async_fn_in_trait)]
pub trait CacheBackend {
    /// An intercepted request. Forwarded to the network as received.
    type Request: ?Sized;
    type Response;

    async fn cache_names(&self) -> Result<Vec<String>, OfflineError>;
    async fn delete_cache(&self, name: &str) -> Result<bool, OfflineError>;
    /// Fetch every URL and store all of them in `cache`, or store nothing.
    async fn add_all(&self, cache: &str, urls: &[&str]) -> Result<(), OfflineError>;
    /// First match for `request` across all caches.
    async fn lookup(&self, request: &Self::Request)
        -> Result<Option<Self::Response>, OfflineError>;
    /// First match for a bare URL across all caches.
    async fn lookup_url(&self, url: &str) -> Result<Option<Self::Response>, OfflineError>;
    async fn put(
        &self,
        cache: &str,
        request: &Self::Request,
        response: Self::Response,
    ) -> Result<(), OfflineError>;
    async fn fetch(&self, request: &Self::Request) -> Result<Self::Response, OfflineError>;
    fn url(&self, request: &Self::Request) -> String;
    fn duplicate(&self, response: &Self::Response) -> Result<Self::Response, OfflineError>;
    fn is_cacheable(&self, response: &Self::Response) -> bool;
}

pub struct OfflineCache<B> {
    backend: B,
    version: String,
    manifest: Vec<String>,
    root_document: String,
    state: RefCell<CacheLifecycle>,
}

impl<B: CacheBackend> OfflineCache<B> {
    /// Manager for the application's own version tag and asset manifest.
    pub fn new(backend: B) -> Self {
        Self::with_manifest(backend, CACHE_VERSION, OFFLINE_ASSETS, ROOT_DOCUMENT)
    }

    pub fn with_manifest(
        backend: B,
        version: &str,
        manifest: &[&str],
        root_document: &str,
    ) -> Self {
        Self {
            backend,
            version: version.to_string(),
            manifest: manifest.iter().map(|s| s.to_string()).collect(),
            root_document: root_document.to_string(),
            state: RefCell::new(CacheLifecycle::Uninstalled),
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn state(&self) -> CacheLifecycle {
        self.state.borrow().clone()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Populate this version's cache from the manifest.
    ///
    /// On failure the state goes back to what it was and a cache this call
    /// created is dropped again. A cache of the same name that existed before
    /// is left alone: an older worker may still be serving from it.
    pub async fn install(&self) -> Result<(), OfflineError> {
        let previous = self.state.replace(CacheLifecycle::Installing);
        info!(
            "installing offline cache '{}' ({} assets)",
            self.version,
            self.manifest.len()
        );

        let existed = match self.backend.cache_names().await {
            Ok(names) => names.contains(&self.version),
            Err(e) => {
                debug!("could not list caches before install: {}", e);
                true
            }
        };

        let urls: Vec<&str> = self.manifest.iter().map(String::as_str).collect();
        match self.backend.add_all(&self.version, &urls).await {
            Ok(()) => {
                info!("offline cache '{}' populated", self.version);
                Ok(())
            }
            Err(e) => {
                warn!("offline cache '{}' install aborted: {}", self.version, e);
                if !existed {
                    if let Err(cleanup) = self.backend.delete_cache(&self.version).await {
                        debug!("could not drop partial cache: {}", cleanup);
                    }
                }
                *self.state.borrow_mut() = previous;
                Err(OfflineError::Install {
                    version: self.version.clone(),
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Delete every cache not named after this version. Returns the purged
    /// names.
    pub async fn activate(&self) -> Result<Vec<String>, OfflineError> {
        let stale: Vec<String> = self
            .backend
            .cache_names()
            .await?
            .into_iter()
            .filter(|name| *name != self.version)
            .collect();

        let deleted = try_join_all(stale.iter().map(|name| self.backend.delete_cache(name))).await?;
        let purged: Vec<String> = stale
            .into_iter()
            .zip(deleted)
            .filter_map(|(name, removed)| removed.then_some(name))
            .collect();

        *self.state.borrow_mut() = CacheLifecycle::Active(self.version.clone());
        info!(
            "offline cache '{}' active, purged {:?}",
            self.version, purged
        );
        Ok(purged)
    }

    /// Answer a request: cache, then network (stored on success), then the
    /// cached root document.
    pub async fn respond(&self, request: &B::Request) -> Result<B::Response, OfflineError> {
        match self.backend.lookup(request).await {
            Ok(Some(hit)) => return Ok(hit),
            Ok(None) => {}
            Err(e) => debug!(
                "cache lookup for '{}' failed: {}",
                self.backend.url(request),
                e
            ),
        }

        match self.backend.fetch(request).await {
            Ok(response) => {
                self.store_copy(request, &response).await;
                Ok(response)
            }
            Err(e) => {
                debug!("{}, falling back to '{}'", e, self.root_document);
                match self.backend.lookup_url(&self.root_document).await {
                    Ok(Some(shell)) => Ok(shell),
                    _ => Err(OfflineError::Unavailable(self.backend.url(request))),
                }
            }
        }
    }

    async fn store_copy(&self, request: &B::Request, response: &B::Response) {
        if !self.backend.is_cacheable(response) {
            return;
        }
        let copy = match self.backend.duplicate(response) {
            Ok(copy) => copy,
            Err(e) => {
                debug!(
                    "could not copy response for '{}': {}",
                    self.backend.url(request),
                    e
                );
                return;
            }
        };
        if let Err(e) = self.backend.put(&self.version, request, copy).await {
            debug!("could not cache '{}': {}", self.backend.url(request), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use std::cell::RefCell;

    const MANIFEST: &[&str] = &[".", "index.html", "app.js", "icon.png"];

    fn seeded_backend() -> MemoryBackend {
        let backend = MemoryBackend::new();
        backend.serve(".", MemoryResponse::ok(b"<html>shell</html>".to_vec()));
        backend.serve("index.html", MemoryResponse::ok(b"<html>shell</html>".to_vec()));
        backend.serve("app.js", MemoryResponse::ok(b"console.log(1)".to_vec()));
        backend.serve("icon.png", MemoryResponse::ok(vec![0x89, 0x50, 0x4e, 0x47, 0x00, 0xff]));
        backend
    }

    fn manager(backend: MemoryBackend, version: &str) -> OfflineCache<MemoryBackend> {
        OfflineCache::with_manifest(backend, version, MANIFEST, "index.html")
    }

    #[test]
    fn install_then_activate_reaches_active() {
        let cache = manager(seeded_backend(), "v1");
        assert_eq!(cache.state(), CacheLifecycle::Uninstalled);

        block_on(cache.install()).expect("install");
        assert_eq!(cache.state(), CacheLifecycle::Installing);
        assert_eq!(cache.backend().entry_count("v1"), Some(MANIFEST.len()));

        block_on(cache.activate()).expect("activate");
        assert_eq!(cache.state(), CacheLifecycle::Active("v1".to_string()));
    }

    #[test]
    fn activation_leaves_exactly_one_cache() {
        let backend = seeded_backend();
        backend.insert_cache("v0", &[("index.html", MemoryResponse::ok(b"old".to_vec()))]);
        backend.insert_cache("unrelated", &[]);

        let cache = manager(backend, "v1");
        block_on(cache.install()).expect("install");
        let mut purged = block_on(cache.activate()).expect("activate");
        purged.sort();

        assert_eq!(purged, vec!["unrelated".to_string(), "v0".to_string()]);
        assert_eq!(
            block_on(cache.backend().cache_names()).expect("names"),
            vec!["v1".to_string()]
        );
    }

    #[test]
    fn failed_install_keeps_previous_snapshot() {
        let backend = seeded_backend();
        let old = cache_with_version(backend, "v1");
        let backend = old.backend;

        // the next version lists an asset the server no longer has
        let next = OfflineCache::with_manifest(
            backend,
            "v2",
            &["index.html", "missing.css"],
            "index.html",
        );
        let err = block_on(next.install()).expect_err("missing asset");
        assert!(matches!(err, OfflineError::Install { ref version, .. } if version == "v2"));
        assert_eq!(next.state(), CacheLifecycle::Uninstalled);
        assert_eq!(
            block_on(next.backend().cache_names()).expect("names"),
            vec!["v1".to_string()]
        );

        next.backend().set_online(false);
        let shell = block_on(next.respond("index.html")).expect("old shell");
        assert_eq!(shell.body, b"<html>shell</html>".to_vec());
    }

    fn cache_with_version(backend: MemoryBackend, version: &str) -> OfflineCache<MemoryBackend> {
        let cache = manager(backend, version);
        block_on(cache.install()).expect("install");
        block_on(cache.activate()).expect("activate");
        cache
    }

    #[test]
    fn offline_fetch_returns_installed_bytes() {
        let cache = cache_with_version(seeded_backend(), "v1");
        cache.backend().set_online(false);

        let icon = block_on(cache.respond("icon.png")).expect("cached icon");
        assert_eq!(icon.body, vec![0x89, 0x50, 0x4e, 0x47, 0x00, 0xff]);
        assert_eq!(cache.backend().fetch_count(), MANIFEST.len());
    }

    #[test]
    fn unknown_route_offline_gets_root_document() {
        let cache = cache_with_version(seeded_backend(), "v1");
        cache.backend().set_online(false);

        let page = block_on(cache.respond("/some/deep/link")).expect("shell fallback");
        assert_eq!(page.body, b"<html>shell</html>".to_vec());
    }

    #[test]
    fn miss_without_any_cache_fails() {
        let cache = manager(seeded_backend(), "v1");
        cache.backend().set_online(false);
        let err = block_on(cache.respond("app.js")).expect_err("nothing cached");
        assert_eq!(err, OfflineError::Unavailable("app.js".to_string()));
    }

    #[test]
    fn network_hits_are_cached_opportunistically() {
        let backend = seeded_backend();
        backend.serve("fonts/a.woff2", MemoryResponse::ok(b"font".to_vec()));
        let cache = cache_with_version(backend, "v1");

        let fresh = block_on(cache.respond("fonts/a.woff2")).expect("network");
        assert_eq!(fresh.body, b"font".to_vec());

        cache.backend().set_online(false);
        let again = block_on(cache.respond("fonts/a.woff2")).expect("cached copy");
        assert_eq!(again, fresh);
    }

    #[test]
    fn error_responses_are_not_cached() {
        let cache = cache_with_version(seeded_backend(), "v1");
        let missing = block_on(cache.respond("nope.txt")).expect("404 passes through");
        assert_eq!(missing.status, 404);
        assert_eq!(cache.backend().entry_count("v1"), Some(MANIFEST.len()));
    }

    #[test]
    fn cache_write_failures_are_ignored() {
        let backend = seeded_backend();
        backend.serve("late.js", MemoryResponse::ok(b"late".to_vec()));
        let cache = cache_with_version(backend, "v1");
        cache.backend().fail_puts(true);

        let response = block_on(cache.respond("late.js")).expect("network response");
        assert_eq!(response.body, b"late".to_vec());
        assert_eq!(cache.backend().entry_count("v1"), Some(MANIFEST.len()));
    }

    #[test]
    fn cache_hits_skip_the_network() {
        let cache = cache_with_version(seeded_backend(), "v1");
        let before = cache.backend().fetch_count();
        block_on(cache.respond("app.js")).expect("hit");
        assert_eq!(cache.backend().fetch_count(), before);
    }

    #[test]
    fn failed_reinstall_keeps_live_cache_of_same_version() {
        let live = cache_with_version(seeded_backend(), "v1");
        let backend = live.backend;
        backend.serve("app.js", MemoryResponse::not_found());

        // a freshly started worker knows nothing about the live cache
        let redeployed = manager(backend, "v1");
        let err = block_on(redeployed.install()).expect_err("app.js now 404s");
        assert!(matches!(err, OfflineError::Install { ref version, .. } if version == "v1"));
        assert_eq!(redeployed.state(), CacheLifecycle::Uninstalled);
        assert_eq!(redeployed.backend().entry_count("v1"), Some(MANIFEST.len()));

        redeployed.backend().set_online(false);
        let shell = block_on(redeployed.respond("index.html")).expect("live shell");
        assert_eq!(shell.body, b"<html>shell</html>".to_vec());
        let script = block_on(redeployed.respond("app.js")).expect("live script");
        assert_eq!(script.body, b"console.log(1)".to_vec());
    }

    #[test]
    fn failed_purge_leaves_state_unchanged() {
        let old = cache_with_version(seeded_backend(), "v1");
        let next = manager(old.backend, "v2");
        block_on(next.install()).expect("install");

        next.backend().fail_deletes(true);
        let err = block_on(next.activate()).expect_err("delete fails");
        assert!(matches!(err, OfflineError::Cache(_)));
        assert_eq!(next.state(), CacheLifecycle::Installing);
        assert_eq!(
            block_on(next.backend().cache_names()).expect("names"),
            vec!["v1".to_string(), "v2".to_string()]
        );

        next.backend().fail_deletes(false);
        let purged = block_on(next.activate()).expect("activate");
        assert_eq!(purged, vec!["v1".to_string()]);
        assert_eq!(next.state(), CacheLifecycle::Active("v2".to_string()));
    }

    /// A request that carries more than its URL.
    struct ModeRequest {
        url: &'static str,
        mode: &'static str,
    }

    /// Records the mode of every request handed to the network or the cache.
    struct ModeRecorder {
        inner: MemoryBackend,
        forwarded: RefCell<Vec<&'static str>>,
    }

    impl CacheBackend for ModeRecorder {
        type Request = ModeRequest;
        type Response = MemoryResponse;

        async fn cache_names(&self) -> Result<Vec<String>, OfflineError> {
            self.inner.cache_names().await
        }

        async fn delete_cache(&self, name: &str) -> Result<bool, OfflineError> {
            self.inner.delete_cache(name).await
        }

        async fn add_all(&self, cache: &str, urls: &[&str]) -> Result<(), OfflineError> {
            self.inner.add_all(cache, urls).await
        }

        async fn lookup(
            &self,
            request: &ModeRequest,
        ) -> Result<Option<MemoryResponse>, OfflineError> {
            self.inner.lookup(request.url).await
        }

        async fn lookup_url(&self, url: &str) -> Result<Option<MemoryResponse>, OfflineError> {
            self.inner.lookup_url(url).await
        }

        async fn put(
            &self,
            cache: &str,
            request: &ModeRequest,
            response: MemoryResponse,
        ) -> Result<(), OfflineError> {
            self.forwarded.borrow_mut().push(request.mode);
            self.inner.put(cache, request.url, response).await
        }

        async fn fetch(&self, request: &ModeRequest) -> Result<MemoryResponse, OfflineError> {
            self.forwarded.borrow_mut().push(request.mode);
            self.inner.fetch(request.url).await
        }

        fn url(&self, request: &ModeRequest) -> String {
            request.url.to_string()
        }

        fn duplicate(&self, response: &MemoryResponse) -> Result<MemoryResponse, OfflineError> {
            self.inner.duplicate(response)
        }

        fn is_cacheable(&self, response: &MemoryResponse) -> bool {
            self.inner.is_cacheable(response)
        }
    }

    #[test]
    fn intercepted_request_is_forwarded_unchanged() {
        let inner = seeded_backend();
        inner.serve("https://cdn.example/font.woff2", MemoryResponse::ok(b"font".to_vec()));
        let backend = ModeRecorder {
            inner,
            forwarded: RefCell::new(Vec::new()),
        };
        let cache = OfflineCache::with_manifest(backend, "v1", MANIFEST, "index.html");

        let request = ModeRequest {
            url: "https://cdn.example/font.woff2",
            mode: "no-cors",
        };
        let response = block_on(cache.respond(&request)).expect("network");
        assert_eq!(response.body, b"font".to_vec());
        // once to the network, once into the cache
        assert_eq!(*cache.backend().forwarded.borrow(), vec!["no-cors", "no-cors"]);

        cache.backend().inner.set_online(false);
        let again = block_on(cache.respond(&request)).expect("cached copy");
        assert_eq!(again.body, b"font".to_vec());
    }
}
