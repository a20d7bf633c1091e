//! In-memory cache storage and scripted network.
//!
//! Caches are kept in name order, which is also the order `lookup` searches
//! them in.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};

use super::{CacheBackend, OfflineError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl MemoryResponse {
    pub fn ok(body: Vec<u8>) -> Self {
        Self { status: 200, body }
    }

    pub fn not_found() -> Self {
        Self {
            status: 404,
            body: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

type Entries = BTreeMap<String, MemoryResponse>;

#[derive(Debug)]
pub struct MemoryBackend {
    caches: RefCell<BTreeMap<String, Entries>>,
    network: RefCell<HashMap<String, MemoryResponse>>,
    online: Cell<bool>,
    fail_puts: Cell<bool>,
    fail_deletes: Cell<bool>,
    fetches: Cell<usize>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self {
            caches: RefCell::new(BTreeMap::new()),
            network: RefCell::new(HashMap::new()),
            online: Cell::new(true),
            fail_puts: Cell::new(false),
            fail_deletes: Cell::new(false),
            fetches: Cell::new(0),
        }
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the network answer `url` with `response`. Unknown URLs get 404.
    pub fn serve(&self, url: &str, response: MemoryResponse) {
        self.network.borrow_mut().insert(url.to_string(), response);
    }

    pub fn set_online(&self, online: bool) {
        self.online.set(online);
    }

    /// Make every `put` fail, like a storage quota error.
    pub fn fail_puts(&self, fail: bool) {
        self.fail_puts.set(fail);
    }

    /// Make every `delete_cache` fail.
    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.set(fail);
    }

    /// Create (or replace) a cache directly, bypassing the network.
    pub fn insert_cache(&self, name: &str, entries: &[(&str, MemoryResponse)]) {
        let entries = entries
            .iter()
            .map(|(url, response)| (url.to_string(), response.clone()))
            .collect();
        self.caches.borrow_mut().insert(name.to_string(), entries);
    }

    pub fn entry_count(&self, cache: &str) -> Option<usize> {
        self.caches.borrow().get(cache).map(BTreeMap::len)
    }

    /// Network requests attempted so far, including those made by `add_all`.
    pub fn fetch_count(&self) -> usize {
        self.fetches.get()
    }

    fn request(&self, url: &str) -> Result<MemoryResponse, OfflineError> {
        self.fetches.set(self.fetches.get() + 1);
        if !self.online.get() {
            return Err(OfflineError::Network {
                url: url.to_string(),
                reason: "offline".to_string(),
            });
        }
        Ok(self
            .network
            .borrow()
            .get(url)
            .cloned()
            .unwrap_or_else(MemoryResponse::not_found))
    }
}

/// Requests are bare URLs.
impl CacheBackend for MemoryBackend {
    type Request = str;
    type Response = MemoryResponse;

    async fn cache_names(&self) -> Result<Vec<String>, OfflineError> {
        Ok(self.caches.borrow().keys().cloned().collect())
    }

    async fn delete_cache(&self, name: &str) -> Result<bool, OfflineError> {
        if self.fail_deletes.get() {
            return Err(OfflineError::Cache(format!("could not delete '{}'", name)));
        }
        Ok(self.caches.borrow_mut().remove(name).is_some())
    }

    async fn add_all(&self, cache: &str, urls: &[&str]) -> Result<(), OfflineError> {
        // opening the cache creates it even if population fails
        self.caches
            .borrow_mut()
            .entry(cache.to_string())
            .or_default();

        let mut fetched = Vec::with_capacity(urls.len());
        for url in urls {
            let response = self.request(url)?;
            if !response.is_success() {
                return Err(OfflineError::Network {
                    url: url.to_string(),
                    reason: format!("status {}", response.status),
                });
            }
            fetched.push((url.to_string(), response));
        }

        let mut caches = self.caches.borrow_mut();
        let entries = caches.entry(cache.to_string()).or_default();
        entries.extend(fetched);
        Ok(())
    }

    async fn lookup(&self, url: &str) -> Result<Option<MemoryResponse>, OfflineError> {
        self.lookup_url(url).await
    }

    async fn lookup_url(&self, url: &str) -> Result<Option<MemoryResponse>, OfflineError> {
        Ok(self
            .caches
            .borrow()
            .values()
            .find_map(|entries| entries.get(url).cloned()))
    }

    async fn put(
        &self,
        cache: &str,
        url: &str,
        response: MemoryResponse,
    ) -> Result<(), OfflineError> {
        if self.fail_puts.get() {
            return Err(OfflineError::Cache("quota exceeded".to_string()));
        }
        self.caches
            .borrow_mut()
            .entry(cache.to_string())
            .or_default()
            .insert(url.to_string(), response);
        Ok(())
    }

    async fn fetch(&self, url: &str) -> Result<MemoryResponse, OfflineError> {
        self.request(url)
    }

    fn url(&self, url: &str) -> String {
        url.to_string()
    }

    fn duplicate(&self, response: &MemoryResponse) -> Result<MemoryResponse, OfflineError> {
        Ok(response.clone())
    }

    fn is_cacheable(&self, response: &MemoryResponse) -> bool {
        response.is_success()
    }
}
