//! Service-worker host for the offline cache manager.
//!
//! The worker script attaches its `install`, `activate` and `fetch`
//! listeners synchronously and hands each event to [`handle_install`],
//! [`handle_activate`] or [`handle_fetch`] once the module is instantiated.

use std::cell::RefCell;
use std::rc::Rc;

use log::debug;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Cache, CacheStorage, Request, Response, ServiceWorkerGlobalScope};

use super::{CacheBackend, OfflineCache, OfflineError};
use crate::utils::describe_js;

fn cache_error(e: JsValue) -> OfflineError {
    OfflineError::Cache(describe_js(&e))
}

/// `CacheStorage` and `fetch` of a service worker's global scope.
pub struct WebBackend {
    scope: ServiceWorkerGlobalScope,
    caches: CacheStorage,
}

impl WebBackend {
    pub fn new(scope: ServiceWorkerGlobalScope) -> Result<Self, OfflineError> {
        let caches = scope.caches().map_err(cache_error)?;
        Ok(Self { scope, caches })
    }

    async fn open(&self, name: &str) -> Result<Cache, OfflineError> {
        JsFuture::from(self.caches.open(name))
            .await
            .map_err(cache_error)?
            .dyn_into::<Cache>()
            .map_err(|_| OfflineError::Cache(format!("'{}' did not open as a cache", name)))
    }
}

impl CacheBackend for WebBackend {
    type Request = Request;
    type Response = Response;

    async fn cache_names(&self) -> Result<Vec<String>, OfflineError> {
        let keys = JsFuture::from(self.caches.keys())
            .await
            .map_err(cache_error)?;
        Ok(js_sys::Array::from(&keys)
            .iter()
            .filter_map(|key| key.as_string())
            .collect())
    }

    async fn delete_cache(&self, name: &str) -> Result<bool, OfflineError> {
        let deleted = JsFuture::from(self.caches.delete(name))
            .await
            .map_err(cache_error)?;
        Ok(deleted.as_bool().unwrap_or(false))
    }

    async fn add_all(&self, cache: &str, urls: &[&str]) -> Result<(), OfflineError> {
        let cache = self.open(cache).await?;
        let requests: js_sys::Array = urls.iter().map(|url| JsValue::from_str(url)).collect();
        JsFuture::from(cache.add_all_with_str_sequence(&requests))
            .await
            .map_err(cache_error)?;
        Ok(())
    }

    async fn lookup(&self, request: &Request) -> Result<Option<Response>, OfflineError> {
        let found = JsFuture::from(self.caches.match_with_request(request))
            .await
            .map_err(cache_error)?;
        as_cached_response(found, &request.url())
    }

    async fn lookup_url(&self, url: &str) -> Result<Option<Response>, OfflineError> {
        let found = JsFuture::from(self.caches.match_with_str(url))
            .await
            .map_err(cache_error)?;
        as_cached_response(found, url)
    }

    async fn put(
        &self,
        cache: &str,
        request: &Request,
        response: Response,
    ) -> Result<(), OfflineError> {
        let cache = self.open(cache).await?;
        JsFuture::from(cache.put_with_request(request, &response))
            .await
            .map_err(cache_error)?;
        Ok(())
    }

    async fn fetch(&self, request: &Request) -> Result<Response, OfflineError> {
        let network_error = |e: JsValue| OfflineError::Network {
            url: request.url(),
            reason: describe_js(&e),
        };
        JsFuture::from(self.scope.fetch_with_request(request))
            .await
            .map_err(network_error)?
            .dyn_into::<Response>()
            .map_err(network_error)
    }

    fn url(&self, request: &Request) -> String {
        request.url()
    }

    fn duplicate(&self, response: &Response) -> Result<Response, OfflineError> {
        Response::clone(response).map_err(cache_error)
    }

    fn is_cacheable(&self, response: &Response) -> bool {
        response.ok()
    }
}

fn as_cached_response(found: JsValue, url: &str) -> Result<Option<Response>, OfflineError> {
    if found.is_undefined() || found.is_null() {
        return Ok(None);
    }
    found
        .dyn_into::<Response>()
        .map(Some)
        .map_err(|_| OfflineError::Cache(format!("cached entry for '{}' is not a response", url)))
}

thread_local! {
    static MANAGER: RefCell<Option<Rc<OfflineCache<WebBackend>>>> = const { RefCell::new(None) };
}

/// The worker's cache manager, created on first use.
fn manager() -> Result<Rc<OfflineCache<WebBackend>>, OfflineError> {
    MANAGER.with(|slot| {
        let existing = slot.borrow().clone();
        if let Some(manager) = existing {
            return Ok(manager);
        }
        let scope: ServiceWorkerGlobalScope = js_sys::global()
            .dyn_into()
            .map_err(|_| OfflineError::Cache("not running in a service worker".to_string()))?;
        let manager = Rc::new(OfflineCache::new(WebBackend::new(scope)?));
        debug!("offline cache manager ready for '{}'", manager.version());
        *slot.borrow_mut() = Some(manager.clone());
        Ok(manager)
    })
}

/// Body of the worker's `install` event.
pub async fn handle_install() -> Result<(), OfflineError> {
    let manager = manager()?;
    manager.install().await
}

/// Body of the worker's `activate` event. Returns the purged cache names.
pub async fn handle_activate() -> Result<Vec<String>, OfflineError> {
    let manager = manager()?;
    manager.activate().await
}

/// Answer an intercepted `GET` request.
pub async fn handle_fetch(request: Request) -> Result<Response, OfflineError> {
    let manager = manager()?;
    manager.respond(&request).await
}
