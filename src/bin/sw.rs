//! Offline cache worker module.
//! `service-worker.js` loads it and forwards each lifecycle and fetch event
//! to the exports below.

use log::{debug, error};
use mathback::logging;
use mathback::offline::web::{handle_activate, handle_fetch, handle_install};
use mathback::offline::OfflineError;
use wasm_bindgen::prelude::*;
use web_sys::{Request, Response};

fn to_js(e: OfflineError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

#[wasm_bindgen]
pub async fn on_install() -> Result<(), JsValue> {
    handle_install().await.map_err(|e| {
        error!("{}", e);
        to_js(e)
    })
}

#[wasm_bindgen]
pub async fn on_activate() -> Result<(), JsValue> {
    let purged = handle_activate().await.map_err(|e| {
        error!("{}", e);
        to_js(e)
    })?;
    debug!("purged {} stale caches", purged.len());
    Ok(())
}

#[wasm_bindgen]
pub async fn on_fetch(request: Request) -> Result<Response, JsValue> {
    handle_fetch(request).await.map_err(to_js)
}

fn main() {
    // Set the panic hook to log detailed errors to the console
    console_error_panic_hook::set_once();
    logging::init(logging::default_level());
}
