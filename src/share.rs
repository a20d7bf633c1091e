//! Share action: native share sheet when the browser has one, clipboard
//! otherwise.

use js_sys::Reflect;
use log::debug;
use serde::Serialize;
use thiserror::Error;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

use crate::config::SHARE_TITLE;
use crate::i18n::Language;
use crate::utils::describe_js;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(extends = web_sys::Navigator, js_name = Navigator)]
    type ShareNavigator;

    #[wasm_bindgen(method, catch)]
    fn share(this: &ShareNavigator, data: &JsValue) -> Result<js_sys::Promise, JsValue>;

    #[wasm_bindgen(method, getter)]
    fn clipboard(this: &ShareNavigator) -> Option<ClipboardApi>;

    type ClipboardApi;

    #[wasm_bindgen(method, catch, js_name = writeText)]
    fn write_text(this: &ClipboardApi, text: &str) -> Result<js_sys::Promise, JsValue>;
}

#[derive(Debug, Error)]
pub enum ShareError {
    #[error("share dialog failed: {0}")]
    Share(String),
    #[error("clipboard write failed: {0}")]
    Clipboard(String),
    #[error("neither share nor clipboard is available")]
    Unsupported,
    #[error("could not encode share payload: {0}")]
    Encode(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareOutcome {
    /// The platform share sheet completed.
    Shared,
    /// Text was copied; the page should show a short confirmation.
    Copied,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SharePayload {
    pub title: String,
    pub text: String,
    pub url: String,
}

impl SharePayload {
    pub fn for_page(language: Language, url: impl Into<String>) -> Self {
        Self {
            title: SHARE_TITLE.to_string(),
            text: language.phrases().motto.to_string(),
            url: url.into(),
        }
    }

    /// What lands on the clipboard when there is no share sheet.
    pub fn clipboard_text(&self) -> String {
        format!("{} — {}", self.text, self.url)
    }
}

/// Share `payload`, falling back to the clipboard.
pub async fn share(payload: &SharePayload) -> Result<ShareOutcome, ShareError> {
    let navigator: ShareNavigator = gloo_utils::window().navigator().unchecked_into();

    if Reflect::has(&navigator, &JsValue::from_str("share")).unwrap_or(false) {
        let data = serde_wasm_bindgen::to_value(payload)
            .map_err(|e| ShareError::Encode(e.to_string()))?;
        let promise = navigator
            .share(&data)
            .map_err(|e| ShareError::Share(describe_js(&e)))?;
        JsFuture::from(promise)
            .await
            .map_err(|e| ShareError::Share(describe_js(&e)))?;
        debug!("shared via platform dialog");
        return Ok(ShareOutcome::Shared);
    }

    let clipboard = navigator.clipboard().ok_or(ShareError::Unsupported)?;
    let promise = clipboard
        .write_text(&payload.clipboard_text())
        .map_err(|e| ShareError::Clipboard(describe_js(&e)))?;
    JsFuture::from(promise)
        .await
        .map_err(|e| ShareError::Clipboard(describe_js(&e)))?;
    debug!("share text copied to clipboard");
    Ok(ShareOutcome::Copied)
}

/// Address of the current page, empty if the location is unreadable.
pub fn page_url() -> String {
    gloo_utils::window().location().href().unwrap_or_default()
}
