use wasm_bindgen::{JsCast, JsValue};

/// Human-readable text for a thrown JS value.
pub fn describe_js(value: &JsValue) -> String {
    if let Some(s) = value.as_string() {
        return s;
    }
    if let Some(err) = value.dyn_ref::<js_sys::Error>() {
        return String::from(err.message());
    }
    format!("{:?}", value)
}

/// Convert a `requestAnimationFrame` timestamp (milliseconds) to seconds.
pub fn frame_seconds(timestamp_ms: f64) -> f64 {
    timestamp_ms / 1000.0
}
