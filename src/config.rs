//! Application-level configuration constants.

use std::f64::consts::PI;

// Revolution period control (seconds per revolution)
pub const DEFAULT_PERIOD_SECS: f64 = 7.0;
pub const MIN_PERIOD_SECS: f64 = 3.0;
pub const MAX_PERIOD_SECS: f64 = 20.0;

// Trail intensity control
pub const DEFAULT_TRAIL_INTENSITY: u32 = 7;
pub const MIN_TRAIL_INTENSITY: u32 = 1;
pub const MAX_TRAIL_INTENSITY: u32 = 10;

// Precession control (signed degrees per revolution)
pub const DEFAULT_PRECESSION_DEG: f64 = 0.0;
pub const MIN_PRECESSION_DEG: f64 = -45.0;
pub const MAX_PRECESSION_DEG: f64 = 45.0;

// Orbit proportions, relative to the shorter canvas side
pub const ORBIT_RADIUS_X_RATIO: f64 = 0.42;
pub const ORBIT_RADIUS_Y_RATIO: f64 = 0.26;
pub const ORBIT_BASE_TILT: f64 = -12.0 * PI / 180.0;

// Particle size
pub const PARTICLE_RADIUS_RATIO: f64 = 0.012;
pub const PARTICLE_MIN_RADIUS_CSS_PX: f64 = 6.0;

// Trail shape
pub const TRAIL_SAMPLES_PER_INTENSITY: u32 = 8;
pub const TRAIL_ARC_BASE: f64 = 0.05;
pub const TRAIL_ARC_PER_INTENSITY: f64 = 0.03;
pub const TRAIL_OPACITY_FLOOR: f64 = 0.04;
pub const TRAIL_RADIUS_TAPER: f64 = 0.65;
pub const HYPER_OVERSAMPLE: u32 = 4;
pub const HYPER_ALPHA_SCALE: f64 = 0.5;

// Soft bloom: a large faint disc under the full-opacity core
pub const GLOW_SCALE: f64 = 2.6;
pub const GLOW_ALPHA: f64 = 0.18;
pub const PARTICLE_COLOR: &str = "#ffffff";

// Offline cache
pub const CACHE_VERSION: &str = "mathback-v1";
pub const ROOT_DOCUMENT: &str = "index.html";
pub const OFFLINE_ASSETS: &[&str] = &[
    ".",
    "index.html",
    "mathback.js",
    "mathback_bg.wasm",
    "style.css",
    "manifest.json",
    "icon-192.png",
    "icon-512.png",
    "service-worker.js",
    "sw.js",
    "sw_bg.wasm",
];
/// Static worker script; it loads the `sw` binary's module itself.
pub const SERVICE_WORKER_SCRIPT: &str = "service-worker.js";

// Share
pub const SHARE_TITLE: &str = "Math's Got Your Back";
pub const COPIED_FEEDBACK_MS: u32 = 1200;

#[cfg(test)]
mod tests {
    use super::*;

    const INDEX_HTML: &str = include_str!("../index.html");
    const WORKER_SCRIPT: &str = include_str!("../service-worker.js");

    fn attribute<'a>(tag: &'a str, name: &str) -> Option<&'a str> {
        let start = tag.find(&format!("{}=\"", name))? + name.len() + 2;
        let len = tag[start..].find('"')?;
        Some(&tag[start..start + len])
    }

    #[test]
    fn offline_manifest_covers_every_build_output() {
        let mut outputs = Vec::new();
        for tag in INDEX_HTML.lines().filter(|line| line.contains("data-trunk")) {
            if let Some(href) = attribute(tag, "href") {
                outputs.push(href.to_string());
            }
            if let Some(bin) = attribute(tag, "data-bin") {
                outputs.push(format!("{}.js", bin));
                outputs.push(format!("{}_bg.wasm", bin));
            }
        }

        assert!(outputs.contains(&"style.css".to_string()));
        for output in &outputs {
            assert!(
                OFFLINE_ASSETS.contains(&output.as_str()),
                "'{}' is not cached for offline use",
                output
            );
        }
        assert!(OFFLINE_ASSETS.contains(&ROOT_DOCUMENT));
    }

    #[test]
    fn registered_worker_script_is_shipped_and_loads_the_module() {
        assert!(INDEX_HTML.contains(&format!(
            "rel=\"copy-file\" href=\"{}\"",
            SERVICE_WORKER_SCRIPT
        )));
        assert!(WORKER_SCRIPT.contains("importScripts(\"./sw.js\")"));
        assert!(WORKER_SCRIPT.contains("\"./sw_bg.wasm\""));
        for export in ["on_install", "on_activate", "on_fetch"] {
            assert!(WORKER_SCRIPT.contains(&format!("wasm_bindgen.{}(", export)));
        }
    }
}
