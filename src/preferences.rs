//! User preferences persisted in per-origin key-value storage.
//!
//! Each control writes its own key as soon as it changes; there is no schema
//! version and the last write wins. Values that are missing or unreadable
//! fall back to the default for that key alone.

use std::cell::RefCell;
use std::collections::HashMap;

use log::{debug, warn};
use thiserror::Error;

use crate::config::{
    DEFAULT_PERIOD_SECS, DEFAULT_PRECESSION_DEG, DEFAULT_TRAIL_INTENSITY, MAX_PERIOD_SECS,
    MAX_PRECESSION_DEG, MAX_TRAIL_INTENSITY, MIN_PERIOD_SECS, MIN_PRECESSION_DEG,
    MIN_TRAIL_INTENSITY,
};
use crate::i18n::Language;
use crate::trail::{BlendMode, TrailSettings};
use crate::utils::describe_js;

#[derive(Debug, Error)]
pub enum PreferenceError {
    #[error("storage rejected write of '{key}': {reason}")]
    Write { key: &'static str, reason: String },
}

/// Key-value backing for preferences.
pub trait PreferenceStore {
    fn read(&self, key: &str) -> Option<String>;
    fn write(&self, key: &'static str, value: &str) -> Result<(), PreferenceError>;
}

impl PreferenceStore for web_sys::Storage {
    fn read(&self, key: &str) -> Option<String> {
        self.get_item(key).ok().flatten()
    }

    fn write(&self, key: &'static str, value: &str) -> Result<(), PreferenceError> {
        self.set_item(key, value).map_err(|e| PreferenceError::Write {
            key,
            reason: describe_js(&e),
        })
    }
}

/// In-memory store, used when local storage is unavailable and in tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RefCell<HashMap<String, String>>,
    read_only: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose writes always fail, like storage with a full quota.
    pub fn read_only() -> Self {
        Self {
            read_only: true,
            ..Self::default()
        }
    }

    pub fn with_values<'a>(values: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let store = Self::new();
        store.values.borrow_mut().extend(
            values
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string())),
        );
        store
    }
}

impl PreferenceStore for MemoryStore {
    fn read(&self, key: &str) -> Option<String> {
        self.values.borrow().get(key).cloned()
    }

    fn write(&self, key: &'static str, value: &str) -> Result<(), PreferenceError> {
        if self.read_only {
            return Err(PreferenceError::Write {
                key,
                reason: "store is read-only".to_string(),
            });
        }
        self.values
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// The page's local storage, if the browser grants access to it.
pub fn local_storage() -> Option<web_sys::Storage> {
    match gloo_utils::window().local_storage() {
        Ok(storage) => storage,
        Err(e) => {
            debug!("local storage unavailable: {}", describe_js(&e));
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferenceKey {
    Period,
    TrailIntensity,
    Precession,
    HyperTrail,
    Blend,
    Language,
}

impl PreferenceKey {
    pub const ALL: [PreferenceKey; 6] = [
        PreferenceKey::Period,
        PreferenceKey::TrailIntensity,
        PreferenceKey::Precession,
        PreferenceKey::HyperTrail,
        PreferenceKey::Blend,
        PreferenceKey::Language,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PreferenceKey::Period => "speed",
            PreferenceKey::TrailIntensity => "trailIntensity",
            PreferenceKey::Precession => "precession",
            PreferenceKey::HyperTrail => "hyperTrail",
            PreferenceKey::Blend => "blend",
            PreferenceKey::Language => "lang",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UserPreferences {
    /// Seconds per revolution, always within the control's range.
    pub period_secs: f64,
    pub trail_intensity: u32,
    /// Signed degrees of tilt per revolution.
    pub precession_deg: f64,
    pub hyper_trail: bool,
    pub blend: BlendMode,
    pub language: Language,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            period_secs: DEFAULT_PERIOD_SECS,
            trail_intensity: DEFAULT_TRAIL_INTENSITY,
            precession_deg: DEFAULT_PRECESSION_DEG,
            hyper_trail: false,
            blend: BlendMode::default(),
            language: Language::default(),
        }
    }
}

fn parse_number(raw: Option<String>) -> Option<f64> {
    raw?.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_flag(raw: Option<String>) -> Option<bool> {
    match raw?.trim() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

fn parse_blend(raw: Option<String>) -> Option<BlendMode> {
    serde_json::from_value(serde_json::Value::String(raw?.trim().to_string())).ok()
}

fn encode_blend(blend: BlendMode) -> String {
    match serde_json::to_value(blend) {
        Ok(serde_json::Value::String(s)) => s,
        _ => String::new(),
    }
}

impl UserPreferences {
    pub fn load(store: &impl PreferenceStore) -> Self {
        let defaults = Self::default();
        let get = |key: PreferenceKey| store.read(key.as_str());

        let prefs = Self {
            period_secs: parse_number(get(PreferenceKey::Period))
                .map(clamp_period)
                .unwrap_or(defaults.period_secs),
            trail_intensity: parse_number(get(PreferenceKey::TrailIntensity))
                .map(|v| clamp_intensity(v.round().max(0.0) as u32))
                .unwrap_or(defaults.trail_intensity),
            precession_deg: parse_number(get(PreferenceKey::Precession))
                .map(clamp_precession)
                .unwrap_or(defaults.precession_deg),
            hyper_trail: parse_flag(get(PreferenceKey::HyperTrail))
                .unwrap_or(defaults.hyper_trail),
            blend: parse_blend(get(PreferenceKey::Blend)).unwrap_or(defaults.blend),
            language: get(PreferenceKey::Language)
                .and_then(|code| Language::parse(&code))
                .unwrap_or(defaults.language),
        };
        debug!("loaded preferences: {:?}", prefs);
        prefs
    }

    /// The string written to storage for `key`.
    pub fn stored_value(&self, key: PreferenceKey) -> String {
        match key {
            PreferenceKey::Period => self.period_secs.to_string(),
            PreferenceKey::TrailIntensity => self.trail_intensity.to_string(),
            PreferenceKey::Precession => self.precession_deg.to_string(),
            PreferenceKey::HyperTrail => self.hyper_trail.to_string(),
            PreferenceKey::Blend => encode_blend(self.blend),
            PreferenceKey::Language => self.language.code().to_string(),
        }
    }

    pub fn persist(
        &self,
        store: &impl PreferenceStore,
        key: PreferenceKey,
    ) -> Result<(), PreferenceError> {
        store.write(key.as_str(), &self.stored_value(key))
    }

    /// Persist one key, logging instead of failing.
    pub fn persist_or_log(&self, store: &impl PreferenceStore, key: PreferenceKey) {
        if let Err(e) = self.persist(store, key) {
            warn!("{}", e);
        }
    }

    pub fn with_period(self, secs: f64) -> Self {
        Self {
            period_secs: if secs.is_finite() {
                clamp_period(secs)
            } else {
                self.period_secs
            },
            ..self
        }
    }

    pub fn with_trail_intensity(self, intensity: u32) -> Self {
        Self {
            trail_intensity: clamp_intensity(intensity),
            ..self
        }
    }

    pub fn with_precession(self, degrees: f64) -> Self {
        Self {
            precession_deg: if degrees.is_finite() {
                clamp_precession(degrees)
            } else {
                self.precession_deg
            },
            ..self
        }
    }

    pub fn trail_settings(&self) -> TrailSettings {
        TrailSettings::from_intensity(self.trail_intensity, self.hyper_trail, self.blend)
    }
}

fn clamp_period(secs: f64) -> f64 {
    secs.clamp(MIN_PERIOD_SECS, MAX_PERIOD_SECS)
}

fn clamp_intensity(intensity: u32) -> u32 {
    intensity.clamp(MIN_TRAIL_INTENSITY, MAX_TRAIL_INTENSITY)
}

fn clamp_precession(degrees: f64) -> f64 {
    degrees.clamp(MIN_PRECESSION_DEG, MAX_PRECESSION_DEG)
}
