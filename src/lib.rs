//! Orbiting-glow landing page: the trail renderer, user preferences, share and
//! install plumbing for the page, and the offline cache manager run by the
//! service worker.

pub mod animation;
pub mod config;
pub mod i18n;
pub mod install;
pub mod logging;
pub mod offline;
pub mod orbit;
pub mod preferences;
pub mod renderer;
pub mod share;
pub mod trail;
pub mod utils;

pub use animation::AnimationState;
pub use offline::{CacheBackend, CacheLifecycle, OfflineCache, OfflineError};
pub use orbit::OrbitParameters;
pub use preferences::UserPreferences;
pub use renderer::{OrbitRenderer, Surface};
pub use trail::BlendMode;
