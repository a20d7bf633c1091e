//! Landing page application using Yew.
//! Wires the orbit canvas, controls, language toggle, share and install
//! buttons, and registers the offline service worker.

use std::rc::Rc;

use gloo_timers::callback::Timeout;
use js_sys::Reflect;
use log::{debug, info, warn};
use mathback::config::*;
use mathback::i18n::Language;
use mathback::logging;
use mathback::preferences::{local_storage, PreferenceKey, UserPreferences};
use mathback::renderer::OrbitRenderer;
use mathback::share::{page_url, share, SharePayload, ShareOutcome};
use mathback::trail::BlendMode;
use mathback::utils::describe_js;
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::{spawn_local, JsFuture};
use yew::prelude::*;

mod components;
mod hooks;

use components::{BlendSelect, RangeControl, ToggleControl};
use hooks::{use_install_prompt, use_orbit_animation};

// ──────────────────────────────────────────────────────────────────────────────
// Helper functions

fn load_preferences() -> UserPreferences {
    match local_storage() {
        Some(storage) => UserPreferences::load(&storage),
        None => UserPreferences::default(),
    }
}

fn persist(prefs: &UserPreferences, key: PreferenceKey) {
    if let Some(storage) = local_storage() {
        prefs.persist_or_log(&storage, key);
    }
}

fn apply_document_language(language: Language) {
    if let Some(root) = gloo_utils::document().document_element() {
        if let Err(e) = root.set_attribute("lang", language.code()) {
            debug!("could not set document language: {}", describe_js(&e));
        }
    }
}

/// Register the offline worker where the browser supports it.
fn register_service_worker() {
    let navigator = gloo_utils::window().navigator();
    if !Reflect::has(&navigator, &JsValue::from_str("serviceWorker")).unwrap_or(false) {
        debug!("service workers unsupported, running online only");
        return;
    }
    let registration = navigator
        .service_worker()
        .register(SERVICE_WORKER_SCRIPT);
    spawn_local(async move {
        match JsFuture::from(registration).await {
            Ok(_) => info!("service worker registered"),
            Err(e) => warn!("service worker registration failed: {}", describe_js(&e)),
        }
    });
}

// ──────────────────────────────────────────────────────────────────────────────

#[function_component(Main)]
fn main_component() -> Html {
    let prefs = use_state(load_preferences);
    let renderer = use_mut_ref(|| {
        OrbitRenderer::new(*prefs, gloo_utils::window().device_pixel_ratio())
    });
    let canvas_ref = use_node_ref();
    let copied = use_state(|| false);
    let install = use_install_prompt();

    use_orbit_animation(canvas_ref.clone(), renderer.clone());

    {
        let language = prefs.language;
        use_effect_with(language, move |language| {
            apply_document_language(*language);
            || ()
        });
    }

    // Persist one key and hand the new values to the running renderer
    // without touching its phase.
    let update = {
        let prefs = prefs.clone();
        let renderer = renderer.clone();
        Rc::new(move |next: UserPreferences, key: PreferenceKey| {
            persist(&next, key);
            renderer.borrow_mut().set_preferences(next);
            prefs.set(next);
        })
    };

    let on_speed = {
        let prefs = prefs.clone();
        let update = update.clone();
        Callback::from(move |raw: String| {
            if let Ok(secs) = raw.parse::<f64>() {
                update(prefs.with_period(secs), PreferenceKey::Period);
            }
        })
    };

    let on_trail = {
        let prefs = prefs.clone();
        let update = update.clone();
        Callback::from(move |raw: String| {
            if let Ok(intensity) = raw.parse::<u32>() {
                update(prefs.with_trail_intensity(intensity), PreferenceKey::TrailIntensity);
            }
        })
    };

    let on_precession = {
        let prefs = prefs.clone();
        let update = update.clone();
        Callback::from(move |raw: String| {
            if let Ok(degrees) = raw.parse::<f64>() {
                update(prefs.with_precession(degrees), PreferenceKey::Precession);
            }
        })
    };

    let on_hyper = {
        let prefs = prefs.clone();
        let update = update.clone();
        Callback::from(move |enabled: bool| {
            let next = UserPreferences {
                hyper_trail: enabled,
                ..*prefs
            };
            update(next, PreferenceKey::HyperTrail);
        })
    };

    let on_blend = {
        let prefs = prefs.clone();
        let update = update.clone();
        Callback::from(move |blend: BlendMode| {
            let next = UserPreferences { blend, ..*prefs };
            update(next, PreferenceKey::Blend);
        })
    };

    let on_toggle_language = {
        let prefs = prefs.clone();
        let update = update.clone();
        Callback::from(move |_: MouseEvent| {
            let next = UserPreferences {
                language: prefs.language.toggle(),
                ..*prefs
            };
            update(next, PreferenceKey::Language);
        })
    };

    let on_share = {
        let language = prefs.language;
        let copied = copied.clone();
        Callback::from(move |_: MouseEvent| {
            let payload = SharePayload::for_page(language, page_url());
            let copied = copied.clone();
            spawn_local(async move {
                match share(&payload).await {
                    Ok(ShareOutcome::Copied) => {
                        copied.set(true);
                        Timeout::new(COPIED_FEEDBACK_MS, move || copied.set(false)).forget();
                    }
                    Ok(ShareOutcome::Shared) => {}
                    Err(e) => debug!("share did not complete: {}", e),
                }
            });
        })
    };

    let phrases = prefs.language.phrases();
    let share_label = if *copied {
        phrases.copied_label
    } else {
        phrases.share_label
    };

    html! {
        <main class="page">
            <canvas id="orb" ref={canvas_ref}></canvas>

            <header class="copy">
                <h1 id="motto">{ phrases.motto }</h1>
                <p id="subtitle">{ phrases.subtitle }</p>
            </header>

            <section class="controls">
                <RangeControl
                    id="speed"
                    label={phrases.speed_label}
                    min={MIN_PERIOD_SECS.to_string()}
                    max={MAX_PERIOD_SECS.to_string()}
                    value={prefs.period_secs.to_string()}
                    display={format!("{}s", prefs.period_secs)}
                    onchange={on_speed}
                />
                <RangeControl
                    id="trail"
                    label={phrases.trail_label}
                    min={MIN_TRAIL_INTENSITY.to_string()}
                    max={MAX_TRAIL_INTENSITY.to_string()}
                    value={prefs.trail_intensity.to_string()}
                    display={prefs.trail_intensity.to_string()}
                    onchange={on_trail}
                />
                <RangeControl
                    id="precession"
                    label={phrases.precession_label}
                    min={MIN_PRECESSION_DEG.to_string()}
                    max={MAX_PRECESSION_DEG.to_string()}
                    value={prefs.precession_deg.to_string()}
                    display={format!("{}°", prefs.precession_deg)}
                    onchange={on_precession}
                />
                <ToggleControl
                    id="hyper"
                    label={phrases.hyper_label}
                    checked={prefs.hyper_trail}
                    onchange={on_hyper}
                />
                <BlendSelect
                    label={phrases.blend_label}
                    additive_label={phrases.blend_additive}
                    alpha_label={phrases.blend_alpha}
                    value={prefs.blend}
                    onchange={on_blend}
                />
            </section>

            <nav class="actions">
                <button id="toggleLang" onclick={on_toggle_language}>
                    { phrases.toggle_label }
                </button>
                <button id="shareBtn" onclick={on_share}>{ share_label }</button>
                <button id="installBtn" hidden={!install.available} onclick={install.on_install}>
                    { phrases.install_label }
                </button>
            </nav>
        </main>
    }
}

#[function_component]
pub fn App() -> Html {
    use_effect_with((), |_| {
        register_service_worker();
        || ()
    });

    html! { <Main /> }
}

/// Entry point: installs logging, then mounts the Yew app.
fn main() {
    console_error_panic_hook::set_once();
    logging::init(logging::default_level());
    yew::Renderer::<App>::new().render();
}
