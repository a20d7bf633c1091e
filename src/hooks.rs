use std::cell::{Cell, RefCell};
use std::rc::Rc;

use log::debug;
use mathback::install::{show_prompt, BeforeInstallPromptEvent, InstallOutcome, InstallPrompt};
use mathback::renderer::{CanvasSurface, OrbitRenderer};
use mathback::utils::{describe_js, frame_seconds};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::HtmlCanvasElement;
use yew::prelude::*;

type FrameCallback = Closure<dyn FnMut(f64)>;

fn request_frame(callback: &FrameCallback) -> Option<i32> {
    gloo_utils::window()
        .request_animation_frame(callback.as_ref().unchecked_ref())
        .ok()
}

/// A running `requestAnimationFrame` loop plus its resize listener.
/// Dropping it stops both.
struct AnimationLoop {
    frame_id: Rc<Cell<Option<i32>>>,
    tick: Rc<RefCell<Option<FrameCallback>>>,
    on_resize: Closure<dyn FnMut()>,
}

impl AnimationLoop {
    fn start(surface: CanvasSurface, renderer: Rc<RefCell<OrbitRenderer>>) -> Self {
        let window = gloo_utils::window();
        let dpr = window.device_pixel_ratio();
        surface.fit(dpr);
        renderer.borrow_mut().set_pixel_ratio(dpr);
        let surface = Rc::new(RefCell::new(surface));

        let on_resize = {
            let surface = surface.clone();
            let renderer = renderer.clone();
            Closure::<dyn FnMut()>::new(move || {
                let dpr = gloo_utils::window().device_pixel_ratio();
                surface.borrow().fit(dpr);
                renderer.borrow_mut().set_pixel_ratio(dpr);
            })
        };
        if let Err(e) =
            window.add_event_listener_with_callback("resize", on_resize.as_ref().unchecked_ref())
        {
            debug!("resize listener not attached: {}", describe_js(&e));
        }

        let frame_id = Rc::new(Cell::new(None));
        let tick: Rc<RefCell<Option<FrameCallback>>> = Rc::new(RefCell::new(None));
        {
            let next = tick.clone();
            let frame_id = frame_id.clone();
            *tick.borrow_mut() = Some(Closure::new(move |timestamp: f64| {
                renderer
                    .borrow_mut()
                    .frame(&mut *surface.borrow_mut(), frame_seconds(timestamp));
                if let Some(callback) = next.borrow().as_ref() {
                    frame_id.set(request_frame(callback));
                }
            }));
        }
        if let Some(callback) = tick.borrow().as_ref() {
            frame_id.set(request_frame(callback));
        }

        Self {
            frame_id,
            tick,
            on_resize,
        }
    }
}

impl Drop for AnimationLoop {
    fn drop(&mut self) {
        let window = gloo_utils::window();
        if let Some(id) = self.frame_id.take() {
            window.cancel_animation_frame(id).ok();
        }
        window
            .remove_event_listener_with_callback("resize", self.on_resize.as_ref().unchecked_ref())
            .ok();
        // break the closure's reference to itself
        self.tick.borrow_mut().take();
    }
}

/// Drive `renderer` on the canvas behind `canvas` for as long as the
/// component is mounted. Without a 2d context nothing runs.
#[hook]
pub fn use_orbit_animation(canvas: NodeRef, renderer: Rc<RefCell<OrbitRenderer>>) {
    use_effect_with(canvas, move |canvas| {
        let running = canvas
            .cast::<HtmlCanvasElement>()
            .and_then(CanvasSurface::attach)
            .map(|surface| AnimationLoop::start(surface, renderer));
        move || drop(running)
    });
}

/// State of the install affordance.
pub struct InstallHandle {
    /// Whether the install button should be visible.
    pub available: bool,
    pub on_install: Callback<MouseEvent>,
}

/// Capture `beforeinstallprompt` and replay it on demand.
#[hook]
pub fn use_install_prompt() -> InstallHandle {
    let prompt = use_mut_ref(InstallPrompt::<BeforeInstallPromptEvent>::default);
    let available = use_state(|| false);

    {
        let prompt = prompt.clone();
        let available = available.clone();
        use_effect_with((), move |_| {
            let listener = Closure::<dyn FnMut(web_sys::Event)>::new(move |event: web_sys::Event| {
                event.prevent_default();
                if prompt.borrow_mut().offer(event.unchecked_into()) {
                    debug!("install prompt deferred");
                    available.set(true);
                }
            });
            let window = gloo_utils::window();
            window
                .add_event_listener_with_callback(
                    "beforeinstallprompt",
                    listener.as_ref().unchecked_ref(),
                )
                .ok();
            move || {
                window
                    .remove_event_listener_with_callback(
                        "beforeinstallprompt",
                        listener.as_ref().unchecked_ref(),
                    )
                    .ok();
            }
        });
    }

    let on_install = {
        let prompt = prompt.clone();
        let available = available.clone();
        Callback::from(move |_: MouseEvent| {
            let Some(event) = prompt.borrow_mut().take_for_prompt() else {
                return;
            };
            let prompt = prompt.clone();
            let available = available.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let outcome = show_prompt(&event).await.unwrap_or_else(|e| {
                    debug!("{}", e);
                    InstallOutcome::Dismissed
                });
                prompt.borrow_mut().resolve(outcome);
                available.set(false);
            });
        })
    };

    InstallHandle {
        available: *available,
        on_install,
    }
}
