//! Per-frame orbit renderer.
//!
//! `OrbitRenderer` owns the animation phase and the current preferences and
//! paints onto anything implementing [`Surface`]. The browser canvas is one
//! such surface; tests use a recording one.

use std::f64::consts::TAU;

use log::debug;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::animation::AnimationState;
use crate::config::{GLOW_ALPHA, GLOW_SCALE, PARTICLE_COLOR};
use crate::orbit::{backing_size, particle_radius, precession_coefficient, OrbitParameters};
use crate::preferences::UserPreferences;
use crate::trail::{radius_at, sample_trail, BlendMode, TrailSample, TrailSettings};
use crate::utils::describe_js;

/// Minimal drawing surface the renderer needs.
pub trait Surface {
    /// Pixel buffer size (device pixels).
    fn size(&self) -> (f64, f64);
    /// Reset every pixel to transparent.
    fn clear(&mut self);
    fn set_blend(&mut self, mode: BlendMode);
    fn fill_disc(&mut self, x: f64, y: f64, radius: f64, alpha: f64);
}

pub struct OrbitRenderer {
    state: AnimationState,
    prefs: UserPreferences,
    trail: TrailSettings,
    precession: f64,
    dpr: f64,
    samples: Vec<TrailSample>,
}

impl OrbitRenderer {
    pub fn new(prefs: UserPreferences, dpr: f64) -> Self {
        let mut renderer = Self {
            state: AnimationState::new(),
            prefs,
            trail: prefs.trail_settings(),
            precession: precession_coefficient(prefs.precession_deg),
            dpr: 1.0,
            samples: Vec::new(),
        };
        renderer.set_pixel_ratio(dpr);
        renderer
    }

    /// Swap in new preferences. The orbital phase carries over untouched.
    pub fn set_preferences(&mut self, prefs: UserPreferences) {
        self.prefs = prefs;
        self.trail = prefs.trail_settings();
        self.precession = precession_coefficient(prefs.precession_deg);
    }

    pub fn preferences(&self) -> &UserPreferences {
        &self.prefs
    }

    pub fn set_pixel_ratio(&mut self, dpr: f64) {
        self.dpr = if dpr.is_finite() && dpr > 0.0 { dpr } else { 1.0 };
    }

    pub fn angle(&self) -> f64 {
        self.state.angle()
    }

    /// Advance to `now` (seconds) and paint one frame.
    pub fn frame(&mut self, surface: &mut impl Surface, now: f64) {
        let dt = self.state.tick(now);
        let angle = self.state.advance(dt, self.prefs.period_secs);

        let (width, height) = surface.size();
        if width <= 0.0 || height <= 0.0 {
            return;
        }

        let orbit = OrbitParameters::for_canvas(width, height);
        let head_radius = particle_radius(width, height, self.dpr);

        surface.clear();
        surface.set_blend(self.trail.blend);
        sample_trail(angle, &self.trail, &mut self.samples);

        for sample in &self.samples {
            let tilt = orbit.tilt_at(sample.angle, self.precession);
            let (x, y) = orbit.position(sample.angle, tilt);
            let radius = radius_at(sample.t, head_radius);
            surface.fill_disc(x, y, radius * GLOW_SCALE, sample.alpha * GLOW_ALPHA);
            surface.fill_disc(x, y, radius, sample.alpha);
        }
    }
}

/// A `<canvas>` with its 2d context.
pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
}

impl CanvasSurface {
    /// `None` when the browser cannot hand out a 2d context; the page then
    /// simply shows no animation.
    pub fn attach(canvas: HtmlCanvasElement) -> Option<Self> {
        let ctx = match canvas.get_context("2d") {
            Ok(Some(ctx)) => ctx.dyn_into::<CanvasRenderingContext2d>().ok(),
            Ok(None) => None,
            Err(e) => {
                debug!("2d context unavailable: {}", describe_js(&e));
                None
            }
        };
        if ctx.is_none() {
            debug!("canvas has no 2d context, animation disabled");
        }
        ctx.map(|ctx| Self { canvas, ctx })
    }

    /// Match the pixel buffer to the displayed size at `dpr`.
    pub fn fit(&self, dpr: f64) {
        let rect = self.canvas.get_bounding_client_rect();
        let (width, height) = backing_size(rect.width(), rect.height(), dpr);
        if self.canvas.width() != width || self.canvas.height() != height {
            self.canvas.set_width(width);
            self.canvas.set_height(height);
            debug!("canvas resized to {}x{} @{}x", width, height, dpr);
        }
    }
}

impl Surface for CanvasSurface {
    fn size(&self) -> (f64, f64) {
        (self.canvas.width() as f64, self.canvas.height() as f64)
    }

    fn clear(&mut self) {
        let (width, height) = self.size();
        self.ctx.set_global_alpha(1.0);
        self.ctx.clear_rect(0.0, 0.0, width, height);
        self.ctx.set_fill_style_str(PARTICLE_COLOR);
    }

    fn set_blend(&mut self, mode: BlendMode) {
        if let Err(e) = self
            .ctx
            .set_global_composite_operation(mode.composite_operation())
        {
            debug!("composite operation rejected: {}", describe_js(&e));
        }
    }

    fn fill_disc(&mut self, x: f64, y: f64, radius: f64, alpha: f64) {
        self.ctx.set_global_alpha(alpha.clamp(0.0, 1.0));
        self.ctx.begin_path();
        if self.ctx.arc(x, y, radius.max(0.0), 0.0, TAU).is_ok() {
            self.ctx.fill();
        }
    }
}
