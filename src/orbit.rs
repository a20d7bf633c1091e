//! Elliptical orbit geometry.
//!
//! The orbit is recomputed from the canvas pixel size every frame, so nothing
//! here holds state between frames.

use std::f64::consts::TAU;

use crate::config::{
    ORBIT_BASE_TILT, ORBIT_RADIUS_X_RATIO, ORBIT_RADIUS_Y_RATIO, PARTICLE_MIN_RADIUS_CSS_PX,
    PARTICLE_RADIUS_RATIO,
};

/// Center, radii (pixels) and resting orientation (radians) of the orbit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitParameters {
    pub center_x: f64,
    pub center_y: f64,
    pub radius_x: f64,
    pub radius_y: f64,
    pub base_tilt: f64,
}

impl OrbitParameters {
    /// Orbit centered on a canvas of `width × height` device pixels.
    pub fn for_canvas(width: f64, height: f64) -> Self {
        let short = width.min(height);
        Self {
            center_x: width / 2.0,
            center_y: height / 2.0,
            radius_x: short * ORBIT_RADIUS_X_RATIO,
            radius_y: short * ORBIT_RADIUS_Y_RATIO,
            base_tilt: ORBIT_BASE_TILT,
        }
    }

    /// Orientation of the ellipse when the particle sits at `angle`.
    pub fn tilt_at(&self, angle: f64, precession_coefficient: f64) -> f64 {
        self.base_tilt + precession_coefficient * angle
    }

    /// Point on the ellipse at `angle`, rotated by `tilt` about the center.
    pub fn position(&self, angle: f64, tilt: f64) -> (f64, f64) {
        let x = self.radius_x * angle.cos();
        let y = self.radius_y * angle.sin();
        let (sin_t, cos_t) = tilt.sin_cos();
        (
            self.center_x + x * cos_t - y * sin_t,
            self.center_y + x * sin_t + y * cos_t,
        )
    }
}

/// Tilt added per radian of orbital angle for a precession rate given in
/// degrees per revolution.
pub fn precession_coefficient(degrees_per_revolution: f64) -> f64 {
    degrees_per_revolution.to_radians() / TAU
}

/// Head particle radius in device pixels.
pub fn particle_radius(width: f64, height: f64, dpr: f64) -> f64 {
    (PARTICLE_MIN_RADIUS_CSS_PX * dpr).max(width.min(height) * PARTICLE_RADIUS_RATIO)
}

/// Pixel buffer size for a canvas displayed at `css_width × css_height`.
pub fn backing_size(css_width: f64, css_height: f64, dpr: f64) -> (u32, u32) {
    let dpr = if dpr.is_finite() && dpr > 0.0 { dpr } else { 1.0 };
    let scale = |v: f64| (v.max(0.0) * dpr).round() as u32;
    (scale(css_width), scale(css_height))
}
