//! Discrete multi-sample trail.
//!
//! Each frame the trail is resampled from scratch behind the head angle, so
//! no positions are remembered between frames. Samples are emitted
//! farthest-first so the head is painted last and ends up on top.

use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

use crate::config::{
    HYPER_ALPHA_SCALE, HYPER_OVERSAMPLE, MAX_TRAIL_INTENSITY, MIN_TRAIL_INTENSITY,
    TRAIL_ARC_BASE, TRAIL_ARC_PER_INTENSITY, TRAIL_OPACITY_FLOOR, TRAIL_RADIUS_TAPER,
    TRAIL_SAMPLES_PER_INTENSITY,
};

/// How overlapping particles combine on the canvas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlendMode {
    /// Overlaps brighten, giving the glow.
    #[default]
    Additive,
    /// Plain alpha compositing.
    Alpha,
}

impl BlendMode {
    /// Canvas `globalCompositeOperation` value.
    pub fn composite_operation(self) -> &'static str {
        match self {
            BlendMode::Additive => "lighter",
            BlendMode::Alpha => "source-over",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrailSettings {
    /// Regular trail steps behind the head (N).
    pub samples: u32,
    /// Portion of a revolution the trail spans.
    pub arc: f64,
    pub hyper: bool,
    pub blend: BlendMode,
}

impl TrailSettings {
    pub fn from_intensity(intensity: u32, hyper: bool, blend: BlendMode) -> Self {
        let intensity = intensity.clamp(MIN_TRAIL_INTENSITY, MAX_TRAIL_INTENSITY);
        Self {
            samples: intensity * TRAIL_SAMPLES_PER_INTENSITY,
            arc: TRAIL_ARC_BASE + TRAIL_ARC_PER_INTENSITY * intensity as f64,
            hyper,
            blend,
        }
    }

    /// Angular distance between two regular steps.
    pub fn step(&self) -> f64 {
        if self.samples == 0 {
            0.0
        } else {
            self.arc * TAU / self.samples as f64
        }
    }

    fn oversample(&self) -> u32 {
        if self.hyper {
            HYPER_OVERSAMPLE.max(1)
        } else {
            1
        }
    }
}

/// One particle of the trail.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrailSample {
    pub angle: f64,
    /// Position along the trail: 0 at the head, 1 at the tail end.
    pub t: f64,
    pub alpha: f64,
}

/// Quadratic falloff with a floor, so the tail never fully disappears.
pub fn opacity_at(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    let falloff = (1.0 - t) * (1.0 - t);
    1.0 - (1.0 - TRAIL_OPACITY_FLOOR) * (1.0 - falloff)
}

pub fn radius_at(t: f64, head_radius: f64) -> f64 {
    head_radius * (1.0 - TRAIL_RADIUS_TAPER * t.clamp(0.0, 1.0))
}

/// Fill `out` with the trail behind `head_angle`, tail first.
///
/// `out` is cleared and reused so steady-state frames do not allocate.
pub fn sample_trail(head_angle: f64, settings: &TrailSettings, out: &mut Vec<TrailSample>) {
    out.clear();
    let n = settings.samples;
    if n == 0 {
        out.push(TrailSample {
            angle: head_angle,
            t: 0.0,
            alpha: opacity_at(0.0),
        });
        return;
    }

    let k = settings.oversample();
    let step = settings.step();
    let total = n * k;
    out.reserve(total as usize + 1);
    for p in (0..=total).rev() {
        let position = p as f64 / k as f64;
        let t = position / n as f64;
        let weight = if p % k == 0 { 1.0 } else { HYPER_ALPHA_SCALE };
        out.push(TrailSample {
            angle: head_angle - position * step,
            t,
            alpha: opacity_at(t) * weight,
        });
    }
}
