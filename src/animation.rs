//! Orbital phase accumulation driven by frame timestamps.

use std::f64::consts::TAU;

/// Orbital phase and frame clock, owned by the renderer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnimationState {
    angle: f64,
    last_timestamp: Option<f64>,
}

impl AnimationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulated orbital angle in radians. Never wrapped.
    pub fn angle(&self) -> f64 {
        self.angle
    }

    /// Record a frame timestamp (seconds) and return the time since the
    /// previous one. The first frame and a clock that runs backwards both
    /// yield zero; a long pause yields the full gap.
    pub fn tick(&mut self, now: f64) -> f64 {
        let dt = match self.last_timestamp {
            Some(last) if now.is_finite() && now > last => now - last,
            _ => 0.0,
        };
        if now.is_finite() {
            self.last_timestamp = Some(now);
        }
        dt
    }

    /// Advance the phase by `dt` seconds at one revolution per `period`.
    pub fn advance(&mut self, dt: f64, period: f64) -> f64 {
        if dt.is_finite() && dt > 0.0 && period.is_finite() && period > 0.0 {
            self.angle += TAU * dt / period;
        }
        self.angle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_frame_has_zero_dt() {
        let mut state = AnimationState::new();
        assert_eq!(state.tick(12.5), 0.0);
        assert_eq!(state.tick(12.75), 0.25);
    }

    #[test]
    fn backwards_clock_does_not_rewind() {
        let mut state = AnimationState::new();
        state.tick(5.0);
        assert_eq!(state.tick(4.0), 0.0);
        assert_eq!(state.tick(4.5), 0.5);
    }

    #[test]
    fn advance_is_proportional_to_dt() {
        let mut state = AnimationState::new();
        state.advance(1.75, 7.0);
        assert!((state.angle() - TAU * 0.25).abs() < 1e-12);

        // a backgrounded tab produces one large step, not an error
        state.advance(70.0, 7.0);
        assert!((state.angle() - TAU * 10.25).abs() < 1e-9);
    }

    #[test]
    fn angle_is_non_decreasing() {
        let mut state = AnimationState::new();
        let mut previous = state.angle();
        for dt in [0.0, 0.016, 0.0, 3.2, -1.0, f64::NAN, 0.5] {
            let angle = state.advance(dt, 4.0);
            assert!(angle >= previous);
            previous = angle;
        }
    }

    #[test]
    fn period_change_keeps_phase() {
        let mut state = AnimationState::new();
        state.advance(1.0, 4.0);
        let before = state.angle();
        let after_change = state.advance(0.0, 12.0);
        assert_eq!(before, after_change);
        state.advance(1.0, 12.0);
        assert!((state.angle() - before - TAU / 12.0).abs() < 1e-12);
    }

    #[test]
    fn invalid_period_is_a_no_op() {
        let mut state = AnimationState::new();
        state.advance(1.0, 0.0);
        state.advance(1.0, -3.0);
        state.advance(1.0, f64::INFINITY);
        assert_eq!(state.angle(), 0.0);
    }
}
