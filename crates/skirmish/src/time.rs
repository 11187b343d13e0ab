//! Simulated frame timing.
//!
//! The [`SimClock`] is advanced by the caller with whatever delta it wants to
//! simulate, so a headless run and a rendered run step the world the same way.
//! Nothing in here reads the wall clock.

use serde::Serialize;

/// Frame timing for one simulation.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct SimClock {
    /// Delta of the most recent frame, in seconds.
    delta: f32,
    /// Total simulated seconds.
    elapsed: f64,
    frame_count: u64,
}

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a frame of `dt` seconds. Negative deltas count as zero.
    pub fn advance(&mut self, dt: f32) {
        let dt = dt.max(0.0);
        self.delta = dt;
        self.elapsed += dt as f64;
        self.frame_count += 1;
    }

    /// Delta of the most recent frame.
    pub fn delta_secs(&self) -> f32 {
        self.delta
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed
    }

    /// Number of frames simulated so far.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_accumulates() {
        let mut clock = SimClock::new();
        clock.advance(0.5);
        clock.advance(0.25);
        assert_eq!(clock.frame_count(), 2);
        assert!((clock.elapsed_secs() - 0.75).abs() < 1e-6);
        assert!((clock.delta_secs() - 0.25).abs() < 1e-6);
    }

    #[test]
    fn negative_delta_is_clamped() {
        let mut clock = SimClock::new();
        clock.advance(-1.0);
        assert_eq!(clock.delta_secs(), 0.0);
        assert_eq!(clock.elapsed_secs(), 0.0);
    }
}
