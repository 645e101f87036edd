//! Level-adaptive soft limiter.
//!
//! The two SAA1099 units are summed before output, so the accumulated frame
//! can exceed full scale. Hard clipping that sum is audibly harsh; instead
//! the limiter tracks a rolling peak estimate per channel and rescales the
//! frame so the loudest recent sample just reaches full scale. The estimate
//! decays back toward full scale while the signal stays in range.
//!
//! Channel volume from the host's volume-control path is applied here as a
//! prescale, via [`SoftLimiter::update_levels`], rather than letting the
//! mixer scale (and hard-clip) the samples after the fact.

use crate::frame::AudioFrame;

/// Full-scale bound of one output sample
const BOUND: f32 = 1.0;

/// Per-frame decay applied to an elevated peak estimate
///
/// Recovers from a doubled peak in roughly a third of a second at the
/// device's native render rate.
const RELEASE: f32 = 0.9999;

#[derive(Debug, Clone, Copy)]
struct ChannelLimiter {
    /// Volume prescale from the level-callback path
    prescale: f32,
    /// Rolling peak estimate, never below the full-scale bound
    peak: f32,
}

impl ChannelLimiter {
    fn new() -> Self {
        ChannelLimiter {
            prescale: 1.0,
            peak: BOUND,
        }
    }

    fn process(&mut self, sample: f32) -> f32 {
        // Non-finite input would poison the peak estimate
        let sample = if sample.is_finite() { sample } else { 0.0 };

        let scaled = sample * self.prescale;
        let magnitude = scaled.abs();
        if magnitude > self.peak {
            self.peak = magnitude;
        }

        let out = if self.peak > BOUND {
            scaled * (BOUND / self.peak)
        } else {
            scaled
        };

        self.peak = (self.peak * RELEASE).max(BOUND);
        out.clamp(-BOUND, BOUND)
    }
}

/// Stereo soft limiter
///
/// `process` runs on the per-frame render path; `update_levels` is fed from
/// the host's volume-control path. The two never race because the owning
/// device serializes all entry points behind one lock.
#[derive(Debug, Clone)]
pub struct SoftLimiter {
    left: ChannelLimiter,
    right: ChannelLimiter,
}

impl SoftLimiter {
    /// Create a limiter with unity levels and a settled peak estimate
    pub fn new() -> Self {
        SoftLimiter {
            left: ChannelLimiter::new(),
            right: ChannelLimiter::new(),
        }
    }

    /// Map an accumulated (possibly out-of-range) frame to a safe frame
    pub fn process(&mut self, accumulator: AudioFrame) -> AudioFrame {
        AudioFrame {
            left: self.left.process(accumulator.left),
            right: self.right.process(accumulator.right),
        }
    }

    /// Update the per-channel volume prescale
    pub fn update_levels(&mut self, levels: AudioFrame) {
        self.left.prescale = levels.left;
        self.right.prescale = levels.right;
    }
}

impl Default for SoftLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_in_range_passthrough() {
        let mut limiter = SoftLimiter::new();
        let out = limiter.process(AudioFrame::new(0.5, -0.25));
        assert_relative_eq!(out.left, 0.5);
        assert_relative_eq!(out.right, -0.25);
    }

    #[test]
    fn test_over_range_scaled_to_bound() {
        let mut limiter = SoftLimiter::new();
        let out = limiter.process(AudioFrame::new(2.0, -2.0));
        assert_relative_eq!(out.left, 1.0, epsilon = 1e-6);
        assert_relative_eq!(out.right, -1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_elevated_peak_attenuates_followers() {
        let mut limiter = SoftLimiter::new();
        limiter.process(AudioFrame::new(2.0, 2.0));

        // While the estimate is elevated, in-range samples are attenuated
        // by roughly the same factor
        let out = limiter.process(AudioFrame::new(0.5, 0.5));
        assert!(out.left < 0.3, "expected attenuation, got {}", out.left);
        assert!(out.left > 0.2);
    }

    #[test]
    fn test_release_restores_unity() {
        let mut limiter = SoftLimiter::new();
        limiter.process(AudioFrame::new(2.0, 2.0));

        for _ in 0..100_000 {
            limiter.process(AudioFrame::default());
        }

        let out = limiter.process(AudioFrame::new(0.5, 0.5));
        assert_relative_eq!(out.left, 0.5, epsilon = 1e-3);
        assert_relative_eq!(out.right, 0.5, epsilon = 1e-3);
    }

    #[test]
    fn test_update_levels_prescales() {
        let mut limiter = SoftLimiter::new();
        limiter.update_levels(AudioFrame::new(0.5, 0.25));
        let out = limiter.process(AudioFrame::new(1.0, 1.0));
        assert_relative_eq!(out.left, 0.5);
        assert_relative_eq!(out.right, 0.25);
    }

    #[test]
    fn test_non_finite_input_is_silenced() {
        let mut limiter = SoftLimiter::new();
        let out = limiter.process(AudioFrame::new(f32::NAN, f32::INFINITY));
        assert_eq!(out.left, 0.0);
        assert_eq!(out.right, 0.0);

        // The estimate must not have been poisoned
        let out = limiter.process(AudioFrame::new(0.5, 0.5));
        assert_relative_eq!(out.left, 0.5);
    }
}
