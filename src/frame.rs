//! Stereo audio frame type shared across the render pipeline.

use std::ops::{Add, AddAssign};

/// One stereo sample.
///
/// A frame lives in exactly one rate domain: either the device's native
/// render rate or the host mixer's output rate. The two domains only meet
/// through the resampler pair.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AudioFrame {
    /// Left channel sample
    pub left: f32,
    /// Right channel sample
    pub right: f32,
}

impl AudioFrame {
    /// Create a frame from left and right samples
    pub fn new(left: f32, right: f32) -> Self {
        AudioFrame { left, right }
    }
}

impl Add for AudioFrame {
    type Output = AudioFrame;

    fn add(self, rhs: AudioFrame) -> AudioFrame {
        AudioFrame {
            left: self.left + rhs.left,
            right: self.right + rhs.right,
        }
    }
}

impl AddAssign for AudioFrame {
    fn add_assign(&mut self, rhs: AudioFrame) {
        self.left += rhs.left;
        self.right += rhs.right;
    }
}
