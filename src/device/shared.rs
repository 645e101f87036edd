//! Shared device handle for concurrent call sites.
//!
//! The device is entered from two external execution contexts: register
//! writes arrive synchronously from the emulation/IO-dispatch path, while
//! audio pulls arrive on the host's real-time audio thread. The level
//! callback adds a third, from the volume-control path. The render clock,
//! queue, limiter, resamplers and power state must move as one atomic unit,
//! so a single mutex guards the whole device bundle.

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use crate::device::{GameBlaster, MixerChannel, RegisterWrite, SoundUnit};
use crate::frame::AudioFrame;

/// Cloneable handle serializing all entry points on one lock
pub struct SharedBlaster<S: SoundUnit, C: MixerChannel> {
    inner: Arc<Mutex<GameBlaster<S, C>>>,
}

impl<S: SoundUnit, C: MixerChannel> SharedBlaster<S, C> {
    /// Wrap an opened device
    pub fn new(blaster: GameBlaster<S, C>) -> Self {
        SharedBlaster {
            inner: Arc::new(Mutex::new(blaster)),
        }
    }

    /// Register write from the emulation path
    pub fn write_register(&self, now_ms: f64, op: RegisterWrite, value: u8) {
        self.inner.lock().write_register(now_ms, op, value);
    }

    /// Audio pull from the host audio thread
    pub fn audio_callback(&self, now_ms: f64, requested_frames: u16) {
        self.inner.lock().audio_callback(now_ms, requested_frames);
    }

    /// Level update from the volume-control path
    pub fn update_levels(&self, levels: AudioFrame) {
        self.inner.lock().update_levels(levels);
    }

    /// Detection-port write from the emulation path
    pub fn write_detection_port(&self, offset: u16, value: u8) {
        self.inner.lock().write_detection_port(offset, value);
    }

    /// Detection-port read from the emulation path
    pub fn read_detection_port(&self, offset: u16) -> u8 {
        self.inner.lock().read_detection_port(offset)
    }

    /// Shut the device down; serialized against in-flight renders
    pub fn close(&self) {
        self.inner.lock().close();
    }

    /// Lock the device directly, for inspection or compound operations
    pub fn lock(&self) -> MutexGuard<'_, GameBlaster<S, C>> {
        self.inner.lock()
    }
}

impl<S: SoundUnit, C: MixerChannel> Clone for SharedBlaster<S, C> {
    fn clone(&self) -> Self {
        SharedBlaster {
            inner: Arc::clone(&self.inner),
        }
    }
}
