//! Game Blaster / CMS audio device emulation
//!
//! A cycle-accurate emulation core for the Creative Game Blaster (and the
//! CMS chip pair included on early Sound Blaster cards): two independently
//! clocked SAA1099-class sound units rendered at their native ~224 kHz rate,
//! soft-limited, and resampled to the host mixer's output rate.
//!
//! The crate owns the time-reconciliation pipeline between the emulated
//! CPU's bursty register writes and the host audio subsystem's steady
//! callback cadence:
//! - catch-up rendering of exactly the frames the device should have
//!   produced since the last render point
//! - a bounded drop-oldest queue for frames produced ahead of demand
//! - lockstep per-channel windowed-sinc resampling
//! - level-adaptive soft limiting of the summed chip pair
//! - idle power management that stops rendering when the card is unused
//!
//! The chip synthesis model and the host mixer are collaborators behind the
//! [`SoundUnit`] and [`MixerChannel`] traits.
//!
//! # Quick start
//! ```no_run
//! use gameblaster::{
//!     AudioFrame, BlasterConfig, GameBlaster, MixerChannel, RegisterWrite, SoundUnit,
//! };
//!
//! struct Chip;
//! impl SoundUnit for Chip {
//!     fn write_data(&mut self, _value: u8) {}
//!     fn write_control(&mut self, _value: u8) {}
//!     fn render_frame(&mut self) -> AudioFrame {
//!         AudioFrame::default()
//!     }
//! }
//!
//! struct Channel;
//! impl MixerChannel for Channel {
//!     fn sample_rate(&self) -> u32 {
//!         48_000
//!     }
//!     fn add_frame(&mut self, _frame: AudioFrame) {}
//!     fn set_enabled(&mut self, _enabled: bool) {}
//! }
//!
//! let mut device =
//!     GameBlaster::open(BlasterConfig::default(), [Chip, Chip], Channel).unwrap();
//! // A register write catches the renderer up to "now" first
//! device.write_register(1.5, RegisterWrite::DataLeft, 0x1c);
//! // The host audio thread pulls frames; queued audio drains first
//! device.audio_callback(2.0, 512);
//! ```
//!
//! For concurrent call sites (emulation thread, audio thread, volume
//! control), wrap the device in a [`SharedBlaster`], which serializes every
//! entry point on one lock.

#![warn(missing_docs)]

pub mod clock; // Render-time tracking
pub mod config; // Device constants and open-time configuration
pub mod device; // Device core and collaborator traits
pub mod fifo; // Bounded drop-oldest queue
pub mod frame; // Stereo frame type
pub mod limiter; // Level-adaptive soft limiter
pub mod resampler; // Native-to-host rate conversion

/// Error types for device operations
#[derive(thiserror::Error, Debug)]
pub enum BlasterError {
    /// Invalid configuration handed to a constructor
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<String> for BlasterError {
    fn from(msg: String) -> Self {
        BlasterError::Other(msg)
    }
}

impl From<&str> for BlasterError {
    fn from(msg: &str) -> Self {
        BlasterError::Other(msg.to_string())
    }
}

/// Result type for device operations
pub type Result<T> = std::result::Result<T, BlasterError>;

// Public API exports
pub use clock::RenderClock;
pub use config::{BlasterConfig, CardType, FilterChoice, NATIVE_RENDER_RATE_HZ};
pub use device::{
    ChannelFeature, FrameSink, GameBlaster, MixerChannel, RegisterWrite, SharedBlaster,
    SoundUnit, IDLE_CALLBACK_THRESHOLD,
};
pub use fifo::Fifo;
pub use frame::AudioFrame;
pub use limiter::SoftLimiter;
pub use resampler::SincResampler;
