//! Game Blaster / CMS device core.
//!
//! Reconciles two independent clocks: emulated time, advanced by bursty
//! register writes from the CPU emulation path, and the host audio
//! subsystem's wall time, which pulls fixed-size blocks of frames at a
//! steady callback rate.
//!
//! A register write first catches the renderer up to "now", depositing the
//! cycle-accurate frames into a bounded queue, then mutates chip state. An
//! audio pull drains that queue, renders the remainder on demand, and resets
//! the render clock since the consumer has, by construction, caught up.
//!
//! The chip synthesis model and the mixer channel are collaborators behind
//! the [`SoundUnit`] and [`MixerChannel`] traits; this module owns the
//! time-reconciliation pipeline between them.

mod shared;

pub use shared::SharedBlaster;

use bitflags::bitflags;

use crate::clock::RenderClock;
use crate::config::{BlasterConfig, FilterChoice, CHIP_CLOCK_HZ, NATIVE_RENDER_RATE_HZ};
use crate::fifo::Fifo;
use crate::frame::AudioFrame;
use crate::limiter::SoftLimiter;
use crate::resampler::SincResampler;
use crate::Result;

/// Callback invocations without an intervening register write before the
/// channel is idled.
///
/// This is a literal count of callback invocations, not wall-clock time; at
/// the mixer's usual millisecond cadence it works out to about ten seconds.
pub const IDLE_CALLBACK_THRESHOLD: u32 = 10 * 1000;

/// Low-pass filter wiring forwarded to the mixer channel when the filter is
/// configured on. The parameters were tweaked by analysing real hardware
/// recordings.
const FILTER_ORDER: u8 = 1;
const FILTER_CUTOFF_HZ: u32 = 6000;

bitflags! {
    /// Capabilities requested from the mixer channel at open time
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ChannelFeature: u8 {
        /// Frames carry independent left/right samples
        const STEREO = 0x01;
        /// Channel participates in the mixer's reverb send
        const REVERB_SEND = 0x02;
        /// Channel participates in the mixer's chorus send
        const CHORUS_SEND = 0x04;
    }
}

/// One sound-generating chip of the card's left/right pair
///
/// The synthesis model is opaque to the device core: each unit accepts the
/// raw data/control writes addressed to it and produces exactly one
/// native-rate frame per tick.
pub trait SoundUnit {
    /// Latch a value written to the unit's data port
    fn write_data(&mut self, value: u8);
    /// Latch a value written to the unit's control port
    fn write_control(&mut self, value: u8);
    /// Advance the unit by one native tick and return its output frame
    fn render_frame(&mut self) -> AudioFrame;
}

/// Host mixer channel the device delivers resampled frames to
pub trait MixerChannel {
    /// The output rate the channel expects, in Hz
    fn sample_rate(&self) -> u32;
    /// Deliver one output-rate frame to the live stream
    fn add_frame(&mut self, frame: AudioFrame);
    /// Power-state notification: the device wakes or idles the channel
    fn set_enabled(&mut self, enabled: bool);
    /// Capabilities requested at open time
    fn set_features(&mut self, _features: ChannelFeature) {}
    /// Configure the channel's output low-pass filter
    fn configure_low_pass(&mut self, _order: u8, _cutoff_hz: u32) {}
    /// Switch the configured low-pass filter on or off
    fn set_low_pass_enabled(&mut self, _enabled: bool) {}
}

/// Register write operations the external I/O decoder dispatches
///
/// The card exposes a fixed, closed set of write ports: data and control for
/// each of the two chips. Detection-port traffic goes through
/// [`GameBlaster::write_detection_port`] instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterWrite {
    /// Data port of the left chip (base + 0)
    DataLeft,
    /// Control port of the left chip (base + 1)
    ControlLeft,
    /// Data port of the right chip (base + 2)
    DataRight,
    /// Control port of the right chip (base + 3)
    ControlRight,
}

/// Where a freshly rendered frame is deposited
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameSink {
    /// Straight into the live mixer channel
    Channel,
    /// Into the bounded catch-up queue, evicting the oldest frame when full
    Queue,
}

/// The Game Blaster / CMS device
///
/// Owns the render clock, the chip pair, the soft limiter, the resampler
/// pair and the catch-up queue. All per-open state is constructed by
/// [`GameBlaster::open`] and torn down by [`GameBlaster::close`] (or drop);
/// nothing persists across open/close cycles.
pub struct GameBlaster<S: SoundUnit, C: MixerChannel> {
    config: BlasterConfig,
    devices: [S; 2],
    channel: C,
    soft_limiter: SoftLimiter,
    resamplers: [SincResampler; 2],
    fifo: Fifo<AudioFrame>,
    clock: RenderClock,
    /// Callback invocations since the last register write
    unused_for_callbacks: u32,
    channel_enabled: bool,
    cms_detect_register: u8,
    is_open: bool,
}

impl<S: SoundUnit, C: MixerChannel> GameBlaster<S, C> {
    /// Open the device: wire the mixer channel and size the resampler pair
    /// to its output rate
    ///
    /// Double-opening is unrepresentable: the constructed instance owns all
    /// per-open state. Port choices are filtered by the host's configuration
    /// layer, so an out-of-family port is asserted, not re-validated.
    pub fn open(config: BlasterConfig, devices: [S; 2], mut channel: C) -> Result<Self> {
        assert!(
            config.card_type.valid_ports().contains(&config.base_port),
            "{}: port {:#x} is not a valid base port",
            config.card_type.name(),
            config.base_port
        );

        channel.set_features(
            ChannelFeature::STEREO | ChannelFeature::REVERB_SEND | ChannelFeature::CHORUS_SEND,
        );
        match config.filter {
            FilterChoice::On => {
                channel.configure_low_pass(FILTER_ORDER, FILTER_CUTOFF_HZ);
                channel.set_low_pass_enabled(true);
            }
            FilterChoice::Off => channel.set_low_pass_enabled(false),
        }

        // Convert from the native render rate to the mixer's frame rate,
        // keeping the passband conservatively below Nyquist
        let frame_rate_hz = f64::from(channel.sample_rate());
        let max_freq = (frame_rate_hz * 0.9 / 2.0).max(8000.0);
        let resamplers = [
            SincResampler::new(NATIVE_RENDER_RATE_HZ, frame_rate_hz, max_freq)?,
            SincResampler::new(NATIVE_RENDER_RATE_HZ, frame_rate_hz, max_freq)?,
        ];

        log::info!(
            "{}: Running on port {:#x} with two {:.3} MHz Philips SAA1099 chips",
            config.card_type.name(),
            config.base_port,
            f64::from(CHIP_CLOCK_HZ) / 1e6
        );

        let fifo = Fifo::new(config.queue_capacity);
        Ok(GameBlaster {
            config,
            devices,
            channel,
            soft_limiter: SoftLimiter::new(),
            resamplers,
            fifo,
            clock: RenderClock::new(NATIVE_RENDER_RATE_HZ),
            unused_for_callbacks: 0,
            channel_enabled: false,
            cms_detect_register: 0,
            is_open: true,
        })
    }

    /// Advance both chips one native tick and deposit the resampled frame
    ///
    /// Returns true only when the resampler pair produced an output-rate
    /// frame; rate conversion is not 1:1, so a false return is the normal
    /// "needs more input" case, not an error.
    fn maybe_render_frame(&mut self, sink: FrameSink) -> bool {
        debug_assert!(self.is_open);

        // Accumulate the frame from both SAA1099 units
        let mut accumulator = self.devices[0].render_frame();
        accumulator += self.devices[1].render_frame();

        // Increment the time datum up to which the device has rendered
        self.clock.advance_tick();

        // Limit the accumulated frame to avoid hard-clipping
        let safe_frame = self.soft_limiter.process(accumulator);

        let l_ready = self.resamplers[0].input(safe_frame.left);
        let r_ready = self.resamplers[1].input(safe_frame.right);
        // The resamplers always have samples ready at the same time
        assert_eq!(l_ready, r_ready, "resampler pair lost lockstep");

        if !l_ready {
            return false;
        }

        let frame = AudioFrame::new(self.resamplers[0].output(), self.resamplers[1].output());
        match sink {
            FrameSink::Channel => self.channel.add_frame(frame),
            FrameSink::Queue => self.fifo.push(frame),
        }
        true
    }

    /// Render every native tick between the last-rendered datum and `now`,
    /// queueing the resulting frames
    ///
    /// When the channel is idle there is nothing to catch up: no audio was
    /// being consumed, and replaying the backlog would render a huge,
    /// meaningless burst. The channel is woken and the datum jumps to `now`.
    fn render_up_to(&mut self, now_ms: f64) {
        if self.channel_enabled {
            while self.clock.is_behind(now_ms) {
                self.maybe_render_frame(FrameSink::Queue);
            }
            return;
        }
        self.channel.set_enabled(true);
        self.channel_enabled = true;
        self.clock.reset_to(now_ms);
    }

    /// Handle a register write dispatched by the external I/O decoder
    ///
    /// Catch-up frames are rendered before the write mutates chip state, so
    /// the queued audio reflects the registers as they were up to `now_ms`.
    pub fn write_register(&mut self, now_ms: f64, op: RegisterWrite, value: u8) {
        debug_assert!(self.is_open);
        self.render_up_to(now_ms);
        self.unused_for_callbacks = 0;
        match op {
            RegisterWrite::DataLeft => self.devices[0].write_data(value),
            RegisterWrite::ControlLeft => self.devices[0].write_control(value),
            RegisterWrite::DataRight => self.devices[1].write_data(value),
            RegisterWrite::ControlRight => self.devices[1].write_control(value),
        }
    }

    /// Satisfy an audio pull of `requested_frames` output-rate frames
    ///
    /// Queued cycle-accurate frames are delivered first, in production
    /// order; the remainder is rendered on demand. Afterwards the render
    /// clock datum is `now_ms`: the consumer has caught up by construction,
    /// and subsequent writes queue fresh frames against it.
    pub fn audio_callback(&mut self, now_ms: f64, requested_frames: u16) {
        debug_assert!(self.is_open);

        let mut remaining = requested_frames;

        // First, deliver any frames queued since the last callback
        while remaining > 0 {
            match self.fifo.pop() {
                Some(frame) => {
                    self.channel.add_frame(frame);
                    remaining -= 1;
                }
                None => break,
            }
        }
        // When the queue's run dry, get the remainder from the device
        while remaining > 0 {
            if self.maybe_render_frame(FrameSink::Channel) {
                remaining -= 1;
            }
        }

        self.clock.reset_to(now_ms);

        // Idle the channel once the device has gone unused long enough
        self.unused_for_callbacks += 1;
        if self.unused_for_callbacks > IDLE_CALLBACK_THRESHOLD && self.channel_enabled {
            self.channel.set_enabled(false);
            self.channel_enabled = false;
        }
    }

    /// Forward channel levels from the host's volume-control path
    ///
    /// The mixer normally scales a channel's samples after hard-clipping;
    /// routing the levels into the soft limiter avoids that clipping.
    pub fn update_levels(&mut self, levels: AudioFrame) {
        self.soft_limiter.update_levels(levels);
    }

    /// Latch a write to the standalone card's detection chip
    ///
    /// Ignored for the CMS card type, which has no detection chip.
    pub fn write_detection_port(&mut self, offset: u16, value: u8) {
        if self.config.card_type != crate::config::CardType::GameBlaster {
            return;
        }
        if offset == 0x6 || offset == 0x7 {
            self.cms_detect_register = value;
        }
    }

    /// Read from the standalone card's detection chip
    pub fn read_detection_port(&self, offset: u16) -> u8 {
        if self.config.card_type != crate::config::CardType::GameBlaster {
            return 0xff;
        }
        match offset {
            0x4 => 0x7f,
            0xa | 0xb => self.cms_detect_register,
            _ => 0xff,
        }
    }

    /// Shut the device down; idempotent
    pub fn close(&mut self) {
        if !self.is_open {
            return;
        }

        log::info!(
            "{}: Shutting down the card on port {:#x}",
            self.config.card_type.name(),
            self.config.base_port
        );

        if self.channel_enabled {
            self.channel.set_enabled(false);
            self.channel_enabled = false;
        }
        self.fifo.clear();
        self.is_open = false;
    }

    /// Emulated time up to which frames have been rendered
    pub fn last_rendered_ms(&self) -> f64 {
        self.clock.last_rendered_ms()
    }

    /// Number of catch-up frames currently queued
    pub fn queued_frames(&self) -> usize {
        self.fifo.len()
    }

    /// Whether the mixer channel is currently awake
    pub fn is_channel_enabled(&self) -> bool {
        self.channel_enabled
    }

    /// Whether the device is open
    pub fn is_open(&self) -> bool {
        self.is_open
    }
}

impl<S: SoundUnit, C: MixerChannel> Drop for GameBlaster<S, C> {
    fn drop(&mut self) {
        self.close();
    }
}
