//! Tests for the shared device handle: one lock serializing the emulation
//! path, the audio thread and the volume-control path.

use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;

use gameblaster::{
    AudioFrame, BlasterConfig, GameBlaster, MixerChannel, RegisterWrite, SharedBlaster, SoundUnit,
};

struct SilentUnit;

impl SoundUnit for SilentUnit {
    fn write_data(&mut self, _value: u8) {}
    fn write_control(&mut self, _value: u8) {}
    fn render_frame(&mut self) -> AudioFrame {
        AudioFrame::default()
    }
}

struct CountingChannel {
    frames_delivered: Arc<Mutex<usize>>,
}

impl MixerChannel for CountingChannel {
    fn sample_rate(&self) -> u32 {
        48_000
    }

    fn add_frame(&mut self, _frame: AudioFrame) {
        *self.frames_delivered.lock() += 1;
    }

    fn set_enabled(&mut self, _enabled: bool) {}
}

fn open_shared() -> (SharedBlaster<SilentUnit, CountingChannel>, Arc<Mutex<usize>>) {
    let frames_delivered = Arc::new(Mutex::new(0));
    let channel = CountingChannel {
        frames_delivered: Arc::clone(&frames_delivered),
    };
    let device = GameBlaster::open(BlasterConfig::default(), [SilentUnit, SilentUnit], channel)
        .unwrap();
    (SharedBlaster::new(device), frames_delivered)
}

#[test]
fn handle_serializes_concurrent_writers_and_pulls() {
    let (shared, frames_delivered) = open_shared();

    let audio_handle = shared.clone();
    let audio_thread = thread::spawn(move || {
        for i in 0..50_u32 {
            audio_handle.audio_callback(f64::from(i) * 0.7, 32);
        }
    });

    let level_handle = shared.clone();
    let level_thread = thread::spawn(move || {
        for _ in 0..20 {
            level_handle.update_levels(AudioFrame::new(0.8, 0.8));
        }
    });

    for i in 0..200_u32 {
        shared.write_register(f64::from(i) * 0.2, RegisterWrite::DataLeft, i as u8);
    }

    audio_thread.join().unwrap();
    level_thread.join().unwrap();

    // Every callback was satisfied in full: 50 pulls of 32 frames each
    assert_eq!(*frames_delivered.lock(), 50 * 32);
}

#[test]
fn handle_exposes_the_device_for_inspection() {
    let (shared, _) = open_shared();

    shared.write_register(3.0, RegisterWrite::ControlLeft, 0x1c);
    assert_eq!(shared.lock().last_rendered_ms(), 3.0);
    assert!(shared.lock().is_channel_enabled());

    shared.close();
    assert!(!shared.lock().is_open());
}

#[test]
fn detection_port_round_trips_through_the_handle() {
    let (shared, _) = open_shared();
    shared.write_detection_port(0x6, 0x42);
    assert_eq!(shared.read_detection_port(0xa), 0x42);
}
