//! Device family constants and open-time configuration.
//!
//! Business-rule validation (legal port values, filter strings) is the
//! responsibility of the host's configuration layer; the core only asserts
//! that it was handed already-valid choices.

use serde::{Deserialize, Serialize};

/// Master clock of the card's SAA1099 chips: half the NTSC colorburst
/// crystal shared with the rest of the ISA sound cards of the era.
pub const CHIP_CLOCK_HZ: u32 = 14_318_180 / 2;

/// Chip clocks consumed per native-rate frame
pub const RENDER_DIVISOR: u32 = 32;

/// The fixed rate at which the sound units naturally produce frames,
/// roughly 223.7 kHz
pub const NATIVE_RENDER_RATE_HZ: f64 = (14_318_180.0 / 2.0) / 32.0;

/// Which card the device presents itself as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardType {
    /// Creative Music System: the CMS chip pair as included on several
    /// Sound Blaster cards
    Cms,
    /// Standalone Game Blaster card, which adds a dedicated detection chip
    GameBlaster,
}

impl CardType {
    /// Display name used in log banners
    pub fn name(self) -> &'static str {
        match self {
            CardType::Cms => "CMS",
            CardType::GameBlaster => "GAMEBLASTER",
        }
    }

    /// Base ports the host's configuration layer may legally hand us
    pub fn valid_ports(self) -> &'static [u16] {
        match self {
            CardType::GameBlaster => &[0x210, 0x220, 0x230, 0x240, 0x250, 0x260],
            CardType::Cms => &[0x220, 0x240, 0x260, 0x280, 0x2a0, 0x2c0, 0x2e0, 0x300],
        }
    }
}

/// Output low-pass filter choice
///
/// The filter itself lives in the mixer channel; the core only forwards the
/// choice at open time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterChoice {
    /// First-order low-pass tuned against real hardware recordings
    On,
    /// Unfiltered output
    Off,
}

/// Open-time configuration for the device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlasterConfig {
    /// Card type to emulate
    pub card_type: CardType,
    /// Base I/O port the external decoder dispatches from
    pub base_port: u16,
    /// Output low-pass filter choice
    pub filter: FilterChoice,
    /// Capacity of the catch-up frame queue, in output-rate frames
    pub queue_capacity: usize,
}

impl Default for BlasterConfig {
    fn default() -> Self {
        BlasterConfig {
            card_type: CardType::GameBlaster,
            base_port: 0x220,
            filter: FilterChoice::On,
            queue_capacity: 4096,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_rate_matches_clock_and_divisor() {
        let expected = f64::from(CHIP_CLOCK_HZ) / f64::from(RENDER_DIVISOR);
        assert!((NATIVE_RENDER_RATE_HZ - expected).abs() < 1e-9);
        assert!(NATIVE_RENDER_RATE_HZ > 223_000.0 && NATIVE_RENDER_RATE_HZ < 224_000.0);
    }

    #[test]
    fn test_valid_ports_per_card() {
        assert!(CardType::GameBlaster.valid_ports().contains(&0x210));
        assert!(!CardType::Cms.valid_ports().contains(&0x210));
        assert!(CardType::Cms.valid_ports().contains(&0x300));
    }

    #[test]
    fn test_config_from_json() {
        let config: BlasterConfig = serde_json::from_str(
            r#"{ "card_type": "cms", "base_port": 576, "filter": "off" }"#,
        )
        .unwrap();
        assert_eq!(config.card_type, CardType::Cms);
        assert_eq!(config.base_port, 0x240);
        assert_eq!(config.filter, FilterChoice::Off);
        // Unspecified fields fall back to defaults
        assert_eq!(config.queue_capacity, 4096);
    }

    #[test]
    fn test_default_config() {
        let config = BlasterConfig::default();
        assert_eq!(config.card_type, CardType::GameBlaster);
        assert!(config
            .card_type
            .valid_ports()
            .contains(&config.base_port));
    }
}
