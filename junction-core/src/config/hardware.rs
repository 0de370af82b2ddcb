//! Hardware configuration types
//!
//! These types define which GPIO drives each signal aspect and each
//! countdown display. The assignment is injected configuration; nothing in
//! the control loop hard-codes a pin.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::lane::{LaneId, NUM_LANES};

/// Pin configuration with optional inversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PinConfig {
    /// GPIO pin number
    pub pin: u8,
    /// Pin is active-low (inverted)
    pub inverted: bool,
}

impl PinConfig {
    /// Create a new pin config
    pub const fn new(pin: u8) -> Self {
        Self {
            pin,
            inverted: false,
        }
    }

    /// Create an inverted (active-low) pin
    pub const fn inverted(pin: u8) -> Self {
        Self {
            pin,
            inverted: true,
        }
    }
}

/// Outputs belonging to one lane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LaneChannels {
    pub red: PinConfig,
    pub yellow: PinConfig,
    pub green: PinConfig,
    /// Countdown display clock line
    pub display_clk: PinConfig,
    /// Countdown display data line
    pub display_dio: PinConfig,
}

impl LaneChannels {
    /// Every pin used by the lane
    pub const fn pins(&self) -> [u8; 5] {
        [
            self.red.pin,
            self.yellow.pin,
            self.green.pin,
            self.display_clk.pin,
            self.display_dio.pin,
        ]
    }

    /// Signal heads share one polarity; the red pin decides it
    pub const fn signal_active_low(&self) -> bool {
        self.red.inverted
    }
}

/// Configuration error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Pin assigned twice
    DuplicatePin { pin: u8, lane: LaneId },
    /// Pin used by another peripheral
    ReservedPin { pin: u8, lane: LaneId },
    /// Pin number does not exist on the target
    PinOutOfRange { pin: u8, lane: LaneId },
    /// Signal aspects of one lane disagree on polarity
    MixedPolarity { lane: LaneId },
}

/// Pin assignment for the whole junction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ChannelMap {
    pub lanes: [LaneChannels; NUM_LANES],
}

impl ChannelMap {
    pub const fn new(lanes: [LaneChannels; NUM_LANES]) -> Self {
        Self { lanes }
    }

    pub fn lane(&self, lane: LaneId) -> &LaneChannels {
        &self.lanes[lane.index()]
    }

    /// Check the assignment before any pin is claimed
    ///
    /// Every pin must be at most `max_pin`, not in `reserved`, and used
    /// exactly once across all lanes. The first problem found is returned.
    pub fn validate(&self, max_pin: u8, reserved: &[u8]) -> Result<(), ConfigError> {
        let mut used: u64 = 0;

        for lane in LaneId::all() {
            let channels = self.lane(lane);

            let polarity = channels.red.inverted;
            if channels.yellow.inverted != polarity || channels.green.inverted != polarity {
                return Err(ConfigError::MixedPolarity { lane });
            }

            for pin in channels.pins() {
                if pin > max_pin || pin >= 64 {
                    return Err(ConfigError::PinOutOfRange { pin, lane });
                }
                if reserved.contains(&pin) {
                    return Err(ConfigError::ReservedPin { pin, lane });
                }
                let bit = 1u64 << pin;
                if used & bit != 0 {
                    return Err(ConfigError::DuplicatePin { pin, lane });
                }
                used |= bit;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAX_PIN: u8 = 29;
    const UART_PINS: [u8; 2] = [0, 1];

    fn lane_at(base: u8) -> LaneChannels {
        LaneChannels {
            red: PinConfig::new(base),
            yellow: PinConfig::new(base + 1),
            green: PinConfig::new(base + 2),
            display_clk: PinConfig::new(base + 3),
            display_dio: PinConfig::new(base + 4),
        }
    }

    fn valid_map() -> ChannelMap {
        ChannelMap::new([lane_at(2), lane_at(7), lane_at(12), lane_at(17)])
    }

    #[test]
    fn test_valid_map() {
        assert_eq!(valid_map().validate(MAX_PIN, &UART_PINS), Ok(()));
    }

    #[test]
    fn test_duplicate_pin_across_lanes() {
        let mut map = valid_map();
        map.lanes[3].green = PinConfig::new(4); // lane 0 green

        assert_eq!(
            map.validate(MAX_PIN, &UART_PINS),
            Err(ConfigError::DuplicatePin {
                pin: 4,
                lane: LaneId::new(3).unwrap()
            })
        );
    }

    #[test]
    fn test_duplicate_pin_within_lane() {
        let mut map = valid_map();
        map.lanes[1].display_dio = map.lanes[1].display_clk;
        assert!(matches!(
            map.validate(MAX_PIN, &UART_PINS),
            Err(ConfigError::DuplicatePin { pin: 10, .. })
        ));
    }

    #[test]
    fn test_reserved_pin() {
        let mut map = valid_map();
        map.lanes[0].red = PinConfig::new(1);
        assert!(matches!(
            map.validate(MAX_PIN, &UART_PINS),
            Err(ConfigError::ReservedPin { pin: 1, .. })
        ));
    }

    #[test]
    fn test_out_of_range() {
        let mut map = valid_map();
        map.lanes[2].yellow = PinConfig::new(30);
        assert!(matches!(
            map.validate(MAX_PIN, &UART_PINS),
            Err(ConfigError::PinOutOfRange { pin: 30, .. })
        ));
    }

    #[test]
    fn test_mixed_polarity() {
        let mut map = valid_map();
        map.lanes[0].green = PinConfig::inverted(4);
        assert!(matches!(
            map.validate(MAX_PIN, &UART_PINS),
            Err(ConfigError::MixedPolarity { .. })
        ));
    }
}
